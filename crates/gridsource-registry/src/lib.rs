//! gridsource-registry: the table of metric sources.
//!
//! Backends register under a source name and are then addressed with
//! qualified targets of the form `source:target`. A target without a
//! prefix goes to the `$default` source.
//!
//! # Architecture
//!
//! ```text
//! Registry (clonable handle)
//!   ├── sources: name → { find, read, annotations, panel }
//!   │                     each slot an Arc<dyn MetricSource>
//!   └── index: MetricPathIndex (domain → location → leaf)
//! ```
//!
//! Sources either implement [`MetricSource`] directly or are assembled
//! from plain closures via `register_finder`, `register_reader` and
//! friends.

pub mod error;
pub mod fn_source;
pub mod registry;
pub mod source;

pub use error::{RegistryError, RegistryResult, SourceError, SourceResult};
pub use registry::{DEFAULT_SOURCE, Registry, Resolved};
pub use source::{Capability, MetricSource, SourceFuture};
