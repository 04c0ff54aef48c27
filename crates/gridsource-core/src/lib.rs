//! gridsource-core: shared types for the gridsource datasource.
//!
//! Everything here is transport-agnostic: the half-open [`TimeRange`]
//! readers are queried with, the [`TimeSeries`] tables they return, and
//! the [`MetricPathIndex`] that turns flat `/domain/location/leaf`
//! identifiers into a navigable tree.

pub mod config;
pub mod error;
pub mod panel;
pub mod path_index;
pub mod range;
pub mod series;

pub use config::ServiceConfig;
pub use error::{CoreError, CoreResult};
pub use panel::Panel;
pub use path_index::{MetricPath, MetricPathIndex, MetricTree, filter};
pub use range::TimeRange;
pub use series::{Aggregation, Column, TimeSeries, Value};
