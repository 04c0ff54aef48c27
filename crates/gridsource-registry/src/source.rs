//! The capability interface every backend implements.

use std::fmt;
use std::future::{Future, ready};
use std::pin::Pin;

use gridsource_core::{Aggregation, Panel, TimeRange, TimeSeries};

use crate::error::{SourceError, SourceResult};

/// Boxed future alias for source calls.
pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = SourceResult<T>> + Send + 'a>>;

/// One of the four things a source can do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Text fragment → matching metric names.
    Find,
    /// Bare target + range → time series.
    Read,
    /// Query + range → timestamped event rows.
    Annotations,
    /// Bare target + range → rendered artifact.
    Panel,
}

impl Capability {
    pub const ALL: [Capability; 4] = [
        Capability::Find,
        Capability::Read,
        Capability::Annotations,
        Capability::Panel,
    ];
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Capability::Find => "finder",
            Capability::Read => "reader",
            Capability::Annotations => "annotation reader",
            Capability::Panel => "panel reader",
        };
        f.write_str(name)
    }
}

/// A metric backend.
///
/// Every call method defaults to [`SourceError::Unsupported`]; implement
/// the ones the backend offers and report them from [`supports`]. Calls
/// may take arbitrarily long; the registry holds no lock while they run.
///
/// [`supports`]: MetricSource::supports
pub trait MetricSource: Send + Sync {
    fn supports(&self, capability: Capability) -> bool;

    /// Aggregation applied when the client asks for a sampling interval.
    fn aggregation(&self) -> Aggregation {
        Aggregation::Mean
    }

    fn find<'a>(&'a self, _fragment: &'a str) -> SourceFuture<'a, Vec<String>> {
        unsupported(Capability::Find)
    }

    fn read<'a>(&'a self, _target: &'a str, _range: TimeRange) -> SourceFuture<'a, TimeSeries> {
        unsupported(Capability::Read)
    }

    fn read_annotations<'a>(
        &'a self,
        _query: &'a str,
        _range: TimeRange,
    ) -> SourceFuture<'a, TimeSeries> {
        unsupported(Capability::Annotations)
    }

    fn read_panel<'a>(&'a self, _target: &'a str, _range: TimeRange) -> SourceFuture<'a, Panel> {
        unsupported(Capability::Panel)
    }
}

pub(crate) fn unsupported<'a, T: Send + 'a>(capability: Capability) -> SourceFuture<'a, T> {
    Box::pin(ready(Err(SourceError::Unsupported(capability))))
}
