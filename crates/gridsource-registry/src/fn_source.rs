//! Sources built from plain closures.
//!
//! Closures are synchronous and may block on I/O, so every call is moved
//! onto tokio's blocking pool.

use std::sync::Arc;

use gridsource_core::{Panel, TimeRange, TimeSeries};

use crate::source::{Capability, MetricSource, SourceFuture, unsupported};

pub type FinderFn = dyn Fn(&str) -> anyhow::Result<Vec<String>> + Send + Sync;
pub type ReaderFn = dyn Fn(&str, TimeRange) -> anyhow::Result<TimeSeries> + Send + Sync;
pub type PanelFn = dyn Fn(&str, TimeRange) -> anyhow::Result<Panel> + Send + Sync;

/// A single-capability source wrapping one closure.
#[derive(Clone)]
pub enum FnSource {
    Finder(Arc<FinderFn>),
    Reader(Arc<ReaderFn>),
    AnnotationReader(Arc<ReaderFn>),
    PanelReader(Arc<PanelFn>),
}

impl FnSource {
    pub fn capability(&self) -> Capability {
        match self {
            FnSource::Finder(_) => Capability::Find,
            FnSource::Reader(_) => Capability::Read,
            FnSource::AnnotationReader(_) => Capability::Annotations,
            FnSource::PanelReader(_) => Capability::Panel,
        }
    }
}

impl MetricSource for FnSource {
    fn supports(&self, capability: Capability) -> bool {
        self.capability() == capability
    }

    fn find<'a>(&'a self, fragment: &'a str) -> SourceFuture<'a, Vec<String>> {
        match self {
            FnSource::Finder(f) => {
                let f = Arc::clone(f);
                let fragment = fragment.to_string();
                run_blocking(move || f(&fragment))
            }
            _ => unsupported(Capability::Find),
        }
    }

    fn read<'a>(&'a self, target: &'a str, range: TimeRange) -> SourceFuture<'a, TimeSeries> {
        match self {
            FnSource::Reader(f) => {
                let f = Arc::clone(f);
                let target = target.to_string();
                run_blocking(move || f(&target, range))
            }
            _ => unsupported(Capability::Read),
        }
    }

    fn read_annotations<'a>(
        &'a self,
        query: &'a str,
        range: TimeRange,
    ) -> SourceFuture<'a, TimeSeries> {
        match self {
            FnSource::AnnotationReader(f) => {
                let f = Arc::clone(f);
                let query = query.to_string();
                run_blocking(move || f(&query, range))
            }
            _ => unsupported(Capability::Annotations),
        }
    }

    fn read_panel<'a>(&'a self, target: &'a str, range: TimeRange) -> SourceFuture<'a, Panel> {
        match self {
            FnSource::PanelReader(f) => {
                let f = Arc::clone(f);
                let target = target.to_string();
                run_blocking(move || f(&target, range))
            }
            _ => unsupported(Capability::Panel),
        }
    }
}

fn run_blocking<'a, T, F>(call: F) -> SourceFuture<'a, T>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    Box::pin(async move {
        let result = tokio::task::spawn_blocking(call)
            .await
            .map_err(anyhow::Error::from)?;
        Ok(result?)
    })
}
