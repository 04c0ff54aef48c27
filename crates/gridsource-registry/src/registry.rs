//! Source registry: resolves qualified targets to backends.
//!
//! The registry is populated at startup and read by every request. All
//! tables sit behind one coarse `RwLock`; lookups clone the source `Arc`
//! out and release the lock before any backend call is made.

use std::sync::{Arc, RwLock};

use gridsource_core::{MetricPathIndex, Panel, TimeRange, TimeSeries};
use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::error::{RegistryError, RegistryResult, SourceError};
use crate::fn_source::FnSource;
use crate::source::{Capability, MetricSource};

/// Source name used for targets without a `source:` prefix.
pub const DEFAULT_SOURCE: &str = "$default";

/// Per-source capability slots.
#[derive(Default)]
struct Slots {
    find: Option<Arc<dyn MetricSource>>,
    read: Option<Arc<dyn MetricSource>>,
    annotations: Option<Arc<dyn MetricSource>>,
    panel: Option<Arc<dyn MetricSource>>,
}

impl Slots {
    fn slot(&mut self, capability: Capability) -> &mut Option<Arc<dyn MetricSource>> {
        match capability {
            Capability::Find => &mut self.find,
            Capability::Read => &mut self.read,
            Capability::Annotations => &mut self.annotations,
            Capability::Panel => &mut self.panel,
        }
    }

    fn get(&self, capability: Capability) -> Option<&Arc<dyn MetricSource>> {
        match capability {
            Capability::Find => self.find.as_ref(),
            Capability::Read => self.read.as_ref(),
            Capability::Annotations => self.annotations.as_ref(),
            Capability::Panel => self.panel.as_ref(),
        }
    }
}

#[derive(Default)]
struct Inner {
    sources: IndexMap<String, Slots>,
    index: Arc<MetricPathIndex>,
}

/// A qualified target resolved to the source that will serve it.
#[derive(Clone)]
pub struct Resolved {
    pub name: String,
    pub target: String,
    pub source: Arc<dyn MetricSource>,
}

impl Resolved {
    pub async fn find(&self) -> RegistryResult<Vec<String>> {
        debug!(source = %self.name, fragment = %self.target, "dispatching finder");
        self.source.find(&self.target).await.map_err(|e| self.backend(e))
    }

    pub async fn read(&self, range: TimeRange) -> RegistryResult<TimeSeries> {
        debug!(source = %self.name, metric = %self.target, "dispatching reader");
        self.source
            .read(&self.target, range)
            .await
            .map_err(|e| self.backend(e))
    }

    pub async fn read_annotations(&self, range: TimeRange) -> RegistryResult<TimeSeries> {
        debug!(source = %self.name, query = %self.target, "dispatching annotation reader");
        self.source
            .read_annotations(&self.target, range)
            .await
            .map_err(|e| self.backend(e))
    }

    pub async fn read_panel(&self, range: TimeRange) -> RegistryResult<Panel> {
        debug!(source = %self.name, metric = %self.target, "dispatching panel reader");
        self.source
            .read_panel(&self.target, range)
            .await
            .map_err(|e| self.backend(e))
    }

    fn backend(&self, error: SourceError) -> RegistryError {
        RegistryError::Backend {
            name: self.name.clone(),
            error,
        }
    }
}

/// Shared handle to the source tables and metric index.
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<RwLock<Inner>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Split `source:target` on the first colon. Without a colon the whole
    /// input is the target and the source is [`DEFAULT_SOURCE`].
    pub fn resolve_target(qualified: &str) -> (&str, &str) {
        qualified
            .split_once(':')
            .unwrap_or((DEFAULT_SOURCE, qualified))
    }

    // ── Registration ───────────────────────────────────────────────

    /// Register `source` for every capability it supports. Later
    /// registrations replace earlier ones per capability. A source that
    /// supports nothing is ignored.
    pub fn register(&self, name: &str, source: Arc<dyn MetricSource>) {
        let supported: Vec<Capability> = Capability::ALL
            .into_iter()
            .filter(|&capability| source.supports(capability))
            .collect();
        if supported.is_empty() {
            warn!(source = name, "source supports no capability, not registered");
            return;
        }

        let mut inner = self.inner.write().expect("registry lock");
        let slots = inner.sources.entry(name.to_string()).or_default();
        for capability in supported {
            *slots.slot(capability) = Some(Arc::clone(&source));
            debug!(source = name, %capability, "registered");
        }
    }

    pub fn register_finder<F>(&self, name: &str, f: F)
    where
        F: Fn(&str) -> anyhow::Result<Vec<String>> + Send + Sync + 'static,
    {
        self.register(name, Arc::new(FnSource::Finder(Arc::new(f))));
    }

    pub fn register_reader<F>(&self, name: &str, f: F)
    where
        F: Fn(&str, TimeRange) -> anyhow::Result<TimeSeries> + Send + Sync + 'static,
    {
        self.register(name, Arc::new(FnSource::Reader(Arc::new(f))));
    }

    pub fn register_annotation_reader<F>(&self, name: &str, f: F)
    where
        F: Fn(&str, TimeRange) -> anyhow::Result<TimeSeries> + Send + Sync + 'static,
    {
        self.register(name, Arc::new(FnSource::AnnotationReader(Arc::new(f))));
    }

    pub fn register_panel_reader<F>(&self, name: &str, f: F)
    where
        F: Fn(&str, TimeRange) -> anyhow::Result<Panel> + Send + Sync + 'static,
    {
        self.register(name, Arc::new(FnSource::PanelReader(Arc::new(f))));
    }

    /// Replace the metric index with one built from `identifiers`.
    pub fn set_metrics<I, S>(&self, identifiers: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let index = Arc::new(MetricPathIndex::build(identifiers));
        self.inner.write().expect("registry lock").index = index;
    }

    // ── Lookup ─────────────────────────────────────────────────────

    /// Registered source names, in order of first registration.
    pub fn source_names(&self) -> Vec<String> {
        let inner = self.inner.read().expect("registry lock");
        inner.sources.keys().cloned().collect()
    }

    pub fn index(&self) -> Arc<MetricPathIndex> {
        Arc::clone(&self.inner.read().expect("registry lock").index)
    }

    /// Resolve a qualified target to the source serving `capability`.
    pub fn lookup(&self, qualified: &str, capability: Capability) -> RegistryResult<Resolved> {
        let (name, target) = Self::resolve_target(qualified);
        let inner = self.inner.read().expect("registry lock");
        let source = inner
            .sources
            .get(name)
            .and_then(|slots| slots.get(capability))
            .cloned()
            .ok_or_else(|| RegistryError::UnknownSource {
                name: name.to_string(),
                capability,
            })?;
        Ok(Resolved {
            name: name.to_string(),
            target: target.to_string(),
            source,
        })
    }

    // ── Dispatch ───────────────────────────────────────────────────

    pub async fn dispatch_finder(&self, qualified: &str) -> RegistryResult<Vec<String>> {
        self.lookup(qualified, Capability::Find)?.find().await
    }

    pub async fn dispatch_reader(
        &self,
        qualified: &str,
        range: TimeRange,
    ) -> RegistryResult<TimeSeries> {
        self.lookup(qualified, Capability::Read)?.read(range).await
    }

    pub async fn dispatch_annotation_reader(
        &self,
        qualified: &str,
        range: TimeRange,
    ) -> RegistryResult<TimeSeries> {
        self.lookup(qualified, Capability::Annotations)?
            .read_annotations(range)
            .await
    }

    pub async fn dispatch_panel_reader(
        &self,
        qualified: &str,
        range: TimeRange,
    ) -> RegistryResult<Panel> {
        self.lookup(qualified, Capability::Panel)?.read_panel(range).await
    }

    // ── Metric tree ────────────────────────────────────────────────

    pub fn list_domains(&self) -> Vec<String> {
        self.index().domains()
    }

    pub fn list_locations(&self, domain: &str) -> Vec<String> {
        self.index().locations(domain)
    }

    /// Leaves under `domain`/`location`, as full `/domain/location/leaf` identifiers.
    pub fn list_leaves(&self, domain: &str, location: &str) -> Vec<String> {
        self.index().leaves(domain, location)
    }
}
