//! Request dispatch: one wire request in, one wire response out.
//!
//! The dispatcher is transport-independent: handlers hand it a decoded
//! request and serialize whatever it returns. It never holds the
//! registry lock while a backend call is outstanding.

use gridsource_core::Panel;
use gridsource_protocol::{
    Annotation, AnnotationRequest, MetricOption, MetricsRequest, PanelQuery, PayloadDescriptor,
    PayloadOption, PayloadOptionsRequest, QueryBlock, QueryRequest, RangeUnit, RawRange, ResponseKind,
    Sampling, SearchRequest, TagKey, TagValue, TagValuesRequest, parse_wire_range,
    to_annotation_response, to_table_response, to_timeserie_response,
};
use gridsource_registry::{Capability, DEFAULT_SOURCE, Registry, RegistryError};
use tracing::debug;

use crate::error::{ApiError, ApiResult};

/// Search fragments shorter than this return nothing.
pub const MIN_SEARCH_LEN: usize = 3;

/// The only tag key offered to ad-hoc filters.
pub const DOMAIN_TAG: &str = "Domain";

#[derive(Clone)]
pub struct RequestDispatcher {
    registry: Registry,
}

impl RequestDispatcher {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Metric names matching the search text.
    ///
    /// A `source:` prefix naming a registered finder routes there; any other
    /// text, colons included, goes whole to the `$default` finder.
    pub async fn search(&self, req: &SearchRequest) -> ApiResult<Vec<String>> {
        if req.target.chars().count() < MIN_SEARCH_LEN {
            return Ok(Vec::new());
        }
        let resolved = match self.registry.lookup(&req.target, Capability::Find) {
            Ok(resolved) => resolved,
            Err(RegistryError::UnknownSource { .. }) => self
                .registry
                .lookup(&format!("{DEFAULT_SOURCE}:{}", req.target), Capability::Find)?,
            Err(e) => return Err(e.into()),
        };
        Ok(resolved.find().await?)
    }

    /// The metric picker list: the current metric (or a placeholder),
    /// followed by its siblings when both domain and location are set.
    pub fn metrics(&self, req: &MetricsRequest) -> Vec<MetricOption> {
        let payloads = vec![
            PayloadDescriptor::input("domain", "Domain"),
            PayloadDescriptor::input("location", "Location"),
        ];

        let mut options = vec![match &req.metric {
            Some(metric) => MetricOption {
                value: metric.clone(),
                label: None,
                payloads: payloads.clone(),
            },
            None => MetricOption {
                value: "DescribeMetricList".to_string(),
                label: Some("Describe Metric below".to_string()),
                payloads: payloads.clone(),
            },
        }];

        let path = req
            .payload
            .as_ref()
            .and_then(|p| Some((p.domain.as_deref()?, p.location.as_deref()?)));
        if let Some((domain, location)) = path {
            options.extend(
                self.registry
                    .list_leaves(domain, location)
                    .into_iter()
                    .filter(|leaf| req.metric.as_deref() != Some(leaf.as_str()))
                    .map(|leaf| MetricOption {
                        value: leaf,
                        label: None,
                        payloads: payloads.clone(),
                    }),
            );
        }
        options
    }

    /// Domains (`namespace`) or the locations of one domain (`location`).
    pub fn payload_options(&self, req: &PayloadOptionsRequest) -> Vec<PayloadOption> {
        let names = match req.name.as_str() {
            "namespace" => self.registry.list_domains(),
            "location" => req
                .payload
                .as_ref()
                .and_then(|p| p.namespace.as_deref().or(p.domain.as_deref()))
                .map(|domain| self.registry.list_locations(domain))
                .unwrap_or_default(),
            _ => Vec::new(),
        };
        names.into_iter().map(|name| PayloadOption { name }).collect()
    }

    pub fn tag_keys(&self) -> Vec<TagKey> {
        vec![TagKey {
            kind: "string".to_string(),
            text: DOMAIN_TAG.to_string(),
        }]
    }

    /// Every registered source name, for the `Domain` tag key.
    pub fn tag_values(&self, req: &TagValuesRequest) -> Vec<TagValue> {
        if req.key != DOMAIN_TAG {
            return Vec::new();
        }
        self.registry
            .source_names()
            .into_iter()
            .map(|text| TagValue { text })
            .collect()
    }

    /// Read every target in order and concatenate the converted blocks.
    /// Any failing target fails the whole request.
    pub async fn query(&self, req: &QueryRequest) -> ApiResult<Vec<QueryBlock>> {
        let range = parse_wire_range(&req.range, RangeUnit::Iso)?;
        debug!(targets = req.targets.len(), ?range, "query");

        let mut blocks = Vec::new();
        for target in &req.targets {
            let resolved = self.registry.lookup(&target.target, Capability::Read)?;
            let series = resolved.read(range).await?;

            match target.kind {
                ResponseKind::Timeserie => {
                    let sampling =
                        Sampling::from_interval_ms(req.interval_ms, resolved.source.aggregation());
                    blocks.extend(
                        to_timeserie_response(&target.target, &series, sampling)
                            .into_iter()
                            .map(QueryBlock::Timeserie),
                    );
                }
                ResponseKind::Table => {
                    blocks.extend(to_table_response(&target.target, &series).map(QueryBlock::Table));
                }
            }
        }
        Ok(blocks)
    }

    /// Annotation queries must name their source explicitly.
    pub async fn annotations(&self, req: &AnnotationRequest) -> ApiResult<Vec<Annotation>> {
        let range = parse_wire_range(&req.range, RangeUnit::Iso)?;
        let query = require_qualified(&req.annotation.query)?;
        let events = self.registry.dispatch_annotation_reader(query, range).await?;
        Ok(to_annotation_response(query, &events))
    }

    /// Panels take an epoch-millisecond range and a qualified query.
    pub async fn panel(&self, req: &PanelQuery) -> ApiResult<Panel> {
        let range = parse_wire_range(
            &RawRange {
                from: req.from.clone(),
                to: req.to.clone(),
            },
            RangeUnit::EpochMillis,
        )?;
        let query = require_qualified(&req.query)?;
        Ok(self.registry.dispatch_panel_reader(query, range).await?)
    }
}

fn require_qualified(query: &str) -> ApiResult<&str> {
    if query.contains(':') {
        Ok(query)
    } else {
        Err(ApiError::UnqualifiedQuery(query.to_string()))
    }
}
