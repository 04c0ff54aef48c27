//! JSON request and response shapes.
//!
//! Field names follow the dashboard client exactly (`intervalMs`,
//! `reloadMetric`, `type`); unknown request fields are ignored.

use gridsource_core::Value;
use serde::{Deserialize, Deserializer, Serialize};

// ── Requests ───────────────────────────────────────────────────────

/// Time range as sent by the client, before parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRange {
    pub from: String,
    pub to: String,
}

/// Response shape requested for a query target. Anything but `"table"`
/// is served as a time series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    Table,
    #[default]
    #[serde(other)]
    Timeserie,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryTarget {
    pub target: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: ResponseKind,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// POST /query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub range: RawRange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_ms: Option<u64>,
    #[serde(default)]
    pub targets: Vec<QueryTarget>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationQuery {
    #[serde(default)]
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// POST /annotations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRequest {
    pub range: RawRange,
    pub annotation: AnnotationQuery,
}

/// POST /search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    #[serde(default = "match_all")]
    pub target: String,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            target: match_all(),
        }
    }
}

fn match_all() -> String {
    "*".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricPayload {
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

/// POST /metrics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsRequest {
    #[serde(default)]
    pub metric: Option<String>,
    #[serde(default)]
    pub payload: Option<MetricPayload>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PayloadOptionsPayload {
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
}

/// POST /metric-payload-options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadOptionsRequest {
    pub name: String,
    #[serde(default)]
    pub payload: Option<PayloadOptionsPayload>,
}

/// POST /tag-values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagValuesRequest {
    #[serde(default)]
    pub key: String,
}

/// GET /panels query string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanelQuery {
    pub from: String,
    pub to: String,
    pub query: String,
}

// ── Responses ──────────────────────────────────────────────────────

/// One series of `[value, epochMillis]` pairs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeserieBlock {
    pub target: String,
    pub datapoints: Vec<(Value, i64)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Time,
    Number,
    String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableColumn {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: ColumnType,
}

/// A table cell: the leading epoch-millisecond time, or a column value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Time(i64),
    Value(Value),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Table,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableBlock {
    pub columns: Vec<TableColumn>,
    pub rows: Vec<Vec<Cell>>,
    #[serde(rename = "type")]
    pub kind: BlockType,
}

/// One element of a /query response array.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryBlock {
    Timeserie(TimeserieBlock),
    Table(TableBlock),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    pub annotation: String,
    pub time: i64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,
}

/// Editor input offered next to a metric in the query editor.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadDescriptor {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub reload_metric: bool,
}

impl PayloadDescriptor {
    pub fn input(name: &str, label: &str) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind: "input".to_string(),
            reload_metric: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricOption {
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub payloads: Vec<PayloadDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayloadOption {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagKey {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagValue {
    pub text: String,
}
