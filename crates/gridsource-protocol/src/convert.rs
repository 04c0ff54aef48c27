//! Reader results → wire responses.
//!
//! These functions assume the table was produced by a registered reader;
//! they never sort, dedupe, or reorder rows.

use std::borrow::Cow;
use std::fmt;
use std::time::Duration;

use gridsource_core::{Aggregation, Column, TimeSeries};
use tracing::debug;

use crate::wire::{
    Annotation, BlockType, Cell, ColumnType, TableBlock, TableColumn, TimeserieBlock,
};

/// Resampling requested by the client's `intervalMs`, with the
/// aggregation chosen by the backend serving the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sampling {
    pub interval: Duration,
    pub aggregation: Aggregation,
}

/// Widest bucket a client may ask for.
pub const MAX_SAMPLING_INTERVAL: Duration = Duration::from_secs(366 * 24 * 3600);

impl Sampling {
    /// `None` for a missing or zero interval. Wider intervals are capped at
    /// [`MAX_SAMPLING_INTERVAL`].
    pub fn from_interval_ms(interval_ms: Option<u64>, aggregation: Aggregation) -> Option<Self> {
        match interval_ms {
            Some(ms) if ms > 0 => Some(Self {
                interval: Duration::from_millis(ms).min(MAX_SAMPLING_INTERVAL),
                aggregation,
            }),
            _ => None,
        }
    }
}

impl fmt::Display for Sampling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms/{}", self.interval.as_millis(), self.aggregation)
    }
}

/// One block per value column, each named `target`. Missing cells are
/// dropped; an empty result yields no blocks.
pub fn to_timeserie_response(
    target: &str,
    result: &TimeSeries,
    sampling: Option<Sampling>,
) -> Vec<TimeserieBlock> {
    if result.is_empty() {
        return Vec::new();
    }

    let series = match sampling {
        Some(s) => {
            debug!(metric = target, sampling = %s, "resampling");
            Cow::Owned(result.resample(s.interval, s.aggregation))
        }
        None => Cow::Borrowed(result),
    };

    series
        .columns()
        .iter()
        .map(|column| TimeserieBlock {
            target: target.to_string(),
            datapoints: series
                .index()
                .iter()
                .zip(&column.values)
                .filter(|(_, value)| !value.is_missing())
                .map(|(ts, value)| (value.clone(), ts.timestamp_millis()))
                .collect(),
        })
        .collect()
}

/// A leading `Time` column, then one typed column per value column.
/// Returns `None` for an empty result.
pub fn to_table_response(target: &str, result: &TimeSeries) -> Option<TableBlock> {
    if result.is_empty() {
        return None;
    }

    let mut columns = vec![TableColumn {
        text: "Time".to_string(),
        kind: ColumnType::Time,
    }];
    columns.extend(result.columns().iter().map(|c| TableColumn {
        text: c.name.clone(),
        kind: if c.is_numeric() {
            ColumnType::Number
        } else {
            ColumnType::String
        },
    }));

    let rows = result
        .index()
        .iter()
        .enumerate()
        .map(|(i, ts)| {
            let mut row = Vec::with_capacity(result.columns().len() + 1);
            row.push(Cell::Time(ts.timestamp_millis()));
            row.extend(result.columns().iter().map(|c| Cell::Value(c.values[i].clone())));
            row
        })
        .collect::<Vec<_>>();

    debug!(metric = target, rows = rows.len(), "table response");
    Some(TableBlock {
        columns,
        rows,
        kind: BlockType::Table,
    })
}

/// One annotation per row, labelled with the full query string.
///
/// The title comes from a `title` column, or from the only column of a
/// single-column result. `text` and `tags` are copied when present.
pub fn to_annotation_response(label: &str, result: &TimeSeries) -> Vec<Annotation> {
    if result.is_empty() {
        return Vec::new();
    }

    let (title, text, tags): (Option<&Column>, Option<&Column>, Option<&Column>) =
        match (result.column("title"), result.columns()) {
            (None, [only]) => (Some(only), None, None),
            (title, _) => (title, result.column("text"), result.column("tags")),
        };

    let cell = |column: Option<&Column>, row: usize| column.map(|c| c.values[row].to_text());

    result
        .index()
        .iter()
        .enumerate()
        .map(|(row, ts)| Annotation {
            annotation: label.to_string(),
            time: ts.timestamp_millis(),
            title: cell(title, row).unwrap_or_default(),
            text: cell(text, row),
            tags: cell(tags, row),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use gridsource_core::Value;
    use serde_json::json;

    fn at(ms: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(ms).unwrap()
    }

    fn two_columns() -> TimeSeries {
        TimeSeries::new(vec![at(1_000), at(2_000)])
            .with_column("min", [1.0, 2.0])
            .unwrap()
            .with_column("max", [Value::Number(5.0), Value::Null])
            .unwrap()
    }

    #[test]
    fn timeserie_one_block_per_column_named_by_target() {
        let blocks = to_timeserie_response("stor:/dc1/rackA/temp", &two_columns(), None);
        assert_eq!(
            serde_json::to_value(&blocks).unwrap(),
            json!([
                {"target": "stor:/dc1/rackA/temp", "datapoints": [[1.0, 1000], [2.0, 2000]]},
                {"target": "stor:/dc1/rackA/temp", "datapoints": [[5.0, 1000]]}
            ])
        );
    }

    #[test]
    fn timeserie_keeps_backend_order() {
        let series = TimeSeries::from_points("v", [(at(3_000), 3.0), (at(1_000), 1.0)]);
        let blocks = to_timeserie_response("v", &series, None);
        assert_eq!(blocks[0].datapoints[0].1, 3_000);
        assert_eq!(blocks[0].datapoints[1].1, 1_000);
    }

    #[test]
    fn timeserie_resamples_when_interval_given() {
        let series = TimeSeries::from_points(
            "v",
            [(at(500), 1.0), (at(1_000), 3.0), (at(1_500), 10.0)],
        );
        let sampling = Sampling::from_interval_ms(Some(1_000), Aggregation::Mean);
        let blocks = to_timeserie_response("v", &series, sampling);
        assert_eq!(
            blocks[0].datapoints,
            vec![(Value::Number(2.0), 1_000), (Value::Number(10.0), 2_000)]
        );
    }

    #[test]
    fn empty_result_yields_nothing() {
        let empty = TimeSeries::default();
        assert!(to_timeserie_response("x", &empty, None).is_empty());
        assert!(to_table_response("x", &empty).is_none());
        assert!(to_annotation_response("x", &empty).is_empty());
    }

    #[test]
    fn oversized_interval_is_capped_and_keeps_points() {
        let sampling = Sampling::from_interval_ms(Some(10_000_000_000_000_000), Aggregation::Mean)
            .unwrap();
        assert_eq!(sampling.interval, MAX_SAMPLING_INTERVAL);

        let series = TimeSeries::from_points("v", [(at(30_000), 4.0)]);
        let blocks = to_timeserie_response("cpu", &series, Some(sampling));
        assert_eq!(
            blocks[0].datapoints,
            vec![(Value::Number(4.0), MAX_SAMPLING_INTERVAL.as_millis() as i64)]
        );
    }

    #[test]
    fn zero_interval_means_no_sampling() {
        assert_eq!(Sampling::from_interval_ms(Some(0), Aggregation::Mean), None);
        assert_eq!(Sampling::from_interval_ms(None, Aggregation::Mean), None);
    }

    #[test]
    fn table_infers_column_types() {
        let series = two_columns().with_column("state", ["ok", "warn"]).unwrap();
        let block = to_table_response("t", &series).unwrap();
        assert_eq!(
            serde_json::to_value(&block).unwrap(),
            json!({
                "columns": [
                    {"text": "Time", "type": "time"},
                    {"text": "min", "type": "number"},
                    {"text": "max", "type": "number"},
                    {"text": "state", "type": "string"}
                ],
                "rows": [
                    [1000, 1.0, 5.0, "ok"],
                    [2000, 2.0, null, "warn"]
                ],
                "type": "table"
            })
        );
    }

    #[test]
    fn annotations_from_title_text_tags() {
        let events = TimeSeries::new(vec![at(1_000), at(2_000)])
            .with_column("title", ["deploy", "rollback"])
            .unwrap()
            .with_column("text", ["v1.2", "v1.1"])
            .unwrap()
            .with_column("tags", ["release", "incident"])
            .unwrap();
        let out = to_annotation_response("stor:event", &events);
        assert_eq!(
            serde_json::to_value(&out).unwrap(),
            json!([
                {"annotation": "stor:event", "time": 1000, "title": "deploy", "text": "v1.2", "tags": "release"},
                {"annotation": "stor:event", "time": 2000, "title": "rollback", "text": "v1.1", "tags": "incident"}
            ])
        );
    }

    #[test]
    fn single_column_becomes_title() {
        let events = TimeSeries::new(vec![at(0)])
            .with_column("whatever", ["midnight"])
            .unwrap();
        let out = to_annotation_response("demo:midnights", &events);
        assert_eq!(out[0].title, "midnight");
        assert_eq!(out[0].text, None);
        assert_eq!(out[0].tags, None);
    }

    #[test]
    fn missing_title_column_defaults_to_empty() {
        let events = TimeSeries::new(vec![at(0)])
            .with_column("text", ["a"])
            .unwrap()
            .with_column("severity", [3.0])
            .unwrap();
        let out = to_annotation_response("q:x", &events);
        assert_eq!(out[0].title, "");
        assert_eq!(out[0].text.as_deref(), Some("a"));
    }
}
