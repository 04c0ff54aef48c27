//! Time-indexed result tables.
//!
//! A [`TimeSeries`] is what every reader hands back: a UTC time index and
//! one or more named value columns, each holding exactly one [`Value`] per
//! index entry. The index order is whatever the backend produced; nothing
//! here sorts or dedupes it.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{CoreError, CoreResult};
use crate::range::TimeRange;

/// A single cell of a result table.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Number(f64),
    Text(String),
}

impl Value {
    /// Null cells and NaN numbers are treated as missing data.
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Number(n) => n.is_nan(),
            Value::Text(_) => false,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) if !n.is_nan() => Some(*n),
            _ => None,
        }
    }

    /// Render the cell as text; missing cells become the empty string.
    pub fn to_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Number(n) if n.is_nan() => String::new(),
            Value::Number(n) => n.to_string(),
            Value::Text(s) => s.clone(),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Number(n) if n.is_finite() => serializer.serialize_f64(*n),
            Value::Number(_) | Value::Null => serializer.serialize_none(),
            Value::Text(s) => serializer.serialize_str(s),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<Option<f64>> for Value {
    fn from(n: Option<f64>) -> Self {
        n.map_or(Value::Null, Value::Number)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

/// A named value column.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

impl Column {
    /// True when every non-missing cell is a number (vacuously true for
    /// all-missing columns).
    pub fn is_numeric(&self) -> bool {
        self.values
            .iter()
            .filter(|v| !v.is_missing())
            .all(|v| matches!(v, Value::Number(_)))
    }
}

/// How values falling into the same resampling bucket are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    #[default]
    Mean,
    Sum,
    Min,
    Max,
    Last,
}

impl Aggregation {
    fn apply(self, samples: &[f64]) -> Value {
        if samples.is_empty() {
            return Value::Null;
        }
        let n = match self {
            Aggregation::Mean => samples.iter().sum::<f64>() / samples.len() as f64,
            Aggregation::Sum => samples.iter().sum(),
            Aggregation::Min => samples.iter().copied().fold(f64::INFINITY, f64::min),
            Aggregation::Max => samples.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Aggregation::Last => samples[samples.len() - 1],
        };
        Value::Number(n)
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Aggregation::Mean => "mean",
            Aggregation::Sum => "sum",
            Aggregation::Min => "min",
            Aggregation::Max => "max",
            Aggregation::Last => "last",
        };
        f.write_str(name)
    }
}

/// Time-indexed table with one or more named value columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeries {
    index: Vec<DateTime<Utc>>,
    columns: Vec<Column>,
}

impl TimeSeries {
    /// Start a table over `index` with no columns yet.
    pub fn new(index: Vec<DateTime<Utc>>) -> Self {
        Self {
            index,
            columns: Vec::new(),
        }
    }

    /// Append a column. Fails if its length differs from the index.
    pub fn with_column<V: Into<Value>>(
        mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> CoreResult<Self> {
        let name = name.into();
        let values: Vec<Value> = values.into_iter().map(Into::into).collect();
        if values.len() != self.index.len() {
            return Err(CoreError::MalformedSeries {
                column: name,
                expected: self.index.len(),
                actual: values.len(),
            });
        }
        self.columns.push(Column { name, values });
        Ok(self)
    }

    /// Single-column table from `(timestamp, value)` pairs.
    pub fn from_points(
        name: impl Into<String>,
        points: impl IntoIterator<Item = (DateTime<Utc>, f64)>,
    ) -> Self {
        let (index, values): (Vec<_>, Vec<_>) = points.into_iter().unzip();
        Self {
            index,
            columns: vec![Column {
                name: name.into(),
                values: values.into_iter().map(Value::Number).collect(),
            }],
        }
    }

    pub fn index(&self) -> &[DateTime<Utc>] {
        &self.index
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// A table with no rows or no columns carries no data.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty() || self.columns.is_empty()
    }

    /// Rename a column in place. Returns `false` if `from` does not exist.
    pub fn rename_column(&mut self, from: &str, to: impl Into<String>) -> bool {
        match self.columns.iter_mut().find(|c| c.name == from) {
            Some(column) => {
                column.name = to.into();
                true
            }
            None => false,
        }
    }

    /// Keep only the rows whose timestamp lies inside `range`.
    pub fn slice(&self, range: &TimeRange) -> Self {
        let keep: Vec<usize> = (0..self.index.len())
            .filter(|&i| range.contains(self.index[i]))
            .collect();
        Self {
            index: keep.iter().map(|&i| self.index[i]).collect(),
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    values: keep.iter().map(|&i| c.values[i].clone()).collect(),
                })
                .collect(),
        }
    }

    /// Resample into fixed-width buckets aligned to the Unix epoch.
    ///
    /// Buckets are closed and labelled on the right: a bucket labelled `t`
    /// holds points in `(t - interval, t]`. Only numeric cells are
    /// aggregated; buckets without any produce a null cell. A zero
    /// interval returns the table unchanged.
    pub fn resample(&self, interval: Duration, aggregation: Aggregation) -> Self {
        let width = interval.as_millis() as i64;
        if width <= 0 || self.is_empty() {
            return self.clone();
        }

        // bucket label (ms) -> per-column samples
        let mut buckets: BTreeMap<i64, Vec<Vec<f64>>> = BTreeMap::new();
        for (row, ts) in self.index.iter().enumerate() {
            let ms = ts.timestamp_millis();
            let label = if ms.rem_euclid(width) == 0 {
                ms
            } else {
                (ms.div_euclid(width) + 1) * width
            };
            let slots = buckets
                .entry(label)
                .or_insert_with(|| vec![Vec::new(); self.columns.len()]);
            for (slot, column) in slots.iter_mut().zip(&self.columns) {
                if let Some(n) = column.values[row].as_f64() {
                    slot.push(n);
                }
            }
        }

        // Labels past chrono's range drop the whole bucket, index and values alike.
        let (index, rows): (Vec<DateTime<Utc>>, Vec<Vec<Vec<f64>>>) = buckets
            .into_iter()
            .filter_map(|(ms, slots)| Some((DateTime::from_timestamp_millis(ms)?, slots)))
            .unzip();
        let columns = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| Column {
                name: c.name.clone(),
                values: rows.iter().map(|slots| aggregation.apply(&slots[i])).collect(),
            })
            .collect();

        Self { index, columns }
    }
}
