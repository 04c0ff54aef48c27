//! gridsource-protocol: the dashboard datasource wire protocol.
//!
//! Request and response shapes for the JSON endpoints, plus the pure
//! conversion functions that turn reader results into those shapes.
//!
//! ```text
//! RawRange ──parse_wire_range()──► TimeRange
//! TimeSeries ──to_timeserie_response()──► [{target, datapoints}]
//!            ──to_table_response()──────► {columns, rows, type: "table"}
//!            ──to_annotation_response()─► [{annotation, time, title, ...}]
//! ```

pub mod convert;
pub mod error;
pub mod range;
pub mod wire;

pub use convert::{MAX_SAMPLING_INTERVAL, Sampling, to_annotation_response, to_table_response, to_timeserie_response};
pub use error::{ProtocolError, ProtocolResult};
pub use range::{RangeUnit, parse_instant, parse_wire_range};
pub use wire::*;
