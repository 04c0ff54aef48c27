//! Errors raised while decoding wire values.

use thiserror::Error;

pub type ProtocolResult<T> = Result<T, ProtocolError>;

#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    #[error("malformed timestamp {value:?}: expected {expected}")]
    MalformedTimestamp { value: String, expected: &'static str },
}
