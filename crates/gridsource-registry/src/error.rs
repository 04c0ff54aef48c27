//! Error types for source lookup and backend calls.

use gridsource_core::CoreError;
use thiserror::Error;

use crate::source::Capability;

pub type SourceResult<T> = Result<T, SourceError>;
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors raised by a backend while serving a call.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{0} is not supported by this source")]
    Unsupported(Capability),

    #[error(transparent)]
    Series(#[from] CoreError),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Errors surfaced by registry dispatch.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("no {capability} registered for source {name:?}")]
    UnknownSource { name: String, capability: Capability },

    #[error("source {name:?} failed: {error}")]
    Backend {
        name: String,
        #[source]
        error: SourceError,
    },
}
