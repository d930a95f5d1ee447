//! Error kinds for a noise sweep.
//!
//! Every variant is fatal for the run: nothing here is retried or
//! downgraded to a warning.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NoiseError {
    /// Schedule kind other than `linear`.
    #[error("unsupported noise schedule kind '{kind}' (only 'linear' is supported)")]
    UnsupportedScheduleKind { kind: String },

    /// Persisted weights do not fit the live model.
    #[error("incompatible architecture: {0}")]
    IncompatibleArchitecture(String),

    /// A condition that only a bug can produce.
    #[error("internal invariant violated: {0}")]
    InternalInvariantViolation(String),

    #[error("dataset unavailable at {}: {reason}", path.display())]
    DatasetUnavailable { path: PathBuf, reason: String },

    #[error("weights unavailable at {}: {reason}", path.display())]
    WeightsUnavailable { path: PathBuf, reason: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("render {}: {reason}", path.display())]
    Render { path: PathBuf, reason: String },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, NoiseError>;

impl NoiseError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn dataset(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::DatasetUnavailable {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
