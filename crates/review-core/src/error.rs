//! Error types.
//!
//! Anchor and layout failures are not errors: they degrade to stale insights and skipped
//! overlays. Only collaborator failures (analyzer, store) and configuration problems surface
//! as `Err`.

use thiserror::Error;

/// Failure reported by an external analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalyzerError {
    /// The analyzer ran but could not produce insights.
    #[error("analysis failed: {0}")]
    Failed(String),
    /// The analyzer could not be reached.
    #[error("analyzer unavailable: {0}")]
    Unavailable(String),
    /// The analyzer gave up waiting.
    #[error("analysis timed out")]
    TimedOut,
}

/// Failure reading or writing the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A stored value could not be decoded.
    #[error("corrupt value under '{key}': {source}")]
    Corrupt {
        /// Key holding the bad value.
        key: String,
        /// Decoder error.
        #[source]
        source: serde_json::Error,
    },
    /// A value could not be encoded for storage.
    #[error("cannot encode value for '{key}': {source}")]
    Encode {
        /// Target key.
        key: String,
        /// Encoder error.
        #[source]
        source: serde_json::Error,
    },
    /// Backend-specific failure.
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Configuration loading failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Figment extraction or merge error.
    #[error("configuration error: {0}")]
    Figment(#[from] Box<figment::Error>),
    /// A value is out of range.
    #[error("invalid configuration value for '{field}': {reason}")]
    InvalidValue {
        /// Offending field.
        field: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl From<figment::Error> for ConfigError {
    fn from(error: figment::Error) -> Self {
        Self::Figment(Box::new(error))
    }
}

/// Umbrella error for review surface operations.
#[derive(Debug, Error)]
pub enum ReviewError {
    /// Analyzer failure.
    #[error(transparent)]
    Analyzer(#[from] AnalyzerError),
    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Configuration failure.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The requested document does not exist.
    #[error("document '{0}' not found")]
    DocumentNotFound(String),
}

/// Result alias for review operations.
pub type Result<T, E = ReviewError> = std::result::Result<T, E>;
