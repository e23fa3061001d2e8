//! Error types shared by the normalizer, translator, and aggregator.
use thiserror::Error;

/// A package description could not be turned into a canonical record.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("cannot normalize package {package}: {reason}")]
pub struct NormalizeError {
    /// Package name when known, otherwise `<unnamed>`.
    pub package: String,
    pub reason: String,
}

impl NormalizeError {
    pub fn new(package: Option<&str>, reason: impl Into<String>) -> Self {
        Self {
            package: package.unwrap_or("<unnamed>").to_string(),
            reason: reason.into(),
        }
    }
}

/// A quasi-CPE string was rejected by the translator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid quasi-CPE {quasi_cpe:?}: {reason}")]
pub struct TranslateError {
    pub quasi_cpe: String,
    pub reason: String,
}

impl TranslateError {
    pub fn new(quasi_cpe: &str, reason: impl Into<String>) -> Self {
        Self {
            quasi_cpe: quasi_cpe.to_string(),
            reason: reason.into(),
        }
    }
}

/// Failure of a whole pattern-building run.
#[derive(Debug, Error)]
pub enum PatternError {
    /// The top-level payload was neither a list nor a single package record.
    #[error("expected a list of packages or a package record, got {kind}")]
    InvalidPayloadShape { kind: &'static str },

    /// The payload text is not valid JSON.
    #[error("malformed payload: {0}")]
    MalformedInput(#[from] serde_json::Error),

    #[error(transparent)]
    Normalization(#[from] NormalizeError),

    #[error(transparent)]
    Translation(#[from] TranslateError),
}
