//! Stage failure taxonomy.

use sentiment_model::dataset::DatasetError;
use sentiment_pipeline_core::contract::ValidationError;

/// Fatal stage failures. Stages raise on the first fatal condition; the
/// runtime boundary reports the message and never crashes the host.
#[derive(Debug)]
pub enum StageError {
    /// Download or upload failure: network, missing remote object,
    /// permission. Safe to re-invoke thanks to the idempotency checks.
    Transfer(String),
    /// Malformed or missing dataset content.
    Data(String),
    /// Model/vectorizer artifact unreadable or incompatible.
    Deserialize(String),
    /// Request parameters failed validation.
    Config(String),
}

impl std::fmt::Display for StageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StageError::Transfer(message) => write!(f, "transfer error: {message}"),
            StageError::Data(message) => write!(f, "data error: {message}"),
            StageError::Deserialize(message) => write!(f, "deserialization error: {message}"),
            StageError::Config(message) => write!(f, "invalid request: {message}"),
        }
    }
}

impl std::error::Error for StageError {}

impl From<ValidationError> for StageError {
    fn from(error: ValidationError) -> Self {
        StageError::Config(error.message().to_string())
    }
}

impl From<DatasetError> for StageError {
    fn from(error: DatasetError) -> Self {
        StageError::Data(error.to_string())
    }
}
