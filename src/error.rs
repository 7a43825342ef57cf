//! Error types for Tourcast Survey

use crate::types::AnswerField;
use thiserror::Error;

/// Errors that can occur while encoding answers or decoding predictions
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Failed to parse survey payload: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid survey envelope: {0}")]
    InvalidEnvelope(String),

    #[error("Unknown label for {field}: \"{label}\"")]
    UnknownLabel { field: AnswerField, label: String },

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Decoding error: {0}")]
    DecodingError(String),
}
