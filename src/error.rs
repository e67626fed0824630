//! Error types for the repform engine
//!
//! Scoring itself never fails: bad frames degrade to "not valid this
//! frame". Errors exist only at the parsing, encoding, and FFI boundaries.

use thiserror::Error;

/// Errors that can occur at the engine boundary
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Failed to parse frame payload: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Frame failed schema validation: {0}")]
    SchemaError(#[from] crate::schema::ValidationError),

    #[error("Unsupported exercise: {0}")]
    UnsupportedExercise(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}
