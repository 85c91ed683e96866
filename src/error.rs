//! Error types for algoviz
//!
//! Centralized error handling using thiserror. Generation and render failures
//! are part of the repair loop's data model and live next to their components
//! (`generator::GenerationFailure`, `render::RenderFailure`).

use thiserror::Error;

/// Errors that escape the library to the caller
#[derive(Debug, Error)]
pub enum AlgovizError {
    /// Contract violation detected at call time (e.g. max_attempts < 1)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Prompt template could not be loaded or rendered
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// LLM API error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Failure log persistence error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Visual metaphor could not be produced
    #[error("Design error: {0}")]
    Design(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for algoviz operations
pub type Result<T> = std::result::Result<T, AlgovizError>;
