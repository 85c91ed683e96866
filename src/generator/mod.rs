//! Code Generator - turns a prompt into scene source code.
//!
//! The generator makes exactly one model call per `generate` (two when the
//! review pass is enabled) and never retries; retry policy belongs to the
//! repair loop.

mod llm_generator;
mod scripted;

use async_trait::async_trait;
use thiserror::Error;

pub use llm_generator::{GeneratorConfig, LlmCodeGenerator};
pub use scripted::ScriptedGenerator;

/// Why the generator could not produce source code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationFailure {
    /// Service unreachable, authentication, quota or API error
    #[error("generation service failed: {0}")]
    Service(String),

    /// The model answered with nothing usable
    #[error("model returned an empty response")]
    EmptyResponse,

    /// The service withheld the answer (safety or recitation filter)
    #[error("model reply was blocked by the service")]
    Blocked,

    /// The reply does not declare the expected scene class
    #[error("generated code does not define class {class}")]
    MissingSceneClass { class: String },
}

/// Produces candidate source code for a prompt.
#[async_trait]
pub trait CodeGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationFailure>;
}
