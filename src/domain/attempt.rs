//! One generate -> render cycle within a repair loop run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How an attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// Rendered; produced an artifact
    Success,
    /// The renderer rejected the generated code
    RenderError,
    /// The generator could not produce code
    GenerationError,
}

impl AttemptOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptOutcome::Success => "success",
            AttemptOutcome::RenderError => "render_error",
            AttemptOutcome::GenerationError => "generation_error",
        }
    }
}

/// Record of a single attempt, appended by the repair loop in attempt order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attempt {
    /// 1-based attempt index
    pub index: u32,
    /// Prompt handed to the generator for this attempt
    pub prompt: String,
    /// Generated source (empty when generation failed)
    pub source_code: String,
    pub outcome: AttemptOutcome,
    /// Render transcript or generation failure message
    pub error_text: Option<String>,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl Attempt {
    pub fn succeeded(index: u32, prompt: String, source_code: String, started_at: DateTime<Utc>) -> Self {
        Self {
            index,
            prompt,
            source_code,
            outcome: AttemptOutcome::Success,
            error_text: None,
            started_at,
            duration_ms: elapsed_ms(started_at),
        }
    }

    pub fn render_failed(
        index: u32,
        prompt: String,
        source_code: String,
        transcript: String,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            index,
            prompt,
            source_code,
            outcome: AttemptOutcome::RenderError,
            error_text: Some(transcript),
            started_at,
            duration_ms: elapsed_ms(started_at),
        }
    }

    pub fn generation_failed(index: u32, prompt: String, message: String, started_at: DateTime<Utc>) -> Self {
        Self {
            index,
            prompt,
            source_code: String::new(),
            outcome: AttemptOutcome::GenerationError,
            error_text: Some(message),
            started_at,
            duration_ms: elapsed_ms(started_at),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == AttemptOutcome::Success
    }
}

fn elapsed_ms(started_at: DateTime<Utc>) -> u64 {
    (Utc::now() - started_at).num_milliseconds().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attempt_outcome_as_str() {
        assert_eq!(AttemptOutcome::Success.as_str(), "success");
        assert_eq!(AttemptOutcome::RenderError.as_str(), "render_error");
        assert_eq!(AttemptOutcome::GenerationError.as_str(), "generation_error");
    }

    #[test]
    fn test_render_failed_keeps_transcript() {
        let attempt = Attempt::render_failed(
            2,
            "prompt".to_string(),
            "class AlgorithmAnimation: pass".to_string(),
            "NameError: x undefined".to_string(),
            Utc::now(),
        );
        assert_eq!(attempt.index, 2);
        assert!(!attempt.is_success());
        assert_eq!(attempt.error_text.as_deref(), Some("NameError: x undefined"));
    }

    #[test]
    fn test_generation_failed_has_no_source() {
        let attempt = Attempt::generation_failed(1, "prompt".to_string(), "quota".to_string(), Utc::now());
        assert_eq!(attempt.outcome, AttemptOutcome::GenerationError);
        assert!(attempt.source_code.is_empty());
    }

    #[test]
    fn test_succeeded_has_no_error() {
        let attempt = Attempt::succeeded(1, "p".to_string(), "code".to_string(), Utc::now());
        assert!(attempt.is_success());
        assert!(attempt.error_text.is_none());
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_string(&AttemptOutcome::RenderError).unwrap();
        assert_eq!(json, "\"render_error\"");
    }
}
