//! Repair loop result types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::attempt::{Attempt, AttemptOutcome};

/// Terminal outcome of a repair loop run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalOutcome {
    /// The renderer produced an artifact
    Succeeded,
    /// The loop stopped without an artifact
    ExhaustedRetries,
}

/// Produced exactly once when the repair loop terminates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopResult {
    pub final_outcome: FinalOutcome,
    pub attempts: Vec<Attempt>,
    /// Present iff `final_outcome == Succeeded`
    pub artifact_path: Option<PathBuf>,
}

impl LoopResult {
    pub fn succeeded(attempts: Vec<Attempt>, artifact_path: PathBuf) -> Self {
        Self {
            final_outcome: FinalOutcome::Succeeded,
            attempts,
            artifact_path: Some(artifact_path),
        }
    }

    pub fn exhausted(attempts: Vec<Attempt>) -> Self {
        Self {
            final_outcome: FinalOutcome::ExhaustedRetries,
            attempts,
            artifact_path: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.final_outcome == FinalOutcome::Succeeded
    }

    /// True when the loop stopped because the generator failed, not because
    /// every render attempt was used up.
    pub fn stopped_by_generation_failure(&self) -> bool {
        self.attempts
            .last()
            .is_some_and(|a| a.outcome == AttemptOutcome::GenerationError)
    }

    /// Error text of the last attempt, if it failed.
    pub fn last_error(&self) -> Option<&str> {
        self.attempts.last().and_then(|a| a.error_text.as_deref())
    }

    /// Source code of the last attempt that produced any.
    pub fn last_source(&self) -> Option<&str> {
        self.attempts
            .iter()
            .rev()
            .find(|a| !a.source_code.is_empty())
            .map(|a| a.source_code.as_str())
    }
}
