//! Failure log - durable record of every failed attempt.
//!
//! The repair loop hands each failed attempt to a `FailureRecorder` before it
//! builds the next prompt. `JsonlFailureLog` appends one JSON object per line;
//! `MemoryRecorder` keeps records in memory for tests.

mod jsonl;
mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::{Attempt, AttemptOutcome};
use crate::error::Result;

pub use jsonl::JsonlFailureLog;
pub use memory::MemoryRecorder;

/// One failed attempt as written to the failure log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub session_id: String,
    pub attempt: u32,
    pub outcome: AttemptOutcome,
    pub timestamp: DateTime<Utc>,
    /// Hex SHA-256 of `source_code`, for spotting repeated identical drafts
    pub source_sha256: String,
    pub source_code: String,
    pub transcript: String,
}

impl FailureRecord {
    pub fn new(
        session_id: impl Into<String>,
        attempt: u32,
        outcome: AttemptOutcome,
        source_code: impl Into<String>,
        transcript: impl Into<String>,
    ) -> Self {
        let source_code = source_code.into();
        Self {
            session_id: session_id.into(),
            attempt,
            outcome,
            timestamp: Utc::now(),
            source_sha256: source_digest(&source_code),
            source_code,
            transcript: transcript.into(),
        }
    }

    /// Build a record from a failed attempt; `None` for a successful one.
    pub fn from_attempt(session_id: &str, attempt: &Attempt) -> Option<Self> {
        if attempt.is_success() {
            return None;
        }
        Some(Self::new(
            session_id,
            attempt.index,
            attempt.outcome,
            attempt.source_code.clone(),
            attempt.error_text.clone().unwrap_or_default(),
        ))
    }
}

pub fn source_digest(source: &str) -> String {
    hex::encode(Sha256::digest(source.as_bytes()))
}

/// Receives failed attempts as they happen.
#[async_trait]
pub trait FailureRecorder: Send + Sync {
    async fn record_failure(&self, record: &FailureRecord) -> Result<()>;
}
