//! In-memory failure recorder.

use std::sync::Mutex;

use async_trait::async_trait;

use super::{FailureRecord, FailureRecorder};
use crate::error::{AlgovizError, Result};

/// Keeps every record in memory. Can be told to fail, to exercise callers'
/// error paths.
#[derive(Default)]
pub struct MemoryRecorder {
    records: Mutex<Vec<FailureRecord>>,
    fail: bool,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A recorder whose every write fails
    pub fn failing() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn records(&self) -> Vec<FailureRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl FailureRecorder for MemoryRecorder {
    async fn record_failure(&self, record: &FailureRecord) -> Result<()> {
        if self.fail {
            return Err(AlgovizError::Storage("recorder unavailable".to_string()));
        }
        self.records
            .lock()
            .map_err(|e| AlgovizError::Storage(e.to_string()))?
            .push(record.clone());
        Ok(())
    }
}
