//! JSONL failure log.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{FailureRecord, FailureRecorder};
use crate::error::{AlgovizError, Result};

const LOG_FILE: &str = "failures.jsonl";

/// Appends one JSON line per failed attempt to `<dir>/failures.jsonl`.
pub struct JsonlFailureLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlFailureLog {
    /// Create a log in `dir`, creating the directory if needed.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        Ok(Self {
            path: dir.join(LOG_FILE),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, record: &FailureRecord) -> Result<()> {
        let _guard = self.write_lock.lock().map_err(|e| AlgovizError::Storage(e.to_string()))?;
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{}", serde_json::to_string(record)?)?;
        Ok(())
    }

    /// Read every record in the log, oldest first.
    pub fn read_all(&self) -> Result<Vec<FailureRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(&self.path)?);
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if !line.trim().is_empty() {
                records.push(serde_json::from_str(&line)?);
            }
        }
        Ok(records)
    }

    /// Records belonging to one session.
    pub fn session(&self, session_id: &str) -> Result<Vec<FailureRecord>> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|r| r.session_id == session_id)
            .collect())
    }
}

#[async_trait]
impl FailureRecorder for JsonlFailureLog {
    async fn record_failure(&self, record: &FailureRecord) -> Result<()> {
        self.append(record)?;
        log::debug!(
            "Recorded failed attempt {} of session {} in {}",
            record.attempt,
            record.session_id,
            self.path.display()
        );
        Ok(())
    }
}
