//! Scripted renderer for tests and dry runs

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{RenderFailure, RenderWorkspace, Renderer};

/// Replays a queue of outcomes: `Ok(())` succeeds, `Err(transcript)` fails.
///
/// The source is still written to the workspace so callers can inspect it.
/// Once the queue is empty every render fails.
pub struct ScriptedRenderer {
    outcomes: Mutex<VecDeque<Result<(), RenderFailure>>>,
    sources: Mutex<Vec<String>>,
}

impl ScriptedRenderer {
    pub fn new(outcomes: impl IntoIterator<Item = Result<(), String>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into_iter().map(|o| o.map_err(RenderFailure::new)).collect()),
            sources: Mutex::new(Vec::new()),
        }
    }

    pub fn succeeding() -> Self {
        Self::new(std::iter::repeat_n(Ok(()), 64))
    }

    /// Fails with each transcript in turn, then succeeds
    pub fn failing_then_succeeding<S: Into<String>>(transcripts: impl IntoIterator<Item = S>) -> Self {
        Self::with_failures(transcripts.into_iter().map(RenderFailure::new))
    }

    /// Returns each failure in turn, then succeeds
    pub fn with_failures(failures: impl IntoIterator<Item = RenderFailure>) -> Self {
        let outcomes = failures
            .into_iter()
            .map(Err)
            .chain(std::iter::once(Ok(())))
            .collect();
        Self {
            outcomes: Mutex::new(outcomes),
            sources: Mutex::new(Vec::new()),
        }
    }

    pub fn always_failing(transcript: impl Into<String>) -> Self {
        let transcript = transcript.into();
        Self::new(std::iter::repeat_n(Err(transcript), 64))
    }

    /// Sources received so far, in order
    pub fn sources(&self) -> Vec<String> {
        self.sources.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.sources.lock().map(|s| s.len()).unwrap_or(0)
    }
}

#[async_trait]
impl Renderer for ScriptedRenderer {
    async fn render(&self, source: &str, workspace: &RenderWorkspace) -> Result<PathBuf, RenderFailure> {
        if let Ok(mut sources) = self.sources.lock() {
            sources.push(source.to_string());
        }

        workspace
            .prepare(source)
            .map_err(|e| RenderFailure::new(format!("could not prepare workspace: {}", e)))?;

        let next = self.outcomes.lock().ok().and_then(|mut q| q.pop_front());
        match next {
            Some(Ok(())) => Ok(workspace
                .videos_dir()
                .join("scripted")
                .join(format!("{}.mp4", workspace.scene_class()))),
            Some(Err(failure)) => Err(failure),
            None => Err(RenderFailure::new("no scripted render outcome left")),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
