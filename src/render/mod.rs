//! Renderer - runs the animation engine against generated source.
//!
//! Two implementations share the `Renderer` trait: `ManimRenderer` spawns the
//! real engine as a subprocess, `ScriptedRenderer` replays canned outcomes so
//! the repair loop can be tested without it.

mod manim;
mod scripted;
mod workspace;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;

pub use manim::{ManimConfig, ManimRenderer};
pub use scripted::ScriptedRenderer;
pub use workspace::RenderWorkspace;

/// Transcript used when a render exceeds its time limit
pub const TIMEOUT_TRANSCRIPT: &str = "render timed out";

/// A failed render and everything the engine printed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("render failed: {transcript}")]
pub struct RenderFailure {
    pub transcript: String,
    pub timed_out: bool,
}

impl RenderFailure {
    pub fn new(transcript: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            timed_out: false,
        }
    }

    pub fn timed_out(limit_ms: u64) -> Self {
        Self {
            transcript: format!("{} after {}ms", TIMEOUT_TRANSCRIPT, limit_ms),
            timed_out: true,
        }
    }
}

/// Renders source code inside a workspace, returning the produced artifact.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, source: &str, workspace: &RenderWorkspace) -> Result<PathBuf, RenderFailure>;

    /// Short name for logs
    fn name(&self) -> &str {
        "renderer"
    }
}

/// Display helper for artifact paths in reports
pub fn display_artifact(path: &Path) -> String {
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}
