//! Manim renderer
//! Spawns the engine in the workspace and captures its output as the transcript

use std::path::PathBuf;
use std::process::{Output, Stdio};

use async_trait::async_trait;
use tokio::process::Command;

use super::{RenderFailure, RenderWorkspace, Renderer};

/// Configuration for the Manim subprocess
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManimConfig {
    /// Executable to run (default: manim)
    pub program: String,
    /// Arguments placed before the quality flag, e.g. `-m manim` for a python launcher
    pub program_args: Vec<String>,
    /// Quality flag for the first render (default: -qm)
    pub quality_flag: String,
    /// Lower quality flag tried once when the first render fails
    pub fallback_quality_flag: Option<String>,
    /// Timeout in milliseconds (default: 600000)
    pub timeout_ms: u64,
}

impl Default for ManimConfig {
    fn default() -> Self {
        Self {
            program: "manim".to_string(),
            program_args: Vec::new(),
            quality_flag: "-qm".to_string(),
            fallback_quality_flag: None,
            timeout_ms: 600_000,
        }
    }
}

impl ManimConfig {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.program_args.push(arg.into());
        self
    }

    pub fn quality(mut self, flag: impl Into<String>) -> Self {
        self.quality_flag = flag.into();
        self
    }

    pub fn fallback_quality(mut self, flag: impl Into<String>) -> Self {
        self.fallback_quality_flag = Some(flag.into());
        self
    }

    /// Set the timeout in milliseconds
    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = ms;
        self
    }
}

/// Renderer that runs `<program> <quality> <source> <SceneClass>` in the workspace
pub struct ManimRenderer {
    config: ManimConfig,
}

impl ManimRenderer {
    pub fn new(config: ManimConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ManimConfig {
        &self.config
    }

    async fn execute(&self, quality_flag: &str, workspace: &RenderWorkspace) -> Result<(), RenderFailure> {
        let mut cmd = Command::new(&self.config.program);
        cmd.args(&self.config.program_args)
            .arg(quality_flag)
            .arg(workspace.source_file())
            .arg(workspace.scene_class())
            .current_dir(workspace.root());

        for (key, value) in workspace.env() {
            cmd.env(key, value);
        }

        // Dropping the child on timeout kills the engine
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        log::debug!(
            "Running {} {} {} {}",
            self.config.program,
            quality_flag,
            workspace.source_file(),
            workspace.scene_class()
        );

        let child = cmd
            .spawn()
            .map_err(|e| RenderFailure::new(format!("failed to start {}: {}", self.config.program, e)))?;

        let timeout = tokio::time::Duration::from_millis(self.config.timeout_ms);
        match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) if output.status.success() => Ok(()),
            Ok(Ok(output)) => Err(RenderFailure::new(self.transcript(&output))),
            Ok(Err(e)) => Err(RenderFailure::new(format!(
                "failed waiting for {}: {}",
                self.config.program, e
            ))),
            Err(_) => Err(RenderFailure::timed_out(self.config.timeout_ms)),
        }
    }

    /// stderr first, then stdout; the exit status when the engine printed nothing
    fn transcript(&self, output: &Output) -> String {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);

        let parts: Vec<&str> = [stderr.trim(), stdout.trim()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect();

        if parts.is_empty() {
            format!("{} exited with {}", self.config.program, output.status)
        } else {
            parts.join("\n")
        }
    }
}

impl Default for ManimRenderer {
    fn default() -> Self {
        Self::new(ManimConfig::default())
    }
}

#[async_trait]
impl Renderer for ManimRenderer {
    async fn render(&self, source: &str, workspace: &RenderWorkspace) -> Result<PathBuf, RenderFailure> {
        workspace
            .prepare(source)
            .map_err(|e| RenderFailure::new(format!("could not prepare workspace: {}", e)))?;

        let mut result = self.execute(&self.config.quality_flag, workspace).await;

        let retry_with = match (&result, &self.config.fallback_quality_flag) {
            (Err(first), Some(fallback)) if !first.timed_out => Some(fallback),
            _ => None,
        };

        if let Some(fallback) = retry_with {
            log::warn!(
                "Render at {} failed, retrying at {}",
                self.config.quality_flag,
                fallback
            );
            workspace
                .clear_outputs()
                .map_err(|e| RenderFailure::new(format!("could not clear outputs: {}", e)))?;
            result = self.execute(fallback, workspace).await;
        }
        result?;

        workspace.find_artifact().ok_or_else(|| {
            RenderFailure::new(format!(
                "{} finished but no {}.mp4 was found under {}",
                self.config.program,
                workspace.scene_class(),
                workspace.videos_dir().display()
            ))
        })
    }

    fn name(&self) -> &str {
        &self.config.program
    }
}
