//! Repair loop - generate, render, and feed render errors back until the
//! renderer accepts the code or the attempt budget runs out.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::{Attempt, GenerationRequest, LoopResult};
use crate::error::{AlgovizError, Result};
use crate::generator::CodeGenerator;
use crate::id::generate_session_id;
use crate::prompt::PromptBuilder;
use crate::render::{RenderWorkspace, Renderer};
use crate::storage::{FailureRecord, FailureRecorder};

/// Attempts per run unless configured otherwise
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Where a run currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopState {
    /// Building the prompt for attempt `attempt`
    Building { attempt: u32 },
    /// Waiting on the generator
    Generating {
        attempt: u32,
        prompt: String,
        started_at: DateTime<Utc>,
    },
    /// Waiting on the renderer
    Rendering {
        attempt: u32,
        prompt: String,
        source: String,
        started_at: DateTime<Utc>,
    },
    Succeeded { artifact: PathBuf },
    Failed,
}

impl LoopState {
    pub fn name(&self) -> &'static str {
        match self {
            LoopState::Building { .. } => "building",
            LoopState::Generating { .. } => "generating",
            LoopState::Rendering { .. } => "rendering",
            LoopState::Succeeded { .. } => "succeeded",
            LoopState::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, LoopState::Succeeded { .. } | LoopState::Failed)
    }
}

type AttemptHook = Box<dyn Fn(&Attempt) + Send + Sync>;

/// Drives a generator and a renderer through the repair state machine.
///
/// Generation failures end the run immediately. Render failures are fed back
/// into the next prompt until `max_attempts` is reached. Every failed attempt
/// is handed to the recorder before the next prompt is built.
pub struct RepairLoop<G, R, F>
where
    G: CodeGenerator,
    R: Renderer,
    F: FailureRecorder,
{
    generator: Arc<G>,
    renderer: Arc<R>,
    recorder: Arc<F>,
    prompts: PromptBuilder,
    session_id: String,
    on_attempt: Option<AttemptHook>,
}

impl<G, R, F> RepairLoop<G, R, F>
where
    G: CodeGenerator,
    R: Renderer,
    F: FailureRecorder,
{
    pub fn new(generator: Arc<G>, renderer: Arc<R>, recorder: Arc<F>, prompts: PromptBuilder) -> Self {
        Self {
            generator,
            renderer,
            recorder,
            prompts,
            session_id: generate_session_id(),
            on_attempt: None,
        }
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    /// Called with every finished attempt, after it has been recorded
    pub fn on_attempt(mut self, hook: impl Fn(&Attempt) + Send + Sync + 'static) -> Self {
        self.on_attempt = Some(Box::new(hook));
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn prompts(&self) -> &PromptBuilder {
        &self.prompts
    }

    /// Run the loop for `request` in `workspace`.
    ///
    /// Returns `Err` only when the call itself is invalid: `max_attempts < 1`
    /// or a template that cannot render. Generation and render failures are
    /// reported through the returned `LoopResult`.
    pub async fn run(
        &self,
        request: &GenerationRequest,
        workspace: &RenderWorkspace,
        max_attempts: u32,
    ) -> Result<LoopResult> {
        if max_attempts < 1 {
            return Err(AlgovizError::InvalidConfig(format!(
                "max_attempts must be at least 1, got {}",
                max_attempts
            )));
        }

        let base_prompt = self.prompts.initial_prompt(request)?;
        let mut attempts: Vec<Attempt> = Vec::new();
        let mut state = LoopState::Building { attempt: 1 };

        tracing::info!(
            session = %self.session_id,
            algorithm = %request.algorithm_name,
            mode = %request.template_mode,
            max_attempts,
            renderer = self.renderer.name(),
            "Repair loop started"
        );

        loop {
            tracing::debug!(session = %self.session_id, state = state.name(), "Loop state");

            state = match state {
                LoopState::Building { attempt } => {
                    let prompt = match attempts.last() {
                        Some(previous) => PromptBuilder::repair_prompt(&base_prompt, previous),
                        None => base_prompt.clone(),
                    };
                    LoopState::Generating {
                        attempt,
                        prompt,
                        started_at: Utc::now(),
                    }
                }

                LoopState::Generating {
                    attempt,
                    prompt,
                    started_at,
                } => match self.generator.generate(&prompt).await {
                    Ok(source) => LoopState::Rendering {
                        attempt,
                        prompt,
                        source,
                        started_at,
                    },
                    Err(failure) => {
                        tracing::error!(
                            session = %self.session_id,
                            attempt,
                            error = %failure,
                            "Generation failed, stopping"
                        );
                        let failed = Attempt::generation_failed(attempt, prompt, failure.to_string(), started_at);
                        self.finish_attempt(failed, &mut attempts).await;
                        LoopState::Failed
                    }
                },

                LoopState::Rendering {
                    attempt,
                    prompt,
                    source,
                    started_at,
                } => match self.renderer.render(&source, workspace).await {
                    Ok(artifact) => {
                        tracing::info!(
                            session = %self.session_id,
                            attempt,
                            artifact = %artifact.display(),
                            "Render succeeded"
                        );
                        let done = Attempt::succeeded(attempt, prompt, source, started_at);
                        self.finish_attempt(done, &mut attempts).await;
                        LoopState::Succeeded { artifact }
                    }
                    Err(failure) => {
                        tracing::warn!(
                            session = %self.session_id,
                            attempt,
                            max_attempts,
                            timed_out = failure.timed_out,
                            "Render failed"
                        );
                        let failed = Attempt::render_failed(attempt, prompt, source, failure.transcript, started_at);
                        self.finish_attempt(failed, &mut attempts).await;

                        if attempt < max_attempts {
                            LoopState::Building { attempt: attempt + 1 }
                        } else {
                            LoopState::Failed
                        }
                    }
                },

                LoopState::Succeeded { artifact } => {
                    return Ok(LoopResult::succeeded(attempts, artifact));
                }

                LoopState::Failed => {
                    tracing::info!(
                        session = %self.session_id,
                        attempts = attempts.len(),
                        "Repair loop gave up"
                    );
                    return Ok(LoopResult::exhausted(attempts));
                }
            };
        }
    }

    /// Record a failed attempt, notify the hook, and append it to the history.
    async fn finish_attempt(&self, attempt: Attempt, attempts: &mut Vec<Attempt>) {
        if let Some(record) = FailureRecord::from_attempt(&self.session_id, &attempt) {
            if let Err(e) = self.recorder.record_failure(&record).await {
                tracing::warn!(
                    session = %self.session_id,
                    attempt = attempt.index,
                    error = %e,
                    "Could not record failed attempt"
                );
            }
        }

        if let Some(hook) = &self.on_attempt {
            hook(&attempt);
        }
        attempts.push(attempt);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AttemptOutcome, FinalOutcome};
    use crate::generator::{GenerationFailure, ScriptedGenerator};
    use crate::prompt::BaseClass;
    use crate::render::{RenderFailure, ScriptedRenderer, TIMEOUT_TRANSCRIPT};
    use crate::storage::MemoryRecorder;
    use serde_json::json;
    use std::sync::Mutex;
    use tempfile::TempDir;

    const SCENE: &str = "class AlgorithmAnimation(BaseAlgorithmScene):\n    pass";

    fn prompts() -> PromptBuilder {
        PromptBuilder::new(
            "Animate {{algorithm_name}} on {{user_input_data}}",
            "AlgorithmAnimation",
            BaseClass::new("base_algorithm_scene", "BaseAlgorithmScene", ""),
            BaseClass::new("simple_animation_scene", "SimpleAnimationScene", ""),
        )
    }

    fn request() -> GenerationRequest {
        GenerationRequest::new("Bubble Sort", json!([5, 1, 4]))
    }

    fn workspace(dir: &TempDir) -> RenderWorkspace {
        RenderWorkspace::new(dir.path(), "generated_algo_scene.py", "AlgorithmAnimation")
    }

    struct Harness {
        generator: Arc<ScriptedGenerator>,
        renderer: Arc<ScriptedRenderer>,
        recorder: Arc<MemoryRecorder>,
    }

    impl Harness {
        fn new(generator: ScriptedGenerator, renderer: ScriptedRenderer) -> Self {
            Self {
                generator: Arc::new(generator),
                renderer: Arc::new(renderer),
                recorder: Arc::new(MemoryRecorder::new()),
            }
        }

        fn with_recorder(mut self, recorder: MemoryRecorder) -> Self {
            self.recorder = Arc::new(recorder);
            self
        }

        fn repair_loop(&self) -> RepairLoop<ScriptedGenerator, ScriptedRenderer, MemoryRecorder> {
            RepairLoop::new(
                self.generator.clone(),
                self.renderer.clone(),
                self.recorder.clone(),
                prompts(),
            )
            .with_session_id("test-session")
        }
    }

    fn sources(n: usize) -> ScriptedGenerator {
        ScriptedGenerator::with_sources((1..=n).map(|i| format!("{}\n# v{}", SCENE, i)))
    }

    #[test]
    fn test_loop_state_names() {
        assert_eq!(LoopState::Building { attempt: 1 }.name(), "building");
        assert_eq!(LoopState::Failed.name(), "failed");
        assert!(LoopState::Failed.is_terminal());
        assert!(
            LoopState::Succeeded {
                artifact: PathBuf::from("a.mp4")
            }
            .is_terminal()
        );
        assert!(!LoopState::Building { attempt: 2 }.is_terminal());
    }

    #[tokio::test]
    async fn test_first_attempt_succeeds() {
        let dir = TempDir::new().unwrap();
        let harness = Harness::new(sources(1), ScriptedRenderer::succeeding());

        let result = harness.repair_loop().run(&request(), &workspace(&dir), 3).await.unwrap();

        assert_eq!(result.final_outcome, FinalOutcome::Succeeded);
        assert_eq!(result.attempts.len(), 1);
        assert_eq!(result.attempts[0].index, 1);
        assert_eq!(result.attempts[0].outcome, AttemptOutcome::Success);
        assert!(result.artifact_path.is_some());
        assert_eq!(harness.generator.prompts()[0], "Animate Bubble Sort on [5,1,4]");
        assert!(harness.recorder.is_empty());
    }

    #[tokio::test]
    async fn test_max_attempts_zero_is_rejected() {
        let dir = TempDir::new().unwrap();
        let harness = Harness::new(sources(1), ScriptedRenderer::succeeding());

        let err = harness.repair_loop().run(&request(), &workspace(&dir), 0).await.unwrap_err();
        assert!(matches!(err, AlgovizError::InvalidConfig(_)));
        assert_eq!(harness.generator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_render_error_then_success() {
        let dir = TempDir::new().unwrap();
        let harness = Harness::new(
            sources(2),
            ScriptedRenderer::failing_then_succeeding(["NameError: x undefined"]),
        );

        let result = harness.repair_loop().run(&request(), &workspace(&dir), 3).await.unwrap();

        assert!(result.is_success());
        assert_eq!(result.attempts.len(), 2);
        assert_eq!(result.attempts[0].outcome, AttemptOutcome::RenderError);
        assert_eq!(result.attempts[0].error_text.as_deref(), Some("NameError: x undefined"));
        assert_eq!(result.attempts[1].outcome, AttemptOutcome::Success);

        // Second prompt carries the first attempt's full source and transcript
        let prompts = harness.generator.prompts();
        assert!(prompts[1].starts_with(&prompts[0]));
        assert!(prompts[1].contains(&result.attempts[0].source_code));
        assert!(prompts[1].contains("NameError: x undefined"));
        assert_eq!(result.attempts[1].prompt, prompts[1]);
    }

    #[tokio::test]
    async fn test_timed_out_render_is_repaired() {
        let dir = TempDir::new().unwrap();
        let harness = Harness::new(sources(2), ScriptedRenderer::with_failures([RenderFailure::timed_out(1000)]));

        let result = harness.repair_loop().run(&request(), &workspace(&dir), 3).await.unwrap();

        assert_eq!(result.final_outcome, FinalOutcome::Succeeded);
        assert_eq!(result.attempts.len(), 2);
        assert_eq!(result.attempts[0].outcome, AttemptOutcome::RenderError);
        let transcript = result.attempts[0].error_text.as_deref().unwrap();
        assert!(transcript.starts_with(TIMEOUT_TRANSCRIPT));
        assert!(harness.generator.prompts()[1].contains(transcript));
    }

    #[tokio::test]
    async fn test_exhausts_after_max_attempts() {
        let dir = TempDir::new().unwrap();
        let harness = Harness::new(sources(5), ScriptedRenderer::always_failing("SyntaxError"));

        let result = harness.repair_loop().run(&request(), &workspace(&dir), 3).await.unwrap();

        assert_eq!(result.final_outcome, FinalOutcome::ExhaustedRetries);
        assert!(result.artifact_path.is_none());
        assert_eq!(result.attempts.len(), 3);
        assert!(result.attempts.iter().all(|a| a.outcome == AttemptOutcome::RenderError));
        assert!(!result.stopped_by_generation_failure());
        assert_eq!(harness.generator.call_count(), 3);
        assert_eq!(harness.renderer.call_count(), 3);
    }

    #[tokio::test]
    async fn test_attempt_indices_increase_from_one() {
        let dir = TempDir::new().unwrap();
        let harness = Harness::new(sources(5), ScriptedRenderer::always_failing("boom"));

        let result = harness.repair_loop().run(&request(), &workspace(&dir), 5).await.unwrap();

        let indices: Vec<u32> = result.attempts.iter().map(|a| a.index).collect();
        assert_eq!(indices, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_generation_failure_is_not_retried() {
        let dir = TempDir::new().unwrap();
        let generator = ScriptedGenerator::new([
            Ok(SCENE.to_string()),
            Err(GenerationFailure::Service("quota exceeded".to_string())),
            Ok(SCENE.to_string()),
        ]);
        let harness = Harness::new(generator, ScriptedRenderer::always_failing("TypeError"));

        let result = harness.repair_loop().run(&request(), &workspace(&dir), 3).await.unwrap();

        assert_eq!(result.final_outcome, FinalOutcome::ExhaustedRetries);
        assert_eq!(result.attempts.len(), 2);
        assert_eq!(result.attempts[1].outcome, AttemptOutcome::GenerationError);
        assert!(result.attempts[1].source_code.is_empty());
        assert!(result.stopped_by_generation_failure());
        assert!(result.last_error().unwrap().contains("quota exceeded"));
        assert_eq!(harness.generator.call_count(), 2);
        assert_eq!(harness.renderer.call_count(), 1);
    }

    #[tokio::test]
    async fn test_generation_failure_on_first_attempt() {
        let dir = TempDir::new().unwrap();
        let generator = ScriptedGenerator::new([Err(GenerationFailure::EmptyResponse)]);
        let harness = Harness::new(generator, ScriptedRenderer::succeeding());

        let result = harness.repair_loop().run(&request(), &workspace(&dir), 3).await.unwrap();

        assert_eq!(result.final_outcome, FinalOutcome::ExhaustedRetries);
        assert_eq!(result.attempts.len(), 1);
        assert!(result.stopped_by_generation_failure());
        assert_eq!(harness.renderer.call_count(), 0);
        assert_eq!(harness.recorder.len(), 1);
        assert_eq!(harness.recorder.records()[0].outcome, AttemptOutcome::GenerationError);
    }

    #[tokio::test]
    async fn test_single_attempt_budget() {
        let dir = TempDir::new().unwrap();
        let harness = Harness::new(sources(2), ScriptedRenderer::always_failing("boom"));

        let result = harness.repair_loop().run(&request(), &workspace(&dir), 1).await.unwrap();

        assert_eq!(result.attempts.len(), 1);
        assert_eq!(result.final_outcome, FinalOutcome::ExhaustedRetries);
        assert_eq!(harness.generator.call_count(), 1);
    }

    #[tokio::test]
    async fn test_each_failure_recorded_before_next_prompt() {
        let dir = TempDir::new().unwrap();
        let harness = Harness::new(sources(3), ScriptedRenderer::failing_then_succeeding(["first", "second"]));

        let result = harness.repair_loop().run(&request(), &workspace(&dir), 3).await.unwrap();
        assert!(result.is_success());
        assert_eq!(result.attempts.len(), 3);
        assert_eq!(result.attempts[2].outcome, AttemptOutcome::Success);

        let records = harness.recorder.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].attempt, 1);
        assert_eq!(records[0].transcript, "first");
        assert_eq!(records[0].source_code, result.attempts[0].source_code);
        assert_eq!(records[1].attempt, 2);
        assert_eq!(records[1].transcript, "second");
        assert!(records.iter().all(|r| r.session_id == "test-session"));
    }

    #[tokio::test]
    async fn test_recorder_error_does_not_abort() {
        let dir = TempDir::new().unwrap();
        let harness = Harness::new(sources(2), ScriptedRenderer::failing_then_succeeding(["boom"]))
            .with_recorder(MemoryRecorder::failing());

        let result = harness.repair_loop().run(&request(), &workspace(&dir), 3).await.unwrap();
        assert!(result.is_success());
        assert_eq!(result.attempts.len(), 2);
    }

    #[tokio::test]
    async fn test_repair_prompt_uses_only_previous_attempt() {
        let dir = TempDir::new().unwrap();
        let harness = Harness::new(sources(3), ScriptedRenderer::failing_then_succeeding(["err one", "err two"]));

        harness.repair_loop().run(&request(), &workspace(&dir), 3).await.unwrap();

        let third = &harness.generator.prompts()[2];
        assert!(third.contains("err two"));
        assert!(!third.contains("err one"));
        assert!(third.contains("# v2"));
        assert!(!third.contains("# v1"));
    }

    #[tokio::test]
    async fn test_workspace_holds_last_source() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(&dir);
        let harness = Harness::new(sources(2), ScriptedRenderer::failing_then_succeeding(["boom"]));

        let result = harness.repair_loop().run(&request(), &ws, 3).await.unwrap();
        assert_eq!(ws.read_source().unwrap(), result.attempts[1].source_code);
        assert_eq!(harness.renderer.sources().len(), 2);
    }

    #[tokio::test]
    async fn test_attempt_hook_sees_every_attempt() {
        let dir = TempDir::new().unwrap();
        let harness = Harness::new(sources(2), ScriptedRenderer::failing_then_succeeding(["boom"]));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();

        harness
            .repair_loop()
            .on_attempt(move |a| sink.lock().unwrap().push((a.index, a.outcome)))
            .run(&request(), &workspace(&dir), 3)
            .await
            .unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![(1, AttemptOutcome::RenderError), (2, AttemptOutcome::Success)]
        );
    }

    #[tokio::test]
    async fn test_broken_template_is_an_error() {
        let dir = TempDir::new().unwrap();
        let harness = Harness::new(sources(1), ScriptedRenderer::succeeding());
        let repair_loop = RepairLoop::new(
            harness.generator.clone(),
            harness.renderer.clone(),
            harness.recorder.clone(),
            PromptBuilder::new(
                "{{#if}}",
                "AlgorithmAnimation",
                BaseClass::new("a", "A", ""),
                BaseClass::new("b", "B", ""),
            ),
        );

        let err = repair_loop.run(&request(), &workspace(&dir), 3).await.unwrap_err();
        assert!(matches!(err, AlgovizError::Prompt(_)));
        assert_eq!(harness.generator.call_count(), 0);
    }

    #[test]
    fn test_default_max_attempts() {
        assert_eq!(DEFAULT_MAX_ATTEMPTS, 3);
    }
}
