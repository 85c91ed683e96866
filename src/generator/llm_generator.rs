//! LLM-backed code generator with an optional review pass.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use super::{CodeGenerator, GenerationFailure};
use crate::llm::{CompletionRequest, LlmClient, StopReason, extract_code_block};
use crate::prompt::{BaseClass, PromptRenderer};

/// Configuration for the LlmCodeGenerator.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Sampling temperature for the draft
    pub temperature: f32,
    /// Max output tokens (client default when None)
    pub max_tokens: Option<u32>,
    /// Class the generated code must declare
    pub scene_class: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_tokens: None,
            scene_class: "AlgorithmAnimation".to_string(),
        }
    }
}

struct ReviewPass {
    template: String,
    base: BaseClass,
}

#[derive(Serialize)]
struct ReviewContext<'a> {
    prompt: &'a str,
    draft_code: &'a str,
    scene_class: &'a str,
    base_module: &'a str,
    base_class_name: &'a str,
}

/// Generates scene code by asking an LLM and extracting the fenced code block.
pub struct LlmCodeGenerator<L: LlmClient> {
    llm: Arc<L>,
    config: GeneratorConfig,
    renderer: PromptRenderer,
    review: Option<ReviewPass>,
}

impl<L: LlmClient> LlmCodeGenerator<L> {
    pub fn new(llm: Arc<L>, config: GeneratorConfig) -> Self {
        Self {
            llm,
            config,
            renderer: PromptRenderer::new(),
            review: None,
        }
    }

    /// Enable the review pass: the draft goes back to the model at temperature 0
    /// with a checklist against `base`.
    pub fn with_review(mut self, template: impl Into<String>, base: BaseClass) -> Self {
        self.review = Some(ReviewPass {
            template: template.into(),
            base,
        });
        self
    }

    pub fn reviews(&self) -> bool {
        self.review.is_some()
    }

    async fn ask(&self, prompt: String, temperature: f32) -> Result<String, GenerationFailure> {
        let mut request = CompletionRequest::prompt(prompt).with_temperature(temperature);
        if let Some(max_tokens) = self.config.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        let response = self
            .llm
            .complete(request)
            .await
            .map_err(|e| GenerationFailure::Service(e.to_string()))?;

        log::debug!(
            "{} replied with {} input / {} output tokens",
            self.llm.model(),
            response.usage.input_tokens,
            response.usage.output_tokens
        );

        match response.stop_reason {
            StopReason::Safety => return Err(GenerationFailure::Blocked),
            StopReason::MaxTokens => {
                log::warn!(
                    "Reply hit the output token limit ({} tokens); the code is probably truncated",
                    response.usage.output_tokens
                );
            }
            StopReason::EndTurn | StopReason::Other => {}
        }

        Ok(extract_code_block(&response.content))
    }

    fn check(&self, code: &str) -> Result<(), GenerationFailure> {
        if code.trim().is_empty() {
            return Err(GenerationFailure::EmptyResponse);
        }
        if !code.contains(&format!("class {}", self.config.scene_class)) {
            return Err(GenerationFailure::MissingSceneClass {
                class: self.config.scene_class.clone(),
            });
        }
        Ok(())
    }

    /// Review the draft; any problem with the review keeps the draft.
    async fn run_review(&self, pass: &ReviewPass, prompt: &str, draft: String) -> String {
        let context = ReviewContext {
            prompt,
            draft_code: &draft,
            scene_class: &self.config.scene_class,
            base_module: &pass.base.module,
            base_class_name: &pass.base.class_name,
        };

        let review_prompt = match self.renderer.render_with(&pass.template, &context) {
            Ok(p) => p,
            Err(e) => {
                log::warn!("Skipping review, template failed to render: {}", e);
                return draft;
            }
        };

        match self.ask(review_prompt, 0.0).await {
            Ok(reviewed) if self.check(&reviewed).is_ok() => reviewed,
            Ok(_) => {
                log::warn!("Review returned unusable code, keeping draft");
                draft
            }
            Err(e) => {
                log::warn!("Review call failed, keeping draft: {}", e);
                draft
            }
        }
    }
}

#[async_trait]
impl<L: LlmClient> CodeGenerator for LlmCodeGenerator<L> {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationFailure> {
        let draft = self.ask(prompt.to_string(), self.config.temperature).await?;
        self.check(&draft)?;

        match &self.review {
            Some(pass) => Ok(self.run_review(pass, prompt, draft).await),
            None => Ok(draft),
        }
    }
}
