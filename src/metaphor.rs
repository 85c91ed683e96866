//! Visual metaphor designer.
//!
//! Asks the model to turn an algorithm and its input into concrete visual
//! design decisions. The resulting JSON document can be handed to the code
//! generator as the request's visual spec.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AlgovizError, Result};
use crate::llm::{CompletionRequest, LlmClient, extract_json};
use crate::prompt::{PromptLoader, PromptRenderer, defaults};

/// Keys a metaphor reply must contain
pub const REQUIRED_FIELDS: [&str; 7] = [
    "algorithm_name",
    "shapes",
    "colors",
    "camera_movements",
    "layout_strategy",
    "animation_style",
    "metaphor_explanation",
];

const DESIGN_TEMPERATURE: f32 = 0.3;

/// Visual design decisions for one algorithm animation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualMetaphor {
    pub algorithm_name: String,
    /// Concept -> shape
    pub shapes: BTreeMap<String, String>,
    /// State -> color
    pub colors: BTreeMap<String, String>,
    pub camera_movements: Vec<String>,
    pub layout_strategy: String,
    pub animation_style: String,
    pub metaphor_explanation: String,
}

impl VisualMetaphor {
    /// Build from a parsed reply, rejecting replies that lack a required key.
    pub fn from_value(value: Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| AlgovizError::Design("reply is not a JSON object".to_string()))?;

        let missing: Vec<&str> = REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|field| !object.contains_key(*field))
            .collect();
        if !missing.is_empty() {
            return Err(AlgovizError::Design(format!(
                "reply is missing required fields: {}",
                missing.join(", ")
            )));
        }

        serde_json::from_value(value).map_err(|e| AlgovizError::Design(format!("reply has unexpected shape: {}", e)))
    }

    /// Pretty-printed JSON, as handed to the generator
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[derive(Serialize)]
struct MetaphorContext<'a> {
    algorithm_name: &'a str,
    input_data: &'a str,
}

/// Produces a `VisualMetaphor` with one model call.
pub struct MetaphorDesigner<L: LlmClient> {
    llm: Arc<L>,
    template: String,
    renderer: PromptRenderer,
}

impl<L: LlmClient> MetaphorDesigner<L> {
    pub fn new(llm: Arc<L>, template: impl Into<String>) -> Self {
        Self {
            llm,
            template: template.into(),
            renderer: PromptRenderer::new(),
        }
    }

    /// Use the metaphor template served by `loader`
    pub fn from_loader(llm: Arc<L>, loader: &PromptLoader) -> Result<Self> {
        Ok(Self::new(llm, loader.load(defaults::METAPHOR)?))
    }

    pub async fn design(&self, algorithm_name: &str, input_data: &str) -> Result<VisualMetaphor> {
        let prompt = self.renderer.render_with(
            &self.template,
            &MetaphorContext {
                algorithm_name,
                input_data,
            },
        )?;

        log::info!("Designing visual metaphor for {} with {}", algorithm_name, self.llm.model());
        let response = self
            .llm
            .complete(CompletionRequest::prompt(prompt).with_temperature(DESIGN_TEMPERATURE))
            .await?;

        let value = extract_json(&response.content)
            .ok_or_else(|| AlgovizError::Design("no valid JSON found in the model reply".to_string()))?;
        VisualMetaphor::from_value(value)
    }
}
