//! Prompt Renderer - Render templates with context variables using Handlebars
//!
//! This module provides the PromptRenderer struct which uses Handlebars to
//! render prompt templates with context variables.

use std::collections::HashMap;

use handlebars::Handlebars;
use serde::Serialize;

use crate::error::{AlgovizError, Result};

/// Renders prompt templates using Handlebars templating
pub struct PromptRenderer {
    handlebars: Handlebars<'static>,
}

impl Default for PromptRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptRenderer {
    /// Create a new PromptRenderer with default settings
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        // Source code and transcripts go in verbatim
        handlebars.register_escape_fn(handlebars::no_escape);
        Self { handlebars }
    }

    /// Render a template string with the given context
    pub fn render(&self, template: &str, context: &HashMap<String, String>) -> Result<String> {
        self.render_with(template, context)
    }

    /// Render a template string with any serializable context
    pub fn render_with<T: Serialize>(&self, template: &str, context: &T) -> Result<String> {
        self.handlebars
            .render_template(template, context)
            .map_err(|e| AlgovizError::Prompt(format!("Failed to render template: {}", e)))
    }

    /// Append a feedback section to an already rendered prompt
    pub fn with_feedback(rendered: &str, heading: &str, feedback: &str) -> String {
        if feedback.is_empty() {
            return rendered.to_string();
        }

        format!("{}\n\n---\n\n## {}\n\n{}", rendered, heading, feedback)
    }
}
