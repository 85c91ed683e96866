//! Scripted generator for tests and offline runs

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{CodeGenerator, GenerationFailure};

/// Hands out canned replies in order and remembers every prompt it saw.
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<String, GenerationFailure>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new(replies: impl IntoIterator<Item = Result<String, GenerationFailure>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Every call succeeds with the next source in `sources`
    pub fn with_sources<S: Into<String>>(sources: impl IntoIterator<Item = S>) -> Self {
        Self::new(sources.into_iter().map(|s| Ok(s.into())))
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }
}

#[async_trait]
impl CodeGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationFailure> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        self.replies
            .lock()
            .ok()
            .and_then(|mut r| r.pop_front())
            .unwrap_or_else(|| Err(GenerationFailure::Service("no scripted reply left".to_string())))
    }
}
