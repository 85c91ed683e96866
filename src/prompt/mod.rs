//! Prompt System - Template loading and rendering
//!
//! This module provides functionality for loading prompt templates, rendering
//! them with Handlebars, and building the repair loop's prompts.

mod builder;
pub mod defaults;
mod loader;
mod render;

pub use builder::{BaseClass, PromptBuilder};
pub use loader::PromptLoader;
pub use render::PromptRenderer;
