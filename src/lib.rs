//! algoviz - LLM-generated algorithm animations that repair themselves
//!
//! algoviz asks a Gemini model for Manim scene code, renders it, and feeds
//! every render error back into the next prompt until the scene renders or
//! the attempt budget is spent.

pub mod domain;
pub mod error;
pub mod generator;
pub mod id;
pub mod llm;
pub mod metaphor;
pub mod prompt;
pub mod render;
pub mod runner;
pub mod storage;

pub use error::{AlgovizError, Result};
