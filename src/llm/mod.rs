//! LLM Client Layer - Gemini API integration and reply parsing
//!
//! This module provides:
//! - Message types for LLM communication
//! - LlmClient trait for API abstraction, plus a scripted mock
//! - GeminiClient implementation
//! - Code block and JSON extraction from replies

pub mod client;
pub mod extract;
pub mod gemini;
pub mod types;

pub use client::{LlmClient, MockLlmClient};
pub use extract::{extract_code_block, extract_json};
pub use gemini::{DEFAULT_API_KEY_ENV, GEMINI_API_URL, GeminiClient, GeminiConfig};
pub use types::{CompletionRequest, CompletionResponse, Message, Role, StopReason, Usage};
