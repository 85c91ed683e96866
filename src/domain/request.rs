//! Generation request built once per session from user input.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which scene base class the generated code builds on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateMode {
    /// Three-panel layout: pseudocode, animation, info
    #[default]
    Full,
    /// Full-screen animation only
    Simple,
}

impl TemplateMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateMode::Full => "full",
            TemplateMode::Simple => "simple",
        }
    }
}

impl fmt::Display for TemplateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TemplateMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(TemplateMode::Full),
            "simple" => Ok(TemplateMode::Simple),
            other => Err(format!("unknown template mode '{}' (expected full or simple)", other)),
        }
    }
}

/// Everything the generator needs to know about the requested animation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub algorithm_name: String,
    /// Structured view of the input; user text that is not valid JSON is kept as a string
    pub input_data: Value,
    /// Input exactly as the user typed it (trimmed)
    #[serde(default)]
    pub raw_input: String,
    pub template_mode: TemplateMode,
    /// Opaque visual design specification (e.g. a visual metaphor JSON document)
    pub visual_spec: Option<String>,
}

impl GenerationRequest {
    /// Create a request in Full mode without a visual spec.
    pub fn new(algorithm_name: impl Into<String>, input_data: Value) -> Self {
        let raw_input = match &input_data {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        Self {
            algorithm_name: algorithm_name.into(),
            input_data,
            raw_input,
            template_mode: TemplateMode::default(),
            visual_spec: None,
        }
    }

    /// Build a request from raw user text, parsing the data as JSON when possible.
    pub fn from_user_input(algorithm_name: impl Into<String>, raw_data: &str) -> Self {
        let trimmed = raw_data.trim();
        let input_data =
            serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_string()));
        Self {
            raw_input: trimmed.to_string(),
            ..Self::new(algorithm_name, input_data)
        }
    }

    pub fn with_mode(mut self, mode: TemplateMode) -> Self {
        self.template_mode = mode;
        self
    }

    pub fn with_visual_spec(mut self, spec: impl Into<String>) -> Self {
        let spec = spec.into();
        self.visual_spec = if spec.trim().is_empty() { None } else { Some(spec) };
        self
    }

    /// Input data as the text handed to prompts and to the render subprocess.
    pub fn input_data_text(&self) -> &str {
        &self.raw_input
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_template_mode_from_str() {
        assert_eq!("full".parse::<TemplateMode>().unwrap(), TemplateMode::Full);
        assert_eq!(" Simple ".parse::<TemplateMode>().unwrap(), TemplateMode::Simple);
        assert!("fancy".parse::<TemplateMode>().is_err());
    }

    #[test]
    fn test_template_mode_default_is_full() {
        assert_eq!(TemplateMode::default(), TemplateMode::Full);
        assert_eq!(TemplateMode::Simple.to_string(), "simple");
    }

    #[test]
    fn test_from_user_input_parses_json() {
        let request = GenerationRequest::from_user_input("Bubble Sort", "[8, 2, 6, 4]");
        assert_eq!(request.input_data, json!([8, 2, 6, 4]));
        assert_eq!(request.input_data_text(), "[8, 2, 6, 4]");
    }

    #[test]
    fn test_input_data_text_is_verbatim() {
        let big = GenerationRequest::from_user_input("Sum", " [12345678901234567890123, 1] ");
        assert_eq!(big.input_data_text(), "[12345678901234567890123, 1]");

        let object = GenerationRequest::from_user_input("BFS", "{\"b\": [1], \"a\": [2]}");
        assert_eq!(object.input_data_text(), "{\"b\": [1], \"a\": [2]}");
        assert_eq!(object.input_data, json!({"a": [2], "b": [1]}));

        let exponent = GenerationRequest::from_user_input("Pow", "1e2");
        assert_eq!(exponent.input_data_text(), "1e2");
    }

    #[test]
    fn test_new_derives_text_from_value() {
        let request = GenerationRequest::new("BFS", json!([1, 2]));
        assert_eq!(request.input_data_text(), "[1,2]");
    }

    #[test]
    fn test_from_user_input_keeps_plain_text() {
        let request = GenerationRequest::from_user_input("Dijkstra", "  graph A-B-C  ");
        assert_eq!(request.input_data, Value::String("graph A-B-C".to_string()));
        assert_eq!(request.input_data_text(), "graph A-B-C");
    }

    #[test]
    fn test_with_visual_spec_ignores_blank() {
        let request = GenerationRequest::new("BFS", json!({})).with_visual_spec("   ");
        assert!(request.visual_spec.is_none());

        let request = request.with_visual_spec("{\"shapes\": {}}");
        assert_eq!(request.visual_spec.as_deref(), Some("{\"shapes\": {}}"));
    }

    #[test]
    fn test_with_mode() {
        let request = GenerationRequest::new("BFS", json!([1])).with_mode(TemplateMode::Simple);
        assert_eq!(request.template_mode, TemplateMode::Simple);
    }
}
