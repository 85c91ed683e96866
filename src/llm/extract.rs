//! Pull code and JSON payloads out of free-form model replies.

use std::sync::LazyLock;

use regex::Regex;

/// Fence patterns tried in order when looking for Python source.
const CODE_FENCES: [&str; 3] = [
    r"```python[ \t]*\r?\n([\s\S]*?)\r?\n```",
    r"```py[ \t]*\r?\n([\s\S]*?)\r?\n```",
    r"```[ \t]*\r?\n([\s\S]*?)\r?\n```",
];

const JSON_FENCES: [&str; 2] = [r"```json\s*\n([\s\S]*?)\n```", r"```\s*\n([\s\S]*?)\n```"];

static CODE_FENCE_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| compile(&CODE_FENCES));
static JSON_FENCE_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| compile(&JSON_FENCES));

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns.iter().filter_map(|p| Regex::new(p).ok()).collect()
}

fn first_capture(re: &Regex, text: &str) -> Option<String> {
    let caps = re.captures(text)?;
    Some(caps.get(1)?.as_str().trim().to_string())
}

/// Extract the first fenced Python code block; falls back to the trimmed reply.
pub fn extract_code_block(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    CODE_FENCE_RES
        .iter()
        .find_map(|re| first_capture(re, text))
        .unwrap_or_else(|| text.trim().to_string())
}

/// Extract a JSON object from a reply: ```json block, plain block, or the raw text.
pub fn extract_json(text: &str) -> Option<serde_json::Value> {
    if text.trim().is_empty() {
        return None;
    }

    let candidate = JSON_FENCE_RES
        .iter()
        .find_map(|re| first_capture(re, text))
        .unwrap_or_else(|| text.trim().to_string());

    match serde_json::from_str(&candidate) {
        Ok(value) => Some(value),
        Err(e) => {
            let preview: String = candidate.chars().take(500).collect();
            log::warn!("Failed to parse JSON from model reply: {} ({})", e, preview);
            None
        }
    }
}
