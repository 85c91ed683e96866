//! Built-in prompt templates and scene base classes.
//!
//! Templates are overridable through the templates directory, base classes
//! through the configured base class paths.

use crate::domain::TemplateMode;

/// Initial code generation prompt
pub const GENERATE: &str = "generate";
/// Review (reflection) prompt for a generated draft
pub const REVIEW: &str = "review";
/// Visual metaphor design prompt
pub const METAPHOR: &str = "metaphor";

const GENERATE_TEMPLATE: &str = include_str!("../../prompts/generate.md");
const REVIEW_TEMPLATE: &str = include_str!("../../prompts/review.md");
const METAPHOR_TEMPLATE: &str = include_str!("../../prompts/metaphor.md");

const FULL_BASE_SOURCE: &str = include_str!("../../scenes/base_algorithm_scene.py");
const SIMPLE_BASE_SOURCE: &str = include_str!("../../scenes/simple_animation_scene.py");

/// Module and class name of the built-in base class for a mode
pub fn base_class_names(mode: TemplateMode) -> (&'static str, &'static str) {
    match mode {
        TemplateMode::Full => ("base_algorithm_scene", "BaseAlgorithmScene"),
        TemplateMode::Simple => ("simple_animation_scene", "SimpleAnimationScene"),
    }
}

/// Built-in base class source for a mode
pub fn base_class_source(mode: TemplateMode) -> &'static str {
    match mode {
        TemplateMode::Full => FULL_BASE_SOURCE,
        TemplateMode::Simple => SIMPLE_BASE_SOURCE,
    }
}

/// Built-in template text for a name, if one exists
pub fn builtin(name: &str) -> Option<&'static str> {
    match name {
        GENERATE => Some(GENERATE_TEMPLATE),
        REVIEW => Some(REVIEW_TEMPLATE),
        METAPHOR => Some(METAPHOR_TEMPLATE),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_names() {
        assert!(builtin(GENERATE).is_some());
        assert!(builtin(REVIEW).unwrap().contains("{{draft_code}}"));
        assert!(builtin(METAPHOR).unwrap().contains("metaphor_explanation"));
        assert!(builtin("plan").is_none());
    }

    #[test]
    fn test_builtin_base_classes_declare_their_class() {
        for mode in [TemplateMode::Full, TemplateMode::Simple] {
            let (_, class_name) = base_class_names(mode);
            assert!(base_class_source(mode).contains(&format!("class {}(Scene)", class_name)));
        }
    }
}
