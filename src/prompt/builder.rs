//! Builds the initial and corrective prompts for the repair loop.

use std::path::Path;

use serde::Serialize;

use crate::domain::{Attempt, GenerationRequest, TemplateMode};
use crate::error::{AlgovizError, Result};
use crate::prompt::defaults;
use crate::prompt::loader::PromptLoader;
use crate::prompt::render::PromptRenderer;

const REPAIR_HEADING: &str = "Previous Attempt Failed";
const VISUAL_SPEC_HEADING: &str = "Visual Design Specification";

/// A scene base class the generated code subclasses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseClass {
    /// Python module name the generated code imports from
    pub module: String,
    pub class_name: String,
    pub source: String,
}

impl BaseClass {
    pub fn new(module: impl Into<String>, class_name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            class_name: class_name.into(),
            source: source.into(),
        }
    }

    /// Read a base class from a `.py` file; the module name is the file stem.
    pub fn from_file(path: &Path, class_name: impl Into<String>) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            AlgovizError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to read base class {:?}: {}", path, e),
            ))
        })?;
        let module = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| AlgovizError::Prompt(format!("Invalid base class path {:?}", path)))?;
        Ok(Self::new(module, class_name, source))
    }

    /// Built-in base class for a template mode
    pub fn builtin(mode: TemplateMode) -> Self {
        let (module, class_name) = defaults::base_class_names(mode);
        Self::new(module, class_name, defaults::base_class_source(mode))
    }

    /// The file at `path` when given, the built-in base class otherwise.
    /// The class name is fixed per mode; a custom file must declare it.
    pub fn load(mode: TemplateMode, path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let (_, class_name) = defaults::base_class_names(mode);
                let base = Self::from_file(path, class_name)?;
                if !base.source.contains(&format!("class {}", base.class_name)) {
                    return Err(AlgovizError::Prompt(format!(
                        "{} does not define class {}",
                        path.display(),
                        base.class_name
                    )));
                }
                Ok(base)
            }
            None => Ok(Self::builtin(mode)),
        }
    }

    /// File name the base class is installed under in a render workspace
    pub fn file_name(&self) -> String {
        format!("{}.py", self.module)
    }
}

#[derive(Serialize)]
struct GenerateContext<'a> {
    algorithm_name: &'a str,
    user_input_data: &'a str,
    template_mode: &'a str,
    base_class_code: &'a str,
    base_module: &'a str,
    base_class_name: &'a str,
    scene_class: &'a str,
    visual_spec: Option<&'a str>,
}

/// Renders the generation template for a request and frames repair prompts.
pub struct PromptBuilder {
    renderer: PromptRenderer,
    template: String,
    scene_class: String,
    full: BaseClass,
    simple: BaseClass,
}

impl PromptBuilder {
    pub fn new(template: impl Into<String>, scene_class: impl Into<String>, full: BaseClass, simple: BaseClass) -> Self {
        Self {
            renderer: PromptRenderer::new(),
            template: template.into(),
            scene_class: scene_class.into(),
            full,
            simple,
        }
    }

    /// Build with the generation template served by `loader`
    pub fn from_loader(
        loader: &PromptLoader,
        scene_class: impl Into<String>,
        full: BaseClass,
        simple: BaseClass,
    ) -> Result<Self> {
        let template = loader.load(defaults::GENERATE)?;
        Ok(Self::new(template, scene_class, full, simple))
    }

    pub fn scene_class(&self) -> &str {
        &self.scene_class
    }

    /// Base class used for a template mode
    pub fn base_class(&self, mode: TemplateMode) -> &BaseClass {
        match mode {
            TemplateMode::Full => &self.full,
            TemplateMode::Simple => &self.simple,
        }
    }

    /// Prompt for the first attempt: the request rendered into the template.
    pub fn initial_prompt(&self, request: &GenerationRequest) -> Result<String> {
        let base = self.base_class(request.template_mode);
        let context = GenerateContext {
            algorithm_name: &request.algorithm_name,
            user_input_data: request.input_data_text(),
            template_mode: request.template_mode.as_str(),
            base_class_code: &base.source,
            base_module: &base.module,
            base_class_name: &base.class_name,
            scene_class: &self.scene_class,
            visual_spec: request.visual_spec.as_deref(),
        };

        let rendered = self.renderer.render_with(&self.template, &context)?;

        // Templates that ignore the visual spec still get it appended
        match request.visual_spec.as_deref() {
            Some(spec) if !self.template.contains("visual_spec") => {
                Ok(PromptRenderer::with_feedback(&rendered, VISUAL_SPEC_HEADING, spec))
            }
            _ => Ok(rendered),
        }
    }

    /// Prompt for attempt i > 1: the initial prompt plus the failed attempt's
    /// full source and transcript, framed as a request to fix the error.
    pub fn repair_prompt(base_prompt: &str, previous: &Attempt) -> String {
        let transcript = previous.error_text.as_deref().unwrap_or("(no error output captured)");
        let feedback = format!(
            "Attempt {} failed to render. This is the complete code that was run:\n\n\
             ```python\n{}\n```\n\n\
             The renderer reported:\n\n```\n{}\n```\n\n\
             Fix the error and return the complete corrected program in exactly one ```python code block.",
            previous.index, previous.source_code, transcript
        );
        PromptRenderer::with_feedback(base_prompt, REPAIR_HEADING, &feedback)
    }
}
