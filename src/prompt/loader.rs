//! Prompt Loader - Load and cache prompt templates from files
//!
//! Templates are looked up as `<templates_dir>/<name>.md`. Names with a built-in
//! default fall back to it when no file overrides them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::error::{AlgovizError, Result};
use crate::prompt::defaults;

/// Loads and caches prompt templates from an optional directory
pub struct PromptLoader {
    /// Directory containing template overrides
    templates_dir: Option<PathBuf>,
    /// In-memory cache of loaded templates
    cache: RwLock<HashMap<String, String>>,
}

impl Default for PromptLoader {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PromptLoader {
    /// Loader that reads overrides from `templates_dir`
    pub fn new(templates_dir: impl AsRef<Path>) -> Self {
        Self {
            templates_dir: Some(templates_dir.as_ref().to_path_buf()),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Loader that only serves the built-in templates
    pub fn builtin() -> Self {
        Self {
            templates_dir: None,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Load a template by name (without .md extension)
    pub fn load(&self, name: &str) -> Result<String> {
        {
            let cache = self
                .cache
                .read()
                .map_err(|e| AlgovizError::Prompt(format!("Failed to acquire read lock: {}", e)))?;
            if let Some(content) = cache.get(name) {
                return Ok(content.clone());
            }
        }

        let content = match self.template_path(name) {
            Some(path) if path.exists() => {
                log::debug!("Loading template '{}' from {}", name, path.display());
                std::fs::read_to_string(&path).map_err(|e| {
                    AlgovizError::Io(std::io::Error::new(
                        e.kind(),
                        format!("Failed to load template '{}' from {:?}: {}", name, path, e),
                    ))
                })?
            }
            _ => defaults::builtin(name)
                .ok_or_else(|| AlgovizError::Prompt(format!("Unknown template '{}'", name)))?
                .to_string(),
        };

        let mut cache = self
            .cache
            .write()
            .map_err(|e| AlgovizError::Prompt(format!("Failed to acquire write lock: {}", e)))?;
        cache.insert(name.to_string(), content.clone());

        Ok(content)
    }

    /// Whether a file override exists for this template
    pub fn has_override(&self, name: &str) -> bool {
        self.template_path(name).is_some_and(|p| p.exists())
    }

    fn template_path(&self, name: &str) -> Option<PathBuf> {
        self.templates_dir
            .as_ref()
            .map(|dir| dir.join(format!("{}.md", name)))
    }

    /// Get the templates directory path
    pub fn templates_dir(&self) -> Option<&Path> {
        self.templates_dir.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_template(temp_dir: &TempDir, name: &str, content: &str) {
        fs::write(temp_dir.path().join(format!("{}.md", name)), content).unwrap();
    }

    #[test]
    fn test_builtin_generate_template() {
        let loader = PromptLoader::builtin();
        let content = loader.load(defaults::GENERATE).unwrap();
        assert!(content.contains("{{algorithm_name}}"));
        assert!(content.contains("{{base_class_code}}"));
    }

    #[test]
    fn test_override_wins_over_builtin() {
        let temp_dir = TempDir::new().unwrap();
        write_template(&temp_dir, defaults::GENERATE, "Custom {{algorithm_name}}");

        let loader = PromptLoader::new(temp_dir.path());
        assert!(loader.has_override(defaults::GENERATE));
        assert_eq!(loader.load(defaults::GENERATE).unwrap(), "Custom {{algorithm_name}}");
    }

    #[test]
    fn test_missing_override_falls_back() {
        let temp_dir = TempDir::new().unwrap();
        let loader = PromptLoader::new(temp_dir.path());
        assert!(!loader.has_override(defaults::METAPHOR));
        assert!(loader.load(defaults::METAPHOR).unwrap().contains("{{input_data}}"));
    }

    #[test]
    fn test_load_caches_template() {
        let temp_dir = TempDir::new().unwrap();
        write_template(&temp_dir, "custom", "Original content");
        let loader = PromptLoader::new(temp_dir.path());

        assert_eq!(loader.load("custom").unwrap(), "Original content");
        write_template(&temp_dir, "custom", "Modified content");
        assert_eq!(loader.load("custom").unwrap(), "Original content");
    }

    #[test]
    fn test_unknown_template() {
        let loader = PromptLoader::builtin();
        assert!(matches!(loader.load("nonexistent"), Err(AlgovizError::Prompt(_))));
    }

    #[test]
    fn test_templates_dir() {
        let temp_dir = TempDir::new().unwrap();
        let loader = PromptLoader::new(temp_dir.path());
        assert_eq!(loader.templates_dir(), Some(temp_dir.path()));
        assert!(PromptLoader::builtin().templates_dir().is_none());
    }
}
