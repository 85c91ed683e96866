use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use algoviz::generator::GeneratorConfig;
use algoviz::llm::{DEFAULT_API_KEY_ENV, GEMINI_API_URL, GeminiConfig};
use algoviz::render::ManimConfig;
use algoviz::runner::DEFAULT_MAX_ATTEMPTS;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
    pub repair: RepairConfig,
    pub render: RenderConfig,
    pub prompts: PromptsConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub timeout_ms: u64,
    pub api_key_env: String,
    pub base_url: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-pro".to_string(),
            temperature: 0.2,
            max_output_tokens: 16384,
            timeout_ms: 300000,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            base_url: GEMINI_API_URL.to_string(),
        }
    }
}

impl LlmConfig {
    pub fn gemini(&self) -> GeminiConfig {
        GeminiConfig {
            model: self.model.clone(),
            max_tokens: self.max_output_tokens,
            temperature: self.temperature,
            timeout: Duration::from_millis(self.timeout_ms),
            base_url: self.base_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepairConfig {
    pub max_attempts: u32,
    pub review: bool,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            review: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub program: String,
    pub program_args: Vec<String>,
    pub quality_flag: String,
    pub fallback_quality_flag: Option<String>,
    pub timeout_ms: u64,
    pub scene_class: String,
    pub source_file: String,
    pub workspace_dir: PathBuf,
    pub open_video: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            program: "manim".to_string(),
            program_args: Vec::new(),
            quality_flag: "-qm".to_string(),
            fallback_quality_flag: None,
            timeout_ms: 600000,
            scene_class: "AlgorithmAnimation".to_string(),
            source_file: "generated_algo_scene.py".to_string(),
            workspace_dir: PathBuf::from("."),
            open_video: true,
        }
    }
}

impl RenderConfig {
    pub fn manim(&self) -> ManimConfig {
        ManimConfig {
            program: self.program.clone(),
            program_args: self.program_args.clone(),
            quality_flag: self.quality_flag.clone(),
            fallback_quality_flag: self.fallback_quality_flag.clone(),
            timeout_ms: self.timeout_ms,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    pub templates_dir: Option<PathBuf>,
    pub full_base_class: Option<PathBuf>,
    pub simple_base_class: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub failure_log_dir: PathBuf,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            failure_log_dir: data_dir().join("failures"),
        }
    }
}

/// `<data_local_dir>/algoviz`
pub fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(env!("CARGO_PKG_NAME"))
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try primary location: ~/.config/<project>/<project>.yml
        if let Some(config_dir) = dirs::config_dir() {
            let project_name = env!("CARGO_PKG_NAME");
            let primary_config = config_dir.join(project_name).join(format!("{}.yml", project_name));
            if primary_config.exists() {
                match Self::load_from_file(&primary_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        log::warn!("Failed to load config from {}: {}", primary_config.display(), e);
                    }
                }
            }
        }

        // Try fallback location: ./<project>.yml
        let project_name = env!("CARGO_PKG_NAME");
        let fallback_config = PathBuf::from(format!("{}.yml", project_name));
        if fallback_config.exists() {
            match Self::load_from_file(&fallback_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    log::warn!("Failed to load config from {}: {}", fallback_config.display(), e);
                }
            }
        }

        // No config file found, use defaults
        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        log::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    pub fn generator(&self) -> GeneratorConfig {
        GeneratorConfig {
            temperature: self.llm.temperature,
            max_tokens: Some(self.llm.max_output_tokens),
            scene_class: self.render.scene_class.clone(),
        }
    }
}
