use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::llm::BackendId;

const PLACEHOLDER_API_KEY: &str = "PLACEHOLDER_GRAPHHOPPER_API_KEY";

/// Main configuration structure for the trip assistant
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub graphhopper: GraphHopperConfig,
    pub llm: LlmConfig,
    pub debug: DebugConfig,
    pub assistant: AssistantConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphHopperConfig {
    pub api_key: String,
    pub geocode_url: String,
    pub route_url: String,
    pub geocode_limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Backend used when none (or an unknown one) is selected
    pub default_backend: String,
    pub timeout_seconds: u64,
    pub ollama: OllamaConfig,
    pub huggingface: HuggingFaceConfig,
    pub gemini: GeminiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HuggingFaceConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub max_new_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Write raw geocoding responses to `dir`
    pub enabled: bool,
    pub dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Instruction steps embedded in summary and Q&A prompts
    pub max_prompt_steps: usize,
}

impl Default for GraphHopperConfig {
    fn default() -> Self {
        Self {
            api_key: env::var("GRAPHHOPPER_API_KEY").unwrap_or_else(|_| PLACEHOLDER_API_KEY.to_string()),
            geocode_url: "https://graphhopper.com/api/1/geocode".to_string(),
            route_url: "https://graphhopper.com/api/1/route".to_string(),
            geocode_limit: 1,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            default_backend: BackendId::Ollama.as_str().to_string(),
            timeout_seconds: 120,
            ollama: OllamaConfig::default(),
            huggingface: HuggingFaceConfig::default(),
            gemini: GeminiConfig::default(),
        }
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3".to_string(),
        }
    }
}

impl Default for HuggingFaceConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api-inference.huggingface.co/models".to_string(),
            model: "mistralai/Mistral-7B-Instruct-v0.2".to_string(),
            max_new_tokens: 500,
            temperature: 0.7,
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            model: "gemini-1.5-flash".to_string(),
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: "data".to_string(),
        }
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            max_prompt_steps: 10,
        }
    }
}

impl Config {
    /// Load configuration from file with environment variable overrides.
    /// Always returns a usable config.
    pub fn load() -> Self {
        let mut env_loaded = false;
        for path in [".env", "../.env"] {
            if dotenvy::from_path(path).is_ok() {
                tracing::info!("Loaded .env from: {}", path);
                env_loaded = true;
                break;
            }
        }
        if !env_loaded {
            tracing::debug!("No .env file found - continuing with env vars only");
        }

        let config_path =
            env::var("TRIP_CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());
        let mut config = Self::from_file(&config_path);

        config.apply_env_overrides(|name| env::var(name).ok());

        for warning in config.validate() {
            tracing::warn!("Config: {}", warning);
        }

        config
    }

    fn from_file(config_path: &str) -> Self {
        if !Path::new(config_path).exists() {
            tracing::debug!("Config file not found at {} - using defaults", config_path);
            return Self::default();
        }
        match fs::read_to_string(config_path) {
            Ok(contents) => match serde_yaml::from_str::<Config>(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded configuration from {}", config_path);
                    config
                }
                Err(e) => {
                    tracing::error!(
                        "Failed to parse config file {}: {} - using defaults",
                        config_path,
                        e
                    );
                    Self::default()
                }
            },
            Err(e) => {
                tracing::error!(
                    "Failed to read config file {}: {} - using defaults",
                    config_path,
                    e
                );
                Self::default()
            }
        }
    }

    /// Apply environment variable overrides; `lookup` is `std::env::var` outside tests
    fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("GRAPHHOPPER_API_KEY") {
            self.graphhopper.api_key = key;
        }

        if let Some(backend) = lookup("TRIP_LLM_BACKEND") {
            self.llm.default_backend = backend;
        }
        if let Some(url) = lookup("OLLAMA_BASE_URL") {
            self.llm.ollama.base_url = url;
        }
        if let Some(model) = lookup("OLLAMA_MODEL") {
            self.llm.ollama.model = model;
        }
        if let Some(key) = lookup("HF_API_KEY").or_else(|| lookup("HUGGINGFACE_API_KEY")) {
            self.llm.huggingface.api_key = key;
        }
        if let Some(model) = lookup("HF_MODEL") {
            self.llm.huggingface.model = model;
        }
        if let Some(key) = lookup("GEMINI_API_KEY") {
            self.llm.gemini.api_key = key;
        }
        if let Some(model) = lookup("GEMINI_MODEL") {
            self.llm.gemini.model = model;
        }

        if let Some(dir) = lookup("TRIP_DEBUG_DIR") {
            self.debug.dir = dir;
        }
        if let Some(flag) = lookup("TRIP_DEBUG_DUMPS") {
            match flag.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.debug.enabled = true,
                "0" | "false" | "no" | "off" => self.debug.enabled = false,
                other => tracing::warn!("Ignoring TRIP_DEBUG_DUMPS={}", other),
            }
        }
    }

    /// Problems worth telling the user about; none of them stop the program
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.graphhopper.api_key.is_empty() || self.graphhopper.api_key == PLACEHOLDER_API_KEY {
            warnings.push("GRAPHHOPPER_API_KEY is not set; geocoding and routing will fail".to_string());
        }
        if self.llm.default_backend.parse::<BackendId>().is_err() {
            warnings.push(format!(
                "Unknown llm.default_backend '{}', falling back to {}",
                self.llm.default_backend,
                BackendId::Ollama
            ));
        }
        if self.llm.huggingface.api_key.is_empty() {
            warnings.push("HF_API_KEY is not set; Hugging Face requests will be unauthorized".to_string());
        }
        if self.llm.gemini.api_key.is_empty() {
            warnings.push("GEMINI_API_KEY is not set; Gemini requests will be unauthorized".to_string());
        }
        if self.assistant.max_prompt_steps == 0 {
            warnings.push("assistant.max_prompt_steps is 0; prompts will carry no directions".to_string());
        }

        warnings
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm.timeout_seconds.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn partial_yaml_keeps_defaults_for_missing_sections() {
        let yaml = r#"
graphhopper:
  api_key: abc
llm:
  default_backend: gemini
  gemini:
    model: gemini-pro
"#;
        let cfg: Config = serde_yaml::from_str(yaml).expect("valid yaml");
        assert_eq!(cfg.graphhopper.api_key, "abc");
        assert_eq!(cfg.graphhopper.route_url, "https://graphhopper.com/api/1/route");
        assert_eq!(cfg.llm.default_backend, "gemini");
        assert_eq!(cfg.llm.gemini.model, "gemini-pro");
        assert_eq!(
            cfg.llm.gemini.base_url,
            "https://generativelanguage.googleapis.com/v1beta"
        );
        assert_eq!(cfg.llm.ollama.model, "llama3");
        assert_eq!(cfg.assistant.max_prompt_steps, 10);
        assert!(cfg.debug.enabled);
    }

    #[test]
    fn example_config_parses() {
        let cfg: Config = serde_yaml::from_str(include_str!("../config.example.yaml"))
            .expect("example config is valid");
        assert_eq!(cfg.llm.default_backend, "ollama");
        assert_eq!(cfg.graphhopper.geocode_limit, 1);
        assert_eq!(cfg.debug.dir, "data");
    }

    #[test]
    fn env_overrides_win() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("GRAPHHOPPER_API_KEY", "gh-env"),
            ("TRIP_LLM_BACKEND", "hf"),
            ("HUGGINGFACE_API_KEY", "hf-env"),
            ("OLLAMA_MODEL", "mistral"),
            ("TRIP_DEBUG_DUMPS", "off"),
        ]);
        let mut cfg = Config::default();
        cfg.apply_env_overrides(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(cfg.graphhopper.api_key, "gh-env");
        assert_eq!(cfg.llm.default_backend, "hf");
        assert_eq!(cfg.llm.huggingface.api_key, "hf-env");
        assert_eq!(cfg.llm.ollama.model, "mistral");
        assert!(!cfg.debug.enabled);
    }

    #[test]
    fn validate_reports_but_never_fails() {
        let mut cfg = Config::default();
        cfg.graphhopper.api_key = String::new();
        cfg.llm.default_backend = "skynet".to_string();
        cfg.assistant.max_prompt_steps = 0;

        let warnings = cfg.validate();
        assert!(warnings.iter().any(|w| w.contains("GRAPHHOPPER_API_KEY")));
        assert!(warnings.iter().any(|w| w.contains("skynet")));
        assert!(warnings.iter().any(|w| w.contains("max_prompt_steps")));
    }
}
