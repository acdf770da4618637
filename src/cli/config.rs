//! Configuration management for SecBuddy
//!
//! Provides TOML-based configuration with defaults and validation.
//! Location: ~/.secbuddy/config.toml

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::assessment::{DriverConfig, QuestionCatalog};
use crate::chat::client::{ChatConfig, DEFAULT_API_KEY_ENV, DEFAULT_ENDPOINT, DEFAULT_MODEL};
use crate::errors::{AssessError, Result};
use crate::telemetry::SimulatorConfig;

/// Complete configuration for SecBuddy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub assessment: AssessmentSettings,
    pub telemetry: TelemetrySettings,
    pub chat: ChatSettings,
    pub display: DisplaySettings,
    pub paths: PathsSettings,
}

/// Assessment flow settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssessmentSettings {
    pub processing_delay_ms: u64,
    /// TOML catalog replacing the built-in questions
    pub catalog_path: Option<String>,
}

/// Simulated telemetry settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetrySettings {
    pub tick_interval_ms: u64,
    pub unstable_probability: f64,
    pub unstable_duration_ms: u64,
    pub download_min: u32,
    pub download_max: u32,
    pub upload_min: u32,
    pub upload_max: u32,
    pub seed: Option<u64>,
}

/// Assistant chat settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    pub endpoint: String,
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub timeout_sec: u64,
}

/// Terminal output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub color_output: bool,
}

/// File system paths configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsSettings {
    pub state_dir: String,
}

impl Default for AssessmentSettings {
    fn default() -> Self {
        Self {
            processing_delay_ms: 3000,
            catalog_path: None,
        }
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: 5000,
            unstable_probability: 0.05,
            unstable_duration_ms: 3000,
            download_min: 20,
            download_max: 99,
            upload_min: 10,
            upload_max: 39,
            seed: None,
        }
    }
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            timeout_sec: 30,
        }
    }
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self { color_output: true }
    }
}

impl Default for PathsSettings {
    fn default() -> Self {
        Self {
            state_dir: "~/.secbuddy".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        if let Some(config_path) = path {
            Self::load_from_file(&config_path)
        } else {
            Self::load_default()
        }
    }

    /// Load configuration from specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| AssessError::ConfigError(format!("Failed to read config: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| AssessError::ConfigError(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load default configuration from standard location or use built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Some(home) = dirs::home_dir() {
            let config_path = home.join(".secbuddy").join("config.toml");
            if config_path.exists() {
                return Self::load_from_file(&config_path);
            }
        }

        Ok(Config::default())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        // Range and probability checks live with the simulator
        self.simulator_config().validate()?;

        if self.chat.endpoint.trim().is_empty() {
            return Err(AssessError::ConfigError(
                "chat endpoint must not be empty".to_string(),
            ));
        }

        if self.chat.timeout_sec == 0 {
            return Err(AssessError::ConfigError(
                "chat timeout_sec must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = self.to_toml()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| AssessError::ConfigError(format!("Failed to create config dir: {}", e)))?;
        }

        std::fs::write(path, contents)
            .map_err(|e| AssessError::ConfigError(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| AssessError::ConfigError(format!("Failed to serialize config: {}", e)))
    }

    pub fn simulator_config(&self) -> SimulatorConfig {
        let t = &self.telemetry;
        SimulatorConfig {
            tick_interval: Duration::from_millis(t.tick_interval_ms),
            unstable_probability: t.unstable_probability,
            unstable_duration: Duration::from_millis(t.unstable_duration_ms),
            download_range: t.download_min..=t.download_max,
            upload_range: t.upload_min..=t.upload_max,
            seed: t.seed,
        }
    }

    pub fn driver_config(&self) -> DriverConfig {
        DriverConfig {
            processing_delay: Duration::from_millis(self.assessment.processing_delay_ms),
            telemetry: self.simulator_config(),
        }
    }

    /// Chat client settings; the key is read from the configured env var
    pub fn chat_config(&self) -> ChatConfig {
        ChatConfig {
            endpoint: self.chat.endpoint.clone(),
            model: self.chat.model.clone(),
            api_key: std::env::var(&self.chat.api_key_env)
                .ok()
                .filter(|k| !k.trim().is_empty()),
            timeout: Duration::from_secs(self.chat.timeout_sec),
        }
    }

    /// Configured catalog, or the built-in network security questions
    pub fn load_catalog(&self) -> Result<QuestionCatalog> {
        match &self.assessment.catalog_path {
            Some(path) => QuestionCatalog::load_from_file(&Self::expand_path(path)),
            None => Ok(QuestionCatalog::network_security()),
        }
    }

    /// Expand tilde in paths
    pub fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }

    /// Get state directory path
    pub fn state_dir(&self) -> PathBuf {
        Self::expand_path(&self.paths.state_dir)
    }

    /// Readline history for the chat REPL
    pub fn history_path(&self) -> PathBuf {
        self.state_dir().join("chat_history")
    }
}
