//! JSON Configuration Management
//!
//! Loads, validates, and saves the application configuration at
//! `~/.covenant/config.json`. The file names the environment variables that
//! hold provider credentials; secret values are read from the environment at
//! startup and are never written to disk.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::utils::error::{AppError, AppResult};
use crate::utils::paths::{config_path, ensure_covenant_dir};

fn default_openrouter_var() -> String {
    "OPENROUTER_API_KEY".to_string()
}

fn default_deepseek_var() -> String {
    "DEEPSEEK_API_KEY".to_string()
}

fn default_glm_var() -> String {
    "GLM_API_KEY".to_string()
}

fn default_openai_var() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_ollama_var() -> String {
    "OLLAMA_BASE_URL".to_string()
}

fn default_call_timeout_secs() -> u64 {
    180
}

/// Read one named environment variable, treating empty values as absent
pub fn read_env(var: &str) -> Option<String> {
    env::var(var).ok().filter(|v| !v.trim().is_empty())
}

/// Where provider credentials come from. Env-var names only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default = "default_openrouter_var")]
    pub openrouter_key_var: String,
    #[serde(default = "default_deepseek_var")]
    pub deepseek_key_var: String,
    #[serde(default = "default_glm_var")]
    pub glm_key_var: String,
    #[serde(default = "default_openai_var")]
    pub openai_key_var: String,
    #[serde(default = "default_ollama_var")]
    pub ollama_url_var: String,
    /// Per-call deadline in seconds
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            openrouter_key_var: default_openrouter_var(),
            deepseek_key_var: default_deepseek_var(),
            glm_key_var: default_glm_var(),
            openai_key_var: default_openai_var(),
            ollama_url_var: default_ollama_var(),
            call_timeout_secs: default_call_timeout_secs(),
        }
    }
}

impl ProviderSettings {
    fn var_names(&self) -> [&str; 5] {
        [
            &self.openrouter_key_var,
            &self.deepseek_key_var,
            &self.glm_key_var,
            &self.openai_key_var,
            &self.ollama_url_var,
        ]
    }
}

/// Application configuration stored in config.json
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub provider: ProviderSettings,
    /// Peer reference dataset override; the embedded table is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer_dataset_path: Option<PathBuf>,
    /// Report output directory; defaults to ~/.covenant/reports
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_dir: Option<PathBuf>,
}

/// Partial configuration update
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigUpdate {
    pub call_timeout_secs: Option<u64>,
    pub peer_dataset_path: Option<PathBuf>,
    pub report_dir: Option<PathBuf>,
}

impl AppConfig {
    /// Apply a partial update to the configuration
    pub fn apply_update(&mut self, update: ConfigUpdate) {
        if let Some(secs) = update.call_timeout_secs {
            self.provider.call_timeout_secs = secs;
        }
        if let Some(path) = update.peer_dataset_path {
            self.peer_dataset_path = Some(path);
        }
        if let Some(dir) = update.report_dir {
            self.report_dir = Some(dir);
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        for name in self.provider.var_names() {
            if name.trim().is_empty() {
                return Err("Credential env-var names cannot be empty".to_string());
            }
            if name.contains('=') || name.contains(char::is_whitespace) {
                return Err(format!("Invalid env-var name: {:?}", name));
            }
        }

        if self.provider.call_timeout_secs == 0 {
            return Err("call_timeout_secs must be at least 1 second".to_string());
        }
        if self.provider.call_timeout_secs > 3600 {
            return Err("call_timeout_secs cannot exceed 3600 seconds".to_string());
        }

        if let Some(path) = &self.peer_dataset_path {
            if path.as_os_str().is_empty() {
                return Err("peer_dataset_path cannot be empty when set".to_string());
            }
        }

        Ok(())
    }
}

/// Configuration service managing the on-disk config file
#[derive(Debug)]
pub struct ConfigService {
    config_path: PathBuf,
    config: AppConfig,
}

impl ConfigService {
    /// Create a new config service, loading existing config or writing defaults
    pub fn new() -> AppResult<Self> {
        ensure_covenant_dir()?;
        let path = config_path()?;
        Self::at_path(path)
    }

    /// Load or create the config at an explicit path
    pub fn at_path(config_path: PathBuf) -> AppResult<Self> {
        let config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            let default_config = AppConfig::default();
            Self::save_to_file(&config_path, &default_config)?;
            default_config
        };

        Ok(Self {
            config_path,
            config,
        })
    }

    fn load_from_file(path: &Path) -> AppResult<AppConfig> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        config.validate().map_err(AppError::validation)?;
        Ok(config)
    }

    fn save_to_file(path: &Path, config: &AppConfig) -> AppResult<()> {
        config.validate().map_err(AppError::validation)?;
        let content = serde_json::to_string_pretty(config)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the current configuration
    pub fn get_config(&self) -> &AppConfig {
        &self.config
    }

    /// Update the configuration with a partial update
    pub fn update_config(&mut self, update: ConfigUpdate) -> AppResult<AppConfig> {
        self.config.apply_update(update);
        self.save()?;
        Ok(self.config.clone())
    }

    /// Save the current configuration to disk
    pub fn save(&self) -> AppResult<()> {
        Self::save_to_file(&self.config_path, &self.config)
    }

    /// Reload configuration from disk
    pub fn reload(&mut self) -> AppResult<()> {
        self.config = Self::load_from_file(&self.config_path)?;
        Ok(())
    }

    /// Reset configuration to defaults
    pub fn reset(&mut self) -> AppResult<()> {
        self.config = AppConfig::default();
        self.save()?;
        Ok(())
    }

    /// Check if the config service is healthy
    pub fn is_healthy(&self) -> bool {
        self.config_path.exists() && self.config.validate().is_ok()
    }
}
