//! Configuration management for EB-5 Guide

use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Content language code
    pub language: String,

    /// Directory holding bundled content (`<dir>/<lang>/quizzes.json`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_dir: Option<PathBuf>,

    /// Log quiz interaction events
    #[serde(default = "default_log_telemetry")]
    pub log_telemetry: bool,
}

fn default_log_telemetry() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self { language: "en".to_string(), content_dir: None, log_telemetry: true }
    }
}

impl Config {
    /// Load configuration from disk, or create default if not exists
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config from {:?}", config_path))?;
            serde_json::from_str(&contents).with_context(|| "Failed to parse config.json")
        } else {
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let contents =
            serde_json::to_string_pretty(self).with_context(|| "Failed to serialize config")?;

        std::fs::write(&config_path, contents)
            .with_context(|| format!("Failed to write config to {:?}", config_path))?;

        Ok(())
    }

    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let proj_dirs =
            ProjectDirs::from("", "", "eb5-guide").context("Failed to determine config directory")?;
        Ok(proj_dirs.config_dir().join("config.json"))
    }

    /// Get the data directory path
    pub fn data_dir() -> Result<PathBuf> {
        let proj_dirs =
            ProjectDirs::from("", "", "eb5-guide").context("Failed to determine data directory")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    /// Get the preferences file path
    pub fn preferences_path() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("preferences.json"))
    }

    /// Content directory, defaulting to `content/` under the data directory
    pub fn content_dir(&self) -> Result<PathBuf> {
        match &self.content_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Self::data_dir()?.join("content")),
        }
    }
}

/// Explicit context handed to the quizzes screen at construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppContext {
    /// Active content language
    pub language: String,
    /// Whether interaction events are logged
    pub log_telemetry: bool,
}

impl AppContext {
    pub fn new(language: impl Into<String>) -> Self {
        Self { language: language.into(), log_telemetry: true }
    }

    pub fn from_config(config: &Config) -> Self {
        Self { language: config.language.clone(), log_telemetry: config.log_telemetry }
    }
}
