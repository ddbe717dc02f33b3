//! Application Configuration
//!
//! Engine and recognition settings stored in TOML format.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::engine::{EngineBackend, EngineOptions, MockSettings};

/// Application settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Engine construction settings
    pub engine: EngineConfig,
    /// Knobs applied after initialization
    pub recognition: RecognitionConfig,
    /// Logging settings
    pub logging: LoggingConfig,
    /// Scripted readings for the simulated backend
    pub mock: MockSettings,
}

/// Engine construction settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Backend to construct
    pub backend: EngineBackend,
    /// Region profile (e.g. "us", "eu")
    pub region: String,
    /// Engine configuration file
    pub config_file: PathBuf,
    /// Engine runtime data directory
    pub runtime_dir: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            backend: EngineBackend::default(),
            region: "us".to_string(),
            config_file: PathBuf::from("/etc/openalpr/openalpr.conf"),
            runtime_dir: PathBuf::from("/usr/share/openalpr/runtime_data"),
        }
    }
}

impl EngineConfig {
    pub fn options(&self) -> EngineOptions {
        EngineOptions::new(
            self.region.clone(),
            self.config_file.clone(),
            self.runtime_dir.clone(),
        )
    }
}

/// Recognition knobs; unset values keep the engine's own defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Region assumed for plates when region detection is off
    pub default_region: Option<String>,
    /// Let the engine guess each plate's region
    pub detect_region: bool,
    /// Maximum candidates per plate
    pub top_n: Option<u32>,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    Ok(config)
}

/// Load configuration, falling back to defaults when the file does not exist
pub fn load_or_default(path: &Path) -> Result<AppConfig> {
    if path.exists() {
        load_config(path)
    } else {
        Ok(AppConfig::default())
    }
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
