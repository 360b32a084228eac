//! Application and surface configuration
//!
//! Surface dimensions (window ceiling, gradient range) are explicit values
//! passed into the builders rather than ambient globals, so multiple
//! configurations can coexist in one process.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PaceGridError, Result};

/// Dimensions of the time x gradient speed surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceConfig {
    /// Longest rolling window considered, in seconds (rows run 0..=max)
    pub max_window_secs: u32,

    /// Lowest gradient bucket retained, in rounded percent
    pub min_gradient: i32,

    /// Highest gradient bucket retained, in rounded percent
    pub max_gradient: i32,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            max_window_secs: 7200,
            min_gradient: -30,
            max_gradient: 30,
        }
    }
}

impl SurfaceConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_gradient > self.max_gradient {
            return Err(PaceGridError::Configuration(format!(
                "min_gradient ({}) exceeds max_gradient ({})",
                self.min_gradient, self.max_gradient
            )));
        }
        Ok(())
    }

    /// Number of window-length rows in a surface with these dimensions
    pub fn rows(&self) -> usize {
        self.max_window_secs as usize + 1
    }

    /// Number of gradient-bucket columns in a surface with these dimensions
    pub fn cols(&self) -> usize {
        (self.max_gradient - self.min_gradient) as usize + 1
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Root directory for stored surfaces
    pub data_dir: PathBuf,

    /// Surface dimensions used when building new surfaces
    pub surface: SurfaceConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pacegrid");
        Self {
            data_dir,
            surface: SurfaceConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.surface.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content =
            toml::to_string_pretty(self).context("Failed to serialize configuration")?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }
}
