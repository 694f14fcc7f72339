//! Configuration management for the view stack
//!
//! This module handles loading, parsing, and validating configuration
//! from TOML files. It combines settings for the stage, occlusion
//! policy, the shared mask, entrance tweens, and the loading indicator.

use anyhow::{Context, Result};
use cgmath::Vector2;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::geometry::Size;

/// Main configuration struct containing all view stack settings
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ViewConfig {
    /// Design resolution of the UI root
    #[serde(default)]
    pub stage: StageConfig,

    /// Occlusion culling policy
    #[serde(default)]
    pub occlusion: OcclusionConfig,

    /// Shared dimming mask
    #[serde(default)]
    pub mask: MaskConfig,

    /// Entrance tween settings
    #[serde(default)]
    pub tween: TweenConfig,

    /// Loading indicator settings
    #[serde(default)]
    pub loading: LoadingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StageConfig {
    /// Stage width (design units)
    pub width: f32,

    /// Stage height (design units)
    pub height: f32,
}

/// Conservative visibility culling inside a layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OcclusionConfig {
    /// When false every participating window stays shown
    pub enabled: bool,

    /// An opaque full-size window hides everything below it in its layer
    pub opaque_full_blocks: bool,

    /// Horizontal margin added to the covered area per shown window
    pub inflate_width: f32,

    /// Vertical margin added to the covered area per shown window
    pub inflate_height: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MaskConfig {
    /// Mask opacity for popups that inherit the default (0.0-1.0)
    pub default_opacity: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TweenConfig {
    /// Enable entrance tweens globally
    pub enabled: bool,

    /// Tween duration (milliseconds)
    pub duration_ms: u64,

    /// Easing curve ("linear", "ease-in", "ease-out", "ease-in-out")
    pub curve: String,

    /// Scale the content starts from (alpha always starts at 0)
    pub start_scale: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoadingConfig {
    /// Upper bound handed to the loading indicator (milliseconds)
    pub max_duration_ms: u64,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

impl Default for OcclusionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            opaque_full_blocks: true,
            inflate_width: 80.0,
            inflate_height: 160.0,
        }
    }
}

impl Default for MaskConfig {
    fn default() -> Self {
        Self {
            default_opacity: 0.8,
        }
    }
}

impl Default for TweenConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            duration_ms: 220,
            curve: "ease-out".to_string(),
            start_scale: 0.0,
        }
    }
}

impl Default for LoadingConfig {
    fn default() -> Self {
        Self {
            max_duration_ms: 10_000,
        }
    }
}

impl StageConfig {
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl OcclusionConfig {
    pub fn inflation(&self) -> Vector2<f32> {
        Vector2::new(self.inflate_width, self.inflate_height)
    }
}

impl TweenConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}

impl LoadingConfig {
    pub fn max_duration(&self) -> Duration {
        Duration::from_millis(self.max_duration_ms)
    }
}

impl ViewConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Expand ~ to home directory
        let expanded_path = if path.to_string_lossy().starts_with('~') {
            let home = std::env::var("HOME").context("Failed to get HOME environment variable")?;
            let rest = path.strip_prefix("~").unwrap_or(path);
            Path::new(&home).join(rest)
        } else {
            path.to_path_buf()
        };

        let contents = fs::read_to_string(&expanded_path)
            .with_context(|| format!("Failed to read config file: {}", expanded_path.display()))?;

        let config: ViewConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", expanded_path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.stage.width > 0.0 && self.stage.height > 0.0) {
            anyhow::bail!(
                "Invalid stage size {}x{}: both sides must be positive",
                self.stage.width,
                self.stage.height
            );
        }

        if self.occlusion.inflate_width < 0.0 || self.occlusion.inflate_height < 0.0 {
            anyhow::bail!("Invalid occlusion inflation: margins must not be negative");
        }

        if !(0.0..=1.0).contains(&self.mask.default_opacity) {
            anyhow::bail!("Invalid mask default_opacity: must be between 0.0 and 1.0");
        }

        let valid_curves = ["linear", "ease-in", "ease-out", "ease-in-out"];
        if !valid_curves.contains(&self.tween.curve.as_str()) {
            anyhow::bail!("Invalid tween curve: {}", self.tween.curve);
        }

        if self.tween.enabled && self.tween.duration_ms == 0 {
            anyhow::bail!("Invalid tween duration: must be greater than 0 when tweens are enabled");
        }

        if !(0.0..=1.0).contains(&self.tween.start_scale) {
            anyhow::bail!("Invalid tween start_scale: must be between 0.0 and 1.0");
        }

        Ok(())
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(path, contents).context("Failed to write configuration file")?;

        Ok(())
    }

    /// Merge a partial configuration into this one
    /// Non-default sections from the partial config override this config
    pub fn merge_partial(mut self, partial: ViewConfig) -> Self {
        let default_config = ViewConfig::default();

        if partial.stage != default_config.stage {
            self.stage = partial.stage;
        }
        if partial.occlusion != default_config.occlusion {
            self.occlusion = partial.occlusion;
        }
        if partial.mask != default_config.mask {
            self.mask = partial.mask;
        }
        if partial.tween != default_config.tween {
            self.tween = partial.tween;
        }
        if partial.loading != default_config.loading {
            self.loading = partial.loading;
        }

        self
    }
}

#[cfg(test)]
mod tests;
