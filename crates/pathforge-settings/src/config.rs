//! Configuration and settings management for PathForge
//!
//! Provides configuration file handling and validation. Supports JSON and
//! TOML file formats stored in platform-specific directories.
//!
//! Configuration is organized into logical sections:
//! - Route settings (curve sampling, resampling)
//! - Extrusion settings (worker pool, sections, post-processing)
//! - Placement settings (tick budget, tick rate, progress reporting)

use crate::error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "pathforge";
const CONFIG_FILE: &str = "config.toml";
const TEMPLATE_DIR: &str = "templates";

/// Route geometry settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteSettings {
    /// Spacing of dense curve samples, in blocks
    pub sampling_step: f64,
    /// Spacing of the resampled full path, in blocks
    pub resample_step: f64,
}

impl Default for RouteSettings {
    fn default() -> Self {
        Self {
            sampling_step: 0.25,
            resample_step: 1.0,
        }
    }
}

/// Extrusion settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtrusionSettings {
    /// Worker threads; unset uses one per core
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_threads: Option<usize>,
    /// Lateral columns per independent section
    pub section_width: usize,
    /// Flip half-height blocks against open space
    pub smooth_slabs: bool,
    /// Keep only the first instruction per position
    pub dedupe_positions: bool,
    /// Directory holding `<name>.json` templates; unset uses the data dir
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_dir: Option<PathBuf>,
}

impl Default for ExtrusionSettings {
    fn default() -> Self {
        Self {
            worker_threads: None,
            section_width: 4,
            smooth_slabs: true,
            dedupe_positions: true,
            template_dir: None,
        }
    }
}

/// Placement settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementSettings {
    /// Instructions committed per tick
    pub blocks_per_tick: usize,
    /// Ticks per second of the standalone driver
    pub tick_rate_hz: u32,
    /// Minimum time between progress events, in milliseconds
    pub progress_interval_ms: u64,
    /// Ask the world not to propagate neighbour updates
    pub suppress_neighbor_updates: bool,
}

impl Default for PlacementSettings {
    fn default() -> Self {
        Self {
            blocks_per_tick: 500,
            tick_rate_hz: 20,
            progress_interval_ms: 1000,
            suppress_neighbor_updates: true,
        }
    }
}

/// Complete application configuration
///
/// Aggregates all settings sections and provides file I/O operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Route geometry
    pub route: RouteSettings,
    /// Extrusion
    pub extrusion: ExtrusionSettings,
    /// Placement
    pub placement: PlacementSettings,
}

enum Format {
    Json,
    Toml,
}

fn format_of(path: &Path) -> ConfigResult<Format> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(Format::Json),
        Some("toml") => Ok(Format::Toml),
        other => Err(ConfigError::UnsupportedFormat(
            other.unwrap_or("<none>").to_string(),
        )),
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Default config file location, `<config dir>/pathforge/config.toml`
    pub fn default_path() -> ConfigResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
            .ok_or_else(|| ConfigError::UnsupportedPlatform(std::env::consts::OS.to_string()))
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = format_of(path)?;
        let content = std::fs::read_to_string(path).map_err(|e| {
            SettingsError::LoadError(format!("{}: {}", path.display(), e))
        })?;

        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Load config from file, falling back to defaults when it doesn't exist
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::info!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match format_of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| SettingsError::ConfigDirectory(format!("{}: {}", parent.display(), e)))?;
        }
        std::fs::write(path, content)
            .map_err(|e| SettingsError::SaveError(format!("{}: {}", path.display(), e)))?;

        tracing::debug!(path = %path.display(), "config saved");
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        let route = &self.route;
        if !(route.sampling_step.is_finite() && route.sampling_step > 0.0) {
            return Err(ConfigError::out_of_range(
                "route.sampling_step",
                route.sampling_step,
            ));
        }
        if !(route.resample_step.is_finite() && route.resample_step > 0.0) {
            return Err(ConfigError::out_of_range(
                "route.resample_step",
                route.resample_step,
            ));
        }

        let extrusion = &self.extrusion;
        if extrusion.worker_threads == Some(0) {
            return Err(ConfigError::out_of_range("extrusion.worker_threads", 0));
        }
        if extrusion.section_width == 0 {
            return Err(ConfigError::out_of_range("extrusion.section_width", 0));
        }

        let placement = &self.placement;
        if placement.blocks_per_tick == 0 {
            return Err(ConfigError::out_of_range("placement.blocks_per_tick", 0));
        }
        if placement.tick_rate_hz == 0 {
            return Err(ConfigError::out_of_range("placement.tick_rate_hz", 0));
        }

        Ok(())
    }

    /// Merge another config into this one
    ///
    /// Sections of `other` left at their defaults don't override ours.
    pub fn merge(&mut self, other: &Config) {
        if other.route != RouteSettings::default() {
            self.route = other.route.clone();
        }
        if other.extrusion != ExtrusionSettings::default() {
            self.extrusion = other.extrusion.clone();
        }
        if other.placement != PlacementSettings::default() {
            self.placement = other.placement.clone();
        }
    }

    /// Directory templates are loaded from
    pub fn template_dir(&self) -> PathBuf {
        self.extrusion.template_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR)
                .join(TEMPLATE_DIR)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Config::new().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_budget() {
        let mut config = Config::default();
        config.placement.blocks_per_tick = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValueOutOfRange { key, .. }) if key == "placement.blocks_per_tick"
        ));
    }

    #[test]
    fn test_validate_rejects_nan_step() {
        let mut config = Config::default();
        config.route.sampling_step = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_merge_keeps_default_sections() {
        let mut base = Config::default();
        base.route.resample_step = 0.5;

        let mut other = Config::default();
        other.placement.blocks_per_tick = 64;

        base.merge(&other);
        assert_eq!(base.route.resample_step, 0.5);
        assert_eq!(base.placement.blocks_per_tick, 64);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = Config::default().save_to_file(Path::new("config.yaml"));
        assert!(matches!(
            err,
            Err(SettingsError::Config(ConfigError::UnsupportedFormat(ext))) if ext == "yaml"
        ));
    }

    #[test]
    fn test_template_dir_override() {
        let mut config = Config::default();
        config.extrusion.template_dir = Some(PathBuf::from("/srv/templates"));
        assert_eq!(config.template_dir(), PathBuf::from("/srv/templates"));
    }
}
