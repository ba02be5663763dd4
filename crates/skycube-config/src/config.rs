//! Configuration structs with defaults and RON persistence.

use std::path::Path;

use serde::{Deserialize, Serialize};
use skycube_cube::LevelRange;

use crate::error::ConfigError;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Tile pyramid settings.
    pub pyramid: PyramidConfig,
    /// Which background renderer to build.
    pub background: BackgroundKind,
    /// Debug/development settings.
    pub debug: DebugConfig,
    /// Headless demo settings.
    pub demo: DemoConfig,
}

/// Tile pyramid configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PyramidConfig {
    /// Coarsest level (one tile per face at 0).
    pub level_min: u8,
    /// Finest level.
    pub level_max: u8,
    /// Far render depth; the cube edge is twice this.
    pub depth_far: f32,
    /// Request the children of visible cells ahead of zooming in.
    pub prefetch_children: bool,
    /// Cache cap per level. `None` keeps every tile.
    pub max_tiles_per_level: Option<usize>,
}

impl PyramidConfig {
    /// Validated level bounds.
    pub fn level_range(&self) -> Result<LevelRange, ConfigError> {
        LevelRange::new(self.level_min, self.level_max).map_err(ConfigError::InvalidLevels)
    }

    /// Check every field a renderer would otherwise reject with a panic.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.level_range()?;
        if !self.depth_far.is_finite() || self.depth_far <= 0.0 {
            return Err(ConfigError::InvalidDepthFar(self.depth_far));
        }
        Ok(())
    }
}

/// Background renderer selection.
///
/// Mirrors `skycube_pyramid::BackgroundKind` so this crate stays free of
/// renderer dependencies; the binary maps one onto the other.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
pub enum BackgroundKind {
    /// Field of view driven tile pyramid.
    #[default]
    Pyramid,
    /// Single-level cube.
    Cubemap,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log filter (e.g. "debug", "info,skycube_pyramid=trace").
    pub log_level: String,
}

/// Headless demo configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DemoConfig {
    /// Frames to render before exiting.
    pub frames: u32,
    /// Field of view at the first frame, in degrees.
    pub start_fov: f32,
    /// Field of view at the last frame, in degrees.
    pub end_fov: f32,
    /// Frames between a texture request and its verdict.
    pub texture_latency_frames: u32,
    /// Every n-th requested texture fails. 0 disables failures.
    pub failure_every: u32,
}

impl Default for PyramidConfig {
    fn default() -> Self {
        Self {
            level_min: 0,
            level_max: 10,
            depth_far: 10_000.0,
            prefetch_children: true,
            max_tiles_per_level: None,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            frames: 120,
            start_fov: 90.0,
            end_fov: 2.0,
            texture_latency_frames: 3,
            failure_every: 0,
        }
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join("config.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Returns `Some(new_config)` if the file on disk differs from `self`.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join("config.ron");
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let ron_str =
            ron::ser::to_string_pretty(&Config::default(), ron::ser::PrettyConfig::new().depth_limit(3))
                .unwrap();
        assert!(ron_str.contains("level_max: 10"));
        assert!(ron_str.contains("background: Pyramid"));
    }

    #[test]
    fn test_missing_section_uses_default() {
        let config: Config = ron::from_str("(pyramid: (level_max: 6))").unwrap();
        assert_eq!(config.pyramid.level_max, 6);
        assert_eq!(config.pyramid.depth_far, 10_000.0);
        assert_eq!(config.demo, DemoConfig::default());
    }

    #[test]
    fn test_extra_field_ignored() {
        let result: Result<Config, _> = ron::from_str("(future_setting: true)");
        assert!(result.is_ok());
    }

    #[test]
    fn test_cache_cap_parses() {
        let config: Config =
            ron::from_str("(pyramid: (max_tiles_per_level: Some(64)), background: Cubemap)").unwrap();
        assert_eq!(config.pyramid.max_tiles_per_level, Some(64));
        assert_eq!(config.background, BackgroundKind::Cubemap);
    }

    #[test]
    fn test_level_range_validates() {
        let range = PyramidConfig::default().level_range().unwrap();
        assert_eq!((range.min(), range.max()), (0, 10));

        let inverted = PyramidConfig {
            level_min: 5,
            level_max: 2,
            ..PyramidConfig::default()
        };
        assert!(matches!(inverted.level_range(), Err(ConfigError::InvalidLevels(_))));
    }

    #[test]
    fn test_depth_far_must_be_positive() {
        assert!(PyramidConfig::default().validate().is_ok());
        for depth_far in [0.0, -5.0, f32::NAN, f32::INFINITY] {
            let config = PyramidConfig {
                depth_far,
                ..PyramidConfig::default()
            };
            assert!(
                matches!(config.validate(), Err(ConfigError::InvalidDepthFar(_))),
                "{depth_far}"
            );
        }
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.pyramid.level_max = 8;
        config.demo.failure_every = 7;

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert!(dir.path().join("config.ron").exists());
    }

    #[test]
    fn test_reload_detects_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();

        let mut modified = config.clone();
        modified.pyramid.prefetch_children = false;
        modified.save(dir.path()).unwrap();

        let reloaded = config.reload(dir.path()).unwrap().unwrap();
        assert!(!reloaded.pyramid.prefetch_children);
        assert!(modified.reload(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_invalid_ron_produces_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.ron"), "{{not valid}}").unwrap();
        assert!(matches!(
            Config::load_or_create(dir.path()),
            Err(ConfigError::ParseError(_))
        ));
    }
}
