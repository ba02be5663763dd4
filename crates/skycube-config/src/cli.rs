//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::{BackgroundKind, Config};

/// Skycube command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "skycube", about = "Cube panorama background demo")]
pub struct CliArgs {
    /// Coarsest pyramid level.
    #[arg(long)]
    pub level_min: Option<u8>,

    /// Finest pyramid level.
    #[arg(long)]
    pub level_max: Option<u8>,

    /// Background renderer.
    #[arg(long, value_enum)]
    pub background: Option<BackgroundKind>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Frames to render.
    #[arg(long)]
    pub frames: Option<u32>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(min) = args.level_min {
            self.pyramid.level_min = min;
        }
        if let Some(max) = args.level_max {
            self.pyramid.level_max = max;
        }
        if let Some(kind) = args.background {
            self.background = kind;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
        if let Some(frames) = args.frames {
            self.demo.frames = frames;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs::parse_from(["skycube", "--level-max", "6", "--background", "cubemap"]);
        config.apply_cli_overrides(&args);
        assert_eq!(config.pyramid.level_max, 6);
        assert_eq!(config.background, BackgroundKind::Cubemap);
        // Non-overridden fields retain defaults
        assert_eq!(config.pyramid.level_min, 0);
        assert_eq!(config.debug.log_level, "info");
    }

    #[test]
    fn test_cli_no_override() {
        let mut config = Config::default();
        config.apply_cli_overrides(&CliArgs::default());
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_dir_flag() {
        let args = CliArgs::parse_from(["skycube", "--config", "/tmp/sky", "--frames", "10"]);
        assert_eq!(args.config, Some(PathBuf::from("/tmp/sky")));
        assert_eq!(args.frames, Some(10));
    }
}
