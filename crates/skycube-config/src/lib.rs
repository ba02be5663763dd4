//! Configuration for the skycube background.
//!
//! Settings persist to disk as `config.ron` and can be overridden from the
//! command line. Unknown fields are ignored and missing ones take defaults,
//! so older and newer files both load.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{BackgroundKind, Config, DebugConfig, DemoConfig, PyramidConfig};
pub use error::ConfigError;

/// Default config directory: `<platform config dir>/skycube`.
pub fn default_config_dir() -> Option<std::path::PathBuf> {
    dirs::config_dir().map(|dir| dir.join("skycube"))
}
