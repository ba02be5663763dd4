//! Configuration error types.

use skycube_cube::AddressError;

/// Errors that can occur when loading, saving, or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the config file from disk.
    #[error("failed to read config: {0}")]
    ReadError(#[source] std::io::Error),

    /// Failed to write the config file to disk.
    #[error("failed to write config: {0}")]
    WriteError(#[source] std::io::Error),

    /// Failed to parse RON content.
    #[error("failed to parse config: {0}")]
    ParseError(#[source] ron::error::SpannedError),

    /// Failed to serialize config to RON.
    #[error("failed to serialize config: {0}")]
    SerializeError(#[source] ron::Error),

    /// The configured pyramid levels are unusable.
    #[error("invalid pyramid levels: {0}")]
    InvalidLevels(#[source] AddressError),

    /// `depth_far` must be finite and positive.
    #[error("invalid far depth {0}, expected a finite positive value")]
    InvalidDepthFar(f32),
}
