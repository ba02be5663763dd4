//! Pyramid error types.

use skycube_cube::AddressError;

/// Errors raised by the tile cache, resolver, and renderers.
///
/// Texture failures are not errors: they put the tile into
/// [`TextureState::Failed`](crate::TextureState::Failed) and the region falls
/// back to a coarser ancestor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PyramidError {
    /// Bad coordinates or level bounds.
    #[error(transparent)]
    Address(#[from] AddressError),

    /// A tile was requested at a level outside the pyramid's range.
    #[error("level {level} is outside the pyramid range {min}..={max}")]
    LevelOutsidePyramid {
        /// Requested level.
        level: u8,
        /// Coarsest level of the pyramid.
        min: u8,
        /// Finest level of the pyramid.
        max: u8,
    },

    /// The renderer or its cache was used after `destroy()`.
    #[error("tile pyramid used after destroy()")]
    UseAfterDestroy,

    /// `render()` was called before `boot()`.
    #[error("tile pyramid rendered before boot()")]
    NotBooted,
}
