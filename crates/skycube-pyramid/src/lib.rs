//! Level-of-detail tile pyramid for panoramic cube backgrounds.
//!
//! Maps camera field of view to a pyramid level, memoizes tiles per level,
//! culls them against the view frustum, and resolves tiles whose texture is
//! still streaming by falling back to the nearest loaded ancestor.

mod background;
mod cache;
mod camera;
mod cubemap;
mod draw_set;
mod error;
mod level;
mod renderer;
mod resolver;
mod scene;
mod texture;
mod tile;
mod visibility;

#[cfg(test)]
pub(crate) mod testing;

pub use background::{Background, BackgroundKind, BackgroundRenderer};
pub use cache::TileCache;
pub use camera::{BackgroundCamera, FovChanged, FovSubscription, PanoramaCamera};
pub use cubemap::CubemapRenderer;
pub use draw_set::DrawSet;
pub use error::PyramidError;
pub use level::{LevelSelector, fov_to_level, level_to_fov};
pub use renderer::{FrameStats, PyramidRenderer, PyramidSettings};
pub use resolver::{Resolution, TileResolver};
pub use scene::TileScene;
pub use texture::{TextureEvent, TextureOutcome, TextureStatus, TextureStore, texture_channel};
pub use tile::{TextureHandle, TextureState, Tile};
pub use visibility::{Frustum, VisibilityFilter};

pub use skycube_cube::{Aabb, CubeFace, LevelRange, PyramidGeometry, TileAddress, TileKey};
