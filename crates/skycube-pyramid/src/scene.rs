//! Contract with the drawing collaborator.

use glam::Mat4;
use skycube_cube::TileAddress;

use crate::Tile;

/// Receives tiles to draw. The pyramid never issues draw calls itself.
pub trait TileScene {
    /// A tile was created and may later be added to the draw set.
    fn register(&mut self, tile: &Tile);

    /// Start drawing `tile`.
    fn add(&mut self, tile: &Tile);

    /// Stop drawing `tile`.
    fn remove(&mut self, tile: &Tile);

    /// The tile was dropped from the cache and will not be referenced again.
    fn release(&mut self, _address: TileAddress) {}

    /// Draw the current set. Called once per frame after the set is updated.
    fn present(&mut self, _view_projection: &Mat4) {}
}
