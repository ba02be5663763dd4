//! Cube background addressing: faces, pyramid tile addresses, and per-level geometry.

mod aabb;
mod cube_face;
mod geometry;
mod tile_address;

pub use aabb::Aabb;
pub use cube_face::CubeFace;
pub use geometry::PyramidGeometry;
pub use tile_address::{AddressError, LevelRange, TileAddress, TileKey};
