//! Per-level pyramid geometry: tile counts, tile sizes, and tile bounds.

use glam::Vec3;

use crate::{Aabb, TileAddress};

/// Pure size computations for a cube of fixed edge length.
///
/// The edge length is twice the scene's far render depth so the background
/// always encloses every foreground object.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PyramidGeometry {
    cube_size: f32,
}

impl PyramidGeometry {
    /// Geometry for a cube of the given edge length.
    ///
    /// # Panics
    ///
    /// Panics if `cube_size` is not a positive finite number.
    pub fn new(cube_size: f32) -> Self {
        assert!(
            cube_size.is_finite() && cube_size > 0.0,
            "cube size must be positive, got {cube_size}"
        );
        Self { cube_size }
    }

    /// Geometry enclosing a scene rendered up to `depth_far`.
    pub fn from_depth_far(depth_far: f32) -> Self {
        Self::new(2.0 * depth_far)
    }

    /// Edge length of the whole cube.
    pub fn cube_size(&self) -> f32 {
        self.cube_size
    }

    /// `2^level`
    pub fn nb_tiles_per_axis(level: u8) -> u32 {
        TileAddress::tiles_per_axis(level)
    }

    /// Tiles on one face at `level`: `4^level`.
    pub fn nb_tiles(level: u8) -> u64 {
        let tpa = Self::nb_tiles_per_axis(level) as u64;
        tpa * tpa
    }

    /// Edge length of one tile at `level`.
    pub fn tile_size(&self, level: u8) -> f32 {
        self.cube_size / Self::nb_tiles_per_axis(level) as f32
    }

    /// The four corners of a tile on the cube surface, in `x`/`y` order
    /// `(u_min, v_min), (u_max, v_min), (u_min, v_max), (u_max, v_max)`.
    pub fn tile_corners(&self, address: &TileAddress) -> [Vec3; 4] {
        let half = self.cube_size * 0.5;
        let face = address.face();
        let center = face.normal() * half;
        let [u0, v0, u1, v1] = address.uv_bounds();
        let point = |u: f32, v: f32| {
            center + face.tangent() * (u * 2.0 - 1.0) * half
                - face.bitangent() * (v * 2.0 - 1.0) * half
        };
        [point(u0, v0), point(u1, v0), point(u0, v1), point(u1, v1)]
    }

    /// Bounding box of a tile. Flat along its face normal.
    pub fn tile_bounds(&self, address: &TileAddress) -> Aabb {
        Aabb::from_points(&self.tile_corners(address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CubeFace, LevelRange};

    const DEPTH_FAR: f32 = 10_000.0;

    #[test]
    fn test_tiles_per_axis_and_size_cover_cube() {
        let geometry = PyramidGeometry::from_depth_far(DEPTH_FAR);
        for level in 0..=10u8 {
            let tpa = PyramidGeometry::nb_tiles_per_axis(level);
            assert_eq!(tpa, 2u32.pow(level as u32));
            assert_eq!(PyramidGeometry::nb_tiles(level), 4u64.pow(level as u32));
            let covered = geometry.tile_size(level) * tpa as f32;
            assert!(
                (covered - geometry.cube_size()).abs() < 1e-3,
                "level {level}: {covered} != {}",
                geometry.cube_size()
            );
        }
    }

    #[test]
    fn test_level_zero_tile_is_whole_face() {
        let geometry = PyramidGeometry::from_depth_far(DEPTH_FAR);
        for face in CubeFace::ALL {
            let bounds = geometry.tile_bounds(&TileAddress::new(0, face, 0, 0));
            let expected_center = face.normal() * DEPTH_FAR;
            assert!((bounds.center() - expected_center).length() < 1e-2);
            let extents = bounds.extents();
            assert!((extents.dot(face.normal()).abs()) < 1e-3, "face should be flat");
            assert!((extents.length() - DEPTH_FAR * 2f32.sqrt()).abs() < 1e-1);
        }
    }

    #[test]
    fn test_first_tile_is_top_left_of_front_face() {
        let geometry = PyramidGeometry::new(2.0);
        let bounds = geometry.tile_bounds(&TileAddress::new(1, CubeFace::Front, 0, 0));
        assert_eq!(bounds.min, Vec3::new(-1.0, 0.0, -1.0));
        assert_eq!(bounds.max, Vec3::new(0.0, 1.0, -1.0));
    }

    #[test]
    fn test_child_bounds_inside_parent() {
        let geometry = PyramidGeometry::from_depth_far(DEPTH_FAR);
        let range = LevelRange::default();
        let parent = TileAddress::new(2, CubeFace::Down, 1, 3);
        let parent_bounds = geometry.tile_bounds(&parent);
        for child in parent.children(range).unwrap() {
            for corner in geometry.tile_corners(&child) {
                let inside = corner.cmpge(parent_bounds.min - Vec3::splat(1e-2)).all()
                    && corner.cmple(parent_bounds.max + Vec3::splat(1e-2)).all();
                assert!(inside, "{child} escapes {parent}");
            }
        }
    }

    #[test]
    #[should_panic(expected = "cube size must be positive")]
    fn test_zero_cube_size_panics() {
        let _ = PyramidGeometry::new(0.0);
    }
}
