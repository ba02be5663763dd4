//! Frustum culling of pyramid tiles.
//!
//! The background cube sits on the far render boundary around a camera at its
//! center, so the near and far clip planes are not meaningful for it. The
//! frustum keeps the four side planes plus the plane through the eye, which
//! rejects everything behind the camera.

use glam::{Mat4, Vec3, Vec4};
use skycube_cube::{Aabb, CubeFace, PyramidGeometry, TileAddress};

use crate::Tile;

/// Plane indices into the frustum planes array.
const LEFT: usize = 0;
const RIGHT: usize = 1;
const BOTTOM: usize = 2;
const TOP: usize = 3;
const EYE: usize = 4;

/// The side planes of a view frustum and the eye plane, pointing inward.
#[derive(Clone, Debug)]
pub struct Frustum {
    /// Each `Vec4(a, b, c, d)` where `(a,b,c)` is the normalized inward
    /// normal and `d` is the signed distance term.
    planes: [Vec4; 5],
}

impl Frustum {
    /// Extract the planes from a combined view-projection matrix using the
    /// Griggs-Hartmann method. Independent of the depth convention.
    pub fn from_view_projection(vp: &Mat4) -> Self {
        let rows = [vp.row(0), vp.row(1), vp.row(3)];

        let mut planes = [Vec4::ZERO; 5];
        planes[LEFT] = rows[2] + rows[0];
        planes[RIGHT] = rows[2] - rows[0];
        planes[BOTTOM] = rows[2] + rows[1];
        planes[TOP] = rows[2] - rows[1];
        // clip w >= 0: in front of the eye
        planes[EYE] = rows[2];

        for plane in &mut planes {
            let len = plane.truncate().length();
            if len > 0.0 {
                *plane /= len;
            }
        }

        Self { planes }
    }

    /// Test whether an AABB is at least partially inside the frustum.
    ///
    /// Uses the p-vertex method: for each plane, the corner furthest along
    /// the plane normal must not be behind it. Conservative near the
    /// frustum edges, never rejects a visible box.
    pub fn intersects(&self, aabb: &Aabb) -> bool {
        self.planes.iter().all(|plane| {
            let normal = plane.truncate();
            let p = Vec3::select(normal.cmpge(Vec3::ZERO), aabb.max, aabb.min);
            normal.dot(p) + plane.w >= 0.0
        })
    }
}

/// Per-frame visibility test for tiles of one pyramid.
///
/// Rebuild it every frame: the camera orientation changes even when the
/// level does not.
pub struct VisibilityFilter {
    frustum: Frustum,
    geometry: PyramidGeometry,
}

impl VisibilityFilter {
    /// Create a filter from the camera's projection × view matrix.
    pub fn new(view_projection: &Mat4, geometry: PyramidGeometry) -> Self {
        Self {
            frustum: Frustum::from_view_projection(view_projection),
            geometry,
        }
    }

    /// Whether any part of the tile can be on screen.
    pub fn is_visible(&self, tile: &Tile) -> bool {
        self.is_address_visible(&tile.address())
    }

    /// Whether any part of the tile at `address` can be on screen.
    pub fn is_address_visible(&self, address: &TileAddress) -> bool {
        self.frustum.intersects(&self.geometry.tile_bounds(address))
    }

    /// Every visible tile at `level`, all faces.
    ///
    /// Descends from level 0 and skips the subtree of any invisible tile. A
    /// parent's bounds contain its children's, so the result equals testing
    /// each of the `6 × 4^level` cells individually.
    pub fn visible_addresses(&self, level: u8) -> Vec<TileAddress> {
        let mut visible = Vec::new();
        let mut stack: Vec<TileAddress> = CubeFace::ALL
            .iter()
            .rev()
            .map(|face| TileAddress::new(0, *face, 0, 0))
            .collect();

        while let Some(address) = stack.pop() {
            if !self.is_address_visible(&address) {
                continue;
            }
            if address.level() == level {
                visible.push(address);
            } else {
                stack.extend(address.subdivide().iter().rev());
            }
        }
        visible
    }
}
