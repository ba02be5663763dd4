//! The six faces of the background cube and their basis vectors.

use glam::Vec3;

/// The six faces of the cube the panorama is projected onto.
///
/// The camera looks down −Z with +Y up, so `Front` sits on the −Z side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum CubeFace {
    /// −Z face
    Front = 0,
    /// −X face
    Left = 1,
    /// +Z face
    Back = 2,
    /// +X face
    Right = 3,
    /// +Y face
    Up = 4,
    /// −Y face
    Down = 5,
}

impl CubeFace {
    /// All six faces in canonical order.
    pub const ALL: [CubeFace; 6] = [
        CubeFace::Front,
        CubeFace::Left,
        CubeFace::Back,
        CubeFace::Right,
        CubeFace::Up,
        CubeFace::Down,
    ];

    /// Face from its `repr(u8)` discriminant.
    #[must_use]
    pub fn from_index(index: u8) -> Option<CubeFace> {
        Self::ALL.get(index as usize).copied()
    }

    /// One-letter code used in tile display names.
    #[must_use]
    pub fn code(self) -> char {
        match self {
            CubeFace::Front => 'f',
            CubeFace::Left => 'l',
            CubeFace::Back => 'b',
            CubeFace::Right => 'r',
            CubeFace::Up => 'u',
            CubeFace::Down => 'd',
        }
    }

    /// The opposite face (e.g., `Front` → `Back`).
    #[must_use]
    pub fn opposite(self) -> CubeFace {
        match self {
            CubeFace::Front => CubeFace::Back,
            CubeFace::Back => CubeFace::Front,
            CubeFace::Left => CubeFace::Right,
            CubeFace::Right => CubeFace::Left,
            CubeFace::Up => CubeFace::Down,
            CubeFace::Down => CubeFace::Up,
        }
    }

    /// Outward-pointing unit normal: the direction from the cube center to this face.
    #[must_use]
    pub fn normal(self) -> Vec3 {
        match self {
            CubeFace::Front => Vec3::NEG_Z,
            CubeFace::Left => Vec3::NEG_X,
            CubeFace::Back => Vec3::Z,
            CubeFace::Right => Vec3::X,
            CubeFace::Up => Vec3::Y,
            CubeFace::Down => Vec3::NEG_Y,
        }
    }

    /// Direction of increasing tile `x` as seen from inside the cube.
    #[must_use]
    pub fn tangent(self) -> Vec3 {
        match self {
            CubeFace::Front => Vec3::X,
            CubeFace::Left => Vec3::NEG_Z,
            CubeFace::Back => Vec3::NEG_X,
            CubeFace::Right => Vec3::Z,
            CubeFace::Up => Vec3::X,
            CubeFace::Down => Vec3::X,
        }
    }

    /// "Up" on the face image. Tile `y` grows along the negated bitangent.
    #[must_use]
    pub fn bitangent(self) -> Vec3 {
        match self {
            CubeFace::Front | CubeFace::Left | CubeFace::Back | CubeFace::Right => Vec3::Y,
            CubeFace::Up => Vec3::Z,
            CubeFace::Down => Vec3::NEG_Z,
        }
    }
}

impl std::fmt::Display for CubeFace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}
