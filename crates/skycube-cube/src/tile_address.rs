//! Pyramid tile addresses, their packed cache keys, and the level range they live in.

use crate::CubeFace;

/// Errors raised when building addresses or level ranges from untrusted values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    /// `x` or `y` lies outside `[0, 2^level)`.
    #[error("tile coordinate ({x}, {y}) out of range for level {level}")]
    InvalidTileCoordinate {
        /// Requested level.
        level: u8,
        /// Requested column.
        x: u32,
        /// Requested row.
        y: u32,
    },

    /// The level exceeds [`TileAddress::MAX_LEVEL`].
    #[error("level {0} exceeds the addressable maximum {max}", max = TileAddress::MAX_LEVEL)]
    LevelTooDeep(u8),

    /// `min > max` or `max` is not addressable.
    #[error("invalid level range {min}..={max}")]
    InvalidLevelRange {
        /// Requested minimum level.
        min: u8,
        /// Requested maximum level.
        max: u8,
    },
}

/// Inclusive range of pyramid levels a renderer works with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LevelRange {
    min: u8,
    max: u8,
}

impl LevelRange {
    /// Create a range, validating `min <= max <= TileAddress::MAX_LEVEL`.
    pub fn new(min: u8, max: u8) -> Result<Self, AddressError> {
        if min > max || max > TileAddress::MAX_LEVEL {
            return Err(AddressError::InvalidLevelRange { min, max });
        }
        Ok(Self { min, max })
    }

    /// Coarsest level.
    #[must_use]
    pub fn min(&self) -> u8 {
        self.min
    }

    /// Finest level.
    #[must_use]
    pub fn max(&self) -> u8 {
        self.max
    }

    /// Clamp any signed level into the range.
    #[must_use]
    pub fn clamp(&self, level: i64) -> u8 {
        level.clamp(self.min as i64, self.max as i64) as u8
    }

    /// Whether `level` lies inside the range.
    #[must_use]
    pub fn contains(&self, level: u8) -> bool {
        (self.min..=self.max).contains(&level)
    }

    /// Iterate the levels from coarsest to finest.
    pub fn levels(&self) -> impl Iterator<Item = u8> {
        self.min..=self.max
    }
}

impl Default for LevelRange {
    fn default() -> Self {
        Self { min: 0, max: 10 }
    }
}

/// Identifies one tile of the pyramid.
///
/// At `level` each face is split into a `2^level × 2^level` grid. `x` grows
/// along the face tangent, `y` grows downward like image rows.
///
/// Fields are private: every address is built through [`TileAddress::new`]
/// or [`TileAddress::try_new`], so coordinates always fit their level and
/// [`TileAddress::key`] stays a bijection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileAddress {
    level: u8,
    face: CubeFace,
    x: u32,
    y: u32,
}

impl TileAddress {
    /// Deepest level the packed [`TileKey`] can represent.
    pub const MAX_LEVEL: u8 = 24;

    /// Number of tiles along one face axis at `level`.
    #[must_use]
    pub fn tiles_per_axis(level: u8) -> u32 {
        1u32 << level
    }

    /// Construct an address, asserting that the coordinates fit the level.
    ///
    /// # Panics
    ///
    /// Panics if `level` exceeds [`Self::MAX_LEVEL`] or `x`/`y` are out of range.
    #[must_use]
    pub fn new(level: u8, face: CubeFace, x: u32, y: u32) -> Self {
        match Self::try_new(level, face, x, y) {
            Ok(address) => address,
            Err(e) => panic!("{e}"),
        }
    }

    /// Construct an address, reporting out-of-range coordinates as an error.
    pub fn try_new(level: u8, face: CubeFace, x: u32, y: u32) -> Result<Self, AddressError> {
        if level > Self::MAX_LEVEL {
            return Err(AddressError::LevelTooDeep(level));
        }
        let size = Self::tiles_per_axis(level);
        if x >= size || y >= size {
            return Err(AddressError::InvalidTileCoordinate { level, x, y });
        }
        Ok(Self { level, face, x, y })
    }

    /// Subdivision depth (0 = one tile per face).
    #[must_use]
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Which cube face the tile belongs to.
    #[must_use]
    pub fn face(&self) -> CubeFace {
        self.face
    }

    /// Column within the face grid.
    #[must_use]
    pub fn x(&self) -> u32 {
        self.x
    }

    /// Row within the face grid.
    #[must_use]
    pub fn y(&self) -> u32 {
        self.y
    }

    /// The canonical cache key of this address.
    #[must_use]
    pub fn key(&self) -> TileKey {
        TileKey(
            (self.level as u64) << 56
                | (self.face as u64) << 48
                | (self.y as u64) << 24
                | self.x as u64,
        )
    }

    /// The tile one level coarser covering this one.
    ///
    /// Returns `None` at the coarsest level of `range`.
    #[must_use]
    pub fn parent(&self, range: LevelRange) -> Option<TileAddress> {
        if self.level <= range.min() {
            return None;
        }
        Some(TileAddress {
            level: self.level - 1,
            face: self.face,
            x: self.x / 2,
            y: self.y / 2,
        })
    }

    /// The four tiles one level finer, ordered `(2x,2y), (2x+1,2y), (2x,2y+1), (2x+1,2y+1)`.
    ///
    /// Returns `None` at the finest level of `range`.
    #[must_use]
    pub fn children(&self, range: LevelRange) -> Option<[TileAddress; 4]> {
        if self.level >= range.max() {
            return None;
        }
        Some(self.subdivide())
    }

    /// The four tiles one level finer, ignoring any level range.
    ///
    /// # Panics
    ///
    /// Panics at [`Self::MAX_LEVEL`].
    #[must_use]
    pub fn subdivide(&self) -> [TileAddress; 4] {
        let level = self.level + 1;
        let cx = self.x * 2;
        let cy = self.y * 2;
        [
            TileAddress::new(level, self.face, cx, cy),
            TileAddress::new(level, self.face, cx + 1, cy),
            TileAddress::new(level, self.face, cx, cy + 1),
            TileAddress::new(level, self.face, cx + 1, cy + 1),
        ]
    }

    /// Ancestors from the direct parent up to the coarsest level of `range`.
    pub fn ancestors(&self, range: LevelRange) -> impl Iterator<Item = TileAddress> {
        std::iter::successors(self.parent(range), move |a| a.parent(range))
    }

    /// Whether `self` lies inside `other`'s region (or is `other`).
    #[must_use]
    pub fn is_within(&self, other: &TileAddress) -> bool {
        if self.face != other.face || self.level < other.level {
            return false;
        }
        let shift = self.level - other.level;
        self.x >> shift == other.x && self.y >> shift == other.y
    }

    /// `[u_min, v_min, u_max, v_max]` of this tile on its face, all in `[0, 1]`.
    #[must_use]
    pub fn uv_bounds(&self) -> [f32; 4] {
        let size = Self::tiles_per_axis(self.level) as f32;
        [
            self.x as f32 / size,
            self.y as f32 / size,
            (self.x + 1) as f32 / size,
            (self.y + 1) as f32 / size,
        ]
    }

    /// Default human readable tile name.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{}-{}-{}-{}", self.face.code(), self.level, self.x, self.y)
    }
}

impl std::fmt::Display for TileAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "(level={}, face={:?}, x={}, y={})",
            self.level, self.face, self.x, self.y
        )
    }
}

/// Packed, directly hashable encoding of a [`TileAddress`].
///
/// Layout: `level:8 | face:8 | y:24 | x:24`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey(u64);

impl TileKey {
    const COORD_MASK: u64 = (1 << 24) - 1;

    /// The raw packed value.
    #[must_use]
    pub fn raw(self) -> u64 {
        self.0
    }

    /// Decode the key back into its address.
    #[must_use]
    pub fn address(self) -> TileAddress {
        let face = CubeFace::from_index((self.0 >> 48) as u8)
            .unwrap_or_else(|| unreachable!("keys are only built from valid addresses"));
        TileAddress {
            level: (self.0 >> 56) as u8,
            face,
            x: (self.0 & Self::COORD_MASK) as u32,
            y: ((self.0 >> 24) & Self::COORD_MASK) as u32,
        }
    }
}

impl From<TileAddress> for TileKey {
    fn from(address: TileAddress) -> Self {
        address.key()
    }
}
