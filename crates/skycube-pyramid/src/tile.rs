//! Pyramid tiles and their texture readiness state machine.

use skycube_cube::{TileAddress, TileKey};

use crate::TextureOutcome;

/// Opaque handle to a texture owned by the texture store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

/// Texture readiness of one tile.
///
/// `Unrequested → Requested → Ready | Failed`. `Ready` and `Failed` are
/// terminal; a failed tile is never retried automatically.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureState {
    /// No query issued to the texture store yet.
    Unrequested,
    /// A query is outstanding.
    Requested,
    /// The texture is available; the tile is render-eligible.
    Ready(TextureHandle),
    /// The store reported a permanent failure.
    Failed,
}

/// One cell of the pyramid at a given face, level and coordinate.
///
/// Tiles are owned by the [`TileCache`](crate::TileCache). The parent link is
/// an address, not an owning reference; the parent may or may not be cached.
#[derive(Debug)]
pub struct Tile {
    address: TileAddress,
    parent: Option<TileAddress>,
    name: String,
    size: f32,
    serial: u64,
    state: TextureState,
    last_seen: u64,
}

impl Tile {
    pub(crate) fn new(
        serial: u64,
        address: TileAddress,
        parent: Option<TileAddress>,
        name: String,
        size: f32,
    ) -> Self {
        Self {
            address,
            parent,
            name,
            size,
            serial,
            state: TextureState::Unrequested,
            last_seen: 0,
        }
    }

    /// Position of the tile in the pyramid.
    pub fn address(&self) -> TileAddress {
        self.address
    }

    /// Cache key of the tile.
    pub fn key(&self) -> TileKey {
        self.address.key()
    }

    /// Address of the tile this one was created under, if any.
    pub fn parent(&self) -> Option<TileAddress> {
        self.parent
    }

    /// Display name given at creation.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Edge length of the tile in world units.
    pub fn size(&self) -> f32 {
        self.size
    }

    /// Creation number, unique within one cache. Equal serials mean the same instance.
    pub fn serial(&self) -> u64 {
        self.serial
    }

    /// Current texture readiness.
    pub fn state(&self) -> TextureState {
        self.state
    }

    /// Whether the tile can be drawn.
    pub fn is_ready(&self) -> bool {
        matches!(self.state, TextureState::Ready(_))
    }

    /// The texture to draw with, once ready.
    pub fn texture(&self) -> Option<TextureHandle> {
        match self.state {
            TextureState::Ready(handle) => Some(handle),
            _ => None,
        }
    }

    /// Finer tiles are drawn over coarser ones covering the same region.
    pub fn draw_order(&self) -> u8 {
        self.address.level()
    }

    /// Last frame in which the resolver looked at this tile.
    pub fn last_seen(&self) -> u64 {
        self.last_seen
    }

    pub(crate) fn touch(&mut self, frame: u64) {
        self.last_seen = self.last_seen.max(frame);
    }

    /// `Unrequested → Requested`. Returns false from any other state.
    pub(crate) fn mark_requested(&mut self) -> bool {
        if self.state != TextureState::Unrequested {
            return false;
        }
        self.state = TextureState::Requested;
        true
    }

    /// Apply a verdict from the texture store. Terminal states ignore it.
    ///
    /// Returns true if the state changed.
    pub(crate) fn apply(&mut self, outcome: &TextureOutcome) -> bool {
        match self.state {
            TextureState::Ready(_) | TextureState::Failed => false,
            TextureState::Unrequested | TextureState::Requested => {
                self.state = match outcome {
                    TextureOutcome::Ready(handle) => TextureState::Ready(*handle),
                    TextureOutcome::Failed(_) => TextureState::Failed,
                };
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skycube_cube::CubeFace;

    fn tile() -> Tile {
        let address = TileAddress::new(1, CubeFace::Front, 1, 0);
        Tile::new(7, address, Some(TileAddress::new(0, CubeFace::Front, 0, 0)), "t".into(), 5.0)
    }

    #[test]
    fn test_new_tile_is_unrequested() {
        let t = tile();
        assert_eq!(t.state(), TextureState::Unrequested);
        assert!(!t.is_ready());
        assert_eq!(t.texture(), None);
        assert_eq!(t.serial(), 7);
        assert_eq!(t.draw_order(), 1);
    }

    #[test]
    fn test_request_then_ready() {
        let mut t = tile();
        assert!(t.mark_requested());
        assert!(!t.mark_requested());
        assert_eq!(t.state(), TextureState::Requested);
        assert!(t.apply(&TextureOutcome::Ready(TextureHandle(3))));
        assert_eq!(t.texture(), Some(TextureHandle(3)));
    }

    #[test]
    fn test_failed_is_terminal() {
        let mut t = tile();
        t.mark_requested();
        assert!(t.apply(&TextureOutcome::Failed("404".into())));
        assert!(!t.apply(&TextureOutcome::Ready(TextureHandle(1))));
        assert_eq!(t.state(), TextureState::Failed);
        assert!(!t.mark_requested());
    }

    #[test]
    fn test_ready_ignores_late_verdicts() {
        let mut t = tile();
        t.apply(&TextureOutcome::Ready(TextureHandle(1)));
        assert!(!t.apply(&TextureOutcome::Failed("late".into())));
        assert_eq!(t.texture(), Some(TextureHandle(1)));
    }

    #[test]
    fn test_touch_keeps_latest_frame() {
        let mut t = tile();
        t.touch(5);
        t.touch(3);
        assert_eq!(t.last_seen(), 5);
    }
}
