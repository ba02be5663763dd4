//! Contract with the asynchronous texture store.

use crossbeam_channel::{Receiver, Sender};
use skycube_cube::TileAddress;

use crate::TextureHandle;

/// What the store knows about one tile texture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TextureStatus {
    /// The store did not start loading (e.g. throttled); ask again later.
    NotRequested,
    /// Loading; the verdict will arrive as a [`TextureEvent`].
    Pending,
    /// Already loaded.
    Ready(TextureHandle),
    /// Permanently unavailable.
    Failed,
}

/// Final verdict for one texture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TextureOutcome {
    /// The texture is available.
    Ready(TextureHandle),
    /// The texture will never be available. Carries a reason for logs.
    Failed(String),
}

/// Asynchronous completion posted by the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextureEvent {
    /// Tile the texture belongs to.
    pub address: TileAddress,
    /// Verdict.
    pub outcome: TextureOutcome,
}

/// Source of tile textures.
///
/// Queries are idempotent: after a verdict, asking again for the same
/// address returns that verdict immediately.
pub trait TextureStore {
    /// Start (or check) loading the texture for `address`.
    fn query(&mut self, address: TileAddress) -> TextureStatus;
}

/// Channel carrying [`TextureEvent`]s from the store to a renderer.
pub fn texture_channel() -> (Sender<TextureEvent>, Receiver<TextureEvent>) {
    crossbeam_channel::unbounded()
}
