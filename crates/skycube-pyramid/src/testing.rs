//! Recording collaborators for tests.

use std::collections::BTreeSet;

use rustc_hash::{FxHashMap, FxHashSet};
use skycube_cube::TileAddress;

use crate::{TextureHandle, TextureStatus, TextureStore, Tile, TileScene};

/// Draw-set change seen by [`RecordingScene`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SceneEvent {
    Add(TileAddress),
    Remove(TileAddress),
}

/// Scene that records every call and checks the add/remove pairing.
#[derive(Default)]
pub struct RecordingScene {
    pub registered: Vec<TileAddress>,
    pub drawn: BTreeSet<TileAddress>,
    pub events: Vec<SceneEvent>,
    pub released: Vec<TileAddress>,
    pub presented: usize,
}

impl RecordingScene {
    pub fn take_events(&mut self) -> Vec<SceneEvent> {
        std::mem::take(&mut self.events)
    }
}

impl TileScene for RecordingScene {
    fn register(&mut self, tile: &Tile) {
        self.registered.push(tile.address());
    }

    fn add(&mut self, tile: &Tile) {
        assert!(tile.is_ready(), "added tile {} without texture", tile.address());
        assert!(self.drawn.insert(tile.address()), "{} added twice", tile.address());
        self.events.push(SceneEvent::Add(tile.address()));
    }

    fn remove(&mut self, tile: &Tile) {
        assert!(self.drawn.remove(&tile.address()), "{} removed but not drawn", tile.address());
        self.events.push(SceneEvent::Remove(tile.address()));
    }

    fn release(&mut self, address: TileAddress) {
        assert!(!self.drawn.contains(&address), "{address} released while drawn");
        self.released.push(address);
    }

    fn present(&mut self, _view_projection: &glam::Mat4) {
        self.presented += 1;
    }
}

/// Store with preset verdicts; everything else stays pending.
#[derive(Default)]
pub struct ScriptedTextureStore {
    pub ready: FxHashMap<TileAddress, TextureHandle>,
    pub failed: FxHashSet<TileAddress>,
    pub queries: Vec<TileAddress>,
}

impl ScriptedTextureStore {
    pub fn with_ready(addresses: impl IntoIterator<Item = TileAddress>) -> Self {
        let mut store = Self::default();
        for (i, address) in addresses.into_iter().enumerate() {
            store.ready.insert(address, TextureHandle(i as u64 + 1));
        }
        store
    }
}

impl TextureStore for ScriptedTextureStore {
    fn query(&mut self, address: TileAddress) -> TextureStatus {
        self.queries.push(address);
        if let Some(handle) = self.ready.get(&address) {
            TextureStatus::Ready(*handle)
        } else if self.failed.contains(&address) {
            TextureStatus::Failed
        } else {
            TextureStatus::Pending
        }
    }
}
