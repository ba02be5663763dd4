//! Single-resolution cube background: six face tiles, no level of detail.

use std::collections::BTreeSet;

use crossbeam_channel::Receiver;
use skycube_cube::{CubeFace, PyramidGeometry, TileAddress};

use crate::resolver::request;
use crate::{
    BackgroundCamera, DrawSet, FrameStats, PyramidError, PyramidSettings, TextureEvent,
    TextureState, TextureStore, TileCache, TileScene, VisibilityFilter,
};

/// Draws the coarsest level of the pyramid only, whatever the field of view.
///
/// Cells whose texture is not ready are simply left out.
pub struct CubemapRenderer<S, T> {
    level: u8,
    geometry: PyramidGeometry,
    cache: TileCache,
    draw_set: DrawSet,
    scene: S,
    store: T,
    texture_events: Receiver<TextureEvent>,
    frame: u64,
    booted: bool,
}

impl<S: TileScene, T: TextureStore> CubemapRenderer<S, T> {
    /// Create a renderer for the coarsest level of `settings.levels`.
    pub fn new(
        settings: &PyramidSettings,
        scene: S,
        store: T,
        texture_events: Receiver<TextureEvent>,
    ) -> Self {
        let geometry = PyramidGeometry::from_depth_far(settings.depth_far);
        Self {
            level: settings.levels.min(),
            geometry,
            cache: TileCache::new(settings.levels, geometry),
            draw_set: DrawSet::default(),
            scene,
            store,
            texture_events,
            frame: 0,
            booted: false,
        }
    }

    /// Create every tile of the level and request its texture.
    pub fn boot(&mut self, _camera: &mut dyn BackgroundCamera) -> Result<(), PyramidError> {
        if self.cache.is_destroyed() {
            return Err(PyramidError::UseAfterDestroy);
        }
        if self.booted {
            return Ok(());
        }
        log::info!("Booting cubemap renderer at level {}", self.level);
        let tiles_per_axis = PyramidGeometry::nb_tiles_per_axis(self.level);
        for face in CubeFace::ALL {
            for y in 0..tiles_per_axis {
                for x in 0..tiles_per_axis {
                    let address = TileAddress::new(self.level, face, x, y);
                    let tile = self.cache.get_or_create(&mut self.scene, None, address, None)?;
                    request(tile, &mut self.store);
                }
            }
        }
        self.booted = true;
        Ok(())
    }

    /// Draw the visible tiles whose textures are ready.
    pub fn render(&mut self, camera: &dyn BackgroundCamera) -> Result<FrameStats, PyramidError> {
        if self.cache.is_destroyed() {
            return Err(PyramidError::UseAfterDestroy);
        }
        if !self.booted {
            return Err(PyramidError::NotBooted);
        }
        self.frame += 1;
        for event in self.texture_events.try_iter() {
            self.cache.apply_texture_event(&event)?;
        }

        let view_projection = camera.view_projection();
        let filter = VisibilityFilter::new(&view_projection, self.geometry);
        let visible = filter.visible_addresses(self.level);

        let mut draw = BTreeSet::new();
        let (mut pending, mut failed) = (0, 0);
        for address in &visible {
            match self.cache.get(address)?.map(|tile| tile.state()) {
                Some(TextureState::Ready(_)) => {
                    draw.insert(*address);
                }
                Some(TextureState::Failed) => failed += 1,
                _ => pending += 1,
            }
        }

        let (added, removed) = self.draw_set.update(draw, &self.cache, &mut self.scene)?;
        self.scene.present(&view_projection);

        Ok(FrameStats {
            frame: self.frame,
            level: self.level,
            visible: visible.len(),
            drawn: self.draw_set.len(),
            added,
            removed,
            pending,
            failed,
            cached: self.cache.len(),
        })
    }

    /// Clear the draw set and drop every tile.
    pub fn destroy(&mut self, _camera: &mut dyn BackgroundCamera) {
        if self.cache.is_destroyed() {
            return;
        }
        if let Err(e) = self.draw_set.clear(&self.cache, &mut self.scene) {
            log::warn!("Failed to clear draw set on destroy: {e}");
        }
        for address in self.cache.destroy() {
            self.scene.release(address);
        }
        log::info!("Destroyed cubemap renderer");
    }

    /// The drawing collaborator.
    pub fn scene(&self) -> &S {
        &self.scene
    }

    /// Tiles currently handed to the scene.
    pub fn draw_set(&self) -> &DrawSet {
        &self.draw_set
    }
}
