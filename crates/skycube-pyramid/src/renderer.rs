//! The pyramid background renderer: owns the cache and drives each frame.

use crossbeam_channel::Receiver;
use skycube_cube::{CubeFace, LevelRange, PyramidGeometry, TileAddress};

use crate::{
    BackgroundCamera, DrawSet, FovChanged, FovSubscription, LevelSelector, PyramidError,
    TextureEvent, TextureOutcome, TextureStore, Tile, TileCache, TileResolver, TileScene,
    VisibilityFilter,
};

/// Construction parameters of a [`PyramidRenderer`].
#[derive(Clone, Debug, PartialEq)]
pub struct PyramidSettings {
    /// Coarsest and finest pyramid levels.
    pub levels: LevelRange,
    /// Far render depth of the scene; the cube edge is twice this.
    pub depth_far: f32,
    /// Create and request the children of visible cells ahead of zooming in.
    pub prefetch_children: bool,
    /// Per-level cache cap. `None` keeps every tile for the renderer's lifetime.
    pub max_tiles_per_level: Option<usize>,
}

impl Default for PyramidSettings {
    fn default() -> Self {
        Self {
            levels: LevelRange::default(),
            depth_far: 10_000.0,
            prefetch_children: true,
            max_tiles_per_level: None,
        }
    }
}

/// Diagnostics for one rendered frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frame counter, starting at 1.
    pub frame: u64,
    /// Level the frame was resolved at.
    pub level: u8,
    /// Visible cells at that level.
    pub visible: usize,
    /// Tiles in the draw set after the frame.
    pub drawn: usize,
    /// Tiles added to the scene this frame.
    pub added: usize,
    /// Tiles removed from the scene this frame.
    pub removed: usize,
    /// Visible cells with nothing to draw yet.
    pub pending: usize,
    /// Visible cells whose own texture failed.
    pub failed: usize,
    /// Tiles held by the cache after the frame.
    pub cached: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Lifecycle {
    Created,
    Booted,
    Destroyed,
}

/// Level-of-detail background built from a pyramid of cube tiles.
///
/// Single threaded: camera and texture notifications are queued on channels
/// and only applied at the start of the next [`PyramidRenderer::render`].
pub struct PyramidRenderer<S, T> {
    settings: PyramidSettings,
    geometry: PyramidGeometry,
    selector: LevelSelector,
    cache: TileCache,
    resolver: TileResolver,
    draw_set: DrawSet,
    scene: S,
    store: T,
    texture_events: Receiver<TextureEvent>,
    fov_events: Option<Receiver<FovChanged>>,
    subscription: Option<FovSubscription>,
    frame: u64,
    lifecycle: Lifecycle,
}

impl<S: TileScene, T: TextureStore> PyramidRenderer<S, T> {
    /// Create a renderer drawing into `scene` with textures from `store`.
    ///
    /// `texture_events` is the receiving half of [`texture_channel`](crate::texture_channel);
    /// the store owns the sender.
    pub fn new(
        settings: PyramidSettings,
        scene: S,
        store: T,
        texture_events: Receiver<TextureEvent>,
    ) -> Self {
        let geometry = PyramidGeometry::from_depth_far(settings.depth_far);
        Self {
            geometry,
            selector: LevelSelector::new(settings.levels),
            cache: TileCache::new(settings.levels, geometry),
            resolver: TileResolver::new(settings.prefetch_children),
            draw_set: DrawSet::default(),
            scene,
            store,
            texture_events,
            fov_events: None,
            subscription: None,
            frame: 0,
            lifecycle: Lifecycle::Created,
            settings,
        }
    }

    fn ensure_alive(&self) -> Result<(), PyramidError> {
        match self.lifecycle {
            Lifecycle::Destroyed => Err(PyramidError::UseAfterDestroy),
            _ => Ok(()),
        }
    }

    /// Select the initial level, subscribe to field of view changes, and
    /// create every tile of the initial level.
    pub fn boot(&mut self, camera: &mut dyn BackgroundCamera) -> Result<(), PyramidError> {
        self.ensure_alive()?;
        if self.lifecycle == Lifecycle::Booted {
            log::debug!("Pyramid renderer already booted");
            return Ok(());
        }
        log::info!(
            "Booting pyramid renderer (levels {}..={}, cube size {})",
            self.settings.levels.min(),
            self.settings.levels.max(),
            self.geometry.cube_size()
        );

        let level = self.selector.fov_to_level(camera.fov());
        self.selector.select_level(level as i64);

        let (sender, receiver) = crossbeam_channel::unbounded();
        self.subscription = Some(camera.subscribe(sender));
        self.fov_events = Some(receiver);

        let range = self.settings.levels;
        let tiles_per_axis = PyramidGeometry::nb_tiles_per_axis(level);
        for face in CubeFace::ALL {
            for y in 0..tiles_per_axis {
                for x in 0..tiles_per_axis {
                    let address = TileAddress::new(level, face, x, y);
                    self.cache
                        .get_or_create(&mut self.scene, address.parent(range), address, None)?;
                }
            }
        }

        self.lifecycle = Lifecycle::Booted;
        Ok(())
    }

    /// Apply queued field of view changes. Returns the new level if it changed.
    ///
    /// Only updates the selected level; the scene is untouched until the next frame.
    pub fn poll_camera_events(&mut self) -> Result<Option<u8>, PyramidError> {
        self.ensure_alive()?;
        let Some(events) = &self.fov_events else {
            return Ok(None);
        };
        let mut changed = None;
        for FovChanged { fov } in events.try_iter() {
            if let Some(level) = self.selector.on_fov_changed(fov) {
                changed = Some(level);
            }
        }
        Ok(changed)
    }

    /// Apply queued texture verdicts. Returns how many tiles changed state.
    ///
    /// Verdicts for tiles that are not visible are still recorded; none of
    /// them touches the scene.
    pub fn poll_texture_events(&mut self) -> Result<usize, PyramidError> {
        self.ensure_alive()?;
        let mut applied = 0;
        for event in self.texture_events.try_iter() {
            if let Some(tile) = self.cache.apply_texture_event(&event)? {
                applied += 1;
                if let TextureOutcome::Failed(reason) = &event.outcome {
                    log::warn!(
                        "Texture for tile {} failed ({reason}), falling back to ancestors",
                        tile.name()
                    );
                } else {
                    log::trace!("Texture ready for tile {}", tile.name());
                }
            }
        }
        Ok(applied)
    }

    /// Resolve the visible tiles for `camera`, update the scene's draw set,
    /// and hand over to the scene's render step.
    pub fn render(&mut self, camera: &dyn BackgroundCamera) -> Result<FrameStats, PyramidError> {
        self.ensure_alive()?;
        if self.lifecycle != Lifecycle::Booted {
            return Err(PyramidError::NotBooted);
        }
        self.frame += 1;
        self.poll_camera_events()?;
        self.poll_texture_events()?;

        let level = self.selector.level();
        let view_projection = camera.view_projection();
        let filter = VisibilityFilter::new(&view_projection, self.geometry);
        let resolution = self.resolver.resolve(
            level,
            &filter,
            &mut self.cache,
            &mut self.scene,
            &mut self.store,
            self.frame,
        )?;

        let (added, removed) =
            self.draw_set
                .update(resolution.draw, &self.cache, &mut self.scene)?;

        if let Some(cap) = self.settings.max_tiles_per_level {
            for level in self.settings.levels.levels() {
                self.cache.evict(
                    &mut self.scene,
                    level,
                    cap,
                    self.frame,
                    self.draw_set.addresses(),
                )?;
            }
        }

        self.scene.present(&view_projection);

        Ok(FrameStats {
            frame: self.frame,
            level,
            visible: resolution.visible.len(),
            drawn: self.draw_set.len(),
            added,
            removed,
            pending: resolution.pending,
            failed: resolution.failed,
            cached: self.cache.len(),
        })
    }

    /// Explicitly select a level. Out-of-range values are clamped.
    pub fn select_level(&mut self, level: i64) -> Result<u8, PyramidError> {
        self.ensure_alive()?;
        Ok(self.selector.select_level(level))
    }

    /// Fetch or create a tile through the cache.
    pub fn tile(
        &mut self,
        address: TileAddress,
        name: Option<&str>,
    ) -> Result<&Tile, PyramidError> {
        let parent = address.parent(self.settings.levels);
        let tile = self
            .cache
            .get_or_create(&mut self.scene, parent, address, name)?;
        Ok(&*tile)
    }

    /// Unsubscribe from the camera, clear the draw set, and drop every tile.
    ///
    /// Further cache or render calls fail with [`PyramidError::UseAfterDestroy`].
    pub fn destroy(&mut self, camera: &mut dyn BackgroundCamera) {
        if self.lifecycle == Lifecycle::Destroyed {
            return;
        }
        if let Some(subscription) = self.subscription.take() {
            camera.unsubscribe(subscription);
        }
        self.fov_events = None;
        if let Err(e) = self.draw_set.clear(&self.cache, &mut self.scene) {
            log::warn!("Failed to clear draw set on destroy: {e}");
        }
        let released = self.cache.destroy();
        for address in &released {
            self.scene.release(*address);
        }
        self.lifecycle = Lifecycle::Destroyed;
        log::info!("Destroyed pyramid renderer, released {} tiles", released.len());
    }

    /// Currently selected level.
    pub fn level(&self) -> u8 {
        self.selector.level()
    }

    /// Pyramid bounds.
    pub fn levels(&self) -> LevelRange {
        self.settings.levels
    }

    /// Cube geometry.
    pub fn geometry(&self) -> PyramidGeometry {
        self.geometry
    }

    /// The tile cache.
    pub fn cache(&self) -> &TileCache {
        &self.cache
    }

    /// Tiles currently handed to the scene.
    pub fn draw_set(&self) -> &DrawSet {
        &self.draw_set
    }

    /// The drawing collaborator.
    pub fn scene(&self) -> &S {
        &self.scene
    }

    /// Mutable access to the drawing collaborator.
    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    /// The texture store.
    pub fn texture_store(&self) -> &T {
        &self.store
    }

    /// Mutable access to the texture store.
    pub fn texture_store_mut(&mut self) -> &mut T {
        &mut self.store
    }

    /// Whether [`PyramidRenderer::destroy`] ran.
    pub fn is_destroyed(&self) -> bool {
        self.lifecycle == Lifecycle::Destroyed
    }
}

#[cfg(test)]
#[path = "renderer_tests.rs"]
mod tests;
