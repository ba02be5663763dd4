//! Background renderer capability and the variants selectable at construction.

use crossbeam_channel::Receiver;

use crate::{
    BackgroundCamera, CubemapRenderer, FrameStats, PyramidError, PyramidRenderer,
    PyramidSettings, TextureEvent, TextureStore, TileScene,
};

/// Lifecycle shared by every background renderer.
pub trait BackgroundRenderer {
    /// Prepare the renderer for the given camera.
    fn boot(&mut self, camera: &mut dyn BackgroundCamera) -> Result<(), PyramidError>;

    /// Update the scene for one frame.
    fn render(&mut self, camera: &dyn BackgroundCamera) -> Result<FrameStats, PyramidError>;

    /// Release everything acquired in `boot`.
    fn destroy(&mut self, camera: &mut dyn BackgroundCamera);
}

/// Which background renderer to build.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BackgroundKind {
    /// Field of view driven tile pyramid.
    #[default]
    Pyramid,
    /// Fixed single-level cube.
    Cubemap,
}

/// A background renderer chosen at construction time.
pub enum Background<S, T> {
    /// See [`PyramidRenderer`].
    Pyramid(PyramidRenderer<S, T>),
    /// See [`CubemapRenderer`].
    Cubemap(CubemapRenderer<S, T>),
}

impl<S: TileScene, T: TextureStore> Background<S, T> {
    /// Build the renderer of the given kind.
    pub fn new(
        kind: BackgroundKind,
        settings: PyramidSettings,
        scene: S,
        store: T,
        texture_events: Receiver<TextureEvent>,
    ) -> Self {
        match kind {
            BackgroundKind::Pyramid => {
                Self::Pyramid(PyramidRenderer::new(settings, scene, store, texture_events))
            }
            BackgroundKind::Cubemap => {
                Self::Cubemap(CubemapRenderer::new(&settings, scene, store, texture_events))
            }
        }
    }

    /// The variant that was built.
    pub fn kind(&self) -> BackgroundKind {
        match self {
            Self::Pyramid(_) => BackgroundKind::Pyramid,
            Self::Cubemap(_) => BackgroundKind::Cubemap,
        }
    }

    /// The drawing collaborator.
    pub fn scene(&self) -> &S {
        match self {
            Self::Pyramid(renderer) => renderer.scene(),
            Self::Cubemap(renderer) => renderer.scene(),
        }
    }
}

impl<S: TileScene, T: TextureStore> BackgroundRenderer for PyramidRenderer<S, T> {
    fn boot(&mut self, camera: &mut dyn BackgroundCamera) -> Result<(), PyramidError> {
        PyramidRenderer::boot(self, camera)
    }

    fn render(&mut self, camera: &dyn BackgroundCamera) -> Result<FrameStats, PyramidError> {
        PyramidRenderer::render(self, camera)
    }

    fn destroy(&mut self, camera: &mut dyn BackgroundCamera) {
        PyramidRenderer::destroy(self, camera)
    }
}

impl<S: TileScene, T: TextureStore> BackgroundRenderer for CubemapRenderer<S, T> {
    fn boot(&mut self, camera: &mut dyn BackgroundCamera) -> Result<(), PyramidError> {
        CubemapRenderer::boot(self, camera)
    }

    fn render(&mut self, camera: &dyn BackgroundCamera) -> Result<FrameStats, PyramidError> {
        CubemapRenderer::render(self, camera)
    }

    fn destroy(&mut self, camera: &mut dyn BackgroundCamera) {
        CubemapRenderer::destroy(self, camera)
    }
}

impl<S: TileScene, T: TextureStore> BackgroundRenderer for Background<S, T> {
    fn boot(&mut self, camera: &mut dyn BackgroundCamera) -> Result<(), PyramidError> {
        match self {
            Self::Pyramid(renderer) => renderer.boot(camera),
            Self::Cubemap(renderer) => renderer.boot(camera),
        }
    }

    fn render(&mut self, camera: &dyn BackgroundCamera) -> Result<FrameStats, PyramidError> {
        match self {
            Self::Pyramid(renderer) => renderer.render(camera),
            Self::Cubemap(renderer) => renderer.render(camera),
        }
    }

    fn destroy(&mut self, camera: &mut dyn BackgroundCamera) {
        match self {
            Self::Pyramid(renderer) => renderer.destroy(camera),
            Self::Cubemap(renderer) => renderer.destroy(camera),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingScene, ScriptedTextureStore};
    use crate::{PanoramaCamera, texture_channel};

    fn build(kind: BackgroundKind) -> Background<RecordingScene, ScriptedTextureStore> {
        let (_sender, events) = texture_channel();
        Background::new(
            kind,
            PyramidSettings::default(),
            RecordingScene::default(),
            ScriptedTextureStore::default(),
            events,
        )
    }

    #[test]
    fn test_kind_selects_variant() {
        assert_eq!(build(BackgroundKind::Pyramid).kind(), BackgroundKind::Pyramid);
        assert_eq!(build(BackgroundKind::Cubemap).kind(), BackgroundKind::Cubemap);
    }

    #[test]
    fn test_variants_share_lifecycle() {
        for kind in [BackgroundKind::Pyramid, BackgroundKind::Cubemap] {
            let mut background: Box<dyn BackgroundRenderer> = Box::new(build(kind));
            let mut camera = PanoramaCamera::new(90.0, 1.0);
            background.boot(&mut camera).unwrap();
            background.render(&camera).unwrap();
            background.destroy(&mut camera);
            assert_eq!(
                background.render(&camera).unwrap_err(),
                PyramidError::UseAfterDestroy,
                "{kind:?}"
            );
            assert_eq!(camera.subscriber_count(), 0, "{kind:?}");
        }
    }
}
