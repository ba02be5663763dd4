//! Camera contract and a rotation-only panorama camera.

use crossbeam_channel::Sender;
use glam::{Mat4, Quat, Vec3};

/// Notification that the camera's field of view changed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FovChanged {
    /// New vertical field of view in degrees.
    pub fov: f32,
}

/// Handle returned by [`BackgroundCamera::subscribe`]; hand it back to unsubscribe.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct FovSubscription(u64);

impl FovSubscription {
    /// Wrap a camera-specific subscriber id.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// The camera-specific subscriber id.
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// What a background renderer needs from the camera.
pub trait BackgroundCamera {
    /// Vertical field of view in degrees (positive).
    fn fov(&self) -> f32;

    /// Combined projection × view matrix.
    fn view_projection(&self) -> Mat4;

    /// Deliver a [`FovChanged`] on `sink` whenever the field of view changes.
    fn subscribe(&mut self, sink: Sender<FovChanged>) -> FovSubscription;

    /// Stop notifications for `subscription`.
    fn unsubscribe(&mut self, subscription: FovSubscription);
}

/// A camera fixed at the cube center that only rotates and zooms.
///
/// Uses reverse-Z (near plane maps to z=1, far plane to z=0).
#[derive(Debug, Clone)]
pub struct PanoramaCamera {
    /// Rotation as a unit quaternion.
    pub rotation: Quat,
    /// Width / height.
    pub aspect_ratio: f32,
    /// Near clip plane distance (always positive).
    pub near: f32,
    /// Far clip plane distance (always positive, > near).
    pub far: f32,
    fov: f32,
    subscribers: Vec<(u64, Sender<FovChanged>)>,
    next_subscriber: u64,
}

impl PanoramaCamera {
    /// Create a camera looking down −Z with the given vertical field of view in degrees.
    pub fn new(fov: f32, aspect_ratio: f32) -> Self {
        Self {
            rotation: Quat::IDENTITY,
            aspect_ratio,
            near: 0.1,
            far: 10_000.0,
            fov,
            subscribers: Vec::new(),
            next_subscriber: 0,
        }
    }

    /// Change the field of view and notify subscribers if it actually changed.
    pub fn set_fov(&mut self, fov: f32) {
        if fov == self.fov {
            return;
        }
        self.fov = fov;
        // Drop subscribers whose receiver is gone.
        self.subscribers
            .retain(|(_, sink)| sink.send(FovChanged { fov }).is_ok());
    }

    /// Orient the camera by yaw (around +Y) then pitch (around the local +X), in degrees.
    pub fn set_yaw_pitch(&mut self, yaw: f32, pitch: f32) {
        self.rotation =
            Quat::from_rotation_y(yaw.to_radians()) * Quat::from_rotation_x(pitch.to_radians());
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// View matrix: inverse of the camera rotation (no translation).
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::from_quat(self.rotation.inverse())
    }

    /// Projection matrix with reverse-Z.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov.to_radians(),
            self.aspect_ratio,
            self.far,  // swapped: far as "near" parameter
            self.near, // swapped: near as "far" parameter
        )
    }

    /// The forward direction vector (−Z in camera space).
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::NEG_Z
    }

    /// Update the aspect ratio.
    pub fn set_aspect_ratio(&mut self, width: f32, height: f32) {
        self.aspect_ratio = width / height;
    }
}

impl Default for PanoramaCamera {
    fn default() -> Self {
        Self::new(90.0, 16.0 / 9.0)
    }
}

impl BackgroundCamera for PanoramaCamera {
    fn fov(&self) -> f32 {
        self.fov
    }

    fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    fn subscribe(&mut self, sink: Sender<FovChanged>) -> FovSubscription {
        let id = self.next_subscriber;
        self.next_subscriber += 1;
        self.subscribers.push((id, sink));
        FovSubscription::new(id)
    }

    fn unsubscribe(&mut self, subscription: FovSubscription) {
        self.subscribers.retain(|(id, _)| *id != subscription.id());
    }
}
