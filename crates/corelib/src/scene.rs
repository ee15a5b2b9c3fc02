//! Scene container: background, lights and the single tracked object.
//!
//! The scene is created once at startup and passed by reference to every
//! handler; there is no global state. The tracked object starts absent and
//! is written exactly once, by the load-completion handler. The render loop
//! only reads presence and advances the rotation.

use crate::light::{AmbientLight, PointLight};
use crate::transform::Transform;
use crate::{Vec3, vec3};

/// Fixed per-tick rotation increment (radians) applied to the tracked
/// object's X and Y axes. Policy constant, not geometry-dependent.
pub const ROTATION_STEP: f32 = 0.01;

/// Presence + spatial state of the loaded mesh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackedObject {
    pub transform: Transform,
}

#[derive(Clone, Debug)]
pub struct ViewerScene {
    /// Linear RGBA clear color.
    pub background: [f32; 4],
    pub ambient: AmbientLight,
    pub point: PointLight,
    pub tracked: Option<TrackedObject>,
}

impl ViewerScene {
    /// Scene with the viewer's fixed lighting rig: white background,
    /// half-intensity white ambient and a half-intensity white point light
    /// above and behind the camera target.
    pub fn new() -> Self {
        Self {
            background: [1.0, 1.0, 1.0, 1.0],
            ambient: AmbientLight {
                color: Vec3::ONE,
                intensity: 0.5,
            },
            point: PointLight {
                color: Vec3::ONE,
                intensity: 0.5,
                position: vec3(0.0, 10.0, 20.0),
                range: 50.0,
            },
            tracked: None,
        }
    }

    /// Publish the loaded object at a fixed position. Called once from the
    /// load-completion handler; a second call is not expected and not
    /// guarded (a single load is issued per process lifetime).
    pub fn attach(&mut self, position: Vec3) {
        self.tracked = Some(TrackedObject {
            transform: Transform::at(position),
        });
    }

    /// One render-loop tick's worth of animation: advance the tracked
    /// object's X/Y rotation, or do nothing while it is absent.
    pub fn tick_rotation(&mut self) {
        if let Some(obj) = self.tracked.as_mut() {
            obj.transform.rotation_euler.x += ROTATION_STEP;
            obj.transform.rotation_euler.y += ROTATION_STEP;
        }
    }
}

impl Default for ViewerScene {
    fn default() -> Self {
        Self::new()
    }
}
