//! Orbit camera controller: rotate around a target with mouse drag,
//! pan with the secondary button, zoom with the wheel.

use std::f32::consts::PI;

use crate::{Mat4, Vec3};

#[derive(Clone, Debug)]
pub struct OrbitController {
    pub target: Vec3,
    pub distance: f32,
    /// Horizontal rotation (radians).
    pub yaw: f32,
    /// Vertical rotation (radians), clamped off the poles.
    pub pitch: f32,
    pub up: Vec3,
}

impl OrbitController {
    pub fn new(target: Vec3, distance: f32) -> Self {
        Self {
            target,
            distance,
            yaw: 0.0,
            pitch: 0.0,
            up: Vec3::Y,
        }
    }

    /// Seed the controller so that `eye()` starts exactly at `eye`.
    pub fn from_eye_target(eye: Vec3, target: Vec3) -> Self {
        let offset = eye - target;
        let distance = offset.length().max(1e-4);
        let pitch = (offset.y / distance).clamp(-1.0, 1.0).asin();
        let yaw = offset.x.atan2(offset.z);
        Self {
            target,
            distance,
            yaw,
            pitch,
            up: Vec3::Y,
        }
    }

    pub fn eye(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    pub fn rotate(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.yaw += delta_yaw;
        self.pitch = (self.pitch + delta_pitch).clamp(-PI / 2.0 + 0.01, PI / 2.0 - 0.01);
    }

    pub fn zoom(&mut self, delta: f32) {
        self.distance = (self.distance * (1.0 + delta * 0.1)).clamp(0.1, 1000.0);
    }

    pub fn pan(&mut self, delta_x: f32, delta_y: f32) {
        let forward = (self.target - self.eye()).normalize();
        let right = forward.cross(self.up).normalize();
        let up = right.cross(forward).normalize();

        let pan_speed = self.distance * 0.001;
        self.target += right * delta_x * pan_speed;
        self.target += up * delta_y * pan_speed;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target, self.up)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vec3;

    #[test]
    fn from_eye_target_round_trips_the_eye() {
        let eye = vec3(0.0, 10.0, 40.0);
        let orbit = OrbitController::from_eye_target(eye, Vec3::ZERO);
        let back = orbit.eye();
        assert!((back - eye).length() < 1e-3, "eye drifted to {back:?}");
    }

    #[test]
    fn pitch_is_clamped_off_the_poles() {
        let mut orbit = OrbitController::new(Vec3::ZERO, 10.0);
        orbit.rotate(0.0, 10.0);
        assert!(orbit.pitch < PI / 2.0);
        orbit.rotate(0.0, -20.0);
        assert!(orbit.pitch > -PI / 2.0);
    }

    #[test]
    fn zoom_never_collapses_distance() {
        let mut orbit = OrbitController::new(Vec3::ZERO, 1.0);
        for _ in 0..200 {
            orbit.zoom(-1.0);
        }
        assert!(orbit.distance >= 0.1);
    }
}
