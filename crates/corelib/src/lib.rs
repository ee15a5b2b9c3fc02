//! Core viewer types: math re-exports, Transform, Camera, orbit controls,
//! lights and the scene container.

pub use glam::{EulerRot, Mat4, Quat, Vec3, vec3};

pub mod camera;
pub mod light;
pub mod orbit;
pub mod scene;
pub mod transform;
