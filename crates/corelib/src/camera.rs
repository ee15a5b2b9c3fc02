use crate::Mat4;

/// Perspective projection state. The view matrix comes from the orbit
/// controller; this only owns the projection parameters, of which the
/// aspect ratio is the one mutated at runtime (on every resize).
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub fov_y_rad: f32,
    pub z_near: f32,
    pub z_far: f32,
    pub aspect: f32,
}

impl Camera {
    pub fn new(fov_y_rad: f32, z_near: f32, z_far: f32, aspect: f32) -> Self {
        Self {
            fov_y_rad,
            z_near,
            z_far,
            aspect,
        }
    }

    /// Recompute aspect from a viewport size in pixels.
    #[inline]
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect = width as f32 / height.max(1) as f32;
    }

    /// wgpu-style projection (z in [0,1], right-handed).
    #[inline]
    pub fn proj(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov_y_rad,
            self.aspect.max(1e-6),
            self.z_near,
            self.z_far,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_viewport_updates_aspect_exactly() {
        let mut cam = Camera::new(45f32.to_radians(), 0.1, 100.0, 1.0);
        cam.set_viewport(1920, 1080);
        assert_eq!(cam.aspect, 1920.0 / 1080.0);
    }

    #[test]
    fn zero_height_viewport_does_not_divide_by_zero() {
        let mut cam = Camera::new(45f32.to_radians(), 0.1, 100.0, 1.0);
        cam.set_viewport(800, 0);
        assert!(cam.aspect.is_finite());
    }
}
