// Copyright @yucwang 2026

use crate::core::config::CameraConfig;
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::ray::Ray3f;

// Pinhole camera with a horizontal field of view.
pub struct PerspectiveCamera {
    origin: Vector3f,
    forward: Vector3f,
    right: Vector3f,
    up: Vector3f,
    tan_half_fov_x: Float,
    aspect: Float,
}

impl PerspectiveCamera {
    pub fn new(config: &CameraConfig) -> Self {
        let forward = (config.look_at - config.eye).normalize();
        let right = forward.cross(&config.up).normalize();
        let up = right.cross(&forward).normalize();

        Self {
            origin: config.eye,
            forward,
            right,
            up,
            tan_half_fov_x: (0.5 * config.fov_x).tan(),
            aspect: config.height as Float / config.width as Float,
        }
    }

    // `u` in [0, 1]^2 across the image plane, top-left origin.
    pub fn sample_ray(&self, u: &Vector2f) -> Ray3f {
        let px = (2.0 * u.x - 1.0) * self.tan_half_fov_x;
        let py = (1.0 - 2.0 * u.y) * self.tan_half_fov_x * self.aspect;

        let dir = (self.right * px + self.up * py + self.forward).normalize();
        Ray3f::new(self.origin, dir, Some(0.0), None)
    }
}
