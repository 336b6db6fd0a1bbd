// Copyright @yucwang 2026

use crate::core::emitter::EmitterSampleRec;
use crate::math::constants::{Vector3f, FLOAT_MAX};

// Parallel light: `direction` is the direction the light travels.
pub struct DirectionalLight {
    direction: Vector3f,
    radiance: Vector3f,
}

impl DirectionalLight {
    pub fn new(direction: Vector3f, radiance: Vector3f) -> Self {
        Self { direction: direction.normalize(), radiance }
    }

    pub fn sample(&self) -> EmitterSampleRec {
        EmitterSampleRec {
            valid: true,
            harsh: true,
            wi: -self.direction,
            distance: FLOAT_MAX,
            value: self.radiance,
            pdf: 0.0,
        }
    }
}
