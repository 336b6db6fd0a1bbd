// Copyright @yucwang 2026

use crate::core::emitter::EmitterSampleRec;
use crate::math::constants::{Float, Vector2f, Vector3f, FLOAT_MAX, INV_FOUR_PI};
use crate::math::warp::sample_uniform_sphere;

// Uniform radiance arriving from every direction.
pub struct ConstantLight {
    radiance: Vector3f,
}

impl ConstantLight {
    pub fn new(radiance: Vector3f) -> Self {
        Self { radiance }
    }

    pub fn sample(&self, u: &Vector2f) -> EmitterSampleRec {
        EmitterSampleRec {
            valid: true,
            harsh: false,
            wi: sample_uniform_sphere(u),
            distance: FLOAT_MAX,
            value: self.radiance / INV_FOUR_PI,
            pdf: INV_FOUR_PI,
        }
    }

    pub fn eval(&self) -> Vector3f {
        self.radiance
    }

    pub fn pdf(&self) -> Float {
        INV_FOUR_PI
    }
}
