// Copyright @yucwang 2026

use crate::core::emitter::EmitterSampleRec;
use crate::math::constants::Vector3f;

pub struct PointLight {
    position: Vector3f,
    intensity: Vector3f,
}

impl PointLight {
    pub fn new(position: Vector3f, intensity: Vector3f) -> Self {
        Self { position, intensity }
    }

    pub fn sample(&self, origin: &Vector3f) -> EmitterSampleRec {
        let to_light = self.position - origin;
        let dist2 = to_light.norm_squared();
        if dist2 <= 0.0 {
            return EmitterSampleRec::default();
        }
        let distance = dist2.sqrt();

        EmitterSampleRec {
            valid: true,
            harsh: true,
            wi: to_light / distance,
            distance,
            value: self.intensity / dist2,
            pdf: 0.0,
        }
    }
}
