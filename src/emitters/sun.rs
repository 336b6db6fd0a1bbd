// Copyright @yucwang 2026

use crate::core::config::INVALID_ID;
use crate::core::emitter::EmitterSampleRec;
use crate::core::texture::Texture;
use crate::math::constants::{Float, Vector2f, Vector3f, FLOAT_MAX};
use crate::math::frame::Frame;

// Sun disc: a delta cone emitter. Next-event samples aim at the disc
// center; rays escaping inside the cone read the disc texture.
pub struct SunLight {
    direction: Vector3f,
    radiance: Vector3f,
    cos_cutoff: Float,
    sin_cutoff: Float,
    id_texture: u32,
    frame: Frame,
}

impl SunLight {
    pub fn new(direction: Vector3f, radiance: Vector3f,
               cos_cutoff_angle: Float, id_texture: u32) -> Self {
        let direction = direction.normalize();
        let cos_cutoff = cos_cutoff_angle.clamp(-1.0, 1.0);
        Self {
            direction,
            radiance,
            cos_cutoff,
            sin_cutoff: (1.0 - cos_cutoff * cos_cutoff).max(1e-12).sqrt(),
            id_texture,
            frame: Frame::from_normal(-direction),
        }
    }

    pub fn sample(&self, textures: &[Texture]) -> EmitterSampleRec {
        let wi = -self.direction;
        let mut value = self.radiance;
        if self.id_texture != INVALID_ID {
            let uv = Vector2f::new(0.5, 0.5);
            value = value.component_mul(&textures[self.id_texture as usize].eval(&uv));
        }
        EmitterSampleRec {
            valid: true,
            harsh: true,
            wi,
            distance: FLOAT_MAX,
            value,
            pdf: 0.0,
        }
    }

    pub fn eval(&self, textures: &[Texture], dir: &Vector3f) -> Vector3f {
        let local = self.frame.to_local(dir);
        if local.z < self.cos_cutoff {
            return Vector3f::zeros();
        }
        let mut value = self.radiance;
        if self.id_texture != INVALID_ID {
            let uv = Vector2f::new(
                0.5 + 0.5 * local.x / self.sin_cutoff,
                0.5 + 0.5 * local.y / self.sin_cutoff,
            );
            value = value.component_mul(&textures[self.id_texture as usize].eval(&uv));
        }
        value
    }
}
