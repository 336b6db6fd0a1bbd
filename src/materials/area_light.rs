// Copyright @yucwang 2026

use crate::core::texture::Texture;
use crate::math::constants::{Float, Vector2f, Vector3f};

// Emitting surface. Never scatters: the integrator reads the emitted
// radiance off the hit record and terminates the path.
pub struct AreaLight {
    pub id_radiance: u32,
    pub weight: Float,
}

impl AreaLight {
    pub fn radiance(&self, textures: &[Texture], uv: &Vector2f) -> Vector3f {
        textures[self.id_radiance as usize].eval(uv) * self.weight
    }
}
