// Copyright @yucwang 2026

use crate::core::bsdf::{BsdfSample, LobeKind};
use crate::core::rng::Sampler;
use crate::core::texture::Texture;
use crate::math::constants::{Float, Vector2f, Vector3f, INV_PI};
use crate::math::warp::{sample_cosine_hemisphere, sample_cosine_hemisphere_pdf};

pub struct Diffuse {
    pub id_reflectance: u32,
}

impl Diffuse {
    pub fn sample(&self, textures: &[Texture], _wo: &Vector3f, uv: &Vector2f,
                  sampler: &mut Sampler) -> Option<BsdfSample> {
        let wi = sample_cosine_hemisphere(&sampler.next_2d());
        let pdf = sample_cosine_hemisphere_pdf(wi.z);
        if pdf <= 0.0 {
            return None;
        }

        // f * cos / pdf collapses to the reflectance.
        Some(BsdfSample {
            wi,
            value: textures[self.id_reflectance as usize].eval(uv),
            pdf,
            kind: LobeKind::Reflect,
            delta: false,
        })
    }

    pub fn eval(&self, textures: &[Texture], wo: &Vector3f, wi: &Vector3f,
                uv: &Vector2f) -> Vector3f {
        if wo.z <= 0.0 || wi.z <= 0.0 {
            return Vector3f::zeros();
        }
        textures[self.id_reflectance as usize].eval(uv) * INV_PI * wi.z
    }

    pub fn pdf(&self, _textures: &[Texture], wo: &Vector3f, wi: &Vector3f,
               _uv: &Vector2f) -> Float {
        if wo.z <= 0.0 || wi.z <= 0.0 {
            return 0.0;
        }
        sample_cosine_hemisphere_pdf(wi.z)
    }
}
