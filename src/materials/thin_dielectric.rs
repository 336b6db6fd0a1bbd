// Copyright @yucwang 2026

use crate::core::bsdf::{BsdfSample, LobeKind};
use crate::core::rng::Sampler;
use crate::core::texture::Texture;
use crate::materials::microfacet::fresnel_dielectric;
use crate::math::constants::{Float, Vector2f, Vector3f};

// Two parallel interfaces at zero thickness: transmission passes
// straight through and picks up no radiance scaling. Roughness is
// carried for config parity but the sheet shades as smooth.
pub struct ThinDielectric {
    pub eta: Float,
    pub id_roughness_u: u32,
    pub id_roughness_v: u32,
    pub id_specular_reflectance: u32,
    pub id_specular_transmittance: u32,
}

impl ThinDielectric {
    pub fn sample(&self, textures: &[Texture], wo: &Vector3f, uv: &Vector2f,
                  sampler: &mut Sampler) -> Option<BsdfSample> {
        if wo.z == 0.0 {
            return None;
        }

        let r = fresnel_dielectric(wo.z.abs(), self.eta);
        // Account for light bouncing between the two interfaces:
        // R' = R + T^2 R / (1 - R^2).
        let reflectance = if r < 1.0 {
            let t = 1.0 - r;
            r + t * t * r / (1.0 - r * r)
        } else {
            1.0
        };

        if sampler.next_f32() < reflectance {
            Some(BsdfSample {
                wi: Vector3f::new(-wo.x, -wo.y, wo.z),
                value: textures[self.id_specular_reflectance as usize].eval(uv),
                pdf: reflectance,
                kind: LobeKind::Reflect,
                delta: true,
            })
        } else {
            Some(BsdfSample {
                wi: -wo,
                value: textures[self.id_specular_transmittance as usize].eval(uv),
                pdf: 1.0 - reflectance,
                kind: LobeKind::Transmit,
                delta: true,
            })
        }
    }
}
