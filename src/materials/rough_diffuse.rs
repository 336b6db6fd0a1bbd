// Copyright @yucwang 2026

use crate::core::bsdf::{BsdfSample, LobeKind};
use crate::core::rng::Sampler;
use crate::core::texture::Texture;
use crate::math::constants::{Float, Vector2f, Vector3f, INV_PI, PI};
use crate::math::warp::{sample_cosine_hemisphere, sample_cosine_hemisphere_pdf};

// Oren-Nayar rough diffuse. Sampling stays cosine-weighted; only the
// evaluated reflectance changes with roughness.
pub struct RoughDiffuse {
    pub id_reflectance: u32,
    pub id_roughness: u32,
    pub use_fast_approx: bool,
}

impl RoughDiffuse {
    pub fn sample(&self, textures: &[Texture], wo: &Vector3f, uv: &Vector2f,
                  sampler: &mut Sampler) -> Option<BsdfSample> {
        let wi = sample_cosine_hemisphere(&sampler.next_2d());
        let pdf = sample_cosine_hemisphere_pdf(wi.z);
        if pdf <= 0.0 {
            return None;
        }

        let f = self.eval(textures, wo, &wi, uv);
        Some(BsdfSample {
            wi,
            value: f / pdf,
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

        let rho = textures[self.id_reflectance as usize].eval(uv);
        let sigma = textures[self.id_roughness as usize].eval_scalar(uv).max(0.0);
        let sigma2 = sigma * sigma;

        let cos_i = wi.z;
        let cos_o = wo.z;
        let sin_i = (1.0 - cos_i * cos_i).max(0.0).sqrt();
        let sin_o = (1.0 - cos_o * cos_o).max(0.0).sqrt();

        // Azimuthal difference from the tangential projections.
        let cos_phi_diff = if sin_i > 1e-6 && sin_o > 1e-6 {
            ((wi.x * wo.x + wi.y * wo.y) / (sin_i * sin_o)).max(-1.0).min(1.0)
        } else {
            0.0
        };

        let theta_i = cos_i.min(1.0).acos();
        let theta_o = cos_o.min(1.0).acos();
        let alpha = theta_i.max(theta_o);
        let beta = theta_i.min(theta_o);
        let sin_alpha = alpha.sin();
        let tan_beta = beta.tan();

        if self.use_fast_approx {
            let a = 1.0 - 0.5 * sigma2 / (sigma2 + 0.33);
            let b = 0.45 * sigma2 / (sigma2 + 0.09);
            let f = rho * INV_PI
                * (a + b * cos_phi_diff.max(0.0) * sin_alpha * tan_beta);
            return f * cos_i;
        }

        // Full first-order model plus the interreflection term.
        let c1 = 1.0 - 0.5 * sigma2 / (sigma2 + 0.33);
        let c2 = 0.45 * sigma2 / (sigma2 + 0.09)
            * if cos_phi_diff >= 0.0 {
                sin_alpha
            } else {
                let cube = 2.0 * beta * INV_PI;
                sin_alpha - cube * cube * cube
            };
        let temp = 4.0 * alpha * beta * INV_PI * INV_PI;
        let c3 = 0.125 * sigma2 / (sigma2 + 0.09) * temp * temp;

        let half_ab = 0.5 * (alpha + beta);
        let single = rho * INV_PI
            * (c1 + cos_phi_diff * c2 * tan_beta
                + (1.0 - cos_phi_diff.abs()) * c3 * half_ab.tan());
        let two_beta = 2.0 * beta * INV_PI;
        let pair = rho.component_mul(&rho) * (0.17 * INV_PI)
            * (sigma2 / (sigma2 + 0.13))
            * (1.0 - cos_phi_diff * two_beta * two_beta);

        let f = single + pair;
        f.map(|v| v.max(0.0)) * cos_i
    }

    pub fn pdf(&self, _textures: &[Texture], wo: &Vector3f, wi: &Vector3f,
               _uv: &Vector2f) -> Float {
        if wo.z <= 0.0 || wi.z <= 0.0 {
            return 0.0;
        }
        sample_cosine_hemisphere_pdf(wi.z)
    }
}
