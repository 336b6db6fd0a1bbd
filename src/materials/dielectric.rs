// Copyright @yucwang 2026

use crate::core::bsdf::{BsdfSample, LobeKind};
use crate::core::rng::Sampler;
use crate::core::texture::Texture;
use crate::materials::microfacet::{
    fresnel_dielectric, ggx_d, ggx_g, ggx_g1, pdf_ggx_vndf, reflect, refract,
    sample_ggx_vndf, ALPHA_SMOOTH,
};
use crate::math::constants::{Float, Vector2f, Vector3f};

// Smooth or GGX-rough dielectric boundary. The local frame normal
// points to the exterior side, so `wo.z < 0` means the ray arrives
// from inside and the relative index flips.
pub struct Dielectric {
    pub eta: Float,
    pub id_roughness_u: u32,
    pub id_roughness_v: u32,
    pub id_specular_reflectance: u32,
    pub id_specular_transmittance: u32,
}

impl Dielectric {
    fn alphas(&self, textures: &[Texture], uv: &Vector2f) -> (Float, Float) {
        let au = textures[self.id_roughness_u as usize].eval_scalar(uv).max(0.0);
        let av = textures[self.id_roughness_v as usize].eval_scalar(uv).max(0.0);
        (au, av)
    }

    fn eta_rel(&self, wo_z: Float) -> Float {
        if wo_z > 0.0 {
            self.eta
        } else {
            1.0 / self.eta
        }
    }

    pub fn sample(&self, textures: &[Texture], wo: &Vector3f, uv: &Vector2f,
                  sampler: &mut Sampler) -> Option<BsdfSample> {
        if wo.z == 0.0 {
            return None;
        }
        let (au, av) = self.alphas(textures, uv);
        if au <= ALPHA_SMOOTH && av <= ALPHA_SMOOTH {
            return self.sample_smooth(textures, wo, uv, sampler);
        }

        let sign = if wo.z > 0.0 { 1.0 } else { -1.0 };
        let m = sample_ggx_vndf(&(sign * wo), au, av, &sampler.next_2d());
        let cos_om = wo.dot(&m);
        let fr = fresnel_dielectric(cos_om, self.eta);
        let g1_o = ggx_g1(wo, au, av);
        if g1_o <= 0.0 {
            return None;
        }

        if sampler.next_f32() < fr {
            let wi = reflect(wo, &m);
            if wi.z * wo.z <= 0.0 {
                return None;
            }
            let pdf_m = g1_o * ggx_d(&m, au, av) * cos_om.abs() / wo.z.abs();
            let pdf = fr * pdf_m / (4.0 * cos_om.abs());
            if pdf <= 0.0 {
                return None;
            }
            let weight = ggx_g(wo, &wi, au, av) / g1_o;
            Some(BsdfSample {
                wi,
                value: textures[self.id_specular_reflectance as usize].eval(uv) * weight,
                pdf,
                kind: LobeKind::Reflect,
                delta: false,
            })
        } else {
            let eta_rel = self.eta_rel(cos_om);
            let wi = refract(wo, &m, eta_rel)?;
            if wi.z * wo.z >= 0.0 {
                return None;
            }
            let cos_im = wi.dot(&m);
            let denom = cos_om + eta_rel * cos_im;
            if denom.abs() < 1e-8 {
                return None;
            }
            let pdf_m = g1_o * ggx_d(&m, au, av) * cos_om.abs() / wo.z.abs();
            let jacobian = eta_rel * eta_rel * cos_im.abs() / (denom * denom);
            let pdf = (1.0 - fr) * pdf_m * jacobian;
            if pdf <= 0.0 {
                return None;
            }
            // eta_rel^2: solid-angle compression of radiance across
            // the boundary.
            let weight = ggx_g(wo, &wi, au, av) / g1_o * eta_rel * eta_rel;
            Some(BsdfSample {
                wi,
                value: textures[self.id_specular_transmittance as usize].eval(uv) * weight,
                pdf,
                kind: LobeKind::Transmit,
                delta: false,
            })
        }
    }

    fn sample_smooth(&self, textures: &[Texture], wo: &Vector3f, uv: &Vector2f,
                     sampler: &mut Sampler) -> Option<BsdfSample> {
        let fr = fresnel_dielectric(wo.z, self.eta);
        if sampler.next_f32() < fr {
            Some(BsdfSample {
                wi: Vector3f::new(-wo.x, -wo.y, wo.z),
                value: textures[self.id_specular_reflectance as usize].eval(uv),
                pdf: fr,
                kind: LobeKind::Reflect,
                delta: true,
            })
        } else {
            let eta_rel = self.eta_rel(wo.z);
            let normal = Vector3f::new(0.0, 0.0, 1.0);
            let wi = refract(wo, &normal, eta_rel)?;
            Some(BsdfSample {
                wi,
                value: textures[self.id_specular_transmittance as usize].eval(uv)
                    * (eta_rel * eta_rel),
                pdf: 1.0 - fr,
                kind: LobeKind::Transmit,
                delta: true,
            })
        }
    }

    pub fn eval(&self, textures: &[Texture], wo: &Vector3f, wi: &Vector3f,
                uv: &Vector2f) -> Vector3f {
        if wo.z == 0.0 || wi.z == 0.0 {
            return Vector3f::zeros();
        }
        let (au, av) = self.alphas(textures, uv);
        if au <= ALPHA_SMOOTH && av <= ALPHA_SMOOTH {
            return Vector3f::zeros();
        }

        if wo.z * wi.z > 0.0 {
            let mut m = wo + wi;
            if m.norm_squared() <= 0.0 {
                return Vector3f::zeros();
            }
            m = m.normalize();
            if m.z < 0.0 {
                m = -m;
            }
            let cos_om = wo.dot(&m);
            let fr = fresnel_dielectric(cos_om, self.eta);
            let d = ggx_d(&m, au, av);
            let g = ggx_g(wo, wi, au, av);
            textures[self.id_specular_reflectance as usize].eval(uv)
                * (fr * d * g / (4.0 * wo.z.abs()))
        } else {
            let eta_rel = self.eta_rel(wo.z);
            let mut m = wo + eta_rel * wi;
            if m.norm_squared() <= 0.0 {
                return Vector3f::zeros();
            }
            m = m.normalize();
            if m.z < 0.0 {
                m = -m;
            }
            let cos_om = wo.dot(&m);
            let cos_im = wi.dot(&m);
            if cos_om * cos_im >= 0.0 {
                return Vector3f::zeros();
            }
            let fr = fresnel_dielectric(cos_om, self.eta);
            let d = ggx_d(&m, au, av);
            let g = ggx_g(wo, wi, au, av);
            let denom = cos_om + eta_rel * cos_im;
            if denom.abs() < 1e-8 {
                return Vector3f::zeros();
            }
            let eta2 = eta_rel * eta_rel;
            // One eta^2 is the half-vector Jacobian, the other the
            // radiance compression.
            textures[self.id_specular_transmittance as usize].eval(uv)
                * ((1.0 - fr) * d * g * (cos_om * cos_im).abs() * eta2 * eta2
                    / (wo.z.abs() * denom * denom))
        }
    }

    pub fn pdf(&self, textures: &[Texture], wo: &Vector3f, wi: &Vector3f,
               uv: &Vector2f) -> Float {
        if wo.z == 0.0 || wi.z == 0.0 {
            return 0.0;
        }
        let (au, av) = self.alphas(textures, uv);
        if au <= ALPHA_SMOOTH && av <= ALPHA_SMOOTH {
            return 0.0;
        }
        let g1_o = ggx_g1(wo, au, av);

        if wo.z * wi.z > 0.0 {
            let mut m = wo + wi;
            if m.norm_squared() <= 0.0 {
                return 0.0;
            }
            m = m.normalize();
            if m.z < 0.0 {
                m = -m;
            }
            let cos_om = wo.dot(&m);
            if cos_om.abs() < 1e-8 {
                return 0.0;
            }
            let fr = fresnel_dielectric(cos_om, self.eta);
            let pdf_m = g1_o * ggx_d(&m, au, av) * cos_om.abs() / wo.z.abs();
            fr * pdf_m / (4.0 * cos_om.abs())
        } else {
            let eta_rel = self.eta_rel(wo.z);
            let mut m = wo + eta_rel * wi;
            if m.norm_squared() <= 0.0 {
                return 0.0;
            }
            m = m.normalize();
            if m.z < 0.0 {
                m = -m;
            }
            let cos_om = wo.dot(&m);
            let cos_im = wi.dot(&m);
            if cos_om * cos_im >= 0.0 {
                return 0.0;
            }
            let fr = fresnel_dielectric(cos_om, self.eta);
            let denom = cos_om + eta_rel * cos_im;
            if denom.abs() < 1e-8 {
                return 0.0;
            }
            let pdf_m = g1_o * ggx_d(&m, au, av) * cos_om.abs() / wo.z.abs();
            (1.0 - fr) * pdf_m * eta_rel * eta_rel * cos_im.abs() / (denom * denom)
        }
    }
}
