// Copyright @yucwang 2026

use crate::core::bsdf::{BsdfSample, LobeKind};
use crate::core::rng::Sampler;
use crate::core::texture::Texture;
use crate::materials::microfacet::{
    fresnel_conductor, ggx_d, ggx_g, ggx_g1, reflect, sample_ggx_vndf, ALPHA_SMOOTH,
};
use crate::math::constants::{Float, Vector2f, Vector3f};

// Conductor parameterized by reflectivity (F0) and edge tint, mapped
// back to a complex index per channel (Gulbrandsen, "Artist Friendly
// Metallic Fresnel").
pub struct Conductor {
    pub id_roughness_u: u32,
    pub id_roughness_v: u32,
    pub id_specular_reflectance: u32,
    eta: Vector3f,
    k: Vector3f,
}

impl Conductor {
    pub fn new(reflectivity: Vector3f, edgetint: Vector3f,
               id_roughness_u: u32, id_roughness_v: u32,
               id_specular_reflectance: u32) -> Self {
        let mut eta = Vector3f::zeros();
        let mut k = Vector3f::zeros();
        for idx in 0..3 {
            let r = reflectivity[idx].max(0.0).min(0.9999);
            let g = edgetint[idx].max(0.0).min(1.0);
            let sqrt_r = r.sqrt();
            let n = g * (1.0 - r) / (1.0 + r)
                + (1.0 - g) * (1.0 + sqrt_r) / (1.0 - sqrt_r);
            let k2 = ((n + 1.0) * (n + 1.0) * r - (n - 1.0) * (n - 1.0))
                / (1.0 - r);
            eta[idx] = n;
            k[idx] = k2.max(0.0).sqrt();
        }
        Self { id_roughness_u, id_roughness_v, id_specular_reflectance, eta, k }
    }

    fn fresnel(&self, cos_i: Float) -> Vector3f {
        Vector3f::new(
            fresnel_conductor(cos_i, self.eta.x, self.k.x),
            fresnel_conductor(cos_i, self.eta.y, self.k.y),
            fresnel_conductor(cos_i, self.eta.z, self.k.z),
        )
    }

    fn alphas(&self, textures: &[Texture], uv: &Vector2f) -> (Float, Float) {
        let au = textures[self.id_roughness_u as usize].eval_scalar(uv).max(0.0);
        let av = textures[self.id_roughness_v as usize].eval_scalar(uv).max(0.0);
        (au, av)
    }

    pub fn sample(&self, textures: &[Texture], wo: &Vector3f, uv: &Vector2f,
                  sampler: &mut Sampler) -> Option<BsdfSample> {
        if wo.z <= 0.0 {
            return None;
        }
        let (au, av) = self.alphas(textures, uv);
        let specular = textures[self.id_specular_reflectance as usize].eval(uv);

        if au <= ALPHA_SMOOTH && av <= ALPHA_SMOOTH {
            let fr = self.fresnel(wo.z);
            return Some(BsdfSample {
                wi: Vector3f::new(-wo.x, -wo.y, wo.z),
                value: specular.component_mul(&fr),
                pdf: 1.0,
                kind: LobeKind::Reflect,
                delta: true,
            });
        }

        let m = sample_ggx_vndf(wo, au, av, &sampler.next_2d());
        let wi = reflect(wo, &m);
        if wi.z <= 0.0 {
            return None;
        }
        let cos_om = wo.dot(&m);
        if cos_om <= 0.0 {
            return None;
        }
        let g1_o = ggx_g1(wo, au, av);
        if g1_o <= 0.0 {
            return None;
        }
        let pdf = g1_o * ggx_d(&m, au, av) / (4.0 * wo.z);
        if pdf <= 0.0 {
            return None;
        }
        let fr = self.fresnel(cos_om);
        let weight = ggx_g(wo, &wi, au, av) / g1_o;
        Some(BsdfSample {
            wi,
            value: specular.component_mul(&fr) * weight,
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
        let (au, av) = self.alphas(textures, uv);
        if au <= ALPHA_SMOOTH && av <= ALPHA_SMOOTH {
            return Vector3f::zeros();
        }

        let mut m = wo + wi;
        if m.norm_squared() <= 0.0 {
            return Vector3f::zeros();
        }
        m = m.normalize();
        let cos_om = wo.dot(&m);
        if cos_om <= 0.0 {
            return Vector3f::zeros();
        }
        let d = ggx_d(&m, au, av);
        let g = ggx_g(wo, wi, au, av);
        let fr = self.fresnel(cos_om);
        textures[self.id_specular_reflectance as usize].eval(uv)
            .component_mul(&fr) * (d * g / (4.0 * wo.z))
    }

    pub fn pdf(&self, textures: &[Texture], wo: &Vector3f, wi: &Vector3f,
               uv: &Vector2f) -> Float {
        if wo.z <= 0.0 || wi.z <= 0.0 {
            return 0.0;
        }
        let (au, av) = self.alphas(textures, uv);
        if au <= ALPHA_SMOOTH && av <= ALPHA_SMOOTH {
            return 0.0;
        }
        let mut m = wo + wi;
        if m.norm_squared() <= 0.0 {
            return 0.0;
        }
        m = m.normalize();
        if wo.dot(&m) <= 0.0 {
            return 0.0;
        }
        ggx_g1(wo, au, av) * ggx_d(&m, au, av) / (4.0 * wo.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::spectrum::max_component;

    fn gold_like() -> Conductor {
        Conductor::new(
            Vector3f::new(0.95, 0.64, 0.54),
            Vector3f::new(0.9, 0.9, 0.9),
            0,
            0,
            1,
        )
    }

    fn textures(alpha: Float) -> Vec<Texture> {
        vec![
            Texture::Constant { color: Vector3f::new(alpha, alpha, alpha) },
            Texture::Constant { color: Vector3f::new(1.0, 1.0, 1.0) },
        ]
    }

    #[test]
    fn test_fresnel_recovers_f0() {
        let conductor = gold_like();
        let f0 = conductor.fresnel(1.0);
        assert!((f0.x - 0.95).abs() < 1e-2);
        assert!((f0.y - 0.64).abs() < 1e-2);
        assert!((f0.z - 0.54).abs() < 1e-2);
    }

    #[test]
    fn test_smooth_is_mirror() {
        let conductor = gold_like();
        let textures = textures(0.0);
        let mut sampler = Sampler::new(1, 0);
        let wo = Vector3f::new(0.5, 0.2, 0.84).normalize();
        let uv = Vector2f::new(0.0, 0.0);
        let s = conductor.sample(&textures, &wo, &uv, &mut sampler).unwrap();
        assert!((s.wi - Vector3f::new(-wo.x, -wo.y, wo.z)).norm() < 1e-6);
        assert_eq!(conductor.pdf(&textures, &wo, &s.wi, &uv), 0.0);
    }

    #[test]
    fn test_rough_sample_eval_pdf_consistency() {
        let conductor = gold_like();
        let textures = textures(0.3);
        let mut sampler = Sampler::new(9, 0);
        let wo = Vector3f::new(0.3, -0.4, 0.86).normalize();
        let uv = Vector2f::new(0.5, 0.5);
        let mut checked = 0;
        for _ in 0..1000 {
            let s = match conductor.sample(&textures, &wo, &uv, &mut sampler) {
                Some(s) => s,
                None => continue,
            };
            let f = conductor.eval(&textures, &wo, &s.wi, &uv);
            let pdf = conductor.pdf(&textures, &wo, &s.wi, &uv);
            assert!((pdf - s.pdf).abs() / s.pdf < 1e-3);
            let err = max_component(&(f / pdf - s.value).abs());
            assert!(err < 1e-3 * s.value.norm().max(1.0));
            checked += 1;
        }
        assert!(checked > 900);
    }

    #[test]
    fn test_energy_bounded() {
        // White furnace style bound: integral of f cos over the
        // hemisphere must not exceed one.
        let conductor = gold_like();
        let textures = textures(0.4);
        let mut sampler = Sampler::new(21, 0);
        let wo = Vector3f::new(0.0, 0.0, 1.0);
        let uv = Vector2f::new(0.5, 0.5);
        let n = 100_000;
        let mut sum = Vector3f::zeros();
        for _ in 0..n {
            let u = sampler.next_2d();
            let wi = crate::math::warp::sample_uniform_sphere(&u);
            if wi.z <= 0.0 {
                continue;
            }
            // Uniform-sphere pdf restricted to the hemisphere.
            sum += conductor.eval(&textures, &wo, &wi, &uv)
                * (4.0 * crate::math::constants::PI);
        }
        let integral = sum / n as Float;
        assert!(max_component(&integral) <= 1.0 + 1e-2);
    }
}
