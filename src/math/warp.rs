// Copyright @yucwang 2026

use super::constants::{Float, Vector2f, Vector3f, INV_FOUR_PI, INV_PI, PI};

pub fn sample_uniform_disk_concentric(u: &Vector2f) -> Vector2f {
    let r1: Float = 2.0 * u.x - 1.0;
    let r2: Float = 2.0 * u.y - 1.0;

    let phi: Float;
    let r: Float;

    if r1 == 0. && r2 == 0. {
        r = 0.0;
        phi = 0.0;
    } else if r1 * r1 > r2 * r2 {
        r = r1;
        phi = (PI / 4.0) * (r2 / r1);
    } else {
        r = r2;
        phi = (PI / 2.0) - (r1 / r2) * (PI / 4.0);
    }

    let (sin_phi, cos_phi) = phi.sin_cos();

    Vector2f::new(r * cos_phi, r * sin_phi)
}

pub fn sample_cosine_hemisphere(u: &Vector2f) -> Vector3f {
    let p = sample_uniform_disk_concentric(u);
    let z = (1. - p.x * p.x - p.y * p.y).max(0.0).sqrt();

    Vector3f::new(p.x, p.y, z)
}

pub fn sample_cosine_hemisphere_pdf(cos_theta: Float) -> Float {
    cos_theta * INV_PI
}

pub fn sample_uniform_sphere(u: &Vector2f) -> Vector3f {
    let z = 1.0 - 2.0 * u.x;
    let r = (1.0 - z * z).max(0.0).sqrt();
    let phi = 2.0 * PI * u.y;

    Vector3f::new(r * phi.cos(), r * phi.sin(), z)
}

pub fn sample_uniform_sphere_pdf() -> Float {
    INV_FOUR_PI
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::Sampler;

    #[test]
    fn test_cosine_hemisphere_upper() {
        let mut sampler = Sampler::new(3, 0);
        for _ in 0..512 {
            let u = Vector2f::new(sampler.next_f32(), sampler.next_f32());
            let d = sample_cosine_hemisphere(&u);
            assert!(d.z >= 0.0);
            assert!((d.norm() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_uniform_sphere_mean() {
        let mut sampler = Sampler::new(11, 0);
        let mut mean = Vector3f::zeros();
        let count = 4096;
        for _ in 0..count {
            let u = Vector2f::new(sampler.next_f32(), sampler.next_f32());
            let d = sample_uniform_sphere(&u);
            assert!((d.norm() - 1.0).abs() < 1e-4);
            mean += d;
        }
        mean /= count as Float;
        assert!(mean.norm() < 0.05);
    }
}
