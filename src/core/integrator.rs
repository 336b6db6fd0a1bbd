// Copyright @yucwang 2026

use crate::core::config::{IntegratorConfig, IntegratorKind};
use crate::core::rng::Sampler;
use crate::core::scene::Scene;
use crate::integrators::path::PathIntegrator;
use crate::integrators::volpath::VolPathIntegrator;
use crate::math::constants::{Float, Vector3f};
use crate::math::ray::Ray3f;

pub trait Integrator: Send + Sync {
    // Radiance estimate for a single camera sub-sample.
    fn li(&self, scene: &Scene, ray: Ray3f, sampler: &mut Sampler) -> Vector3f;
}

pub fn make_integrator(config: &IntegratorConfig) -> Box<dyn Integrator> {
    match config.kind {
        IntegratorKind::Path => Box::new(PathIntegrator::new(config)),
        IntegratorKind::VolPath => Box::new(VolPathIntegrator::new(config)),
    }
}

pub fn power_heuristic(pdf_a: Float, pdf_b: Float) -> Float {
    let a2 = pdf_a * pdf_a;
    let b2 = pdf_b * pdf_b;
    if a2 + b2 == 0.0 {
        0.0
    } else {
        a2 / (a2 + b2)
    }
}

#[cfg(test)]
mod tests {
    use super::power_heuristic;

    #[test]
    fn test_power_heuristic_limits() {
        assert_eq!(power_heuristic(0.0, 0.0), 0.0);
        assert!((power_heuristic(1.0, 1.0) - 0.5).abs() < 1e-6);
        assert!(power_heuristic(10.0, 0.1) > 0.99);
        let complementary = power_heuristic(0.3, 0.7) + power_heuristic(0.7, 0.3);
        assert!((complementary - 1.0).abs() < 1e-6);
    }
}
