// Copyright @yucwang 2026

use crate::core::shape::{LocalHit, SurfaceSample};
use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector2f, Vector3f, INV_PI, INV_TWO_PI, PI};
use crate::math::ray::Ray3f;
use crate::math::warp::sample_uniform_sphere;

pub struct Sphere {
    center: Vector3f,
    radius: Float,
}

impl Sphere {
    pub fn new(center: Vector3f, radius: Float) -> Self {
        Self { center, radius }
    }

    pub fn intersect(&self, ray: &Ray3f) -> Option<LocalHit> {
        let oc = ray.origin() - self.center;
        let d = ray.dir();
        let a = d.dot(&d);
        let b = 2.0 * oc.dot(&d);
        let c = oc.dot(&oc) - self.radius * self.radius;

        let disc = b * b - 4.0 * a * c;
        if disc < 0.0 || a == 0.0 {
            return None;
        }
        let sqrt_disc = disc.sqrt();
        let t0 = (-b - sqrt_disc) / (2.0 * a);
        let t1 = (-b + sqrt_disc) / (2.0 * a);

        let t = if ray.test_segment(t0) {
            t0
        } else if ray.test_segment(t1) {
            t1
        } else {
            return None;
        };

        let p = ray.at(t);
        let n = (p - self.center) / self.radius;
        Some(self.hit_from_normal(t, p, n))
    }

    fn hit_from_normal(&self, t: Float, p: Vector3f, n: Vector3f) -> LocalHit {
        let phi = n.y.atan2(n.x);
        let phi = if phi < 0.0 { phi + 2.0 * PI } else { phi };
        let theta = n.z.clamp(-1.0, 1.0).acos();
        let uv = Vector2f::new(phi * INV_TWO_PI, theta * INV_PI);

        let sin_theta = (1.0 - n.z * n.z).max(0.0).sqrt();
        let tangent = if sin_theta > 1e-6 {
            Vector3f::new(-n.y, n.x, 0.0) / sin_theta
        } else {
            Vector3f::new(1.0, 0.0, 0.0)
        };

        LocalHit {
            t,
            p,
            normal_geom: n,
            normal_shade: n,
            uv,
            tangent,
        }
    }

    pub fn bounding_box(&self) -> AABB {
        let r = Vector3f::new(self.radius, self.radius, self.radius);
        AABB::new(self.center - r, self.center + r)
    }

    pub fn sample_surface(&self, u: &Vector2f) -> SurfaceSample {
        let n = sample_uniform_sphere(u);
        let hit = self.hit_from_normal(0.0, self.center + n * self.radius, n);
        SurfaceSample {
            p: hit.p,
            normal: n,
            uv: hit.uv,
        }
    }

    pub fn surface_area(&self) -> Float {
        4.0 * PI * self.radius * self.radius
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_from_outside() {
        let sphere = Sphere::new(Vector3f::new(0.0, 0.0, 5.0), 1.0);
        let ray = Ray3f::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, 1.0), None, None);
        let hit = sphere.intersect(&ray).expect("ray must hit");
        assert!((hit.t - 4.0).abs() < 1e-5);
        assert!((hit.normal_geom - Vector3f::new(0.0, 0.0, -1.0)).norm() < 1e-5);
    }

    #[test]
    fn test_hit_from_inside_picks_far_root() {
        let sphere = Sphere::new(Vector3f::zeros(), 2.0);
        let ray = Ray3f::new(Vector3f::zeros(), Vector3f::new(1.0, 0.0, 0.0), None, None);
        let hit = sphere.intersect(&ray).expect("ray must hit");
        assert!((hit.t - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_miss() {
        let sphere = Sphere::new(Vector3f::new(0.0, 5.0, 0.0), 1.0);
        let ray = Ray3f::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, 1.0), None, None);
        assert!(sphere.intersect(&ray).is_none());
    }

    #[test]
    fn test_tangent_orthogonal_to_normal() {
        let sphere = Sphere::new(Vector3f::zeros(), 1.0);
        let ray = Ray3f::new(Vector3f::new(3.0, 0.4, 0.2), Vector3f::new(-1.0, -0.1, 0.0), None, None);
        let hit = sphere.intersect(&ray).expect("ray must hit");
        assert!(hit.tangent.dot(&hit.normal_geom).abs() < 1e-4);
    }
}
