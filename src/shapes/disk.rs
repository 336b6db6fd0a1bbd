// Copyright @yucwang 2026

use crate::core::shape::{LocalHit, SurfaceSample};
use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector2f, Vector3f, EPSILON, INV_TWO_PI, PI};
use crate::math::ray::Ray3f;
use crate::math::warp::sample_uniform_disk_concentric;

// Unit disk in the z = 0 plane, facing +z. uv is polar: radius and
// normalized angle.
pub struct Disk;

impl Disk {
    pub fn new() -> Self {
        Self
    }

    pub fn intersect(&self, ray: &Ray3f) -> Option<LocalHit> {
        let o = ray.origin();
        let d = ray.dir();
        if d.z.abs() < 1e-12 {
            return None;
        }

        let t = -o.z / d.z;
        if !ray.test_segment(t) {
            return None;
        }
        let p = ray.at(t);
        let r2 = p.x * p.x + p.y * p.y;
        if r2 > 1.0 {
            return None;
        }

        let r = r2.sqrt();
        let phi = p.y.atan2(p.x);
        let phi = if phi < 0.0 { phi + 2.0 * PI } else { phi };
        let tangent = if r > 1e-6 {
            Vector3f::new(-p.y, p.x, 0.0) / r
        } else {
            Vector3f::new(1.0, 0.0, 0.0)
        };

        Some(LocalHit {
            t,
            p,
            normal_geom: Vector3f::new(0.0, 0.0, 1.0),
            normal_shade: Vector3f::new(0.0, 0.0, 1.0),
            uv: Vector2f::new(r, phi * INV_TWO_PI),
            tangent,
        })
    }

    pub fn bounding_box(&self) -> AABB {
        let mut bbox = AABB::new(Vector3f::new(-1.0, -1.0, 0.0),
                                 Vector3f::new(1.0, 1.0, 0.0));
        bbox.expand_degenerate(EPSILON);
        bbox
    }

    pub fn sample_surface(&self, u: &Vector2f) -> SurfaceSample {
        let p = sample_uniform_disk_concentric(u);
        let r = (p.x * p.x + p.y * p.y).sqrt();
        let phi = p.y.atan2(p.x);
        let phi = if phi < 0.0 { phi + 2.0 * PI } else { phi };
        SurfaceSample {
            p: Vector3f::new(p.x, p.y, 0.0),
            normal: Vector3f::new(0.0, 0.0, 1.0),
            uv: Vector2f::new(r, phi * INV_TWO_PI),
        }
    }

    pub fn surface_area(&self) -> Float {
        PI
    }
}
