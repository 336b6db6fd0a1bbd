// Copyright @yucwang 2026

use crate::core::shape::{LocalHit, SurfaceSample};
use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector2f, Vector3f, EPSILON};
use crate::math::ray::Ray3f;

// Unit rectangle spanning [-1, 1]^2 in the z = 0 plane, facing +z.
pub struct Rectangle;

impl Rectangle {
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
        if p.x.abs() > 1.0 || p.y.abs() > 1.0 {
            return None;
        }

        Some(LocalHit {
            t,
            p,
            normal_geom: Vector3f::new(0.0, 0.0, 1.0),
            normal_shade: Vector3f::new(0.0, 0.0, 1.0),
            uv: Vector2f::new(0.5 * (p.x + 1.0), 0.5 * (p.y + 1.0)),
            tangent: Vector3f::new(1.0, 0.0, 0.0),
        })
    }

    pub fn bounding_box(&self) -> AABB {
        let mut bbox = AABB::new(Vector3f::new(-1.0, -1.0, 0.0),
                                 Vector3f::new(1.0, 1.0, 0.0));
        bbox.expand_degenerate(EPSILON);
        bbox
    }

    pub fn sample_surface(&self, u: &Vector2f) -> SurfaceSample {
        SurfaceSample {
            p: Vector3f::new(2.0 * u.x - 1.0, 2.0 * u.y - 1.0, 0.0),
            normal: Vector3f::new(0.0, 0.0, 1.0),
            uv: *u,
        }
    }

    pub fn surface_area(&self) -> Float {
        4.0
    }
}
