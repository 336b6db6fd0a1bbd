// Copyright @yucwang 2026

use crate::core::shape::{LocalHit, SurfaceSample};
use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::ray::Ray3f;

// Axis-aligned unit cube spanning [-1, 1]^3.
pub struct Cube;

impl Cube {
    pub fn new() -> Self {
        Self
    }

    pub fn intersect(&self, ray: &Ray3f) -> Option<LocalHit> {
        let o = ray.origin();
        let d = ray.dir();

        let mut t_near = -Float::MAX;
        let mut t_far = Float::MAX;
        let mut axis_near = 0usize;
        let mut axis_far = 0usize;
        for idx in 0..3 {
            if d[idx].abs() < 1e-12 {
                if o[idx].abs() > 1.0 {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / d[idx];
            let mut t0 = (-1.0 - o[idx]) * inv;
            let mut t1 = (1.0 - o[idx]) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            if t0 > t_near {
                t_near = t0;
                axis_near = idx;
            }
            if t1 < t_far {
                t_far = t1;
                axis_far = idx;
            }
            if t_near > t_far {
                return None;
            }
        }

        let (t, axis) = if ray.test_segment(t_near) {
            (t_near, axis_near)
        } else if ray.test_segment(t_far) {
            (t_far, axis_far)
        } else {
            return None;
        };

        let p = ray.at(t);
        let mut n = Vector3f::zeros();
        n[axis] = p[axis].signum();

        let (ua, va) = match axis {
            0 => (1, 2),
            1 => (0, 2),
            _ => (0, 1),
        };
        let uv = Vector2f::new(0.5 * (p[ua] + 1.0), 0.5 * (p[va] + 1.0));
        let mut tangent = Vector3f::zeros();
        tangent[ua] = 1.0;

        Some(LocalHit {
            t,
            p,
            normal_geom: n,
            normal_shade: n,
            uv,
            tangent,
        })
    }

    pub fn bounding_box(&self) -> AABB {
        AABB::new(Vector3f::new(-1.0, -1.0, -1.0), Vector3f::new(1.0, 1.0, 1.0))
    }

    pub fn sample_surface(&self, u: &Vector2f) -> SurfaceSample {
        // All six faces have equal area; stretch u.x to pick one.
        let scaled = u.x * 6.0;
        let face = (scaled as usize).min(5);
        let fu = scaled - face as usize as Float;
        let a = 2.0 * fu - 1.0;
        let b = 2.0 * u.y - 1.0;

        let (p, normal, uv) = match face {
            0 => (Vector3f::new(1.0, a, b), Vector3f::new(1.0, 0.0, 0.0),
                  Vector2f::new(fu, u.y)),
            1 => (Vector3f::new(-1.0, a, b), Vector3f::new(-1.0, 0.0, 0.0),
                  Vector2f::new(fu, u.y)),
            2 => (Vector3f::new(a, 1.0, b), Vector3f::new(0.0, 1.0, 0.0),
                  Vector2f::new(fu, u.y)),
            3 => (Vector3f::new(a, -1.0, b), Vector3f::new(0.0, -1.0, 0.0),
                  Vector2f::new(fu, u.y)),
            4 => (Vector3f::new(a, b, 1.0), Vector3f::new(0.0, 0.0, 1.0),
                  Vector2f::new(fu, u.y)),
            _ => (Vector3f::new(a, b, -1.0), Vector3f::new(0.0, 0.0, -1.0),
                  Vector2f::new(fu, u.y)),
        };
        SurfaceSample { p, normal, uv }
    }

    pub fn surface_area(&self) -> Float {
        24.0
    }
}
