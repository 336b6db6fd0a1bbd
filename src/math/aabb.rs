// Copyright @yucwang 2026

use super::constants::{Float, Int, Vector3f, FLOAT_MAX, FLOAT_MIN};
use super::ray::Ray3f;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AABB {
    pub p_min: Vector3f,
    pub p_max: Vector3f,
}

impl Default for AABB {
    fn default() -> Self {
        Self { p_min: Vector3f::new(FLOAT_MAX, FLOAT_MAX, FLOAT_MAX),
               p_max: Vector3f::new(FLOAT_MIN, FLOAT_MIN, FLOAT_MIN) }
    }
}

impl AABB {
    pub fn new(p_min: Vector3f, p_max: Vector3f) -> Self {
        let mut min = Vector3f::new(0.0, 0.0, 0.0);
        let mut max = Vector3f::new(0.0, 0.0, 0.0);
        for idx in 0..3 {
            min[idx] = p_min[idx].min(p_max[idx]);
            max[idx] = p_max[idx].max(p_min[idx]);
        }
        Self { p_min: min, p_max: max }
    }

    pub fn center(&self) -> Vector3f {
        0.5f32 * self.p_min + 0.5f32 * self.p_max
    }

    pub fn expand_by_point(&mut self, p: &Vector3f) {
        for idx in 0..3 {
            self.p_min[idx] = self.p_min[idx].min(p[idx]);
            self.p_max[idx] = self.p_max[idx].max(p[idx]);
        }
    }

    pub fn expand_by_aabb(&mut self, other: &AABB) {
        for idx in 0..3 {
            self.p_min[idx] = self.p_min[idx].min(other.p_min[idx]);
            self.p_max[idx] = self.p_max[idx].max(other.p_max[idx]);
        }
    }

    // Zero-extent boxes collapse the slab test; pad them out.
    pub fn expand_degenerate(&mut self, epsilon: Float) {
        for idx in 0..3 {
            if self.p_max[idx] - self.p_min[idx] < epsilon {
                self.p_min[idx] -= epsilon;
                self.p_max[idx] += epsilon;
            }
        }
    }

    pub fn ray_intersect(&self, ray: &Ray3f) -> bool {
        let o = ray.origin();
        let d = ray.dir();
        let inv_dir = Vector3f::new(1.0 / d.x, 1.0 / d.y, 1.0 / d.z);
        let neg = [d.x < 0.0, d.y < 0.0, d.z < 0.0];
        self.ray_intersect_fast(&o, &inv_dir, &neg, ray.min_t, ray.max_t)
    }

    // Slab test with the reciprocal direction precomputed by the caller,
    // shared across every node of a traversal.
    pub fn ray_intersect_fast(&self, origin: &Vector3f, inv_dir: &Vector3f,
                              dir_neg: &[bool; 3], min_t: Float, max_t: Float) -> bool {
        let mut t0 = min_t;
        let mut t1 = max_t;
        for idx in 0..3 {
            let (near, far) = if dir_neg[idx] {
                (self.p_max[idx], self.p_min[idx])
            } else {
                (self.p_min[idx], self.p_max[idx])
            };
            t0 = t0.max((near - origin[idx]) * inv_dir[idx]);
            t1 = t1.min((far - origin[idx]) * inv_dir[idx]);
            if t0 > t1 {
                return false;
            }
        }
        true
    }

    pub fn surface_area(&self) -> Float {
        if !self.is_valid() {
            return 0.0;
        }
        let a = self.p_max[0] - self.p_min[0];
        let b = self.p_max[1] - self.p_min[1];
        let c = self.p_max[2] - self.p_min[2];

        2.0f32 * (a * b + a * c + b * c)
    }

    pub fn diagnal(&self) -> Vector3f {
        self.p_max - self.p_min
    }

    pub fn max_extent(&self) -> Int {
        let diagnal = self.diagnal();
        let ans: Int;
        if diagnal[0] > diagnal[1] && diagnal[0] > diagnal[2] {
            ans = 0;
        } else if diagnal[1] > diagnal[2] {
            ans = 1;
        } else {
            ans = 2;
        }

        ans
    }

    pub fn is_valid(&self) -> bool {
        for idx in 0..3 {
            if self.p_min[idx] > self.p_max[idx] {
                return false;
            }
        }

        true
    }
}

/* Test for AABB */
