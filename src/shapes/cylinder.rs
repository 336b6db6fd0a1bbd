// Copyright @yucwang 2026

use crate::core::shape::{LocalHit, SurfaceSample};
use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector2f, Vector3f, INV_TWO_PI, PI};
use crate::math::frame::Frame;
use crate::math::ray::Ray3f;

// Open cylinder around the segment p0 -> p1.
pub struct Cylinder {
    p0: Vector3f,
    radius: Float,
    height: Float,
    frame: Frame,
}

impl Cylinder {
    pub fn new(p0: Vector3f, p1: Vector3f, radius: Float) -> Self {
        let axis = p1 - p0;
        let height = axis.norm();
        Self {
            p0,
            radius,
            height,
            frame: Frame::from_normal(axis / height),
        }
    }

    pub fn intersect(&self, ray: &Ray3f) -> Option<LocalHit> {
        // Work in the cylinder frame: axis along +z from the origin.
        let o = self.frame.to_local(&(ray.origin() - self.p0));
        let d = self.frame.to_local(&ray.dir());

        let a = d.x * d.x + d.y * d.y;
        if a < 1e-12 {
            return None;
        }
        let b = 2.0 * (o.x * d.x + o.y * d.y);
        let c = o.x * o.x + o.y * o.y - self.radius * self.radius;
        let disc = b * b - 4.0 * a * c;
        if disc < 0.0 {
            return None;
        }
        let sqrt_disc = disc.sqrt();

        for t in [(-b - sqrt_disc) / (2.0 * a), (-b + sqrt_disc) / (2.0 * a)] {
            if !ray.test_segment(t) {
                continue;
            }
            let q = o + d * t;
            if q.z < 0.0 || q.z > self.height {
                continue;
            }

            let radial = Vector3f::new(q.x, q.y, 0.0) / self.radius;
            let phi = q.y.atan2(q.x);
            let phi = if phi < 0.0 { phi + 2.0 * PI } else { phi };
            let tangent_local = Vector3f::new(-radial.y, radial.x, 0.0);

            return Some(LocalHit {
                t,
                p: ray.at(t),
                normal_geom: self.frame.to_world(&radial),
                normal_shade: self.frame.to_world(&radial),
                uv: Vector2f::new(phi * INV_TWO_PI, q.z / self.height),
                tangent: self.frame.to_world(&tangent_local),
            });
        }
        None
    }

    pub fn bounding_box(&self) -> AABB {
        let mut bbox = AABB::default();
        // Conservative: expand both cap centers by the radius.
        let r = Vector3f::new(self.radius, self.radius, self.radius);
        let p1 = self.p0 + self.frame.to_world(&Vector3f::new(0.0, 0.0, self.height));
        bbox.expand_by_point(&(self.p0 - r));
        bbox.expand_by_point(&(self.p0 + r));
        bbox.expand_by_point(&(p1 - r));
        bbox.expand_by_point(&(p1 + r));
        bbox
    }

    pub fn sample_surface(&self, u: &Vector2f) -> SurfaceSample {
        let phi = 2.0 * PI * u.x;
        let z = u.y * self.height;
        let radial = Vector3f::new(phi.cos(), phi.sin(), 0.0);
        let local = radial * self.radius + Vector3f::new(0.0, 0.0, z);
        SurfaceSample {
            p: self.p0 + self.frame.to_world(&local),
            normal: self.frame.to_world(&radial),
            uv: Vector2f::new(u.x, u.y),
        }
    }

    pub fn surface_area(&self) -> Float {
        2.0 * PI * self.radius * self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_side() {
        let cyl = Cylinder::new(Vector3f::new(0.0, 0.0, -1.0),
                                Vector3f::new(0.0, 0.0, 1.0), 0.5);
        let ray = Ray3f::new(Vector3f::new(5.0, 0.0, 0.0),
                             Vector3f::new(-1.0, 0.0, 0.0), None, None);
        let hit = cyl.intersect(&ray).expect("ray must hit");
        assert!((hit.t - 4.5).abs() < 1e-4);
        assert!((hit.normal_geom - Vector3f::new(1.0, 0.0, 0.0)).norm() < 1e-4);
    }

    #[test]
    fn test_miss_beyond_caps() {
        let cyl = Cylinder::new(Vector3f::new(0.0, 0.0, -1.0),
                                Vector3f::new(0.0, 0.0, 1.0), 0.5);
        let ray = Ray3f::new(Vector3f::new(5.0, 0.0, 3.0),
                             Vector3f::new(-1.0, 0.0, 0.0), None, None);
        assert!(cyl.intersect(&ray).is_none());
    }

    #[test]
    fn test_open_ends_pass_axial_rays() {
        let cyl = Cylinder::new(Vector3f::new(0.0, 0.0, -1.0),
                                Vector3f::new(0.0, 0.0, 1.0), 0.5);
        let ray = Ray3f::new(Vector3f::new(0.0, 0.0, -5.0),
                             Vector3f::new(0.0, 0.0, 1.0), None, None);
        assert!(cyl.intersect(&ray).is_none());
    }
}
