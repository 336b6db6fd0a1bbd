// Copyright @yucwang 2026

use crate::core::config::{GeometryConfig, InstanceConfig, INVALID_ID};
use crate::core::error::Error;
use crate::core::shape::{Shape, SurfaceSample};
use crate::math::aabb::AABB;
use crate::math::constants::{Float, Vector2f, Vector3f, EPSILON, PI};
use crate::math::ray::Ray3f;
use crate::math::transform::Transform;

// World-space intersection record handed to the integrators.
#[derive(Clone, Copy)]
pub struct Hit {
    pub t: Float,
    pub p: Vector3f,
    pub normal_geom: Vector3f,
    pub normal_shade: Vector3f,
    pub uv: Vector2f,
    pub tangent: Vector3f,
    pub bitangent: Vector3f,
    // True when the backface was hit.
    pub inside: bool,
    pub instance_id: u32,
    pub id_bsdf: u32,
    pub id_medium_int: u32,
    pub id_medium_ext: u32,
    // Radiance for area-light surfaces, filled during intersection.
    pub emitter_color: Vector3f,
}

pub struct Instance {
    pub shape: Shape,
    pub to_world: Transform,
    pub flip_normals: bool,
    pub id_bsdf: u32,
    pub id_medium_int: u32,
    pub id_medium_ext: u32,
    world_bounds: AABB,
    world_area: Float,
    // Prefix sums of world-space triangle areas for mesh emitters.
    mesh_area_cdf: Vec<Float>,
}

impl Instance {
    pub fn from_config(config: &InstanceConfig, n_bsdfs: usize, n_media: usize)
                       -> Result<Self, Error> {
        if config.id_bsdf != INVALID_ID && config.id_bsdf as usize >= n_bsdfs {
            return Err(Error::config(format!(
                "instance references unknown bsdf {}", config.id_bsdf)));
        }
        for id in [config.id_medium_int, config.id_medium_ext] {
            if id != INVALID_ID && id as usize >= n_media {
                return Err(Error::config(format!(
                    "instance references unknown medium {}", id)));
            }
        }

        let shape = Shape::from_config(&config.geometry)?;
        let to_world = config.to_world;

        let local_bounds = shape.bounding_box();
        let mut world_bounds = AABB::default();
        for idx in 0..8 {
            let corner = Vector3f::new(
                if idx & 1 == 0 { local_bounds.p_min.x } else { local_bounds.p_max.x },
                if idx & 2 == 0 { local_bounds.p_min.y } else { local_bounds.p_max.y },
                if idx & 4 == 0 { local_bounds.p_min.z } else { local_bounds.p_max.z },
            );
            world_bounds.expand_by_point(&to_world.apply_point(corner));
        }
        world_bounds.expand_degenerate(EPSILON);

        let (world_area, mesh_area_cdf) = world_surface_area(&shape, &to_world);

        Ok(Self {
            shape,
            to_world,
            flip_normals: config.flip_normals,
            id_bsdf: config.id_bsdf,
            id_medium_int: config.id_medium_int,
            id_medium_ext: config.id_medium_ext,
            world_bounds,
            world_area,
            mesh_area_cdf,
        })
    }

    pub fn world_bounds(&self) -> &AABB {
        &self.world_bounds
    }

    pub fn world_area(&self) -> Float {
        self.world_area
    }

    // Closest hit in world space. `max_t` is measured along the world
    // ray direction; the local ray keeps the unnormalized direction so
    // distances carry over unchanged.
    pub fn intersect(&self, ray: &Ray3f, instance_id: u32, max_t: Float)
                     -> Option<Hit> {
        let mut local_ray = self.to_world.inv_apply_ray(ray);
        local_ray.max_t = max_t;
        let local = self.shape.intersect(&local_ray)?;

        let p = self.to_world.apply_point(local.p);
        let mut normal_geom = self.to_world.apply_normal(local.normal_geom).normalize();
        let mut normal_shade = self.to_world.apply_normal(local.normal_shade).normalize();
        if self.flip_normals {
            normal_geom = -normal_geom;
            normal_shade = -normal_shade;
        }

        // Re-orthogonalize the tangent frame after the transform.
        let mut tangent = self.to_world.apply_vector(local.tangent);
        tangent -= normal_shade * normal_shade.dot(&tangent);
        let tangent = if tangent.norm_squared() > 1e-12 {
            tangent.normalize()
        } else {
            crate::math::frame::Frame::from_normal(normal_shade).t
        };
        let bitangent = normal_shade.cross(&tangent);

        let inside = ray.dir().dot(&normal_geom) > 0.0;

        Some(Hit {
            t: local.t,
            p,
            normal_geom,
            normal_shade,
            uv: local.uv,
            tangent,
            bitangent,
            inside,
            instance_id,
            id_bsdf: self.id_bsdf,
            id_medium_int: self.id_medium_int,
            id_medium_ext: self.id_medium_ext,
            emitter_color: Vector3f::zeros(),
        })
    }

    pub fn intersect_any(&self, ray: &Ray3f, max_t: Float) -> bool {
        let mut local_ray = self.to_world.inv_apply_ray(ray);
        local_ray.max_t = max_t;
        self.shape.intersect_any(&local_ray)
    }

    // Area-uniform surface sample in world space; the density is
    // 1 / world_area. Meshes resample by world triangle areas so
    // non-uniform scales stay unbiased.
    pub fn sample_surface(&self, u: &Vector2f) -> (SurfaceSample, Float) {
        let local = match (&self.shape, self.mesh_area_cdf.last().copied()) {
            (Shape::Mesh(mesh), Some(total)) if total > 0.0 => {
                let target = u.x * total;
                let index = match self.mesh_area_cdf.binary_search_by(|probe| {
                    probe.partial_cmp(&target).unwrap_or(std::cmp::Ordering::Less)
                }) {
                    Ok(idx) => idx,
                    Err(idx) => idx.min(self.mesh_area_cdf.len() - 1),
                };
                let low = if index == 0 { 0.0 } else { self.mesh_area_cdf[index - 1] };
                let span = (self.mesh_area_cdf[index] - low).max(1e-12);
                let u1 = ((target - low) / span).clamp(0.0, 1.0 - 1e-6);
                mesh.sample_triangle(index, &Vector2f::new(u1, u.y))
            }
            _ => self.shape.sample_surface(u),
        };

        let mut normal = self.to_world.apply_normal(local.normal).normalize();
        if self.flip_normals {
            normal = -normal;
        }
        let sample = SurfaceSample {
            p: self.to_world.apply_point(local.p),
            normal,
            uv: local.uv,
        };
        let pdf_area = if self.world_area > 0.0 { 1.0 / self.world_area } else { 0.0 };
        (sample, pdf_area)
    }
}

// World-space surface area; exact for meshes, rectangles and disks,
// an ellipsoid-style estimate for the remaining analytic shapes.
fn world_surface_area(shape: &Shape, to_world: &Transform) -> (Float, Vec<Float>) {
    let ex = to_world.apply_vector(Vector3f::new(1.0, 0.0, 0.0));
    let ey = to_world.apply_vector(Vector3f::new(0.0, 1.0, 0.0));
    let ez = to_world.apply_vector(Vector3f::new(0.0, 0.0, 1.0));

    match shape {
        Shape::Rectangle(_) => ((ex.cross(&ey)).norm() * 4.0, Vec::new()),
        Shape::Disk(_) => ((ex.cross(&ey)).norm() * PI, Vec::new()),
        Shape::Cube(_) => {
            let area = 4.0 * 2.0
                * (ex.cross(&ey).norm() + ey.cross(&ez).norm() + ez.cross(&ex).norm());
            (area, Vec::new())
        }
        Shape::Sphere(_) | Shape::Cylinder(_) => {
            let s2 = (ex.cross(&ey).norm() + ey.cross(&ez).norm() + ez.cross(&ex).norm()) / 3.0;
            (shape.surface_area() * s2, Vec::new())
        }
        Shape::Mesh(mesh) => {
            let mut cdf = Vec::with_capacity(mesh.triangle_count());
            let mut total = 0.0;
            for idx in 0..mesh.triangle_count() {
                let (p0, p1, p2) = mesh.triangle(idx);
                let q0 = to_world.apply_point(p0);
                let q1 = to_world.apply_point(p1);
                let q2 = to_world.apply_point(p2);
                total += 0.5 * (q1 - q0).cross(&(q2 - q0)).norm();
                cdf.push(total);
            }
            (total, cdf)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::GeometryConfig;

    fn sphere_at(center: Vector3f) -> Instance {
        let config = InstanceConfig::new(
            GeometryConfig::Sphere { center: Vector3f::zeros(), radius: 1.0 },
            Transform::translate(center),
            INVALID_ID,
        );
        Instance::from_config(&config, 0, 0).unwrap()
    }

    #[test]
    fn test_translated_sphere_hit() {
        let instance = sphere_at(Vector3f::new(10.0, 0.0, 0.0));
        let ray = Ray3f::new(Vector3f::new(10.0, 0.0, -5.0),
                             Vector3f::new(0.0, 0.0, 1.0), None, None);
        let hit = instance.intersect(&ray, 0, Float::MAX).expect("must hit");
        assert!((hit.t - 4.0).abs() < 1e-4);
        assert!((hit.p - Vector3f::new(10.0, 0.0, -1.0)).norm() < 1e-4);

        let miss = Ray3f::new(Vector3f::new(0.0, 0.0, -5.0),
                              Vector3f::new(0.0, 0.0, 1.0), None, None);
        assert!(instance.intersect(&miss, 0, Float::MAX).is_none());
    }

    #[test]
    fn test_rotated_normal() {
        let rot = Transform::rotate(Vector3f::new(0.0, 0.0, 1.0), 0.5 * PI);
        let config = InstanceConfig::new(GeometryConfig::Rectangle, rot, INVALID_ID);
        let instance = Instance::from_config(&config, 0, 0).unwrap();
        let ray = Ray3f::new(Vector3f::new(0.0, 0.0, 5.0),
                             Vector3f::new(0.0, 0.0, -1.0), None, None);
        let hit = instance.intersect(&ray, 0, Float::MAX).expect("must hit");
        // Rotation around z leaves the +z rectangle normal unchanged.
        assert!((hit.normal_geom - Vector3f::new(0.0, 0.0, 1.0)).norm() < 1e-4);
        // The local +x tangent rotates onto +y.
        assert!((hit.tangent - Vector3f::new(0.0, 1.0, 0.0)).norm() < 1e-4);
    }

    #[test]
    fn test_scaled_instance_t_is_world_distance() {
        let config = InstanceConfig::new(
            GeometryConfig::Sphere { center: Vector3f::zeros(), radius: 1.0 },
            Transform::scale(Vector3f::new(2.0, 2.0, 2.0)),
            INVALID_ID,
        );
        let instance = Instance::from_config(&config, 0, 0).unwrap();
        let ray = Ray3f::new(Vector3f::new(0.0, 0.0, -10.0),
                             Vector3f::new(0.0, 0.0, 1.0), None, None);
        let hit = instance.intersect(&ray, 0, Float::MAX).expect("must hit");
        assert!((hit.t - 8.0).abs() < 1e-4);
    }

    #[test]
    fn test_inside_flag() {
        let instance = sphere_at(Vector3f::zeros());
        let ray = Ray3f::new(Vector3f::zeros(), Vector3f::new(1.0, 0.0, 0.0), None, None);
        let hit = instance.intersect(&ray, 0, Float::MAX).expect("must hit");
        assert!(hit.inside);
    }

    #[test]
    fn test_flip_normals() {
        let mut config = InstanceConfig::new(GeometryConfig::Rectangle,
                                             Transform::default(), INVALID_ID);
        config.flip_normals = true;
        let instance = Instance::from_config(&config, 0, 0).unwrap();
        let ray = Ray3f::new(Vector3f::new(0.0, 0.0, 5.0),
                             Vector3f::new(0.0, 0.0, -1.0), None, None);
        let hit = instance.intersect(&ray, 0, Float::MAX).expect("must hit");
        assert!((hit.normal_geom - Vector3f::new(0.0, 0.0, -1.0)).norm() < 1e-4);
        assert!(hit.inside);
    }

    #[test]
    fn test_world_area_scaled_rectangle() {
        let config = InstanceConfig::new(
            GeometryConfig::Rectangle,
            Transform::scale(Vector3f::new(3.0, 2.0, 1.0)),
            INVALID_ID,
        );
        let instance = Instance::from_config(&config, 0, 0).unwrap();
        assert!((instance.world_area() - 24.0).abs() < 1e-3);
    }
}
