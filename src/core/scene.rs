// Copyright @yucwang 2026

use crate::core::bsdf::{Bsdf, Lobe};
use crate::core::bvh::Bvh;
use crate::core::config::{CameraConfig, IntegratorConfig, SceneConfig, INVALID_ID};
use crate::core::emitter::Emitter;
use crate::core::error::Error;
use crate::core::instance::{Hit, Instance};
use crate::core::medium::Medium;
use crate::core::rng::Sampler;
use crate::core::texture::Texture;
use crate::emitters::area::AreaEmitter;
use crate::math::constants::{Float, Vector2f, Vector3f, EPSILON};
use crate::math::frame::Frame;
use crate::math::ray::Ray3f;

// Bound on stochastic opacity steps along one shadow ray.
const MAX_PASS_THROUGH_STEPS: usize = 16;

pub struct Scene {
    pub camera: CameraConfig,
    pub integrator: IntegratorConfig,
    pub textures: Vec<Texture>,
    pub bsdfs: Vec<Bsdf>,
    pub media: Vec<Medium>,
    pub instances: Vec<Instance>,
    pub emitters: Vec<Emitter>,
    tlas: Bvh,
    // instance id -> index into `emitters` for area-light instances.
    emitter_of_instance: Vec<u32>,
    has_pass_through: bool,
}

impl Scene {
    pub fn build(config: &SceneConfig) -> Result<Self, Error> {
        let camera = config.camera;
        if camera.width == 0 || camera.height == 0 {
            return Err(Error::config("camera with zero resolution"));
        }
        if camera.fov_x <= 0.0 || camera.fov_x >= std::f32::consts::PI {
            return Err(Error::config("camera fov_x outside (0, pi)"));
        }
        if camera.spp == 0 {
            return Err(Error::config("camera with zero samples per pixel"));
        }
        if (camera.look_at - camera.eye).norm_squared() <= 0.0 {
            return Err(Error::config("camera eye and look-at coincide"));
        }

        let integrator = config.integrator;
        if integrator.depth_max < 1 {
            return Err(Error::config("integrator depth_max must be at least 1"));
        }
        if integrator.pdf_rr <= 0.0 || integrator.pdf_rr > 1.0 {
            return Err(Error::config("integrator pdf_rr outside (0, 1]"));
        }

        let mut textures = Vec::with_capacity(config.textures.len());
        for texture in &config.textures {
            textures.push(Texture::from_config(texture)?);
        }

        let mut bsdfs = Vec::with_capacity(config.bsdfs.len());
        for bsdf in &config.bsdfs {
            bsdfs.push(Bsdf::from_config(bsdf, textures.len())?);
        }

        let mut media = Vec::with_capacity(config.media.len());
        for medium in &config.media {
            media.push(Medium::from_config(medium)?);
        }

        let mut instances = Vec::with_capacity(config.instances.len());
        for instance in &config.instances {
            instances.push(Instance::from_config(instance, bsdfs.len(), media.len())?);
        }

        let mut emitters = Vec::with_capacity(config.emitters.len());
        for emitter in &config.emitters {
            emitters.push(Emitter::from_config(emitter, &textures)?);
        }

        // Wrap every area-light instance in an implicit emitter.
        let mut emitter_of_instance = vec![INVALID_ID; instances.len()];
        for (idx, instance) in instances.iter().enumerate() {
            if instance.id_bsdf == INVALID_ID {
                continue;
            }
            if let Lobe::AreaLight(area) = &bsdfs[instance.id_bsdf as usize].lobe {
                emitter_of_instance[idx] = emitters.len() as u32;
                emitters.push(Emitter::Area(AreaEmitter::new(
                    idx as u32, area.id_radiance, area.weight)));
            }
        }

        if !instances.is_empty() && emitters.is_empty() {
            return Err(Error::config("scene with geometry but no emitters"));
        }

        let mut tlas_bounds = Vec::with_capacity(instances.len());
        let mut tlas_centroids = Vec::with_capacity(instances.len());
        for instance in &instances {
            tlas_bounds.push(*instance.world_bounds());
            tlas_centroids.push(instance.world_bounds().center());
        }
        let tlas = Bvh::build(&tlas_bounds, &tlas_centroids)?;

        let has_pass_through = instances.iter().any(|i| i.id_bsdf == INVALID_ID)
            || bsdfs.iter().any(|b| b.id_opacity != INVALID_ID);

        log::info!(
            "scene built: {} instances, {} emitters, {} bsdfs, {} textures, {} media, {} tlas nodes",
            instances.len(), emitters.len(), bsdfs.len(), textures.len(),
            media.len(), tlas.node_count());

        Ok(Self {
            camera,
            integrator,
            textures,
            bsdfs,
            media,
            instances,
            emitters,
            tlas,
            emitter_of_instance,
            has_pass_through,
        })
    }

    // Closest intersection in world space; fills the emitted radiance
    // for area-light surfaces.
    pub fn intersect(&self, ray: &Ray3f) -> Option<Hit> {
        let origin = ray.origin();
        let dir = ray.dir();
        let found = self.tlas.intersect(&origin, &dir, ray.min_t, ray.max_t, |prim, max_t| {
            self.instances[prim as usize]
                .intersect(ray, prim, max_t)
                .map(|hit| { let t = hit.t; (hit, t) })
        });
        found.map(|(_, mut hit)| {
            if hit.id_bsdf != INVALID_ID {
                hit.emitter_color = self.bsdfs[hit.id_bsdf as usize]
                    .emitted_radiance(&self.textures, &hit.uv);
            }
            hit
        })
    }

    // Shadow query. Opacity-mapped surfaces pass the ray through
    // stochastically; surfaces with no BSDF never occlude.
    pub fn intersect_any(&self, ray: &Ray3f, sampler: &mut Sampler) -> bool {
        if !self.has_pass_through {
            let origin = ray.origin();
            let dir = ray.dir();
            return self.tlas.intersect_any(&origin, &dir, ray.min_t, ray.max_t, |prim| {
                self.instances[prim as usize].intersect_any(ray, ray.max_t)
            });
        }

        let mut min_t = ray.min_t;
        for _ in 0..MAX_PASS_THROUGH_STEPS {
            let segment = Ray3f::new_unnormalized(
                ray.origin(), ray.dir(), Some(min_t), Some(ray.max_t));
            let hit = match self.intersect(&segment) {
                Some(hit) => hit,
                None => return false,
            };
            if hit.id_bsdf != INVALID_ID {
                let bsdf = &self.bsdfs[hit.id_bsdf as usize];
                let alpha = bsdf.opacity(&self.textures, &hit.uv);
                if alpha >= 1.0 || sampler.next_f32() < alpha {
                    return true;
                }
            }
            min_t = hit.t + EPSILON;
        }
        true
    }

    pub fn emitter_count(&self) -> usize {
        self.emitters.len()
    }

    // The implicit area emitter wrapped around an instance, if any.
    pub fn area_emitter_of(&self, instance_id: u32) -> Option<&AreaEmitter> {
        let idx = self.emitter_of_instance[instance_id as usize];
        if idx == INVALID_ID {
            return None;
        }
        match &self.emitters[idx as usize] {
            Emitter::Area(area) => Some(area),
            _ => None,
        }
    }

    // Shading frame at a hit, with the BSDF's bump map applied.
    pub fn shading_frame(&self, hit: &Hit) -> Frame {
        let mut frame = Frame::from_tangents(hit.tangent, hit.bitangent, hit.normal_shade);
        if hit.id_bsdf == INVALID_ID {
            return frame;
        }
        let bsdf = &self.bsdfs[hit.id_bsdf as usize];
        if bsdf.id_bump_map == INVALID_ID {
            return frame;
        }

        let texture = &self.textures[bsdf.id_bump_map as usize];
        let (width, height) = texture.resolution();
        let du = 1.0 / width.max(2) as Float;
        let dv = 1.0 / height.max(2) as Float;
        let h00 = texture.eval_scalar(&hit.uv);
        let h10 = texture.eval_scalar(&Vector2f::new(hit.uv.x + du, hit.uv.y));
        let h01 = texture.eval_scalar(&Vector2f::new(hit.uv.x, hit.uv.y + dv));
        let dhdu = (h10 - h00) / du;
        let dhdv = (h01 - h00) / dv;

        let dpdu = frame.t + hit.normal_shade * dhdu;
        let dpdv = frame.b + hit.normal_shade * dhdv;
        let mut normal = dpdu.cross(&dpdv);
        if normal.norm_squared() <= 1e-12 {
            return frame;
        }
        normal = normal.normalize();
        if normal.dot(&hit.normal_shade) < 0.0 {
            normal = -normal;
        }

        let mut tangent = frame.t - normal * normal.dot(&frame.t);
        if tangent.norm_squared() <= 1e-12 {
            return Frame::from_normal(normal);
        }
        tangent = tangent.normalize();
        frame = Frame::from_tangents(tangent, normal.cross(&tangent), normal);
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::*;
    use crate::math::transform::Transform;

    fn two_sphere_config() -> SceneConfig {
        let mut config = SceneConfig::default();
        config.textures.push(TextureConfig::Constant {
            color: Vector3f::new(0.5, 0.5, 0.5),
        });
        config.bsdfs.push(BsdfConfig {
            variant: BsdfVariant::Diffuse { id_reflectance: 0 },
            twosided: false,
            id_opacity: INVALID_ID,
            id_bump_map: INVALID_ID,
        });
        for z in [5.0, 9.0] {
            config.instances.push(InstanceConfig::new(
                GeometryConfig::Sphere { center: Vector3f::zeros(), radius: 1.0 },
                Transform::translate(Vector3f::new(0.0, 0.0, z)),
                0,
            ));
        }
        config.emitters.push(EmitterConfig::Constant {
            radiance: Vector3f::new(1.0, 1.0, 1.0),
        });
        config
    }

    #[test]
    fn test_intersect_returns_nearest_instance() {
        let scene = Scene::build(&two_sphere_config()).unwrap();
        let ray = Ray3f::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, 1.0), None, None);
        let hit = scene.intersect(&ray).expect("must hit");
        assert_eq!(hit.instance_id, 0);
        assert!((hit.t - 4.0).abs() < 1e-4);
    }

    #[test]
    fn test_intersect_any_blocks() {
        let scene = Scene::build(&two_sphere_config()).unwrap();
        let mut sampler = Sampler::new(1, 1);
        let ray = Ray3f::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, 1.0),
                             Some(0.0), Some(100.0));
        assert!(scene.intersect_any(&ray, &mut sampler));
        let miss = Ray3f::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, -1.0),
                              Some(0.0), Some(100.0));
        assert!(!scene.intersect_any(&miss, &mut sampler));
    }

    #[test]
    fn test_opacity_passthrough_lets_light_through() {
        let mut config = two_sphere_config();
        // Fully transparent opacity on the front sphere.
        config.textures.push(TextureConfig::Constant { color: Vector3f::zeros() });
        config.bsdfs[0].id_opacity = 1;
        let scene = Scene::build(&config).unwrap();
        let mut sampler = Sampler::new(2, 1);
        let ray = Ray3f::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, 1.0),
                             Some(0.0), Some(100.0));
        assert!(!scene.intersect_any(&ray, &mut sampler));
    }

    #[test]
    fn test_area_light_instances_become_emitters() {
        let mut config = two_sphere_config();
        config.bsdfs.push(BsdfConfig {
            variant: BsdfVariant::AreaLight { id_radiance: 0, weight: 1.0 },
            twosided: false,
            id_opacity: INVALID_ID,
            id_bump_map: INVALID_ID,
        });
        config.instances.push(InstanceConfig::new(
            GeometryConfig::Rectangle,
            Transform::translate(Vector3f::new(0.0, 5.0, 0.0)),
            1,
        ));
        let scene = Scene::build(&config).unwrap();
        assert_eq!(scene.emitter_count(), 2);
        assert!(scene.area_emitter_of(2).is_some());
        assert!(scene.area_emitter_of(0).is_none());

        // The light rectangle still spans the z = 0 plane around
        // (0, 5, 0); approach it head-on from +z.
        let ray = Ray3f::new(Vector3f::new(0.0, 5.0, 5.0),
                             Vector3f::new(0.0, 0.0, -1.0), None, None);
        let hit = scene.intersect(&ray).expect("must hit the light");
        assert!((hit.emitter_color.x - 0.5).abs() < 1e-5);
    }

    // TLAS traversal must agree with brute force over instances, in
    // both hit instance and distance.
    #[test]
    fn test_tlas_matches_brute_force() {
        let mut config = two_sphere_config();
        config.instances.clear();
        let mut sampler = Sampler::new(31, 7);
        for _ in 0..64 {
            let center = Vector3f::new(
                sampler.next_f32() * 16.0 - 8.0,
                sampler.next_f32() * 16.0 - 8.0,
                sampler.next_f32() * 16.0 - 8.0,
            );
            let radius = 0.2 + 0.6 * sampler.next_f32();
            config.instances.push(InstanceConfig::new(
                GeometryConfig::Sphere { center: Vector3f::zeros(), radius },
                Transform::translate(center),
                0,
            ));
        }
        let scene = Scene::build(&config).unwrap();

        for _ in 0..1000 {
            let origin = Vector3f::new(
                sampler.next_f32() * 24.0 - 12.0,
                sampler.next_f32() * 24.0 - 12.0,
                -20.0,
            );
            let dir = Vector3f::new(
                sampler.next_f32() - 0.5,
                sampler.next_f32() - 0.5,
                1.0,
            ).normalize();
            let ray = Ray3f::new(origin, dir, None, None);

            let got = scene.intersect(&ray);

            let mut want: Option<(u32, Float)> = None;
            for (idx, instance) in scene.instances.iter().enumerate() {
                if let Some(hit) = instance.intersect(&ray, idx as u32, Float::MAX) {
                    if want.map_or(true, |(_, t)| hit.t < t) {
                        want = Some((idx as u32, hit.t));
                    }
                }
            }

            match (got, want) {
                (None, None) => {}
                (Some(hit), Some((idx, t))) => {
                    assert_eq!(hit.instance_id, idx);
                    assert!((hit.t - t).abs() < 1e-4);
                }
                (got, want) => panic!(
                    "bvh/brute-force mismatch: {:?} vs {:?}",
                    got.map(|h| h.instance_id), want.map(|w| w.0)),
            }
        }
    }

    #[test]
    fn test_invalid_references_rejected() {
        let mut config = two_sphere_config();
        config.instances[0].id_bsdf = 7;
        assert!(Scene::build(&config).is_err());

        let mut config = two_sphere_config();
        config.camera.fov_x = 0.0;
        assert!(Scene::build(&config).is_err());

        let mut config = two_sphere_config();
        config.emitters.clear();
        assert!(Scene::build(&config).is_err());
    }
}
