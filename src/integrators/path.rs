// Copyright @yucwang 2026

use crate::core::bsdf::{Bsdf, LobeKind};
use crate::core::config::{IntegratorConfig, INVALID_ID};
use crate::core::integrator::{power_heuristic, Integrator};
use crate::core::instance::Hit;
use crate::core::rng::Sampler;
use crate::core::scene::Scene;
use crate::math::constants::{Float, Vector3f, EPSILON, FLOAT_MAX};
use crate::math::frame::Frame;
use crate::math::ray::Ray3f;
use crate::math::spectrum::{is_black, is_finite, luminance};

// Throughput cap; keeps a degenerate pdf from poisoning the pixel.
pub(crate) const BETA_CLAMP: Float = 1e4;
// Consecutive index-matched boundaries a path may cross.
pub(crate) const MAX_NULL_STEPS: u32 = 16;

// Unidirectional path tracing over surfaces with next-event estimation
// and power-heuristic MIS between emitter and BSDF sampling.
pub struct PathIntegrator {
    depth_max: u32,
    depth_rr: u32,
    pdf_rr: Float,
    hide_emitters: bool,
}

impl PathIntegrator {
    pub fn new(config: &IntegratorConfig) -> Self {
        Self {
            depth_max: config.depth_max,
            depth_rr: config.depth_rr,
            pdf_rr: config.pdf_rr,
            hide_emitters: config.hide_emitters,
        }
    }
}

impl Integrator for PathIntegrator {
    fn li(&self, scene: &Scene, mut ray: Ray3f, sampler: &mut Sampler) -> Vector3f {
        let mut radiance = Vector3f::zeros();
        let mut throughput = Vector3f::new(1.0, 1.0, 1.0);
        // The camera behaves like a delta lobe for MIS purposes.
        let mut prev_pdf: Float = 0.0;
        let mut prev_delta = true;
        let mut depth = 0u32;
        let mut null_steps = 0u32;

        loop {
            let hit = match scene.intersect(&ray) {
                Some(hit) => hit,
                None => {
                    radiance += throughput.component_mul(&escaped_radiance(
                        scene, &ray.dir(), prev_pdf, prev_delta, depth,
                        self.hide_emitters));
                    break;
                }
            };

            // Index-matched boundary: the surface has no BSDF. The
            // path integrator ignores media, so just step across.
            if hit.id_bsdf == INVALID_ID {
                null_steps += 1;
                if null_steps > MAX_NULL_STEPS {
                    break;
                }
                ray = spawn_ray(&hit.p, &hit.normal_geom, &ray.dir());
                continue;
            }

            let bsdf = &scene.bsdfs[hit.id_bsdf as usize];
            if bsdf.is_area_light() {
                radiance += throughput.component_mul(&area_light_radiance(
                    scene, &hit, &ray, prev_pdf, prev_delta, depth,
                    self.hide_emitters));
                break;
            }

            let frame = scene.shading_frame(&hit);
            let wo_local = frame.to_local(&-ray.dir());

            radiance += throughput.component_mul(
                &sample_one_emitter(scene, &hit, &frame, &wo_local, bsdf, sampler));

            let scatter = match bsdf.sample(&scene.textures, &wo_local, &hit.uv, sampler) {
                Some(scatter) => scatter,
                None => break,
            };
            if scatter.pdf <= 0.0 || !is_finite(&scatter.value) {
                break;
            }
            throughput = clamp_beta(throughput.component_mul(&scatter.value));
            if is_black(&throughput) {
                break;
            }

            let dir = if scatter.kind == LobeKind::Null {
                ray.dir()
            } else {
                frame.to_world(&scatter.wi)
            };
            prev_pdf = scatter.pdf;
            prev_delta = scatter.delta;
            ray = spawn_ray(&hit.p, &hit.normal_geom, &dir);

            if depth >= self.depth_rr {
                let q = luminance(&throughput).min(self.pdf_rr);
                if sampler.next_f32() > q {
                    break;
                }
                throughput /= q;
            }
            depth += 1;
            if depth >= self.depth_max {
                break;
            }
        }

        radiance
    }
}

// Offset the origin along the geometric normal to escape self-shadow
// acne, on whichever side the new direction leaves through.
pub(crate) fn spawn_ray(p: &Vector3f, normal_geom: &Vector3f, dir: &Vector3f) -> Ray3f {
    let side = if dir.dot(normal_geom) >= 0.0 { 1.0 } else { -1.0 };
    Ray3f::new(p + normal_geom * (side * EPSILON), *dir, Some(0.0), None)
}

// Environment contribution for a ray that left the scene.
pub(crate) fn escaped_radiance(scene: &Scene, dir: &Vector3f, prev_pdf: Float,
                               prev_delta: bool, depth: u32,
                               hide_emitters: bool) -> Vector3f {
    if hide_emitters && depth == 0 {
        return Vector3f::zeros();
    }
    let n = scene.emitter_count();
    if n == 0 {
        return Vector3f::zeros();
    }
    let select_pdf = 1.0 / n as Float;

    let from_delta = prev_delta || depth == 0;
    let mut total = Vector3f::zeros();
    for emitter in &scene.emitters {
        if !emitter.is_environment() {
            continue;
        }
        // The sun cone is sampled as a delta light, so its disc only
        // shows up on primary and specular chains; evaluating it after
        // a sampled bounce would count it twice.
        if matches!(emitter, crate::core::emitter::Emitter::Sun(_)) && !from_delta {
            continue;
        }
        let le = emitter.eval(&scene.textures, dir);
        if is_black(&le) {
            continue;
        }
        let weight = if from_delta {
            1.0
        } else {
            power_heuristic(prev_pdf, emitter.pdf(dir) * select_pdf)
        };
        total += le * weight;
    }
    total
}

// Emission picked up by hitting an area light with a BSDF ray. The
// light absorbs the path; emission leaves the front face only.
pub(crate) fn area_light_radiance(scene: &Scene, hit: &Hit, ray: &Ray3f,
                                  prev_pdf: Float, prev_delta: bool, depth: u32,
                                  hide_emitters: bool) -> Vector3f {
    if (hide_emitters && depth == 0) || hit.inside {
        return Vector3f::zeros();
    }
    let mut weight = 1.0;
    if !prev_delta {
        if let Some(area) = scene.area_emitter_of(hit.instance_id) {
            let pdf_light = area.pdf_from_hit(
                &scene.instances, &ray.origin(), &hit.p, &hit.normal_geom)
                / scene.emitter_count() as Float;
            weight = power_heuristic(prev_pdf, pdf_light);
        }
    }
    hit.emitter_color * weight
}

// Next-event estimation at a surface vertex: one uniformly chosen
// emitter, MIS-weighted against BSDF sampling for soft lights.
pub(crate) fn sample_one_emitter(scene: &Scene, hit: &Hit, frame: &Frame,
                                 wo_local: &Vector3f, bsdf: &Bsdf,
                                 sampler: &mut Sampler) -> Vector3f {
    let n = scene.emitter_count();
    if n == 0 {
        return Vector3f::zeros();
    }
    let pick = ((sampler.next_f32() * n as Float) as usize).min(n - 1);
    let u = sampler.next_2d();
    let rec = scene.emitters[pick].sample(&scene.textures, &scene.instances, &hit.p, &u);
    if !rec.valid || is_black(&rec.value) {
        return Vector3f::zeros();
    }

    let wi_local = frame.to_local(&rec.wi);
    let f = bsdf.eval(&scene.textures, wo_local, &wi_local, &hit.uv);
    if is_black(&f) {
        return Vector3f::zeros();
    }

    let max_t = if rec.distance >= FLOAT_MAX {
        FLOAT_MAX
    } else {
        rec.distance - 2.0 * EPSILON
    };
    let mut shadow = spawn_ray(&hit.p, &hit.normal_geom, &rec.wi);
    shadow.max_t = max_t;
    if scene.intersect_any(&shadow, sampler) {
        return Vector3f::zeros();
    }

    let select_pdf = 1.0 / n as Float;
    let weight = if rec.harsh {
        1.0
    } else {
        let pdf_bsdf = bsdf.pdf(&scene.textures, wo_local, &wi_local, &hit.uv);
        power_heuristic(rec.pdf * select_pdf, pdf_bsdf)
    };

    f.component_mul(&rec.value) * (weight / select_pdf)
}

pub(crate) fn clamp_beta(beta: Vector3f) -> Vector3f {
    Vector3f::new(
        beta.x.min(BETA_CLAMP),
        beta.y.min(BETA_CLAMP),
        beta.z.min(BETA_CLAMP),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::*;
    use crate::math::transform::Transform;

    // Single white rectangle filling the view, lit by a constant
    // emitter of unit radiance: every estimate must come out near 1.
    fn rectangle_under_constant_sky() -> Scene {
        let mut config = SceneConfig::default();
        config.camera = CameraConfig {
            eye: Vector3f::zeros(),
            look_at: Vector3f::new(0.0, 0.0, 1.0),
            up: Vector3f::new(0.0, 1.0, 0.0),
            fov_x: 0.5,
            width: 8,
            height: 8,
            spp: 256,
        };
        config.integrator.depth_max = 2;
        config.textures.push(TextureConfig::Constant {
            color: Vector3f::new(1.0, 1.0, 1.0),
        });
        config.bsdfs.push(BsdfConfig {
            variant: BsdfVariant::Diffuse { id_reflectance: 0 },
            twosided: true,
            id_opacity: INVALID_ID,
            id_bump_map: INVALID_ID,
        });
        config.instances.push(InstanceConfig::new(
            GeometryConfig::Rectangle,
            Transform::translate(Vector3f::new(0.0, 0.0, 1.0))
                .compose(&Transform::rotate(Vector3f::new(1.0, 0.0, 0.0),
                                            crate::math::constants::PI)),
            0,
        ));
        config.emitters.push(EmitterConfig::Constant {
            radiance: Vector3f::new(1.0, 1.0, 1.0),
        });
        Scene::build(&config).unwrap()
    }

    #[test]
    fn test_white_rectangle_under_white_sky_is_white() {
        let scene = rectangle_under_constant_sky();
        let integrator = PathIntegrator::new(&scene.integrator);
        let mut sampler = Sampler::new(0, 0);
        let mut sum = Vector3f::zeros();
        let n = 4096;
        for _ in 0..n {
            let ray = Ray3f::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, 1.0),
                                 None, None);
            sum += integrator.li(&scene, ray, &mut sampler);
        }
        let mean = sum / n as Float;
        // One bounce of a unit-albedo surface under unit radiance.
        assert!((mean.x - 1.0).abs() < 0.02, "mean {}", mean.x);
    }

    #[test]
    fn test_background_sees_constant_emitter() {
        let scene = rectangle_under_constant_sky();
        let integrator = PathIntegrator::new(&scene.integrator);
        let mut sampler = Sampler::new(1, 0);
        let ray = Ray3f::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, -1.0),
                             None, None);
        let value = integrator.li(&scene, ray, &mut sampler);
        assert!((value.x - 1.0).abs() < 1e-4);
    }

    // Furnace: a closed diffuse sphere floating in a uniform white
    // sky. The sphere is convex, so its reflected radiance is exactly
    // albedo * sky radiance.
    #[test]
    fn test_furnace_sphere_reflects_albedo() {
        let mut config = SceneConfig::default();
        config.camera = CameraConfig {
            eye: Vector3f::new(0.0, 0.0, -4.0),
            look_at: Vector3f::zeros(),
            up: Vector3f::new(0.0, 1.0, 0.0),
            fov_x: 0.4,
            width: 4,
            height: 4,
            spp: 16,
        };
        config.integrator.depth_max = 20;
        config.textures.push(TextureConfig::Constant {
            color: Vector3f::new(0.5, 0.5, 0.5),
        });
        config.bsdfs.push(BsdfConfig {
            variant: BsdfVariant::Diffuse { id_reflectance: 0 },
            twosided: false,
            id_opacity: INVALID_ID,
            id_bump_map: INVALID_ID,
        });
        config.instances.push(InstanceConfig::new(
            GeometryConfig::Sphere { center: Vector3f::zeros(), radius: 1.0 },
            Transform::default(),
            0,
        ));
        config.emitters.push(EmitterConfig::Constant {
            radiance: Vector3f::new(1.0, 1.0, 1.0),
        });
        let scene = Scene::build(&config).unwrap();
        let integrator = PathIntegrator::new(&scene.integrator);

        let mut sampler = Sampler::new(5, 0);
        let n = 8192;
        let mut sum = Vector3f::zeros();
        for _ in 0..n {
            let ray = Ray3f::new(Vector3f::new(0.0, 0.0, -4.0),
                                 Vector3f::new(0.0, 0.0, 1.0), None, None);
            sum += integrator.li(&scene, ray, &mut sampler);
        }
        let mean = sum / n as Float;
        assert!((mean.x - 0.5).abs() < 0.02, "mean {}", mean.x);
        assert!((mean.y - 0.5).abs() < 0.02, "mean {}", mean.y);
    }

    // Environment-only scene: the primary ray must return exactly the
    // envmap radiance along its direction.
    #[test]
    fn test_envmap_only_scene_matches_direct_lookup() {
        let mut config = SceneConfig::default();
        config.textures.push(TextureConfig::Checkerboard {
            color0: Vector3f::new(0.2, 0.2, 0.2),
            color1: Vector3f::new(1.5, 1.5, 1.5),
            to_uv: Transform::scale(Vector3f::new(8.0, 4.0, 1.0)),
        });
        config.emitters.push(EmitterConfig::EnvMap {
            id_radiance: 0,
            to_world: Transform::default(),
        });
        let scene = Scene::build(&config).unwrap();
        let integrator = PathIntegrator::new(&scene.integrator);
        let mut sampler = Sampler::new(3, 0);

        for seed in 0..64 {
            let mut dir_sampler = Sampler::new(seed, 5);
            let dir = crate::math::warp::sample_uniform_sphere(&dir_sampler.next_2d());
            let ray = Ray3f::new(Vector3f::zeros(), dir, None, None);
            let value = integrator.li(&scene, ray, &mut sampler);
            let expected = match &scene.emitters[0] {
                crate::core::emitter::Emitter::EnvMap(envmap) => {
                    envmap.eval(&scene.textures, &dir)
                }
                _ => unreachable!(),
            };
            assert!((value - expected).norm() < 1e-2 * expected.norm().max(1.0));
        }
    }

    // Color bleeding: a white floor next to a red wall under a white
    // sky picks up a red tint where indirect light dominates.
    #[test]
    fn test_red_wall_bleeds_onto_floor() {
        let mut config = SceneConfig::default();
        config.camera.spp = 1;
        config.integrator.depth_max = 4;
        config.textures.push(TextureConfig::Constant {
            color: Vector3f::new(0.8, 0.8, 0.8),
        });
        config.textures.push(TextureConfig::Constant {
            color: Vector3f::new(0.8, 0.05, 0.05),
        });
        for id in 0..2u32 {
            config.bsdfs.push(BsdfConfig {
                variant: BsdfVariant::Diffuse { id_reflectance: id },
                twosided: true,
                id_opacity: INVALID_ID,
                id_bump_map: INVALID_ID,
            });
        }
        // Floor in the xz plane at y = 0.
        config.instances.push(InstanceConfig::new(
            GeometryConfig::Rectangle,
            Transform::rotate(Vector3f::new(1.0, 0.0, 0.0),
                              -0.5 * crate::math::constants::PI),
            0,
        ));
        // Red wall in the xy plane at z = 1, facing -z.
        config.instances.push(InstanceConfig::new(
            GeometryConfig::Rectangle,
            Transform::translate(Vector3f::new(0.0, 0.0, 1.0))
                .compose(&Transform::rotate(Vector3f::new(1.0, 0.0, 0.0),
                                            crate::math::constants::PI)),
            1,
        ));
        config.emitters.push(EmitterConfig::Constant {
            radiance: Vector3f::new(1.0, 1.0, 1.0),
        });
        let scene = Scene::build(&config).unwrap();
        let integrator = PathIntegrator::new(&scene.integrator);

        let mut sampler = Sampler::new(17, 0);
        let n = 20_000;
        let mut near_wall = Vector3f::zeros();
        for _ in 0..n {
            // Aim at the floor just in front of the red wall.
            let ray = Ray3f::new(Vector3f::new(0.0, 1.0, 0.6),
                                 Vector3f::new(0.0, -1.0, 0.35).normalize(),
                                 None, None);
            near_wall += integrator.li(&scene, ray, &mut sampler);
        }
        near_wall /= n as Float;
        assert!(near_wall.x > near_wall.y * 1.05,
                "no bleeding: {:?}", near_wall);
    }

    #[test]
    fn test_hide_emitters_suppresses_primary() {
        let mut scene = rectangle_under_constant_sky();
        scene.integrator.hide_emitters = true;
        let integrator = PathIntegrator::new(&scene.integrator);
        let mut sampler = Sampler::new(2, 0);
        let ray = Ray3f::new(Vector3f::zeros(), Vector3f::new(0.0, 0.0, -1.0),
                             None, None);
        let value = integrator.li(&scene, ray, &mut sampler);
        assert!(is_black(&value));
    }
}
