// Copyright @yucwang 2026

use crate::core::bsdf::{Bsdf, LobeKind};
use crate::core::config::{IntegratorConfig, INVALID_ID};
use crate::core::instance::Hit;
use crate::core::integrator::{power_heuristic, Integrator};
use crate::core::medium::Medium;
use crate::core::rng::Sampler;
use crate::core::scene::Scene;
use crate::integrators::path::{
    area_light_radiance, clamp_beta, escaped_radiance, spawn_ray, MAX_NULL_STEPS,
};
use crate::math::constants::{Float, Vector3f, EPSILON, FLOAT_MAX};
use crate::math::frame::Frame;
use crate::math::ray::Ray3f;
use crate::math::spectrum::{is_black, is_finite, luminance};

// Path tracing through homogeneous participating media. The current
// medium is tracked across boundaries via the hit's backface flag;
// distance sampling MIS-averages the free-flight pdf over channels.
pub struct VolPathIntegrator {
    depth_max: u32,
    depth_rr: u32,
    pdf_rr: Float,
    hide_emitters: bool,
}

impl VolPathIntegrator {
    pub fn new(config: &IntegratorConfig) -> Self {
        Self {
            depth_max: config.depth_max,
            depth_rr: config.depth_rr,
            pdf_rr: config.pdf_rr,
            hide_emitters: config.hide_emitters,
        }
    }

    // Russian roulette; false means the path dies.
    fn roulette(&self, depth: &mut u32, throughput: &mut Vector3f,
                sampler: &mut Sampler) -> bool {
        if *depth >= self.depth_rr {
            let q = luminance(throughput).min(self.pdf_rr);
            if sampler.next_f32() > q {
                return false;
            }
            *throughput /= q;
        }
        *depth += 1;
        *depth < self.depth_max
    }
}

impl Integrator for VolPathIntegrator {
    fn li(&self, scene: &Scene, mut ray: Ray3f, sampler: &mut Sampler) -> Vector3f {
        let mut radiance = Vector3f::zeros();
        let mut throughput = Vector3f::new(1.0, 1.0, 1.0);
        let mut prev_pdf: Float = 0.0;
        let mut prev_delta = true;
        let mut depth = 0u32;
        let mut null_steps = 0u32;
        // The camera sits in vacuum unless a boundary says otherwise.
        let mut medium_id = INVALID_ID;

        loop {
            let hit = scene.intersect(&ray);

            if medium_id != INVALID_ID {
                let medium = &scene.media[medium_id as usize];
                let t_hit = hit.as_ref().map(|h| h.t).unwrap_or(FLOAT_MAX);
                let flight = match medium.sample_distance(t_hit, sampler) {
                    Some(flight) => flight,
                    None => break,
                };
                throughput = clamp_beta(throughput.component_mul(&flight.weight));
                if is_black(&throughput) || !is_finite(&throughput) {
                    break;
                }

                if flight.scattered {
                    let p = ray.at(flight.t);
                    radiance += throughput.component_mul(&nee_from_medium(
                        scene, medium, medium_id, &p, &ray.dir(), sampler));

                    let (dir, pdf) = medium.phase.sample(&ray.dir(), &sampler.next_2d());
                    prev_pdf = pdf;
                    prev_delta = false;
                    ray = Ray3f::new(p, dir, Some(0.0), None);

                    if !self.roulette(&mut depth, &mut throughput, sampler) {
                        break;
                    }
                    continue;
                }
                // Reached the boundary; fall through with the
                // transmittance already folded into the throughput.
            }

            let hit = match hit {
                Some(hit) => hit,
                None => {
                    radiance += throughput.component_mul(&escaped_radiance(
                        scene, &ray.dir(), prev_pdf, prev_delta, depth,
                        self.hide_emitters));
                    break;
                }
            };

            // Index-matched boundary: only the medium changes.
            if hit.id_bsdf == INVALID_ID {
                null_steps += 1;
                if null_steps > MAX_NULL_STEPS {
                    break;
                }
                medium_id = if hit.inside { hit.id_medium_ext } else { hit.id_medium_int };
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

            radiance += throughput.component_mul(&nee_from_surface(
                scene, &hit, &frame, &wo_local, bsdf, medium_id, sampler));

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
            // Crossing the boundary swaps in the medium on the far side.
            if scatter.kind != LobeKind::Reflect {
                medium_id = if hit.inside { hit.id_medium_ext } else { hit.id_medium_int };
            }
            prev_pdf = scatter.pdf;
            prev_delta = scatter.delta;
            ray = spawn_ray(&hit.p, &hit.normal_geom, &dir);

            if !self.roulette(&mut depth, &mut throughput, sampler) {
                break;
            }
        }

        radiance
    }
}

// Transmittance of a shadow segment through media and index-matched
// boundaries; None when an opaque surface blocks it. Opacity-mapped
// occluders pass the ray stochastically, like Scene::intersect_any.
fn shadow_transmittance(scene: &Scene, origin: &Vector3f, wi: &Vector3f,
                        distance: Float, medium_id: u32,
                        sampler: &mut Sampler) -> Option<Vector3f> {
    let mut transmittance = Vector3f::new(1.0, 1.0, 1.0);
    let mut medium_id = medium_id;
    let mut origin = *origin;
    let mut remaining = distance;

    for _ in 0..=MAX_NULL_STEPS {
        let max_t = if remaining >= FLOAT_MAX {
            FLOAT_MAX
        } else {
            remaining - 2.0 * EPSILON
        };
        let ray = Ray3f::new(origin, *wi, Some(EPSILON), Some(max_t));
        let hit = match scene.intersect(&ray) {
            None => {
                if medium_id != INVALID_ID {
                    let medium = &scene.media[medium_id as usize];
                    transmittance =
                        transmittance.component_mul(&medium.transmittance(remaining));
                }
                return Some(transmittance);
            }
            Some(hit) => hit,
        };

        if hit.id_bsdf != INVALID_ID {
            let bsdf = &scene.bsdfs[hit.id_bsdf as usize];
            let alpha = bsdf.opacity(&scene.textures, &hit.uv);
            if alpha >= 1.0 || sampler.next_f32() < alpha {
                return None;
            }
        }

        if medium_id != INVALID_ID {
            let medium = &scene.media[medium_id as usize];
            transmittance = transmittance.component_mul(&medium.transmittance(hit.t));
        }
        if is_black(&transmittance) {
            return None;
        }

        medium_id = if hit.inside { hit.id_medium_ext } else { hit.id_medium_int };
        origin = hit.p;
        if remaining < FLOAT_MAX {
            remaining -= hit.t;
            if remaining <= EPSILON {
                return Some(transmittance);
            }
        }
    }
    None
}

// Next-event estimation from a point inside a medium; the phase
// function stands in for the BSDF.
fn nee_from_medium(scene: &Scene, medium: &Medium, medium_id: u32, p: &Vector3f,
                   dir_in: &Vector3f, sampler: &mut Sampler) -> Vector3f {
    let n = scene.emitter_count();
    if n == 0 {
        return Vector3f::zeros();
    }
    let pick = ((sampler.next_f32() * n as Float) as usize).min(n - 1);
    let u = sampler.next_2d();
    let rec = scene.emitters[pick].sample(&scene.textures, &scene.instances, p, &u);
    if !rec.valid || is_black(&rec.value) {
        return Vector3f::zeros();
    }

    let phase = medium.phase.pdf(dir_in, &rec.wi);
    if phase <= 0.0 {
        return Vector3f::zeros();
    }

    let transmittance =
        match shadow_transmittance(scene, p, &rec.wi, rec.distance, medium_id, sampler) {
            Some(transmittance) => transmittance,
            None => return Vector3f::zeros(),
        };

    let select_pdf = 1.0 / n as Float;
    let weight = if rec.harsh {
        1.0
    } else {
        power_heuristic(rec.pdf * select_pdf, phase)
    };

    transmittance.component_mul(&rec.value) * (phase * weight / select_pdf)
}

// Surface next-event estimation with medium-aware shadow rays.
fn nee_from_surface(scene: &Scene, hit: &Hit, frame: &Frame, wo_local: &Vector3f,
                    bsdf: &Bsdf, medium_id: u32, sampler: &mut Sampler) -> Vector3f {
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

    let side = if rec.wi.dot(&hit.normal_geom) >= 0.0 { 1.0 } else { -1.0 };
    let origin = hit.p + hit.normal_geom * (side * EPSILON);
    let transmittance =
        match shadow_transmittance(scene, &origin, &rec.wi, rec.distance,
                                   medium_id, sampler) {
            Some(transmittance) => transmittance,
            None => return Vector3f::zeros(),
        };

    let select_pdf = 1.0 / n as Float;
    let weight = if rec.harsh {
        1.0
    } else {
        let pdf_bsdf = bsdf.pdf(&scene.textures, wo_local, &wi_local, &hit.uv);
        power_heuristic(rec.pdf * select_pdf, pdf_bsdf)
    };

    f.component_mul(&rec.value)
        .component_mul(&transmittance) * (weight / select_pdf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::*;
    use crate::math::transform::Transform;

    // Scattering cube in a constant white sky, camera outside.
    fn medium_cube_scene(sigma_s: Float) -> Scene {
        let mut config = SceneConfig::default();
        config.camera = CameraConfig {
            eye: Vector3f::new(0.0, 0.0, -5.0),
            look_at: Vector3f::zeros(),
            up: Vector3f::new(0.0, 1.0, 0.0),
            fov_x: 0.5,
            width: 4,
            height: 4,
            spp: 16,
        };
        config.integrator.kind = IntegratorKind::VolPath;
        config.integrator.depth_max = 64;
        config.integrator.depth_rr = 16;
        config.media.push(MediumConfig {
            sigma_a: Vector3f::zeros(),
            sigma_s: Vector3f::new(sigma_s, sigma_s, sigma_s),
            phase: PhaseConfig::Isotropic,
        });
        let mut cube = InstanceConfig::new(
            GeometryConfig::Cube,
            Transform::default(),
            INVALID_ID,
        );
        cube.id_medium_int = 0;
        config.instances.push(cube);
        config.emitters.push(EmitterConfig::Constant {
            radiance: Vector3f::new(1.0, 1.0, 1.0),
        });
        Scene::build(&config).unwrap()
    }

    #[test]
    fn test_direct_transmission_matches_beer_lambert() {
        let sigma = 1.0;
        let scene = medium_cube_scene(sigma);
        // depth_max = 1 kills every scattered path after its first
        // vertex, leaving only the ballistic component.
        let config = IntegratorConfig {
            kind: IntegratorKind::VolPath,
            depth_max: 1,
            depth_rr: 64,
            pdf_rr: 0.95,
            hide_emitters: false,
        };
        let integrator = VolPathIntegrator::new(&config);

        let mut sampler = Sampler::new(7, 0);
        let n = 40_000;
        let mut sum = Vector3f::zeros();
        for _ in 0..n {
            let ray = Ray3f::new(Vector3f::new(0.0, 0.0, -5.0),
                                 Vector3f::new(0.0, 0.0, 1.0), None, None);
            sum += integrator.li(&scene, ray, &mut sampler);
        }
        let mean = sum / n as Float;
        // NEE at the single scatter vertex still contributes, so the
        // ballistic floor is exp(-2 sigma); allow the one-vertex NEE
        // term on top by bounding from below and far above.
        let expected = (-sigma * 2.0_f32).exp();
        assert!(mean.x >= expected - 0.02, "mean {} floor {}", mean.x, expected);
        assert!(mean.x < 1.0, "mean {}", mean.x);
    }

    #[test]
    fn test_vacuum_volpath_matches_background() {
        let scene = medium_cube_scene(1.0);
        let integrator = VolPathIntegrator::new(&scene.integrator);
        let mut sampler = Sampler::new(9, 0);
        // A ray that misses the cube sees the constant emitter directly.
        let ray = Ray3f::new(Vector3f::new(0.0, 3.0, -5.0),
                             Vector3f::new(0.0, 0.3, 1.0), None, None);
        let value = integrator.li(&scene, ray, &mut sampler);
        assert!((value.x - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_scattering_conserves_energy_in_white_furnace() {
        // No absorption inside a white sky: every path terminates on
        // the emitter, so the pixel stays near 1.
        let scene = medium_cube_scene(0.8);
        let integrator = VolPathIntegrator::new(&scene.integrator);
        let mut sampler = Sampler::new(11, 0);
        let n = 20_000;
        let mut sum = Vector3f::zeros();
        for _ in 0..n {
            let ray = Ray3f::new(Vector3f::new(0.0, 0.0, -5.0),
                                 Vector3f::new(0.0, 0.0, 1.0), None, None);
            sum += integrator.li(&scene, ray, &mut sampler);
        }
        let mean = sum / n as Float;
        assert!((mean.x - 1.0).abs() < 0.05, "mean {}", mean.x);
    }
}
