// Copyright @yucwang 2026

use crate::core::config::{MediumConfig, PhaseConfig};
use crate::core::error::Error;
use crate::core::rng::Sampler;
use crate::math::constants::{Float, Vector2f, Vector3f, INV_FOUR_PI, PI};
use crate::math::frame::Frame;

#[derive(Debug, Clone, Copy)]
pub enum PhaseFunction {
    Isotropic,
    HenyeyGreenstein { g: Float },
}

impl PhaseFunction {
    // Directions are propagation directions; `dir_in` is the one the
    // photon arrived along. Phase functions are perfectly importance
    // sampled, so the returned pdf equals the phase value.
    pub fn sample(&self, dir_in: &Vector3f, u: &Vector2f) -> (Vector3f, Float) {
        match self {
            Self::Isotropic => {
                let dir = crate::math::warp::sample_uniform_sphere(u);
                (dir, INV_FOUR_PI)
            }
            Self::HenyeyGreenstein { g } => {
                let g = *g;
                let cos_theta = if g.abs() < 1e-3 {
                    1.0 - 2.0 * u.x
                } else {
                    let sqr = (1.0 - g * g) / (1.0 + g - 2.0 * g * u.x);
                    (1.0 + g * g - sqr * sqr) / (2.0 * g)
                };
                let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
                let phi = 2.0 * PI * u.y;
                let frame = Frame::from_normal(*dir_in);
                let dir = frame.to_world(&Vector3f::new(
                    sin_theta * phi.cos(),
                    sin_theta * phi.sin(),
                    cos_theta,
                ));
                (dir, self.eval(cos_theta))
            }
        }
    }

    pub fn pdf(&self, dir_in: &Vector3f, dir_out: &Vector3f) -> Float {
        match self {
            Self::Isotropic => INV_FOUR_PI,
            Self::HenyeyGreenstein { .. } => self.eval(dir_in.dot(dir_out)),
        }
    }

    fn eval(&self, cos_theta: Float) -> Float {
        match self {
            Self::Isotropic => INV_FOUR_PI,
            Self::HenyeyGreenstein { g } => {
                let denom = (1.0 + g * g - 2.0 * g * cos_theta).max(1e-8);
                INV_FOUR_PI * (1.0 - g * g) / (denom * denom.sqrt())
            }
        }
    }
}

pub struct MediumSample {
    pub scattered: bool,
    pub t: Float,
    pub weight: Vector3f,
}

// Homogeneous medium with spectral extinction and a single phase
// function. Distance sampling MIS-averages the pdf across the three
// color channels.
pub struct Medium {
    pub sigma_s: Vector3f,
    pub sigma_t: Vector3f,
    pub phase: PhaseFunction,
}

impl Medium {
    pub fn from_config(config: &MediumConfig) -> Result<Self, Error> {
        for idx in 0..3 {
            if config.sigma_a[idx] < 0.0 || config.sigma_s[idx] < 0.0 {
                return Err(Error::config("medium with negative coefficients"));
            }
        }
        let sigma_t = config.sigma_a + config.sigma_s;
        if sigma_t.norm_squared() <= 0.0 {
            return Err(Error::config("medium with zero extinction"));
        }
        let phase = match config.phase {
            PhaseConfig::Isotropic => PhaseFunction::Isotropic,
            PhaseConfig::HenyeyGreenstein { g } => {
                if g.abs() >= 1.0 {
                    return Err(Error::config("Henyey-Greenstein g outside (-1, 1)"));
                }
                PhaseFunction::HenyeyGreenstein { g }
            }
        };
        Ok(Self { sigma_s: config.sigma_s, sigma_t, phase })
    }

    pub fn transmittance(&self, distance: Float) -> Vector3f {
        Vector3f::new(
            (-self.sigma_t.x * distance).exp(),
            (-self.sigma_t.y * distance).exp(),
            (-self.sigma_t.z * distance).exp(),
        )
    }

    // Free-flight sampling up to the next surface at `t_max`. The
    // channel is picked uniformly and the pdf averaged over channels.
    pub fn sample_distance(&self, t_max: Float, sampler: &mut Sampler) -> Option<MediumSample> {
        let channel = (sampler.next_f32() * 3.0) as usize % 3;
        let sigma = self.sigma_t[channel];
        let t = if sigma > 0.0 {
            -(1.0 - sampler.next_f32()).ln() / sigma
        } else {
            t_max
        };

        if sigma > 0.0 && t < t_max {
            let tr = self.transmittance(t);
            let mut pdf = 0.0;
            for c in 0..3 {
                pdf += self.sigma_t[c] * tr[c];
            }
            pdf /= 3.0;
            if pdf <= 0.0 {
                return None;
            }
            Some(MediumSample {
                scattered: true,
                t,
                weight: self.sigma_s.component_mul(&tr) / pdf,
            })
        } else {
            let tr = self.transmittance(t_max);
            let pdf = (tr.x + tr.y + tr.z) / 3.0;
            if pdf <= 0.0 {
                return None;
            }
            Some(MediumSample {
                scattered: false,
                t: t_max,
                weight: tr / pdf,
            })
        }
    }
}
