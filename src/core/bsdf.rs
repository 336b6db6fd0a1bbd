// Copyright @yucwang 2026

use crate::core::config::{BsdfConfig, BsdfVariant, INVALID_ID};
use crate::core::error::Error;
use crate::core::rng::Sampler;
use crate::core::texture::Texture;
use crate::materials::area_light::AreaLight;
use crate::materials::conductor::Conductor;
use crate::materials::dielectric::Dielectric;
use crate::materials::diffuse::Diffuse;
use crate::materials::plastic::Plastic;
use crate::materials::rough_diffuse::RoughDiffuse;
use crate::materials::thin_dielectric::ThinDielectric;
use crate::math::constants::{Float, Vector2f, Vector3f};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LobeKind {
    Reflect,
    Transmit,
    // Opacity passthrough: the ray continues unchanged.
    Null,
}

// Record returned by sampling. `value` is the full Monte Carlo weight
// f(wo, wi) * |cos theta_i| / pdf. `delta` marks lobes with a discrete
// pdf; light sampling cannot mix with those.
#[derive(Debug, Clone, Copy)]
pub struct BsdfSample {
    pub wi: Vector3f,
    pub value: Vector3f,
    pub pdf: Float,
    pub kind: LobeKind,
    pub delta: bool,
}

pub enum Lobe {
    Diffuse(Diffuse),
    RoughDiffuse(RoughDiffuse),
    Dielectric(Dielectric),
    ThinDielectric(ThinDielectric),
    Conductor(Conductor),
    Plastic(Plastic),
    AreaLight(AreaLight),
}

pub struct Bsdf {
    pub lobe: Lobe,
    pub twosided: bool,
    pub id_opacity: u32,
    pub id_bump_map: u32,
}

impl Bsdf {
    pub fn from_config(config: &BsdfConfig, n_textures: usize) -> Result<Self, Error> {
        let check = |id: u32, what: &str| -> Result<(), Error> {
            if id != INVALID_ID && id as usize >= n_textures {
                Err(Error::config(format!("bsdf references unknown {} texture {}", what, id)))
            } else {
                Ok(())
            }
        };
        let require = |id: u32, what: &str| -> Result<(), Error> {
            if id as usize >= n_textures {
                Err(Error::config(format!("bsdf references unknown {} texture {}", what, id)))
            } else {
                Ok(())
            }
        };

        check(config.id_opacity, "opacity")?;
        check(config.id_bump_map, "bump map")?;

        let lobe = match &config.variant {
            BsdfVariant::Diffuse { id_reflectance } => {
                require(*id_reflectance, "reflectance")?;
                Lobe::Diffuse(Diffuse { id_reflectance: *id_reflectance })
            }
            BsdfVariant::RoughDiffuse { id_reflectance, id_roughness, use_fast_approx } => {
                require(*id_reflectance, "reflectance")?;
                require(*id_roughness, "roughness")?;
                Lobe::RoughDiffuse(RoughDiffuse {
                    id_reflectance: *id_reflectance,
                    id_roughness: *id_roughness,
                    use_fast_approx: *use_fast_approx,
                })
            }
            BsdfVariant::Dielectric {
                eta, id_roughness_u, id_roughness_v,
                id_specular_reflectance, id_specular_transmittance,
            } => {
                if *eta <= 0.0 {
                    return Err(Error::config("dielectric with non-positive eta"));
                }
                require(*id_roughness_u, "roughness")?;
                require(*id_roughness_v, "roughness")?;
                require(*id_specular_reflectance, "specular reflectance")?;
                require(*id_specular_transmittance, "specular transmittance")?;
                Lobe::Dielectric(Dielectric {
                    eta: *eta,
                    id_roughness_u: *id_roughness_u,
                    id_roughness_v: *id_roughness_v,
                    id_specular_reflectance: *id_specular_reflectance,
                    id_specular_transmittance: *id_specular_transmittance,
                })
            }
            BsdfVariant::ThinDielectric {
                eta, id_roughness_u, id_roughness_v,
                id_specular_reflectance, id_specular_transmittance,
            } => {
                if *eta <= 0.0 {
                    return Err(Error::config("thin dielectric with non-positive eta"));
                }
                require(*id_roughness_u, "roughness")?;
                require(*id_roughness_v, "roughness")?;
                require(*id_specular_reflectance, "specular reflectance")?;
                require(*id_specular_transmittance, "specular transmittance")?;
                Lobe::ThinDielectric(ThinDielectric {
                    eta: *eta,
                    id_roughness_u: *id_roughness_u,
                    id_roughness_v: *id_roughness_v,
                    id_specular_reflectance: *id_specular_reflectance,
                    id_specular_transmittance: *id_specular_transmittance,
                })
            }
            BsdfVariant::Conductor {
                reflectivity, edgetint, id_roughness_u, id_roughness_v,
                id_specular_reflectance,
            } => {
                require(*id_roughness_u, "roughness")?;
                require(*id_roughness_v, "roughness")?;
                require(*id_specular_reflectance, "specular reflectance")?;
                Lobe::Conductor(Conductor::new(
                    *reflectivity,
                    *edgetint,
                    *id_roughness_u,
                    *id_roughness_v,
                    *id_specular_reflectance,
                ))
            }
            BsdfVariant::Plastic {
                eta, id_roughness, id_diffuse_reflectance, id_specular_reflectance,
            } => {
                if *eta <= 0.0 {
                    return Err(Error::config("plastic with non-positive eta"));
                }
                require(*id_roughness, "roughness")?;
                require(*id_diffuse_reflectance, "diffuse reflectance")?;
                require(*id_specular_reflectance, "specular reflectance")?;
                Lobe::Plastic(Plastic::new(
                    *eta,
                    *id_roughness,
                    *id_diffuse_reflectance,
                    *id_specular_reflectance,
                ))
            }
            BsdfVariant::AreaLight { id_radiance, weight } => {
                require(*id_radiance, "radiance")?;
                Lobe::AreaLight(AreaLight {
                    id_radiance: *id_radiance,
                    weight: *weight,
                })
            }
        };

        Ok(Self {
            lobe,
            twosided: config.twosided,
            id_opacity: config.id_opacity,
            id_bump_map: config.id_bump_map,
        })
    }

    pub fn is_area_light(&self) -> bool {
        matches!(self.lobe, Lobe::AreaLight(_))
    }

    // Opacity of the surface at `uv`; 1 when no opacity texture is set.
    pub fn opacity(&self, textures: &[Texture], uv: &Vector2f) -> Float {
        if self.id_opacity == INVALID_ID {
            1.0
        } else {
            textures[self.id_opacity as usize].eval_scalar(uv).max(0.0).min(1.0)
        }
    }

    pub fn sample(&self, textures: &[Texture], wo: &Vector3f, uv: &Vector2f,
                  sampler: &mut Sampler) -> Option<BsdfSample> {
        let alpha = self.opacity(textures, uv);
        if alpha < 1.0 && sampler.next_f32() >= alpha {
            return Some(BsdfSample {
                wi: -wo,
                value: Vector3f::new(1.0, 1.0, 1.0),
                pdf: 1.0 - alpha,
                kind: LobeKind::Null,
                delta: true,
            });
        }

        // Transmissive lobes resolve the hemisphere themselves; the
        // rest follow the twosided policy.
        match &self.lobe {
            Lobe::Dielectric(lobe) => lobe.sample(textures, wo, uv, sampler),
            Lobe::ThinDielectric(lobe) => lobe.sample(textures, wo, uv, sampler),
            Lobe::AreaLight(_) => None,
            _ => {
                let (wo_up, flipped) = self.orient(wo)?;
                let mut sample = match &self.lobe {
                    Lobe::Diffuse(lobe) => lobe.sample(textures, &wo_up, uv, sampler),
                    Lobe::RoughDiffuse(lobe) => lobe.sample(textures, &wo_up, uv, sampler),
                    Lobe::Conductor(lobe) => lobe.sample(textures, &wo_up, uv, sampler),
                    Lobe::Plastic(lobe) => lobe.sample(textures, &wo_up, uv, sampler),
                    _ => unreachable!(),
                }?;
                if flipped {
                    sample.wi.z = -sample.wi.z;
                }
                Some(sample)
            }
        }
    }

    pub fn eval(&self, textures: &[Texture], wo: &Vector3f, wi: &Vector3f,
                uv: &Vector2f) -> Vector3f {
        match &self.lobe {
            Lobe::Dielectric(lobe) => lobe.eval(textures, wo, wi, uv),
            Lobe::ThinDielectric(_) | Lobe::AreaLight(_) => Vector3f::zeros(),
            _ => {
                let (wo_up, flipped) = match self.orient(wo) {
                    Some(pair) => pair,
                    None => return Vector3f::zeros(),
                };
                let wi_up = if flipped {
                    Vector3f::new(wi.x, wi.y, -wi.z)
                } else {
                    *wi
                };
                match &self.lobe {
                    Lobe::Diffuse(lobe) => lobe.eval(textures, &wo_up, &wi_up, uv),
                    Lobe::RoughDiffuse(lobe) => lobe.eval(textures, &wo_up, &wi_up, uv),
                    Lobe::Conductor(lobe) => lobe.eval(textures, &wo_up, &wi_up, uv),
                    Lobe::Plastic(lobe) => lobe.eval(textures, &wo_up, &wi_up, uv),
                    _ => unreachable!(),
                }
            }
        }
    }

    pub fn pdf(&self, textures: &[Texture], wo: &Vector3f, wi: &Vector3f,
               uv: &Vector2f) -> Float {
        match &self.lobe {
            Lobe::Dielectric(lobe) => lobe.pdf(textures, wo, wi, uv),
            Lobe::ThinDielectric(_) | Lobe::AreaLight(_) => 0.0,
            _ => {
                let (wo_up, flipped) = match self.orient(wo) {
                    Some(pair) => pair,
                    None => return 0.0,
                };
                let wi_up = if flipped {
                    Vector3f::new(wi.x, wi.y, -wi.z)
                } else {
                    *wi
                };
                match &self.lobe {
                    Lobe::Diffuse(lobe) => lobe.pdf(textures, &wo_up, &wi_up, uv),
                    Lobe::RoughDiffuse(lobe) => lobe.pdf(textures, &wo_up, &wi_up, uv),
                    Lobe::Conductor(lobe) => lobe.pdf(textures, &wo_up, &wi_up, uv),
                    Lobe::Plastic(lobe) => lobe.pdf(textures, &wo_up, &wi_up, uv),
                    _ => unreachable!(),
                }
            }
        }
    }

    // Radiance of an area-light surface, looked up by the intersection
    // routine rather than through eval.
    pub fn emitted_radiance(&self, textures: &[Texture], uv: &Vector2f) -> Vector3f {
        match &self.lobe {
            Lobe::AreaLight(lobe) => lobe.radiance(textures, uv),
            _ => Vector3f::zeros(),
        }
    }

    fn orient(&self, wo: &Vector3f) -> Option<(Vector3f, bool)> {
        if wo.z >= 0.0 {
            Some((*wo, false))
        } else if self.twosided {
            Some((Vector3f::new(wo.x, wo.y, -wo.z), true))
        } else {
            None
        }
    }
}
