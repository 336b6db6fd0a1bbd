// Copyright @yucwang 2026

use crate::core::config::{EmitterConfig, INVALID_ID};
use crate::core::error::Error;
use crate::core::instance::Instance;
use crate::core::texture::Texture;
use crate::emitters::area::AreaEmitter;
use crate::emitters::constant::ConstantLight;
use crate::emitters::directional::DirectionalLight;
use crate::emitters::envmap::EnvMap;
use crate::emitters::point::PointLight;
use crate::emitters::spot::SpotLight;
use crate::emitters::sun::SunLight;
use crate::math::constants::{Float, Vector2f, Vector3f, FLOAT_MAX};

// Next-event sample toward one emitter. `value` is the incident
// radiance already divided by the solid-angle pdf; `harsh` marks
// delta lights that never mix with BSDF sampling.
#[derive(Debug, Clone, Copy)]
pub struct EmitterSampleRec {
    pub valid: bool,
    pub harsh: bool,
    pub wi: Vector3f,
    pub distance: Float,
    pub value: Vector3f,
    pub pdf: Float,
}

impl Default for EmitterSampleRec {
    fn default() -> Self {
        Self {
            valid: false,
            harsh: true,
            wi: Vector3f::zeros(),
            distance: FLOAT_MAX,
            value: Vector3f::zeros(),
            pdf: 0.0,
        }
    }
}

pub enum Emitter {
    Point(PointLight),
    Spot(SpotLight),
    Directional(DirectionalLight),
    Sun(SunLight),
    EnvMap(EnvMap),
    Constant(ConstantLight),
    Area(AreaEmitter),
}

impl Emitter {
    pub fn from_config(config: &EmitterConfig, textures: &[Texture]) -> Result<Self, Error> {
        match config {
            EmitterConfig::Point { position, intensity } => {
                Ok(Self::Point(PointLight::new(*position, *intensity)))
            }
            EmitterConfig::Spot { to_world, intensity, cutoff_angle, beam_width, id_texture } => {
                if *cutoff_angle <= 0.0 || *beam_width > *cutoff_angle {
                    return Err(Error::config("spot with invalid cone angles"));
                }
                if *id_texture != INVALID_ID && *id_texture as usize >= textures.len() {
                    return Err(Error::config("spot references unknown texture"));
                }
                Ok(Self::Spot(SpotLight::new(
                    *to_world, *intensity, *cutoff_angle, *beam_width, *id_texture)))
            }
            EmitterConfig::Directional { direction, radiance } => {
                if direction.norm_squared() <= 0.0 {
                    return Err(Error::config("directional emitter with zero direction"));
                }
                Ok(Self::Directional(DirectionalLight::new(*direction, *radiance)))
            }
            EmitterConfig::Sun { direction, radiance, cos_cutoff_angle, id_texture } => {
                if direction.norm_squared() <= 0.0 {
                    return Err(Error::config("sun emitter with zero direction"));
                }
                if *id_texture != INVALID_ID && *id_texture as usize >= textures.len() {
                    return Err(Error::config("sun references unknown texture"));
                }
                Ok(Self::Sun(SunLight::new(
                    *direction, *radiance, *cos_cutoff_angle, *id_texture)))
            }
            EmitterConfig::EnvMap { id_radiance, to_world } => {
                if *id_radiance as usize >= textures.len() {
                    return Err(Error::config("envmap references unknown texture"));
                }
                Ok(Self::EnvMap(EnvMap::build(
                    *id_radiance, *to_world, &textures[*id_radiance as usize])?))
            }
            EmitterConfig::Constant { radiance } => {
                Ok(Self::Constant(ConstantLight::new(*radiance)))
            }
        }
    }

    pub fn sample(&self, textures: &[Texture], instances: &[Instance],
                  origin: &Vector3f, u: &Vector2f) -> EmitterSampleRec {
        match self {
            Self::Point(light) => light.sample(origin),
            Self::Spot(light) => light.sample(textures, origin),
            Self::Directional(light) => light.sample(),
            Self::Sun(light) => light.sample(textures),
            Self::EnvMap(light) => light.sample(textures, u),
            Self::Constant(light) => light.sample(u),
            Self::Area(light) => light.sample(textures, instances, origin, u),
        }
    }

    // Radiance carried along `dir` (pointing toward the emitter) for
    // emitters visible on escaped rays.
    pub fn eval(&self, textures: &[Texture], dir: &Vector3f) -> Vector3f {
        match self {
            Self::Sun(light) => light.eval(textures, dir),
            Self::EnvMap(light) => light.eval(textures, dir),
            Self::Constant(light) => light.eval(),
            _ => Vector3f::zeros(),
        }
    }

    // Solid-angle density of `sample` along `dir`; zero for delta
    // emitters.
    pub fn pdf(&self, dir: &Vector3f) -> Float {
        match self {
            Self::EnvMap(light) => light.pdf(dir),
            Self::Constant(light) => light.pdf(),
            _ => 0.0,
        }
    }

    // Emitters that contribute when a ray leaves the scene.
    pub fn is_environment(&self) -> bool {
        matches!(self, Self::EnvMap(_) | Self::Constant(_) | Self::Sun(_))
    }
}
