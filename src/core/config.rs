// Copyright @yucwang 2026

use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::transform::Transform;

// Absent cross-reference sentinel shared by every id field.
pub const INVALID_ID: u32 = u32::MAX;

#[derive(Debug, Clone, Copy)]
pub struct CameraConfig {
    pub eye: Vector3f,
    pub look_at: Vector3f,
    pub up: Vector3f,
    // Horizontal field of view, radians.
    pub fov_x: Float,
    pub width: usize,
    pub height: usize,
    pub spp: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            eye: Vector3f::zeros(),
            look_at: Vector3f::new(0.0, 0.0, 1.0),
            up: Vector3f::new(0.0, 1.0, 0.0),
            fov_x: 0.6911504,
            width: 256,
            height: 256,
            spp: 16,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegratorKind {
    Path,
    VolPath,
}

#[derive(Debug, Clone, Copy)]
pub struct IntegratorConfig {
    pub kind: IntegratorKind,
    pub depth_max: u32,
    pub depth_rr: u32,
    pub pdf_rr: Float,
    pub hide_emitters: bool,
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            kind: IntegratorKind::Path,
            depth_max: 32,
            depth_rr: 5,
            pdf_rr: 0.95,
            hide_emitters: false,
        }
    }
}

#[derive(Debug, Clone)]
pub enum TextureConfig {
    Constant {
        color: Vector3f,
    },
    Checkerboard {
        color0: Vector3f,
        color1: Vector3f,
        to_uv: Transform,
    },
    Bitmap {
        data: Vec<Float>,
        width: usize,
        height: usize,
        channels: usize,
        to_uv: Transform,
    },
}

#[derive(Debug, Clone)]
pub struct BsdfConfig {
    pub variant: BsdfVariant,
    pub twosided: bool,
    pub id_opacity: u32,
    pub id_bump_map: u32,
}

#[derive(Debug, Clone)]
pub enum BsdfVariant {
    Diffuse {
        id_reflectance: u32,
    },
    RoughDiffuse {
        id_reflectance: u32,
        id_roughness: u32,
        use_fast_approx: bool,
    },
    Dielectric {
        // int_ior / ext_ior
        eta: Float,
        id_roughness_u: u32,
        id_roughness_v: u32,
        id_specular_reflectance: u32,
        id_specular_transmittance: u32,
    },
    ThinDielectric {
        eta: Float,
        id_roughness_u: u32,
        id_roughness_v: u32,
        id_specular_reflectance: u32,
        id_specular_transmittance: u32,
    },
    Conductor {
        reflectivity: Vector3f,
        edgetint: Vector3f,
        id_roughness_u: u32,
        id_roughness_v: u32,
        id_specular_reflectance: u32,
    },
    Plastic {
        eta: Float,
        id_roughness: u32,
        id_diffuse_reflectance: u32,
        id_specular_reflectance: u32,
    },
    AreaLight {
        id_radiance: u32,
        weight: Float,
    },
}

#[derive(Debug, Clone, Copy)]
pub enum PhaseConfig {
    Isotropic,
    HenyeyGreenstein { g: Float },
}

#[derive(Debug, Clone, Copy)]
pub struct MediumConfig {
    pub sigma_a: Vector3f,
    pub sigma_s: Vector3f,
    pub phase: PhaseConfig,
}

#[derive(Debug, Clone, Default)]
pub struct MeshConfig {
    pub positions: Vec<Vector3f>,
    pub indices: Vec<[u32; 3]>,
    pub normals: Option<Vec<Vector3f>>,
    pub texcoords: Option<Vec<Vector2f>>,
    pub tangents: Option<Vec<Vector3f>>,
    pub bitangents: Option<Vec<Vector3f>>,
}

#[derive(Debug, Clone)]
pub enum GeometryConfig {
    Sphere { center: Vector3f, radius: Float },
    Cube,
    Rectangle,
    Disk,
    Cylinder { p0: Vector3f, p1: Vector3f, radius: Float },
    Mesh(MeshConfig),
}

#[derive(Debug, Clone)]
pub struct InstanceConfig {
    pub geometry: GeometryConfig,
    pub to_world: Transform,
    pub flip_normals: bool,
    pub id_bsdf: u32,
    pub id_medium_int: u32,
    pub id_medium_ext: u32,
}

impl InstanceConfig {
    pub fn new(geometry: GeometryConfig, to_world: Transform, id_bsdf: u32) -> Self {
        Self {
            geometry,
            to_world,
            flip_normals: false,
            id_bsdf,
            id_medium_int: INVALID_ID,
            id_medium_ext: INVALID_ID,
        }
    }
}

#[derive(Debug, Clone)]
pub enum EmitterConfig {
    Point {
        position: Vector3f,
        intensity: Vector3f,
    },
    Spot {
        to_world: Transform,
        intensity: Vector3f,
        cutoff_angle: Float,
        beam_width: Float,
        id_texture: u32,
    },
    Directional {
        direction: Vector3f,
        radiance: Vector3f,
    },
    Sun {
        direction: Vector3f,
        radiance: Vector3f,
        cos_cutoff_angle: Float,
        id_texture: u32,
    },
    EnvMap {
        id_radiance: u32,
        to_world: Transform,
    },
    Constant {
        radiance: Vector3f,
    },
}

#[derive(Debug, Clone, Default)]
pub struct SceneConfig {
    pub camera: CameraConfig,
    pub integrator: IntegratorConfig,
    pub textures: Vec<TextureConfig>,
    pub bsdfs: Vec<BsdfConfig>,
    pub media: Vec<MediumConfig>,
    pub instances: Vec<InstanceConfig>,
    pub emitters: Vec<EmitterConfig>,
}
