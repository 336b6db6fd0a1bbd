// Copyright @yucwang 2026

use crate::core::emitter::EmitterSampleRec;
use crate::core::instance::Instance;
use crate::core::texture::Texture;
use crate::math::constants::{Float, Vector2f, Vector3f};

// Implicit emitter wrapped around an instance whose BSDF is an area
// light. Emission leaves the front side only.
pub struct AreaEmitter {
    pub instance_id: u32,
    pub id_radiance: u32,
    pub weight: Float,
}

impl AreaEmitter {
    pub fn new(instance_id: u32, id_radiance: u32, weight: Float) -> Self {
        Self { instance_id, id_radiance, weight }
    }

    pub fn sample(&self, textures: &[Texture], instances: &[Instance],
                  origin: &Vector3f, u: &Vector2f) -> EmitterSampleRec {
        let instance = &instances[self.instance_id as usize];
        let (surface, pdf_area) = instance.sample_surface(u);
        if pdf_area <= 0.0 {
            return EmitterSampleRec::default();
        }

        let to_light = surface.p - origin;
        let dist2 = to_light.norm_squared();
        if dist2 <= 0.0 {
            return EmitterSampleRec::default();
        }
        let distance = dist2.sqrt();
        let wi = to_light / distance;

        let cos_light = surface.normal.dot(&-wi);
        if cos_light <= 0.0 {
            return EmitterSampleRec::default();
        }

        // Area density converted to solid angle at the origin.
        let pdf = pdf_area * dist2 / cos_light;
        if pdf <= 0.0 || !pdf.is_finite() {
            return EmitterSampleRec::default();
        }

        let radiance = textures[self.id_radiance as usize].eval(&surface.uv) * self.weight;

        EmitterSampleRec {
            valid: true,
            harsh: false,
            wi,
            distance,
            value: radiance / pdf,
            pdf,
        }
    }

    // Solid-angle pdf of hitting this emitter at a known intersection,
    // used for the MIS weight on the BSDF-sampling side.
    pub fn pdf_from_hit(&self, instances: &[Instance], origin: &Vector3f,
                        p: &Vector3f, normal: &Vector3f) -> Float {
        let instance = &instances[self.instance_id as usize];
        let area = instance.world_area();
        if area <= 0.0 {
            return 0.0;
        }
        let to_light = p - origin;
        let dist2 = to_light.norm_squared();
        if dist2 <= 0.0 {
            return 0.0;
        }
        let cos_light = normal.dot(&(-to_light / dist2.sqrt()));
        if cos_light <= 0.0 {
            return 0.0;
        }
        dist2 / (cos_light * area)
    }
}
