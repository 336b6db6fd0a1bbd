// Copyright @yucwang 2026

use crate::core::config::INVALID_ID;
use crate::core::emitter::EmitterSampleRec;
use crate::core::texture::Texture;
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::transform::Transform;

// Spot cone along local +z. Falloff is 1 inside the beam, 0 outside
// the cutoff and a smoothstep in between; an optional texture is
// projected across the cone opening.
pub struct SpotLight {
    to_world: Transform,
    position: Vector3f,
    intensity: Vector3f,
    cos_cutoff: Float,
    cos_beam: Float,
    inv_transition: Float,
    tan_cutoff: Float,
    id_texture: u32,
}

impl SpotLight {
    pub fn new(to_world: Transform, intensity: Vector3f,
               cutoff_angle: Float, beam_width: Float, id_texture: u32) -> Self {
        let transition = (cutoff_angle - beam_width).max(1e-6);
        Self {
            to_world,
            position: to_world.apply_point(Vector3f::zeros()),
            intensity,
            cos_cutoff: cutoff_angle.cos(),
            cos_beam: beam_width.cos(),
            inv_transition: 1.0 / transition,
            tan_cutoff: cutoff_angle.tan(),
            id_texture,
        }
    }

    pub fn sample(&self, textures: &[Texture], origin: &Vector3f) -> EmitterSampleRec {
        let to_light = self.position - origin;
        let dist2 = to_light.norm_squared();
        if dist2 <= 0.0 {
            return EmitterSampleRec::default();
        }
        let distance = dist2.sqrt();
        let wi = to_light / distance;

        // Direction from the light toward the origin, in light space.
        let local = self.to_world.inv_apply_vector(-wi);
        let local = local.normalize();
        let falloff = self.falloff(&local);
        if falloff <= 0.0 {
            return EmitterSampleRec::default();
        }

        let mut value = self.intensity * falloff / dist2;
        if self.id_texture != INVALID_ID {
            let uv = self.cone_uv(&local);
            value = value.component_mul(&textures[self.id_texture as usize].eval(&uv));
        }

        EmitterSampleRec {
            valid: true,
            harsh: true,
            wi,
            distance,
            value,
            pdf: 0.0,
        }
    }

    fn falloff(&self, local: &Vector3f) -> Float {
        if local.z <= 0.0 {
            return 0.0;
        }
        let cos_theta = local.z;
        if cos_theta >= self.cos_beam {
            1.0
        } else if cos_theta <= self.cos_cutoff {
            0.0
        } else {
            let theta = cos_theta.min(1.0).acos();
            let t = ((self.cos_cutoff.acos() - theta) * self.inv_transition)
                .clamp(0.0, 1.0);
            t * t * (3.0 - 2.0 * t)
        }
    }

    fn cone_uv(&self, local: &Vector3f) -> Vector2f {
        let scale = 1.0 / (local.z * self.tan_cutoff);
        Vector2f::new(
            0.5 + 0.5 * local.x * scale,
            0.5 + 0.5 * local.y * scale,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::constants::PI;

    fn spot() -> SpotLight {
        // At the origin, shining along +z.
        SpotLight::new(
            Transform::default(),
            Vector3f::new(10.0, 10.0, 10.0),
            0.25 * PI,
            0.125 * PI,
            INVALID_ID,
        )
    }

    #[test]
    fn test_full_intensity_inside_beam() {
        let light = spot();
        let rec = light.sample(&[], &Vector3f::new(0.0, 0.0, 5.0));
        assert!(rec.valid);
        assert!((rec.value.x - 10.0 / 25.0).abs() < 1e-5);
    }

    #[test]
    fn test_zero_outside_cutoff() {
        let light = spot();
        let rec = light.sample(&[], &Vector3f::new(5.0, 0.0, 0.1));
        assert!(!rec.valid);
    }

    #[test]
    fn test_transition_between() {
        let light = spot();
        // About 30 degrees off axis, between beam (22.5) and cutoff (45).
        let rec = light.sample(&[], &Vector3f::new(2.9, 0.0, 5.0));
        assert!(rec.valid);
        let scale = rec.value.x * 33.41 / 10.0;
        assert!(scale > 0.0 && scale < 1.0);
    }
}
