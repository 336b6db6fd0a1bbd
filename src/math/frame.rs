// Copyright @yucwang 2026

use super::constants::Vector3f;

#[derive(Debug, Clone, Copy)]
pub struct Frame {
    pub t: Vector3f,
    pub b: Vector3f,
    pub n: Vector3f,
}

impl Default for Frame {
    fn default() -> Self {
        Frame {
            t: Vector3f::new(1.0, 0.0, 0.0),
            b: Vector3f::new(0.0, 1.0, 0.0),
            n: Vector3f::new(0.0, 0.0, 1.0),
        }
    }
}

impl Frame {
    // Branchless basis construction from a unit normal (Duff et al.,
    // "Building an Orthonormal Basis, Revisited").
    pub fn from_normal(n: Vector3f) -> Self {
        let sign = (1.0f32).copysign(n.z);
        let a = -1.0 / (sign + n.z);
        let b = n.x * n.y * a;
        Frame {
            t: Vector3f::new(1.0 + sign * n.x * n.x * a, sign * b, -sign * n.x),
            b: Vector3f::new(b, sign + n.y * n.y * a, -n.y),
            n,
        }
    }

    pub fn from_tangents(t: Vector3f, b: Vector3f, n: Vector3f) -> Self {
        Frame { t, b, n }
    }

    pub fn to_local(&self, v: &Vector3f) -> Vector3f {
        Vector3f::new(v.dot(&self.t), v.dot(&self.b), v.dot(&self.n))
    }

    pub fn to_world(&self, v: &Vector3f) -> Vector3f {
        v.x * self.t + v.y * self.b + v.z * self.n
    }
}

#[cfg(test)]
mod tests {
    use super::Frame;
    use super::Vector3f;
    use crate::core::rng::Sampler;

    #[test]
    fn test_frame_orthonormal() {
        let mut sampler = Sampler::new(17, 0);
        for _ in 0..256 {
            let n = crate::math::warp::sample_uniform_sphere(
                &nalgebra::Vector2::new(sampler.next_f32(), sampler.next_f32()));
            let frame = Frame::from_normal(n);
            assert!((frame.t.norm() - 1.0).abs() < 1e-5);
            assert!((frame.b.norm() - 1.0).abs() < 1e-5);
            assert!(frame.t.dot(&frame.b).abs() < 1e-5);
            assert!(frame.t.dot(&frame.n).abs() < 1e-5);
            assert!(frame.b.dot(&frame.n).abs() < 1e-5);
            // b = cross(n, t)
            assert!((frame.n.cross(&frame.t) - frame.b).norm() < 1e-4);
        }
    }

    #[test]
    fn test_frame_roundtrip() {
        let frame = Frame::from_normal(Vector3f::new(0.0, 1.0, 0.0).normalize());
        let v = Vector3f::new(0.3, -0.4, 0.6);
        let w = frame.to_local(&frame.to_world(&v));
        assert!((v - w).norm() < 1e-5);
    }
}
