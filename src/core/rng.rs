// Copyright @yucwang 2026

use crate::math::constants::{Float, Vector2f};
use rand::Rng;
use rand_pcg::Pcg32;

// Per-pixel uniform stream. Every pixel owns an independent PCG-32
// state seeded from its index, so the image is deterministic no matter
// how tiles are scheduled across workers.
pub struct Sampler {
    rng: Pcg32,
}

impl Sampler {
    pub fn new(pixel_index: u64, frame_salt: u64) -> Self {
        let state = pixel_index
            .wrapping_mul(0x9e37_79b9_7f4a_7c15)
            .wrapping_add(frame_salt);
        Self { rng: Pcg32::new(state, 0xa02b_dbf7_bb3c_0a7) }
    }

    pub fn next_f32(&mut self) -> Float {
        self.rng.gen::<f32>()
    }

    pub fn next_2d(&mut self) -> Vector2f {
        Vector2f::new(self.next_f32(), self.next_f32())
    }
}

#[cfg(test)]
mod tests {
    use super::Sampler;

    #[test]
    fn test_stream_in_unit_interval() {
        let mut sampler = Sampler::new(42, 7);
        for _ in 0..4096 {
            let x = sampler.next_f32();
            assert!(x >= 0.0 && x < 1.0);
        }
    }

    #[test]
    fn test_deterministic_per_pixel() {
        let mut a = Sampler::new(123, 9);
        let mut b = Sampler::new(123, 9);
        for _ in 0..64 {
            assert_eq!(a.next_f32().to_bits(), b.next_f32().to_bits());
        }
    }

    #[test]
    fn test_cross_pixel_independence() {
        let mut a = Sampler::new(0, 0);
        let mut b = Sampler::new(1, 0);
        let mut same = 0;
        for _ in 0..64 {
            if a.next_f32().to_bits() == b.next_f32().to_bits() {
                same += 1;
            }
        }
        assert!(same < 4);
    }
}
