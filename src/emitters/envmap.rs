// Copyright @yucwang 2026

use crate::core::emitter::EmitterSampleRec;
use crate::core::error::Error;
use crate::core::texture::Texture;
use crate::math::constants::{Float, Vector2f, Vector3f, FLOAT_MAX, INV_TWO_PI, PI};
use crate::math::spectrum::luminance;
use crate::math::transform::Transform;

// Fallback CDF resolution for procedural radiance textures.
const PROCEDURAL_WIDTH: usize = 64;
const PROCEDURAL_HEIGHT: usize = 32;

// Lat-long environment map importance-sampled through a 2D CDF over
// sin-theta-weighted luminance. Rows hold conditional column CDFs,
// the marginal selects the row; both end in exactly one.
pub struct EnvMap {
    id_radiance: u32,
    to_world: Transform,
    width: usize,
    height: usize,
    cdf_rows: Vec<Vec<Float>>,
    cdf_marginal: Vec<Float>,
    // Average cell weight; the uv density of cell (x, y) is
    // weight(x, y) / normalization.
    normalization: Float,
}

impl EnvMap {
    pub fn build(id_radiance: u32, to_world: Transform, radiance: &Texture)
                 -> Result<Self, Error> {
        let (tex_w, tex_h) = radiance.resolution();
        let (width, height) = if tex_w > 1 || tex_h > 1 {
            (tex_w, tex_h)
        } else {
            (PROCEDURAL_WIDTH, PROCEDURAL_HEIGHT)
        };

        let mut cdf_rows = Vec::with_capacity(height);
        let mut row_weights = Vec::with_capacity(height);
        let mut total = 0.0;
        for y in 0..height {
            let v = (y as Float + 0.5) / height as Float;
            let sin_theta = (v * PI).sin();
            let mut row = Vec::with_capacity(width + 1);
            row.push(0.0);
            let mut row_sum = 0.0;
            for x in 0..width {
                let u = (x as Float + 0.5) / width as Float;
                let weight = luminance(&radiance.eval(&Vector2f::new(u, v))) * sin_theta;
                row_sum += weight.max(0.0);
                row.push(row_sum);
            }
            if row_sum > 0.0 {
                for value in row.iter_mut() {
                    *value /= row_sum;
                }
                if let Some(last) = row.last_mut() {
                    *last = 1.0;
                }
            }
            cdf_rows.push(row);
            row_weights.push(row_sum);
            total += row_sum;
        }

        if total <= 0.0 {
            return Err(Error::config("environment map with zero radiance"));
        }

        let mut cdf_marginal = Vec::with_capacity(height + 1);
        cdf_marginal.push(0.0);
        let mut acc = 0.0;
        for weight in &row_weights {
            acc += weight / total;
            cdf_marginal.push(acc);
        }
        if let Some(last) = cdf_marginal.last_mut() {
            *last = 1.0;
        }

        Ok(Self {
            id_radiance,
            to_world,
            width,
            height,
            cdf_rows,
            cdf_marginal,
            normalization: total / (width * height) as Float,
        })
    }

    pub fn sample(&self, textures: &[Texture], u: &Vector2f) -> EmitterSampleRec {
        // Row by the first variate, column by the second.
        let (y, dy) = invert_cdf(&self.cdf_marginal, u.x);
        let (x, dx) = invert_cdf(&self.cdf_rows[y], u.y);

        let uv = Vector2f::new(
            (x as Float + dx) / self.width as Float,
            (y as Float + dy) / self.height as Float,
        );
        let pdf = self.pdf_uv(x, y) / dir_jacobian(uv.y);
        if pdf <= 0.0 {
            return EmitterSampleRec::default();
        }

        let dir_local = dir_from_uv(&uv);
        let wi = self.to_world.apply_vector(dir_local).normalize();
        let value = textures[self.id_radiance as usize].eval(&uv) / pdf;

        EmitterSampleRec {
            valid: true,
            harsh: false,
            wi,
            distance: FLOAT_MAX,
            value,
            pdf,
        }
    }

    pub fn eval(&self, textures: &[Texture], dir: &Vector3f) -> Vector3f {
        let local = self.to_world.inv_apply_vector(*dir);
        if local.norm_squared() <= 0.0 {
            return Vector3f::zeros();
        }
        let uv = uv_from_dir(&local.normalize());
        textures[self.id_radiance as usize].eval(&uv)
    }

    pub fn pdf(&self, dir: &Vector3f) -> Float {
        let local = self.to_world.inv_apply_vector(*dir);
        if local.norm_squared() <= 0.0 {
            return 0.0;
        }
        let uv = uv_from_dir(&local.normalize());
        let x = ((uv.x * self.width as Float) as usize).min(self.width - 1);
        let y = ((uv.y * self.height as Float) as usize).min(self.height - 1);
        let jacobian = dir_jacobian(uv.y);
        if jacobian <= 0.0 {
            return 0.0;
        }
        self.pdf_uv(x, y) / jacobian
    }

    // Density over the unit uv square.
    fn pdf_uv(&self, x: usize, y: usize) -> Float {
        let row_pdf = self.cdf_marginal[y + 1] - self.cdf_marginal[y];
        let col_pdf = self.cdf_rows[y][x + 1] - self.cdf_rows[y][x];
        row_pdf * col_pdf * (self.width * self.height) as Float
    }
}

// d(omega) / d(uv) denominator: 2 pi^2 sin(theta).
fn dir_jacobian(v: Float) -> Float {
    2.0 * PI * PI * (v * PI).sin().max(1e-8)
}

fn dir_from_uv(uv: &Vector2f) -> Vector3f {
    let theta = uv.y * PI;
    let phi = uv.x * 2.0 * PI;
    let sin_theta = theta.sin();
    Vector3f::new(sin_theta * phi.cos(), sin_theta * phi.sin(), theta.cos())
}

fn uv_from_dir(dir: &Vector3f) -> Vector2f {
    let theta = dir.z.clamp(-1.0, 1.0).acos();
    let mut phi = dir.y.atan2(dir.x);
    if phi < 0.0 {
        phi += 2.0 * PI;
    }
    Vector2f::new(phi * INV_TWO_PI, theta / PI)
}

// Inverse transform sampling on a normalized CDF; returns the cell and
// the continuous offset inside it.
fn invert_cdf(cdf: &[Float], u: Float) -> (usize, Float) {
    let n = cdf.len() - 1;
    let mut lo = 0usize;
    let mut hi = n;
    while lo + 1 < hi {
        let mid = (lo + hi) / 2;
        if cdf[mid] <= u {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    let span = cdf[lo + 1] - cdf[lo];
    let offset = if span > 0.0 {
        ((u - cdf[lo]) / span).clamp(0.0, 1.0 - 1e-6)
    } else {
        0.5
    };
    (lo.min(n - 1), offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::rng::Sampler;

    fn gradient_texture() -> Vec<Texture> {
        // Bright band in the upper rows.
        let width = 8;
        let height = 4;
        let mut data = Vec::new();
        for y in 0..height {
            for _ in 0..width {
                let value = if y == 1 { 10.0 } else { 0.1 };
                data.extend_from_slice(&[value, value, value]);
            }
        }
        vec![Texture::Bitmap {
            data,
            width,
            height,
            channels: 3,
            to_uv: Transform::default(),
        }]
    }

    #[test]
    fn test_cdf_tails_are_one() {
        let textures = gradient_texture();
        let envmap = EnvMap::build(0, Transform::default(), &textures[0]).unwrap();
        assert!((envmap.cdf_marginal.last().unwrap() - 1.0).abs() < 1e-6);
        for row in &envmap.cdf_rows {
            assert!((row.last().unwrap() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_sample_pdf_matches_pdf_query() {
        let textures = gradient_texture();
        let envmap = EnvMap::build(0, Transform::default(), &textures[0]).unwrap();
        let mut sampler = Sampler::new(11, 4);
        for _ in 0..2000 {
            let rec = envmap.sample(&textures, &sampler.next_2d());
            assert!(rec.valid);
            let pdf = envmap.pdf(&rec.wi);
            assert!((pdf - rec.pdf).abs() < 1e-3 * rec.pdf.max(1e-3),
                    "pdf mismatch {} vs {}", pdf, rec.pdf);
        }
    }

    #[test]
    fn test_importance_prefers_bright_rows() {
        let textures = gradient_texture();
        let envmap = EnvMap::build(0, Transform::default(), &textures[0]).unwrap();
        let mut sampler = Sampler::new(13, 4);
        let mut bright = 0;
        let n = 2000;
        for _ in 0..n {
            let rec = envmap.sample(&textures, &sampler.next_2d());
            let local = rec.wi;
            let uv = uv_from_dir(&local);
            if (uv.y * 4.0) as usize == 1 {
                bright += 1;
            }
        }
        assert!(bright as Float / n as Float > 0.8);
    }

    #[test]
    fn test_uv_dir_roundtrip() {
        let uv = Vector2f::new(0.37, 0.61);
        let dir = dir_from_uv(&uv);
        let back = uv_from_dir(&dir);
        assert!((uv - back).norm() < 1e-4);
    }

    #[test]
    fn test_zero_radiance_rejected() {
        let texture = Texture::Constant { color: Vector3f::zeros() };
        assert!(EnvMap::build(0, Transform::default(), &texture).is_err());
    }
}
