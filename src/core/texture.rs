// Copyright @yucwang 2026

use crate::core::config::TextureConfig;
use crate::core::error::Error;
use crate::math::constants::{Float, Vector2f, Vector3f};
use crate::math::transform::Transform;

pub enum Texture {
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

impl Texture {
    pub fn from_config(config: &TextureConfig) -> Result<Self, Error> {
        match config {
            TextureConfig::Constant { color } => Ok(Self::Constant { color: *color }),
            TextureConfig::Checkerboard { color0, color1, to_uv } => Ok(Self::Checkerboard {
                color0: *color0,
                color1: *color1,
                to_uv: *to_uv,
            }),
            TextureConfig::Bitmap { data, width, height, channels, to_uv } => {
                if *width == 0 || *height == 0 {
                    return Err(Error::config("bitmap texture with zero resolution"));
                }
                if !matches!(*channels, 1 | 3 | 4) {
                    return Err(Error::config(format!(
                        "bitmap texture with {} channels", channels)));
                }
                if data.len() != width * height * channels {
                    return Err(Error::config("bitmap texture pixel count mismatch"));
                }
                Ok(Self::Bitmap {
                    data: data.clone(),
                    width: *width,
                    height: *height,
                    channels: *channels,
                    to_uv: *to_uv,
                })
            }
        }
    }

    pub fn eval(&self, uv: &Vector2f) -> Vector3f {
        match self {
            Self::Constant { color } => *color,
            Self::Checkerboard { color0, color1, to_uv } => {
                let p = to_uv.apply_point(Vector3f::new(uv.x, uv.y, 0.0));
                let parity = (p.x.floor() + p.y.floor()) as i64;
                if parity % 2 == 0 {
                    *color0
                } else {
                    *color1
                }
            }
            Self::Bitmap { data, width, height, channels, to_uv } => {
                let p = to_uv.apply_point(Vector3f::new(uv.x, uv.y, 0.0));
                bilinear(data, *width, *height, *channels, p.x, p.y)
            }
        }
    }

    // Scalar lookup used by opacity and roughness references.
    pub fn eval_scalar(&self, uv: &Vector2f) -> Float {
        self.eval(uv).x
    }

    pub fn resolution(&self) -> (usize, usize) {
        match self {
            Self::Bitmap { width, height, .. } => (*width, *height),
            _ => (1, 1),
        }
    }
}

fn wrap(x: Float) -> Float {
    let r = x - x.floor();
    if r < 0.0 {
        r + 1.0
    } else {
        r
    }
}

fn texel(data: &[Float], width: usize, height: usize, channels: usize,
         x: usize, y: usize) -> Vector3f {
    let x = x.min(width - 1);
    let y = y.min(height - 1);
    let base = (y * width + x) * channels;
    match channels {
        1 => {
            let v = data[base];
            Vector3f::new(v, v, v)
        }
        // 4 channels: alpha dropped.
        _ => Vector3f::new(data[base], data[base + 1], data[base + 2]),
    }
}

fn bilinear(data: &[Float], width: usize, height: usize, channels: usize,
            u: Float, v: Float) -> Vector3f {
    let x = wrap(u) * width as Float - 0.5;
    let y = wrap(v) * height as Float - 0.5;
    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;

    let x0i = x0.rem_euclid(width as Float) as usize;
    let y0i = y0.rem_euclid(height as Float) as usize;
    let x1i = (x0i + 1) % width;
    let y1i = (y0i + 1) % height;

    let c00 = texel(data, width, height, channels, x0i, y0i);
    let c10 = texel(data, width, height, channels, x1i, y0i);
    let c01 = texel(data, width, height, channels, x0i, y1i);
    let c11 = texel(data, width, height, channels, x1i, y1i);

    (c00 * (1.0 - fx) + c10 * fx) * (1.0 - fy) + (c01 * (1.0 - fx) + c11 * fx) * fy
}
