// Copyright @yucwang 2026

use super::constants::{Float, Vector3f};

pub fn luminance(rgb: &Vector3f) -> Float {
    0.212671 * rgb.x + 0.715160 * rgb.y + 0.072169 * rgb.z
}

pub fn max_component(rgb: &Vector3f) -> Float {
    rgb.x.max(rgb.y).max(rgb.z)
}

pub fn is_black(rgb: &Vector3f) -> bool {
    rgb.x == 0.0 && rgb.y == 0.0 && rgb.z == 0.0
}

pub fn is_finite(rgb: &Vector3f) -> bool {
    rgb.x.is_finite() && rgb.y.is_finite() && rgb.z.is_finite()
}
