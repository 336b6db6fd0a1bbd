// Copyright @yucwang 2026

use crate::math::constants::{Float, Vector2f, Vector3f, PI};

// Roughness at or below this is treated as a perfect mirror lobe.
pub const ALPHA_SMOOTH: Float = 1e-4;

fn clamp01(v: Float) -> Float {
    v.max(0.0).min(1.0)
}

// Anisotropic GGX (Trowbridge-Reitz) normal distribution, m in the
// upper hemisphere of the shading frame.
pub fn ggx_d(m: &Vector3f, alpha_u: Float, alpha_v: Float) -> Float {
    if m.z <= 0.0 {
        return 0.0;
    }
    let au = alpha_u.max(ALPHA_SMOOTH);
    let av = alpha_v.max(ALPHA_SMOOTH);
    let e = m.x * m.x / (au * au) + m.y * m.y / (av * av) + m.z * m.z;
    1.0 / (PI * au * av * e * e)
}

fn ggx_lambda(w: &Vector3f, alpha_u: Float, alpha_v: Float) -> Float {
    let cos2 = w.z * w.z;
    if cos2 <= 0.0 {
        return 0.0;
    }
    let au = alpha_u.max(ALPHA_SMOOTH);
    let av = alpha_v.max(ALPHA_SMOOTH);
    let a2_tan2 = (au * au * w.x * w.x + av * av * w.y * w.y) / cos2;
    0.5 * ((1.0 + a2_tan2).sqrt() - 1.0)
}

pub fn ggx_g1(w: &Vector3f, alpha_u: Float, alpha_v: Float) -> Float {
    if w.z == 0.0 {
        return 0.0;
    }
    1.0 / (1.0 + ggx_lambda(w, alpha_u, alpha_v))
}

// Separable Smith shadowing-masking.
pub fn ggx_g(wo: &Vector3f, wi: &Vector3f, alpha_u: Float, alpha_v: Float) -> Float {
    ggx_g1(wo, alpha_u, alpha_v) * ggx_g1(wi, alpha_u, alpha_v)
}

// Visible-normal sampling (Heitz 2018). `wo` must lie in the upper
// hemisphere; the returned half-vector does too.
pub fn sample_ggx_vndf(wo: &Vector3f, alpha_u: Float, alpha_v: Float,
                       u: &Vector2f) -> Vector3f {
    let au = alpha_u.max(ALPHA_SMOOTH);
    let av = alpha_v.max(ALPHA_SMOOTH);
    let wh = Vector3f::new(au * wo.x, av * wo.y, wo.z).normalize();

    let mut t1 = Vector3f::new(1.0, 0.0, 0.0);
    if wh.z < 0.9999 {
        t1 = Vector3f::new(0.0, 0.0, 1.0).cross(&wh).normalize();
    }
    let t2 = wh.cross(&t1);

    let u1 = clamp01(u.x);
    let u2 = clamp01(u.y);
    let r = u1.sqrt();
    let phi = 2.0 * PI * u2;
    let t1p = r * phi.cos();
    let mut t2p = r * phi.sin();
    let s = 0.5 * (1.0 + wh.z);
    t2p = (1.0 - s) * (1.0 - t1p * t1p).max(0.0).sqrt() + s * t2p;

    let nh = t1 * t1p + t2 * t2p
        + wh * (1.0 - t1p * t1p - t2p * t2p).max(0.0).sqrt();
    Vector3f::new(au * nh.x, av * nh.y, nh.z.max(1e-6)).normalize()
}

// Density of sample_ggx_vndf over half-vectors.
pub fn pdf_ggx_vndf(wo: &Vector3f, m: &Vector3f, alpha_u: Float, alpha_v: Float) -> Float {
    if wo.z <= 0.0 || m.z <= 0.0 {
        return 0.0;
    }
    let d = ggx_d(m, alpha_u, alpha_v);
    let g1 = ggx_g1(wo, alpha_u, alpha_v);
    d * g1 * wo.dot(m).abs() / wo.z.abs()
}

pub fn reflect(w: &Vector3f, m: &Vector3f) -> Vector3f {
    2.0 * w.dot(m) * m - w
}

// Refract `w` about `m` with relative index eta = eta_t / eta_i taken
// for the side `w` arrives from. None on total internal reflection.
pub fn refract(w: &Vector3f, m: &Vector3f, eta: Float) -> Option<Vector3f> {
    let cos_i = w.dot(m);
    let sin2_i = (1.0 - cos_i * cos_i).max(0.0);
    let sin2_t = sin2_i / (eta * eta);
    if sin2_t >= 1.0 {
        return None;
    }
    let cos_t = (1.0 - sin2_t).sqrt();
    let cos_t = if cos_i >= 0.0 { -cos_t } else { cos_t };
    Some((-w + cos_i * m) / eta + cos_t * m)
}

// Unpolarized dielectric Fresnel. `cos_i > 0` means the ray arrives
// from the exterior side; `eta = int_ior / ext_ior`.
pub fn fresnel_dielectric(cos_i: Float, eta: Float) -> Float {
    let mut cos_i = cos_i.max(-1.0).min(1.0);
    let (eta_i, eta_t) = if cos_i > 0.0 { (1.0, eta) } else { (eta, 1.0) };
    cos_i = cos_i.abs();

    let sin2_i = (1.0 - cos_i * cos_i).max(0.0);
    let sin2_t = (eta_i / eta_t) * (eta_i / eta_t) * sin2_i;
    if sin2_t >= 1.0 {
        return 1.0;
    }
    let cos_t = (1.0 - sin2_t).sqrt();
    let r_parl = (eta_t * cos_i - eta_i * cos_t) / (eta_t * cos_i + eta_i * cos_t);
    let r_perp = (eta_i * cos_i - eta_t * cos_t) / (eta_i * cos_i + eta_t * cos_t);
    0.5 * (r_parl * r_parl + r_perp * r_perp)
}

// Exact conductor Fresnel for one channel.
pub fn fresnel_conductor(cos_i: Float, eta: Float, k: Float) -> Float {
    let cos_i = cos_i.abs().min(1.0);
    let cos2 = cos_i * cos_i;
    let sin2 = 1.0 - cos2;
    let eta2 = eta * eta;
    let k2 = k * k;

    let t0 = eta2 - k2 - sin2;
    let a2b2 = (t0 * t0 + 4.0 * eta2 * k2).max(0.0).sqrt();
    let t1 = a2b2 + cos2;
    let a = (0.5 * (a2b2 + t0)).max(0.0).sqrt();
    let t2 = 2.0 * a * cos_i;
    let rs = (t1 - t2) / (t1 + t2);

    let t3 = cos2 * a2b2 + sin2 * sin2;
    let t4 = t2 * sin2;
    let rp = rs * (t3 - t4) / (t3 + t4);

    0.5 * (rp + rs)
}

// Average dielectric Fresnel reflectance over the hemisphere
// (rational fit by Egan & Hilgeman / d'Eon).
pub fn fresnel_diffuse_reflectance(eta: Float) -> Float {
    if eta < 1.0 {
        -0.4399 + 0.7099 / eta - 0.3319 / (eta * eta)
            + 0.0636 / (eta * eta * eta)
    } else {
        let inv_eta = 1.0 / eta;
        let inv_eta2 = inv_eta * inv_eta;
        -1.4399 * inv_eta2 + 0.7099 * inv_eta + 0.6681 + 0.0636 * eta
    }
}
