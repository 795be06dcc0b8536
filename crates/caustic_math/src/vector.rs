//! Reflection, refraction and other small vector helpers.

use crate::Vec3;

/// Reflect a vector about a normal.
#[inline]
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Refract a unit vector through a surface with relative index `etai_over_etat`.
#[inline]
pub fn refract(uv: Vec3, n: Vec3, etai_over_etat: f32) -> Vec3 {
    let cos_theta = (-uv).dot(n).min(1.0);
    let r_out_perp = etai_over_etat * (uv + cos_theta * n);
    let r_out_parallel = -(1.0 - r_out_perp.length_squared()).abs().sqrt() * n;
    r_out_perp + r_out_parallel
}

/// True if every component is within `1e-8` of zero.
#[inline]
pub fn near_zero(v: Vec3) -> bool {
    const S: f32 = 1e-8;
    v.x.abs() < S && v.y.abs() < S && v.z.abs() < S
}

/// Normalize `v`, or return zero for a zero-length input instead of NaN.
#[inline]
pub fn unit_or_zero(v: Vec3) -> Vec3 {
    v.normalize_or_zero()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reflect_flips_normal_component() {
        let v = Vec3::new(1.0, -1.0, 0.0);
        assert_eq!(reflect(v, Vec3::Y), Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_refract_straight_through_at_normal_incidence() {
        let out = refract(-Vec3::Y, Vec3::Y, 1.0 / 1.5);
        assert!((out - (-Vec3::Y)).length() < 1e-6);
    }

    #[test]
    fn test_refract_index_one_keeps_direction() {
        let dir = Vec3::new(1.0, -1.0, 0.0).normalize();
        let out = refract(dir, Vec3::Y, 1.0);
        assert!((out - dir).length() < 1e-6);
    }

    #[test]
    fn test_degenerate_normalize_falls_back_to_zero() {
        assert_eq!(unit_or_zero(Vec3::ZERO), Vec3::ZERO);
        assert!(near_zero(Vec3::new(1e-9, -1e-9, 0.0)));
        assert!(!near_zero(Vec3::new(1e-3, 0.0, 0.0)));
    }
}
