//! Surface information at a ray intersection.

use caustic_math::{Point3, Ray, Vec3};

/// Record of a ray-surface intersection.
///
/// Built fresh for every query. `normal` always opposes the incoming ray;
/// `front_face` tells whether that is the outward geometric normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitInfo {
    /// World-space hit point
    pub position: Point3,
    pub normal: Vec3,
    /// Ray arrived from the outside of the surface
    pub front_face: bool,
    pub t: f32,
    /// Surface parameterization fed to textures
    pub u: f32,
    pub v: f32,
}

impl HitInfo {
    /// Start a record at `position`/`t`; normal and face are set separately.
    pub fn new(position: Point3, t: f32) -> Self {
        Self {
            position,
            normal: Vec3::ZERO,
            front_face: false,
            t,
            u: 0.0,
            v: 0.0,
        }
    }

    /// Derive `front_face` and the stored normal together from the geometry's
    /// outward normal (expected unit length).
    pub fn set_face_normal(&mut self, ray: &Ray, outward_normal: Vec3) {
        self.front_face = ray.direction().dot(outward_normal) < 0.0;

        self.normal = if self.front_face {
            outward_normal
        } else {
            -outward_normal
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_front_face_keeps_outward_normal() {
        let ray = Ray::new_simple(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z);
        let mut info = HitInfo::new(Vec3::ZERO, 5.0);
        info.set_face_normal(&ray, Vec3::Z);

        assert!(info.front_face);
        assert_eq!(info.normal, Vec3::Z);
    }

    #[test]
    fn test_back_face_flips_normal() {
        let ray = Ray::new_simple(Vec3::ZERO, Vec3::Z);
        let mut info = HitInfo::new(Vec3::new(0.0, 0.0, 1.0), 1.0);
        info.set_face_normal(&ray, Vec3::Z);

        assert!(!info.front_face);
        assert_eq!(info.normal, -Vec3::Z);
    }
}
