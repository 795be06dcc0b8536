//! Sphere primitive.

use std::f32::consts::PI;
use std::sync::Arc;

use caustic_math::{Point3, Ray, Vec3};
use caustic_rtc::{Device, Geometry as RtcGeometry};

use crate::hit_info::HitInfo;
use crate::material::Material;
use crate::scene::SceneError;

/// A sphere primitive.
#[derive(Debug)]
pub struct Sphere {
    center: Point3,
    radius: f32,
    material: Arc<Material>,
    rtc: RtcGeometry,
}

impl Sphere {
    /// Create a sphere and its backend geometry. The radius must be positive.
    pub fn new(device: &Device, center: Point3, radius: f32, material: Arc<Material>) -> Result<Self, SceneError> {
        let rtc = RtcGeometry::sphere(device, center, radius)?;
        Ok(Self {
            center,
            radius,
            material,
            rtc,
        })
    }

    pub fn center(&self) -> Point3 {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub(crate) fn rtc_geometry(&self) -> &RtcGeometry {
        &self.rtc
    }

    pub(crate) fn hit_info(&self, ray: &Ray, point: Point3, t: f32) -> HitInfo {
        let mut info = HitInfo::new(point, t);
        let outward_normal = (point - self.center) / self.radius;
        info.set_face_normal(ray, outward_normal);
        (info.u, info.v) = Self::get_sphere_uv(outward_normal);
        info
    }

    /// Get the UV coordinates for a point on the unit sphere.
    fn get_sphere_uv(p: Vec3) -> (f32, f32) {
        // theta: angle down from -Y
        // phi: angle around Y axis from -X
        let theta = (-p.y).acos();
        let phi = (-p.z).atan2(p.x) + PI;

        let u = phi / (2.0 * PI);
        let v = theta / PI;
        (u, v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Lambertian;
    use caustic_math::Color;

    fn test_sphere(device: &Device) -> Sphere {
        let material = Arc::new(Material::Lambertian(Lambertian::from_color(Color::splat(0.5))));
        Sphere::new(device, Vec3::new(1.0, 2.0, 3.0), 2.0, material).unwrap()
    }

    #[test]
    fn test_hit_info_on_positive_x() {
        let device = Device::new();
        let sphere = test_sphere(&device);
        let point = sphere.center() + Vec3::new(sphere.radius(), 0.0, 0.0);
        let ray = Ray::new_simple(point + Vec3::new(5.0, 0.0, 0.0), -Vec3::X);

        let info = sphere.hit_info(&ray, point, 5.0);

        assert_eq!(info.normal, Vec3::X);
        assert!(info.front_face);
        assert!((info.u - 0.5).abs() < 1e-6);
        assert!((info.v - 0.5).abs() < 1e-6);
        assert_eq!(info.position, point);
        assert_eq!(info.t, 5.0);
    }

    #[test]
    fn test_hit_from_inside_flips_normal() {
        let device = Device::new();
        let sphere = test_sphere(&device);
        let point = sphere.center() + Vec3::new(0.0, sphere.radius(), 0.0);
        let ray = Ray::new_simple(sphere.center(), Vec3::Y);

        let info = sphere.hit_info(&ray, point, 2.0);

        assert!(!info.front_face);
        assert_eq!(info.normal, -Vec3::Y);
        // Top pole
        assert!((info.v - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_radius_rejected() {
        let device = Device::new();
        let material = Arc::new(Material::Lambertian(Lambertian::from_color(Color::ONE)));
        assert!(Sphere::new(&device, Vec3::ZERO, 0.0, material).is_err());
    }
}
