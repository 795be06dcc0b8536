//! Planar parallelogram primitive.

use std::sync::Arc;

use caustic_math::{near_zero, Point3, Ray, Vec3};
use caustic_rtc::{Device, Geometry as RtcGeometry};

use crate::hit_info::HitInfo;
use crate::material::Material;
use crate::scene::SceneError;

/// Parallelogram with corner `origin` spanned by edges `u` and `v`.
#[derive(Debug)]
pub struct Quad {
    origin: Point3,
    u: Vec3,
    v: Vec3,
    /// Unit normal, `u x v` direction
    normal: Vec3,
    /// `n / (n . n)`, used to project onto the edge basis
    w: Vec3,
    material: Arc<Material>,
    rtc: RtcGeometry,
}

impl Quad {
    /// Create a quad. Parallel edges are rejected.
    pub fn new(device: &Device, origin: Point3, u: Vec3, v: Vec3, material: Arc<Material>) -> Result<Self, SceneError> {
        let n = u.cross(v);
        if near_zero(n) {
            return Err(SceneError::Degenerate("quad edges are parallel".into()));
        }

        Ok(Self {
            origin,
            u,
            v,
            normal: n.normalize(),
            w: n / n.dot(n),
            material,
            rtc: RtcGeometry::quad(device, origin, u, v),
        })
    }

    pub fn origin(&self) -> Point3 {
        self.origin
    }

    pub fn edges(&self) -> (Vec3, Vec3) {
        (self.u, self.v)
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub(crate) fn rtc_geometry(&self) -> &RtcGeometry {
        &self.rtc
    }

    pub(crate) fn hit_info(&self, ray: &Ray, point: Point3, t: f32) -> HitInfo {
        let mut info = HitInfo::new(point, t);

        // Fractional position along each edge
        let planar = point - self.origin;
        info.u = self.w.dot(planar.cross(self.v));
        info.v = self.w.dot(self.u.cross(planar));

        info.set_face_normal(ray, self.normal);
        info
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::{Emissive, Material};
    use caustic_math::Color;

    fn light() -> Arc<Material> {
        Arc::new(Material::Emissive(Emissive::new(Color::ONE)))
    }

    #[test]
    fn test_hit_info_uv() {
        let device = Device::new();
        let quad = Quad::new(
            &device,
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(4.0, 0.0, 0.0),
            Vec3::new(0.0, 2.0, 0.0),
            light(),
        )
        .unwrap();

        let ray = Ray::new_simple(Vec3::new(0.0, 0.5, 5.0), -Vec3::Z);
        let info = quad.hit_info(&ray, Vec3::new(0.0, 0.5, 0.0), 5.0);

        assert!((info.u - 0.25).abs() < 1e-6);
        assert!((info.v - 0.75).abs() < 1e-6);
        assert_eq!(info.normal, Vec3::Z);
        assert!(info.front_face);
    }

    #[test]
    fn test_back_face() {
        let device = Device::new();
        let quad = Quad::new(&device, Vec3::ZERO, Vec3::X, Vec3::Y, light()).unwrap();
        let ray = Ray::new_simple(Vec3::new(0.5, 0.5, -1.0), Vec3::Z);

        let info = quad.hit_info(&ray, Vec3::new(0.5, 0.5, 0.0), 1.0);

        assert!(!info.front_face);
        assert_eq!(info.normal, -Vec3::Z);
    }

    #[test]
    fn test_parallel_edges_rejected() {
        let device = Device::new();
        let result = Quad::new(&device, Vec3::ZERO, Vec3::X, Vec3::X * 2.0, light());
        assert!(matches!(result, Err(SceneError::Degenerate(_))));
    }
}
