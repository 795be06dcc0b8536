//! Parallelepiped ("box") primitive.

use std::sync::Arc;

use caustic_math::{Point3, Ray, Vec3};
use caustic_rtc::{Device, Geometry as RtcGeometry};

use crate::hit_info::HitInfo;
use crate::material::Material;
use crate::scene::SceneError;

/// Distance from a face plane still counted as on the face.
const FACE_EPSILON: f32 = 0.001;

/// Edges carrying (u, v) on the faces normal to each edge.
const FACE_UV_AXES: [(usize, usize); 3] = [(1, 2), (0, 2), (0, 1)];

/// Vertex `i` is `corner + bit0*a + bit1*b + bit2*c`; faces in a-, a+, b-,
/// b+, c-, c+ order.
const FACES: [[u32; 4]; 6] = [
    [0, 2, 6, 4],
    [1, 3, 7, 5],
    [0, 1, 5, 4],
    [2, 3, 7, 6],
    [0, 1, 3, 2],
    [4, 5, 7, 6],
];

/// Box spanned by three non-parallel edges `a`, `b`, `c` from `corner`.
///
/// Registered with the backend as a six-quad mesh.
#[derive(Debug)]
pub struct Cuboid {
    corner: Point3,
    edges: [Vec3; 3],
    /// Dual basis: `rel . dual[k]` is the fractional coordinate along `edges[k]`
    dual: [Vec3; 3],
    material: Arc<Material>,
    rtc: RtcGeometry,
}

impl Cuboid {
    pub fn new(
        device: &Device,
        corner: Point3,
        a: Vec3,
        b: Vec3,
        c: Vec3,
        material: Arc<Material>,
    ) -> Result<Self, SceneError> {
        let volume = a.dot(b.cross(c));
        if volume.abs() < 1e-8 {
            return Err(SceneError::Degenerate("box edges are coplanar".into()));
        }
        let dual = [b.cross(c) / volume, c.cross(a) / volume, a.cross(b) / volume];

        let edges = [a, b, c];
        let vertices = (0..8u32)
            .map(|i| {
                (0..3)
                    .filter(|&axis| i & (1 << axis) != 0)
                    .fold(corner, |p, axis| p + edges[axis])
            })
            .collect();
        let rtc = RtcGeometry::quad_mesh(device, vertices, FACES.to_vec())?;

        Ok(Self {
            corner,
            edges,
            dual,
            material,
            rtc,
        })
    }

    pub fn corner(&self) -> Point3 {
        self.corner
    }

    pub fn edges(&self) -> [Vec3; 3] {
        self.edges
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub(crate) fn rtc_geometry(&self) -> &RtcGeometry {
        &self.rtc
    }

    pub(crate) fn hit_info(&self, ray: &Ray, point: Point3, t: f32) -> HitInfo {
        let mut info = HitInfo::new(point, t);
        let rel = point - self.corner;
        let frac = self.dual.map(|d| rel.dot(d));

        let (axis, positive) = self.face_at(&frac);
        let (ua, va) = FACE_UV_AXES[axis];

        // Outward normal of the face: along the dual vector, pointing away
        // from the opposite face
        let dual_dir = self.dual[axis].normalize();
        let outward = if positive { dual_dir } else { -dual_dir };

        info.u = frac[ua];
        info.v = frac[va];
        info.set_face_normal(ray, outward);
        info
    }

    /// First face within epsilon of the point, plus before minus for each of
    /// a, b, c; falls back to the closest face.
    fn face_at(&self, frac: &[f32; 3]) -> (usize, bool) {
        let mut best = (0, false);
        let mut best_distance = f32::INFINITY;

        for axis in 0..3 {
            let len = self.edges[axis].length();
            let along = frac[axis] * len;

            for (positive, distance) in [(true, (along - len).abs()), (false, along.abs())] {
                if distance < FACE_EPSILON {
                    return (axis, positive);
                }
                if distance < best_distance {
                    best_distance = distance;
                    best = (axis, positive);
                }
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Lambertian;
    use caustic_math::Color;

    fn unit_box(device: &Device) -> Cuboid {
        let material = Arc::new(Material::Lambertian(Lambertian::from_color(Color::ONE)));
        Cuboid::new(device, Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Z, material).unwrap()
    }

    #[test]
    fn test_positive_x_face() {
        let device = Device::new();
        let cuboid = unit_box(&device);
        let ray = Ray::new_simple(Vec3::new(3.0, 0.5, 0.5), -Vec3::X);

        let info = cuboid.hit_info(&ray, Vec3::new(1.0, 0.5, 0.5), 2.0);

        assert_eq!(info.normal, Vec3::X);
        assert!(info.front_face);
        assert!((info.u - 0.5).abs() < 1e-6);
        assert!((info.v - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_negative_faces() {
        let device = Device::new();
        let cuboid = unit_box(&device);

        let ray = Ray::new_simple(Vec3::new(0.25, -2.0, 0.75), Vec3::Y);
        let info = cuboid.hit_info(&ray, Vec3::new(0.25, 0.0, 0.75), 2.0);
        assert_eq!(info.normal, -Vec3::Y);
        assert!(info.front_face);
        // b-face: u along a, v along c
        assert!((info.u - 0.25).abs() < 1e-6);
        assert!((info.v - 0.75).abs() < 1e-6);

        let ray = Ray::new_simple(Vec3::new(0.5, 0.5, -2.0), Vec3::Z);
        let info = cuboid.hit_info(&ray, Vec3::new(0.5, 0.5, 0.0), 2.0);
        assert_eq!(info.normal, -Vec3::Z);
    }

    #[test]
    fn test_edge_prefers_first_axis() {
        let device = Device::new();
        let cuboid = unit_box(&device);
        let ray = Ray::new_simple(Vec3::new(2.0, 2.0, 0.5), Vec3::new(-1.0, -1.0, 0.0));

        let info = cuboid.hit_info(&ray, Vec3::new(1.0, 1.0, 0.5), 1.0);

        assert_eq!(info.normal, Vec3::X);
    }

    #[test]
    fn test_face_uv_axes_follow_edge_order() {
        let device = Device::new();
        let cuboid = unit_box(&device);

        // a-face: u along b, v along c
        let ray = Ray::new_simple(Vec3::new(-2.0, 0.2, 0.6), Vec3::X);
        let info = cuboid.hit_info(&ray, Vec3::new(0.0, 0.2, 0.6), 2.0);
        assert_eq!(info.normal, -Vec3::X);
        assert!((info.u - 0.2).abs() < 1e-6);
        assert!((info.v - 0.6).abs() < 1e-6);

        // b+ face: u along a, v along c
        let ray = Ray::new_simple(Vec3::new(0.3, 4.0, 0.9), -Vec3::Y);
        let info = cuboid.hit_info(&ray, Vec3::new(0.3, 1.0, 0.9), 3.0);
        assert_eq!(info.normal, Vec3::Y);
        assert!((info.u - 0.3).abs() < 1e-6);
        assert!((info.v - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_thin_box_prefers_plus_face() {
        let device = Device::new();
        let material = Arc::new(Material::Lambertian(Lambertian::from_color(Color::ONE)));
        let sliver = Cuboid::new(
            &device,
            Vec3::ZERO,
            Vec3::new(0.0005, 0.0, 0.0),
            Vec3::Y,
            Vec3::Z,
            material,
        )
        .unwrap();
        let ray = Ray::new_simple(Vec3::new(2.0, 0.5, 0.5), -Vec3::X);

        // Within epsilon of both a-faces: the plus face wins
        let info = sliver.hit_info(&ray, Vec3::new(0.0004, 0.5, 0.5), 2.0);

        assert_eq!(info.normal, Vec3::X);
        assert!(info.front_face);
    }

    #[test]
    fn test_off_surface_point_uses_nearest_face() {
        let device = Device::new();
        let cuboid = unit_box(&device);
        let ray = Ray::new_simple(Vec3::new(0.5, 5.0, 0.5), -Vec3::Y);

        let info = cuboid.hit_info(&ray, Vec3::new(0.5, 0.98, 0.5), 4.0);

        assert_eq!(info.normal, Vec3::Y);
    }

    #[test]
    fn test_scaled_box() {
        let device = Device::new();
        let material = Arc::new(Material::Lambertian(Lambertian::from_color(Color::ONE)));
        let cuboid = Cuboid::new(
            &device,
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(0.0, 4.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            material,
        )
        .unwrap();
        let ray = Ray::new_simple(Vec3::new(2.0, 1.0, 5.0), -Vec3::Z);

        let info = cuboid.hit_info(&ray, Vec3::new(2.0, 1.0, 1.0), 4.0);

        assert_eq!(info.normal, Vec3::Z);
        // c-face: u along a, v along b
        assert!((info.u - 0.5).abs() < 1e-6);
        assert!((info.v - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_coplanar_edges_rejected() {
        let device = Device::new();
        let material = Arc::new(Material::Lambertian(Lambertian::from_color(Color::ONE)));
        let result = Cuboid::new(&device, Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::X + Vec3::Y, material);
        assert!(matches!(result, Err(SceneError::Degenerate(_))));
    }
}
