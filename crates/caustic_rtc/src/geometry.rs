//! Geometry registered with the intersection service.

use std::sync::Arc;

use caustic_math::{Aabb, InstanceTransform, Interval, Ray, Vec3};

use crate::scene::CommittedScene;
use crate::{Device, RtcError, RtcResult, Scene, INVALID_GEOMETRY_ID};

/// Shape data behind a [`Geometry`] handle.
#[derive(Debug)]
pub enum GeometryKind {
    /// Analytic sphere.
    Sphere { center: Vec3, radius: f32 },
    /// Planar quads over a shared vertex buffer.
    ///
    /// Each quad `[v0, v1, v2, v3]` is split into triangles `(v0, v1, v3)`
    /// and `(v2, v3, v1)`.
    QuadMesh {
        vertices: Vec<Vec3>,
        quads: Vec<[u32; 4]>,
    },
    /// A committed scene placed under a transform.
    Instance {
        scene: Arc<CommittedScene>,
        transform: InstanceTransform,
    },
}

/// Reference-counted geometry handle.
///
/// The same geometry may be attached to several scenes (for example a
/// primitive's scene and the sub-scene of an instance of it).
#[derive(Clone, Debug)]
pub struct Geometry {
    inner: Arc<GeometryData>,
}

#[derive(Debug)]
struct GeometryData {
    kind: GeometryKind,
    bounds: Aabb,
    device: Device,
}

impl Drop for GeometryData {
    fn drop(&mut self) {
        self.device.release_geometry();
    }
}

/// Closest-hit result of a single geometry.
#[derive(Debug, Copy, Clone)]
pub(crate) struct GeometryHit {
    pub t: f32,
    pub ng: Vec3,
    pub u: f32,
    pub v: f32,
    pub prim_id: u32,
    /// Geometry id inside an instanced sub-scene, or invalid.
    pub inner_geom_id: u32,
}

impl Geometry {
    fn from_kind(device: &Device, kind: GeometryKind, bounds: Aabb) -> Self {
        device.retain_geometry();
        Self {
            inner: Arc::new(GeometryData {
                kind,
                bounds,
                device: device.clone(),
            }),
        }
    }

    /// Analytic sphere geometry.
    pub fn sphere(device: &Device, center: Vec3, radius: f32) -> RtcResult<Self> {
        if !(radius > 0.0) {
            return Err(RtcError::InvalidRadius(radius));
        }
        let rvec = Vec3::splat(radius);
        let bounds = Aabb::from_points(center - rvec, center + rvec);
        Ok(Self::from_kind(device, GeometryKind::Sphere { center, radius }, bounds))
    }

    /// Single parallelogram spanned by `u` and `v` from corner `origin`.
    pub fn quad(device: &Device, origin: Vec3, u: Vec3, v: Vec3) -> Self {
        let vertices = vec![origin, origin + u, origin + u + v, origin + v];
        let bounds = Aabb::enclosing(&vertices);
        Self::from_kind(
            device,
            GeometryKind::QuadMesh {
                vertices,
                quads: vec![[0, 1, 2, 3]],
            },
            bounds,
        )
    }

    /// Indexed quad mesh.
    pub fn quad_mesh(device: &Device, vertices: Vec<Vec3>, quads: Vec<[u32; 4]>) -> RtcResult<Self> {
        for (quad, indices) in quads.iter().enumerate() {
            if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
                return Err(RtcError::InvalidIndex {
                    quad,
                    index,
                    vertex_count: vertices.len(),
                });
            }
        }
        let bounds = Aabb::enclosing(&vertices);
        Ok(Self::from_kind(device, GeometryKind::QuadMesh { vertices, quads }, bounds))
    }

    /// Place a committed scene under `transform`.
    ///
    /// Only translations are supported, and the instanced scene may not itself
    /// contain instances.
    pub fn instance(device: &Device, scene: &Scene, transform: InstanceTransform) -> RtcResult<Self> {
        let committed = scene.committed().ok_or(RtcError::UncommittedInstanceScene)?;
        if !transform.is_pure_translation() {
            return Err(RtcError::UnsupportedTransform);
        }
        if committed.has_instances() {
            return Err(RtcError::NestedInstance);
        }
        let bounds = transform.transform_aabb(&committed.bounds());
        Ok(Self::from_kind(
            device,
            GeometryKind::Instance {
                scene: Arc::clone(committed),
                transform,
            },
            bounds,
        ))
    }

    pub fn kind(&self) -> &GeometryKind {
        &self.inner.kind
    }

    /// World-space bounds.
    pub fn bounds(&self) -> Aabb {
        self.inner.bounds
    }

    pub(crate) fn is_instance(&self) -> bool {
        matches!(self.inner.kind, GeometryKind::Instance { .. })
    }

    /// Closest intersection strictly inside `ray_t`.
    pub(crate) fn intersect(&self, ray: &Ray, ray_t: Interval) -> Option<GeometryHit> {
        if !self.inner.bounds.hit(ray, ray_t) {
            return None;
        }
        match &self.inner.kind {
            GeometryKind::Sphere { center, radius } => intersect_sphere(*center, *radius, ray, ray_t),
            GeometryKind::QuadMesh { vertices, quads } => {
                intersect_quads(vertices, quads, ray, ray_t)
            }
            GeometryKind::Instance { scene, transform } => {
                let local = ray.offset_origin(-transform.translation());
                scene.closest_hit(&local, ray_t).map(|(geom_id, hit)| GeometryHit {
                    inner_geom_id: geom_id,
                    ..hit
                })
            }
        }
    }
}

fn intersect_sphere(center: Vec3, radius: f32, ray: &Ray, ray_t: Interval) -> Option<GeometryHit> {
    let oc = center - ray.origin();
    let a = ray.direction().length_squared();
    let h = ray.direction().dot(oc);
    let c = oc.length_squared() - radius * radius;

    let discriminant = h * h - a * c;
    if discriminant < 0.0 {
        return None;
    }
    let sqrtd = discriminant.sqrt();

    // Find the nearest root in the acceptable range
    let mut root = (h - sqrtd) / a;
    if !ray_t.surrounds(root) {
        root = (h + sqrtd) / a;
        if !ray_t.surrounds(root) {
            return None;
        }
    }

    let ng = (ray.at(root) - center) / radius;
    Some(GeometryHit {
        t: root,
        ng,
        u: 0.0,
        v: 0.0,
        prim_id: 0,
        inner_geom_id: INVALID_GEOMETRY_ID,
    })
}

fn intersect_quads(
    vertices: &[Vec3],
    quads: &[[u32; 4]],
    ray: &Ray,
    ray_t: Interval,
) -> Option<GeometryHit> {
    let mut closest: Option<GeometryHit> = None;
    let mut t_max = ray_t.max;

    for (prim_id, q) in quads.iter().enumerate() {
        let [v0, v1, v2, v3] = q.map(|i| vertices[i as usize]);
        let window = Interval::new(ray_t.min, t_max);
        // Second triangle runs from the opposite corner, so its barycentrics
        // are mirrored back into quad space.
        let hit = intersect_triangle(v0, v1, v3, ray, window)
            .or_else(|| intersect_triangle(v2, v3, v1, ray, window).map(|(t, u, v)| (t, 1.0 - u, 1.0 - v)));

        if let Some((t, u, v)) = hit {
            t_max = t;
            closest = Some(GeometryHit {
                t,
                ng: (v1 - v0).cross(v3 - v0),
                u,
                v,
                prim_id: prim_id as u32,
                inner_geom_id: INVALID_GEOMETRY_ID,
            });
        }
    }

    closest
}

/// Moller-Trumbore. Returns `(t, u, v)` with barycentrics relative to `v0`.
fn intersect_triangle(v0: Vec3, v1: Vec3, v2: Vec3, ray: &Ray, ray_t: Interval) -> Option<(f32, f32, f32)> {
    let e1 = v1 - v0;
    let e2 = v2 - v0;
    let pvec = ray.direction().cross(e2);
    let det = e1.dot(pvec);
    if det.abs() < 1e-12 {
        return None;
    }
    let inv_det = 1.0 / det;

    let tvec = ray.origin() - v0;
    let u = tvec.dot(pvec) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let qvec = tvec.cross(e1);
    let v = ray.direction().dot(qvec) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = e2.dot(qvec) * inv_det;
    ray_t.surrounds(t).then_some((t, u, v))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forward() -> Interval {
        Interval::new(0.001, f32::INFINITY)
    }

    #[test]
    fn test_sphere_hit_and_miss() {
        let device = Device::new();
        let sphere = Geometry::sphere(&device, Vec3::new(0.0, 0.0, -1.0), 0.5).unwrap();

        let hit = sphere
            .intersect(&Ray::new_simple(Vec3::ZERO, -Vec3::Z), forward())
            .unwrap();
        assert!((hit.t - 0.5).abs() < 1e-5);
        assert!((hit.ng - Vec3::Z).length() < 1e-5);

        assert!(sphere.intersect(&Ray::new_simple(Vec3::ZERO, Vec3::Y), forward()).is_none());
    }

    #[test]
    fn test_sphere_rejects_non_positive_radius() {
        let device = Device::new();
        assert_eq!(
            Geometry::sphere(&device, Vec3::ZERO, 0.0).unwrap_err(),
            RtcError::InvalidRadius(0.0)
        );
    }

    #[test]
    fn test_quad_hit_reports_parametric_uv() {
        let device = Device::new();
        let quad = Geometry::quad(&device, Vec3::new(-1.0, -1.0, -2.0), Vec3::new(2.0, 0.0, 0.0), Vec3::new(0.0, 2.0, 0.0));

        let hit = quad
            .intersect(&Ray::new_simple(Vec3::new(0.5, -0.5, 0.0), -Vec3::Z), forward())
            .unwrap();
        assert!((hit.t - 2.0).abs() < 1e-5);
        assert!((hit.u - 0.75).abs() < 1e-5);
        assert!((hit.v - 0.25).abs() < 1e-5);

        // Upper-right half is covered by the second triangle.
        let hit = quad
            .intersect(&Ray::new_simple(Vec3::new(0.9, 0.8, 0.0), -Vec3::Z), forward())
            .unwrap();
        assert!((hit.u - 0.95).abs() < 1e-5);
        assert!((hit.v - 0.9).abs() < 1e-5);

        assert!(quad
            .intersect(&Ray::new_simple(Vec3::new(1.5, 0.0, 0.0), -Vec3::Z), forward())
            .is_none());
    }

    #[test]
    fn test_quad_mesh_validates_indices() {
        let device = Device::new();
        let err = Geometry::quad_mesh(&device, vec![Vec3::ZERO; 3], vec![[0, 1, 2, 3]]).unwrap_err();
        assert_eq!(
            err,
            RtcError::InvalidIndex {
                quad: 0,
                index: 3,
                vertex_count: 3
            }
        );
    }

    #[test]
    fn test_instance_requires_committed_translation() {
        let device = Device::new();
        let mut scene = Scene::new(&device);
        scene
            .attach(Geometry::sphere(&device, Vec3::ZERO, 1.0).unwrap())
            .unwrap();

        let translate = InstanceTransform::from_translation(Vec3::X);
        assert_eq!(
            Geometry::instance(&device, &scene, translate).unwrap_err(),
            RtcError::UncommittedInstanceScene
        );

        scene.commit().unwrap();
        let scaled = InstanceTransform::from_rows([2.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        assert_eq!(
            Geometry::instance(&device, &scene, scaled).unwrap_err(),
            RtcError::UnsupportedTransform
        );

        let instance = Geometry::instance(&device, &scene, translate).unwrap();
        assert!(instance.bounds().x.contains(1.9));
    }

    #[test]
    fn test_geometry_release_is_tracked() {
        let device = Device::new();
        let quad = Geometry::quad(&device, Vec3::ZERO, Vec3::X, Vec3::Y);
        let shared = quad.clone();
        assert_eq!(device.live_geometries(), 1);

        drop(quad);
        assert_eq!(device.live_geometries(), 1);
        drop(shared);
        assert_eq!(device.live_geometries(), 0);
    }
}
