//! Scene primitives and their surface queries.
//!
//! The backend only reports which hit-identifier a ray struck and how far
//! away; everything shading needs (normal, face, texture coordinates,
//! material) is recovered here from the world-space hit point.

mod cuboid;
mod instance;
mod quad;
mod sphere;

pub use cuboid::Cuboid;
pub use instance::Instance;
pub use quad::Quad;
pub use sphere::Sphere;

use caustic_math::{Point3, Ray};
use caustic_rtc::Geometry as RtcGeometry;

use crate::hit_info::HitInfo;
use crate::material::Material;

/// Closed set of primitives a scene can hold.
#[derive(Debug)]
pub enum Geometry {
    Sphere(Sphere),
    Quad(Quad),
    Box(Cuboid),
    Instance(Instance),
}

impl Geometry {
    /// Material of the surface reported under `hit_id`.
    ///
    /// Every current primitive carries a single material; the id is accepted
    /// for multi-material meshes.
    pub fn material_by_id(&self, hit_id: u32) -> &Material {
        match self {
            Geometry::Sphere(s) => s.material(),
            Geometry::Quad(q) => q.material(),
            Geometry::Box(b) => b.material(),
            Geometry::Instance(i) => i.material_by_id(hit_id),
        }
    }

    /// Surface record for a hit at `point`, `t` along `ray`.
    pub fn hit_info(&self, ray: &Ray, point: Point3, t: f32, hit_id: u32) -> HitInfo {
        match self {
            Geometry::Sphere(s) => s.hit_info(ray, point, t),
            Geometry::Quad(q) => q.hit_info(ray, point, t),
            Geometry::Box(b) => b.hit_info(ray, point, t),
            Geometry::Instance(i) => i.hit_info(ray, point, t, hit_id),
        }
    }

    /// Backend handle registered for this primitive.
    pub fn rtc_geometry(&self) -> &RtcGeometry {
        match self {
            Geometry::Sphere(s) => s.rtc_geometry(),
            Geometry::Quad(q) => q.rtc_geometry(),
            Geometry::Box(b) => b.rtc_geometry(),
            Geometry::Instance(i) => i.rtc_geometry(),
        }
    }

    /// Short lowercase name used in logs and errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Geometry::Sphere(_) => "sphere",
            Geometry::Quad(_) => "quad",
            Geometry::Box(_) => "box",
            Geometry::Instance(_) => "instance",
        }
    }
}

impl From<Sphere> for Geometry {
    fn from(s: Sphere) -> Self {
        Geometry::Sphere(s)
    }
}

impl From<Quad> for Geometry {
    fn from(q: Quad) -> Self {
        Geometry::Quad(q)
    }
}

impl From<Cuboid> for Geometry {
    fn from(b: Cuboid) -> Self {
        Geometry::Box(b)
    }
}

impl From<Instance> for Geometry {
    fn from(i: Instance) -> Self {
        Geometry::Instance(i)
    }
}
