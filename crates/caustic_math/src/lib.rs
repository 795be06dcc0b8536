//! Math types shared by every caustic crate.
//!
//! Vectors come straight from glam; this crate adds the ray-tracing pieces on
//! top of it (rays, intervals, bounding boxes, instance transforms and the
//! reflection/refraction formulas).

// Re-export glam for convenience
pub use glam::*;

mod aabb;
mod interval;
mod ray;
mod transform;
mod vector;

pub use aabb::Aabb;
pub use interval::Interval;
pub use ray::Ray;
pub use transform::InstanceTransform;
pub use vector::{near_zero, reflect, refract, unit_or_zero};

/// Linear RGB color. Shares the full vector algebra with [`Vec3`].
pub type Color = Vec3;

/// A position in world or object space.
pub type Point3 = Vec3;
