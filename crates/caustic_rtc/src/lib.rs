//! Intersection service for caustic.
//!
//! Mirrors the shape of a two-level ray tracing kernel API: a [`Device`]
//! creates [`Scene`]s and [`Geometry`]; geometry is attached to a scene and
//! receives a hit-identifier; the scene is committed exactly once and may then
//! be queried with single rays ([`Scene::intersect1`]) or SIMD-style packets
//! ([`Scene::intersect4`], [`Scene::intersect8`]).
//!
//! Acceleration is limited to per-geometry bounding-box culling.
//!
//! # Example
//! ```
//! use caustic_math::{Interval, Ray, Vec3};
//! use caustic_rtc::{Device, Geometry, RayHit, Scene};
//!
//! let device = Device::new();
//! let mut scene = Scene::new(&device);
//! let id = scene.attach(Geometry::sphere(&device, Vec3::new(0.0, 0.0, -1.0), 0.5)?)?;
//! scene.commit()?;
//!
//! let mut rayhit = RayHit::new(&Ray::new_simple(Vec3::ZERO, -Vec3::Z), Interval::new(0.001, f32::INFINITY));
//! scene.intersect1(&mut rayhit)?;
//! assert_eq!(rayhit.hit.geom_id, id);
//! # Ok::<(), caustic_rtc::RtcError>(())
//! ```

mod device;
mod error;
mod geometry;
mod ray;
mod scene;

pub use device::Device;
pub use error::{RtcError, RtcResult};
pub use geometry::{Geometry, GeometryKind};
pub use ray::{LaneMask, RayHit, RayHit16, RayHit4, RayHit8, RayHitN, RtcHit, RtcRay};
pub use scene::{CommittedScene, Scene};

/// Identifier reported for "no geometry" / "no instance".
pub const INVALID_GEOMETRY_ID: u32 = u32::MAX;
