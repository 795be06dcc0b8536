//! Ray/hit records exchanged with the intersection service.
//!
//! Single rays use an array-of-structures record ([`RayHit`]); packets use a
//! structure-of-arrays layout ([`RayHitN`]) whose width matches the batch.

use caustic_math::{Interval, Ray, Vec3};

use crate::INVALID_GEOMETRY_ID;

/// Ray half of a query: origin, direction, time and the `(tnear, tfar)` window.
///
/// `tfar` is shortened to the closest hit distance by a successful query.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RtcRay {
    pub org: Vec3,
    pub tnear: f32,
    pub dir: Vec3,
    pub time: f32,
    pub tfar: f32,
}

/// Hit half of a query.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RtcHit {
    /// Unnormalized geometric normal
    pub ng: Vec3,
    /// Surface parameterization reported by the geometry
    pub u: f32,
    pub v: f32,
    /// Primitive index within the geometry (face of a quad mesh)
    pub prim_id: u32,
    /// Hit-identifier of the geometry, local to the scene it was attached to
    pub geom_id: u32,
    /// Hit-identifier of the instance the ray entered, if any
    pub inst_id: u32,
}

impl Default for RtcHit {
    fn default() -> Self {
        Self {
            ng: Vec3::ZERO,
            u: 0.0,
            v: 0.0,
            prim_id: INVALID_GEOMETRY_ID,
            geom_id: INVALID_GEOMETRY_ID,
            inst_id: INVALID_GEOMETRY_ID,
        }
    }
}

/// Combined ray-hit record for [`Scene::intersect1`](crate::Scene::intersect1).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RayHit {
    pub ray: RtcRay,
    pub hit: RtcHit,
}

impl RayHit {
    /// Prepare a query for `ray` restricted to `ray_t`.
    pub fn new(ray: &Ray, ray_t: Interval) -> Self {
        Self {
            ray: RtcRay {
                org: ray.origin(),
                tnear: ray_t.min,
                dir: ray.direction(),
                time: ray.time(),
                tfar: ray_t.max,
            },
            hit: RtcHit::default(),
        }
    }

    /// True once a query has found geometry.
    #[inline]
    pub fn is_hit(&self) -> bool {
        self.hit.geom_id != INVALID_GEOMETRY_ID
    }

    /// The identifier the owning scene knows this hit by.
    ///
    /// Instance hits take priority: a ray that entered an instance reports the
    /// instance, not the geometry inside its sub-scene.
    #[inline]
    pub fn hit_id(&self) -> Option<u32> {
        if self.hit.inst_id != INVALID_GEOMETRY_ID {
            Some(self.hit.inst_id)
        } else if self.hit.geom_id != INVALID_GEOMETRY_ID {
            Some(self.hit.geom_id)
        } else {
            None
        }
    }

    /// Distance to the closest hit (or the requested `tfar` on a miss).
    #[inline]
    pub fn t_far(&self) -> f32 {
        self.ray.tfar
    }

    pub(crate) fn as_ray(&self) -> Ray {
        Ray::new(self.ray.org, self.ray.dir, self.ray.time)
    }
}

/// Bitmask of active lanes in a ray packet.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct LaneMask(u32);

impl LaneMask {
    /// No lane active.
    pub const NONE: LaneMask = LaneMask(0);

    /// The first `n` lanes active.
    pub fn first(n: usize) -> Self {
        debug_assert!(n <= 32);
        if n >= 32 {
            LaneMask(u32::MAX)
        } else {
            LaneMask((1u32 << n) - 1)
        }
    }

    #[inline]
    pub fn is_active(&self, lane: usize) -> bool {
        self.0 & (1 << lane) != 0
    }

    #[inline]
    pub fn activate(&mut self, lane: usize) {
        self.0 |= 1 << lane;
    }

    #[inline]
    pub fn deactivate(&mut self, lane: usize) {
        self.0 &= !(1 << lane);
    }

    /// True if any lane is active.
    #[inline]
    pub fn any(&self) -> bool {
        self.0 != 0
    }

    /// Number of active lanes.
    #[inline]
    pub fn count(&self) -> u32 {
        self.0.count_ones()
    }

    /// Raw bits, lane 0 in the least significant bit.
    #[inline]
    pub fn bits(&self) -> u32 {
        self.0
    }
}

/// Structure-of-arrays ray packet of width `N`.
#[derive(Debug, Clone, PartialEq)]
pub struct RayHitN<const N: usize> {
    pub org_x: [f32; N],
    pub org_y: [f32; N],
    pub org_z: [f32; N],
    pub tnear: [f32; N],

    pub dir_x: [f32; N],
    pub dir_y: [f32; N],
    pub dir_z: [f32; N],
    pub time: [f32; N],

    pub tfar: [f32; N],

    pub ng_x: [f32; N],
    pub ng_y: [f32; N],
    pub ng_z: [f32; N],

    pub u: [f32; N],
    pub v: [f32; N],

    pub prim_id: [u32; N],
    pub geom_id: [u32; N],
    pub inst_id: [u32; N],
}

/// 4-wide packet (SSE width).
pub type RayHit4 = RayHitN<4>;
/// 8-wide packet (AVX width).
pub type RayHit8 = RayHitN<8>;
/// 16-wide packet (AVX-512 width).
pub type RayHit16 = RayHitN<16>;

impl<const N: usize> RayHitN<N> {
    /// Packet with every lane empty and unhit.
    pub fn new() -> Self {
        Self {
            org_x: [0.0; N],
            org_y: [0.0; N],
            org_z: [0.0; N],
            tnear: [0.0; N],
            dir_x: [0.0; N],
            dir_y: [0.0; N],
            dir_z: [0.0; N],
            time: [0.0; N],
            tfar: [0.0; N],
            ng_x: [0.0; N],
            ng_y: [0.0; N],
            ng_z: [0.0; N],
            u: [0.0; N],
            v: [0.0; N],
            prim_id: [INVALID_GEOMETRY_ID; N],
            geom_id: [INVALID_GEOMETRY_ID; N],
            inst_id: [INVALID_GEOMETRY_ID; N],
        }
    }

    /// Load `ray` into `lane` and clear its hit.
    pub fn set_ray(&mut self, lane: usize, ray: &Ray, ray_t: Interval) {
        self.store(lane, &RayHit::new(ray, ray_t));
    }

    /// Gather one lane into an array-of-structures record.
    pub fn load(&self, lane: usize) -> RayHit {
        RayHit {
            ray: RtcRay {
                org: Vec3::new(self.org_x[lane], self.org_y[lane], self.org_z[lane]),
                tnear: self.tnear[lane],
                dir: Vec3::new(self.dir_x[lane], self.dir_y[lane], self.dir_z[lane]),
                time: self.time[lane],
                tfar: self.tfar[lane],
            },
            hit: RtcHit {
                ng: Vec3::new(self.ng_x[lane], self.ng_y[lane], self.ng_z[lane]),
                u: self.u[lane],
                v: self.v[lane],
                prim_id: self.prim_id[lane],
                geom_id: self.geom_id[lane],
                inst_id: self.inst_id[lane],
            },
        }
    }

    /// Scatter an array-of-structures record into one lane.
    pub fn store(&mut self, lane: usize, rayhit: &RayHit) {
        let RayHit { ray, hit } = rayhit;
        self.org_x[lane] = ray.org.x;
        self.org_y[lane] = ray.org.y;
        self.org_z[lane] = ray.org.z;
        self.tnear[lane] = ray.tnear;
        self.dir_x[lane] = ray.dir.x;
        self.dir_y[lane] = ray.dir.y;
        self.dir_z[lane] = ray.dir.z;
        self.time[lane] = ray.time;
        self.tfar[lane] = ray.tfar;
        self.ng_x[lane] = hit.ng.x;
        self.ng_y[lane] = hit.ng.y;
        self.ng_z[lane] = hit.ng.z;
        self.u[lane] = hit.u;
        self.v[lane] = hit.v;
        self.prim_id[lane] = hit.prim_id;
        self.geom_id[lane] = hit.geom_id;
        self.inst_id[lane] = hit.inst_id;
    }
}

impl<const N: usize> Default for RayHitN<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_id_prefers_instance() {
        let mut rayhit = RayHit::new(&Ray::default(), Interval::new(0.0, 1.0));
        assert_eq!(rayhit.hit_id(), None);

        rayhit.hit.geom_id = 0;
        assert_eq!(rayhit.hit_id(), Some(0));

        rayhit.hit.inst_id = 3;
        assert_eq!(rayhit.hit_id(), Some(3));
    }

    #[test]
    fn test_lane_mask() {
        let mut mask = LaneMask::first(4);
        assert_eq!(mask.bits(), 0b1111);
        assert_eq!(mask.count(), 4);

        mask.deactivate(1);
        assert!(!mask.is_active(1));
        assert!(mask.is_active(2));

        for lane in [0, 2, 3] {
            mask.deactivate(lane);
        }
        assert!(!mask.any());

        mask.activate(7);
        assert_eq!(mask.bits(), 1 << 7);
        assert_eq!(LaneMask::first(32).count(), 32);
    }

    #[test]
    fn test_packet_lane_round_trip() {
        let mut packet = RayHit8::new();
        let ray = Ray::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.0, -1.0, 0.0), 0.5);
        packet.set_ray(5, &ray, Interval::new(0.001, 100.0));

        let lane = packet.load(5);
        assert_eq!(lane.as_ray(), ray);
        assert_eq!(lane.ray.tfar, 100.0);
        assert!(!lane.is_hit());
        assert_eq!(packet.load(4).ray.dir, Vec3::ZERO);
    }
}
