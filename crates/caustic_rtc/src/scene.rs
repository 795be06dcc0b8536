//! Scenes: attach geometry, commit once, then intersect.

use std::sync::Arc;

use caustic_math::{Aabb, Interval, Ray};

use crate::geometry::GeometryHit;
use crate::{Device, Geometry, LaneMask, RayHit, RayHitN, RtcError, RtcResult, INVALID_GEOMETRY_ID};

/// Geometry frozen by [`Scene::commit`]. Shared by instances of the scene.
#[derive(Debug)]
pub struct CommittedScene {
    geometries: Vec<Geometry>,
    bounds: Aabb,
    has_instances: bool,
}

impl CommittedScene {
    fn new(geometries: Vec<Geometry>) -> Self {
        let bounds = geometries
            .iter()
            .fold(Aabb::EMPTY, |acc, g| Aabb::surrounding(&acc, &g.bounds()));
        let has_instances = geometries.iter().any(Geometry::is_instance);
        Self {
            geometries,
            bounds,
            has_instances,
        }
    }

    pub(crate) fn bounds(&self) -> Aabb {
        self.bounds
    }

    pub(crate) fn has_instances(&self) -> bool {
        self.has_instances
    }

    /// Closest hit over every geometry, with the id of the geometry hit.
    pub(crate) fn closest_hit(&self, ray: &Ray, ray_t: Interval) -> Option<(u32, GeometryHit)> {
        let mut closest = None;
        let mut t_max = ray_t.max;

        for (geom_id, geometry) in self.geometries.iter().enumerate() {
            if let Some(hit) = geometry.intersect(ray, Interval::new(ray_t.min, t_max)) {
                t_max = hit.t;
                closest = Some((geom_id as u32, hit));
            }
        }

        closest
    }
}

/// A scene handle.
///
/// Geometry ids are assigned in attach order starting at 0. The scene must be
/// committed exactly once; queries are rejected before that and attachments
/// after. Dropping the scene releases it.
#[derive(Debug)]
pub struct Scene {
    device: Device,
    pending: Vec<Geometry>,
    committed: Option<Arc<CommittedScene>>,
}

impl Scene {
    /// Create an empty, uncommitted scene.
    pub fn new(device: &Device) -> Self {
        device.retain_scene();
        Self {
            device: device.clone(),
            pending: Vec::new(),
            committed: None,
        }
    }

    /// Attach geometry and return its hit-identifier.
    pub fn attach(&mut self, geometry: Geometry) -> RtcResult<u32> {
        if self.committed.is_some() {
            return Err(RtcError::AttachAfterCommit);
        }
        let geom_id = self.pending.len() as u32;
        self.pending.push(geometry);
        log::debug!("Attached geometry to scene: geom_id={}", geom_id);
        Ok(geom_id)
    }

    /// Finalize the scene for intersection queries.
    pub fn commit(&mut self) -> RtcResult<()> {
        if self.committed.is_some() {
            return Err(RtcError::AlreadyCommitted);
        }
        let committed = CommittedScene::new(std::mem::take(&mut self.pending));
        let b = committed.bounds;
        log::debug!(
            "Scene committed: {} geometries, bounds ({}, {}, {}) to ({}, {}, {})",
            committed.geometries.len(),
            b.x.min, b.y.min, b.z.min,
            b.x.max, b.y.max, b.z.max
        );
        self.committed = Some(Arc::new(committed));
        Ok(())
    }

    pub fn is_committed(&self) -> bool {
        self.committed.is_some()
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Number of attached geometries.
    pub fn geometry_count(&self) -> usize {
        match &self.committed {
            Some(committed) => committed.geometries.len(),
            None => self.pending.len(),
        }
    }

    /// Bounds of all committed geometry.
    pub fn bounds(&self) -> RtcResult<Aabb> {
        Ok(self.require_committed()?.bounds)
    }

    pub(crate) fn committed(&self) -> Option<&Arc<CommittedScene>> {
        self.committed.as_ref()
    }

    fn require_committed(&self) -> RtcResult<&CommittedScene> {
        self.committed.as_deref().ok_or(RtcError::NotCommitted)
    }

    /// Trace one ray. On a hit the record's `tfar` is shortened to the hit
    /// distance and the hit half is filled; a miss leaves the ids invalid.
    pub fn intersect1(&self, rayhit: &mut RayHit) -> RtcResult<()> {
        let committed = self.require_committed()?;
        trace(committed, rayhit);
        Ok(())
    }

    /// Trace every active lane of a packet. Inactive lanes are left untouched.
    pub fn intersect_packet<const N: usize>(&self, valid: LaneMask, rayhit: &mut RayHitN<N>) -> RtcResult<()> {
        let committed = self.require_committed()?;
        for lane in (0..N).filter(|&lane| valid.is_active(lane)) {
            let mut single = rayhit.load(lane);
            trace(committed, &mut single);
            rayhit.store(lane, &single);
        }
        Ok(())
    }

    /// 4-wide packet query.
    pub fn intersect4(&self, valid: LaneMask, rayhit: &mut RayHitN<4>) -> RtcResult<()> {
        self.intersect_packet(valid, rayhit)
    }

    /// 8-wide packet query.
    pub fn intersect8(&self, valid: LaneMask, rayhit: &mut RayHitN<8>) -> RtcResult<()> {
        self.intersect_packet(valid, rayhit)
    }

    /// 16-wide packet query.
    pub fn intersect16(&self, valid: LaneMask, rayhit: &mut RayHitN<16>) -> RtcResult<()> {
        self.intersect_packet(valid, rayhit)
    }
}

impl Drop for Scene {
    fn drop(&mut self) {
        self.device.release_scene();
    }
}

fn trace(committed: &CommittedScene, rayhit: &mut RayHit) {
    let ray = rayhit.as_ray();
    let window = Interval::new(rayhit.ray.tnear, rayhit.ray.tfar);

    let Some((geom_id, hit)) = committed.closest_hit(&ray, window) else {
        return;
    };

    rayhit.ray.tfar = hit.t;
    rayhit.hit.ng = hit.ng;
    rayhit.hit.u = hit.u;
    rayhit.hit.v = hit.v;
    rayhit.hit.prim_id = hit.prim_id;
    if hit.inner_geom_id == INVALID_GEOMETRY_ID {
        rayhit.hit.geom_id = geom_id;
        rayhit.hit.inst_id = INVALID_GEOMETRY_ID;
    } else {
        rayhit.hit.geom_id = hit.inner_geom_id;
        rayhit.hit.inst_id = geom_id;
    }
}
