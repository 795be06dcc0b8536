//! Scene construction and hit resolution.
//!
//! A scene is assembled through [`SceneBuilder`] and becomes a queryable
//! [`Scene`] only through [`SceneBuilder::commit`], so rays can never be fired
//! at an uncommitted backend scene and nothing can be added afterwards.

use std::collections::BTreeMap;
use std::sync::Arc;

use caustic_math::{Interval, Ray};
use caustic_rtc::{Device, LaneMask, RayHit, RayHitN, RtcError, Scene as RtcScene};
use thiserror::Error;

use crate::camera::Camera;
use crate::geometry::{Geometry, Instance};
use crate::hit_info::HitInfo;
use crate::material::Material;

/// Valid hit distances; the lower bound keeps bounced rays off their surface.
pub const HIT_WINDOW: Interval = Interval {
    min: 0.001,
    max: f32::INFINITY,
};

/// Errors raised while building a scene.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("intersection backend error: {0}")]
    Backend(#[from] RtcError),

    #[error("{0} primitives cannot be instanced")]
    UnsupportedInstance(&'static str),

    #[error("instances must be added with add_primitive_instance")]
    InstanceAsPrimitive,

    #[error("degenerate primitive: {0}")]
    Degenerate(String),
}

/// Incremental scene construction, consumed by [`commit`](Self::commit).
#[derive(Debug)]
pub struct SceneBuilder {
    device: Device,
    camera: Camera,
    rtc: RtcScene,
    geometries: BTreeMap<u32, Arc<Geometry>>,
}

impl SceneBuilder {
    pub fn new(device: &Device, camera: Camera) -> Self {
        log::debug!("Creating scene");
        Self {
            device: device.clone(),
            camera,
            rtc: RtcScene::new(device),
            geometries: BTreeMap::new(),
        }
    }

    /// Device primitives for this scene must be created on.
    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Register a primitive and return its hit-identifier.
    pub fn add_primitive(&mut self, primitive: impl Into<Geometry>) -> Result<u32, SceneError> {
        let primitive = primitive.into();
        if matches!(primitive, Geometry::Instance(_)) {
            return Err(SceneError::InstanceAsPrimitive);
        }
        self.register(primitive)
    }

    /// Register an instance under its own hit-identifier.
    ///
    /// Rays entering the instance report this identifier, so lookups resolve
    /// to the instance rather than to the wrapped primitive.
    pub fn add_primitive_instance(&mut self, instance: Instance) -> Result<u32, SceneError> {
        self.register(Geometry::Instance(instance))
    }

    fn register(&mut self, geometry: Geometry) -> Result<u32, SceneError> {
        let id = self.rtc.attach(geometry.rtc_geometry().clone())?;
        log::debug!("Registered {} as hit id {}", geometry.kind_name(), id);
        self.geometries.insert(id, Arc::new(geometry));
        Ok(id)
    }

    /// Shared handle to a registered primitive, e.g. to instance it.
    pub fn geometry(&self, id: u32) -> Option<&Arc<Geometry>> {
        self.geometries.get(&id)
    }

    pub fn len(&self) -> usize {
        self.geometries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }

    /// Finalize the acceleration structure. Happens exactly once per scene.
    pub fn commit(mut self) -> Result<Scene, SceneError> {
        self.rtc.commit()?;
        log::info!("Scene committed with {} primitives", self.geometries.len());
        Ok(Scene {
            camera: self.camera,
            rtc: self.rtc,
            geometries: self.geometries,
        })
    }
}

/// A committed, read-only scene.
///
/// Dropping the scene releases its backend handle.
#[derive(Debug)]
pub struct Scene {
    camera: Camera,
    rtc: RtcScene,
    geometries: BTreeMap<u32, Arc<Geometry>>,
}

impl Scene {
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn geometry(&self, id: u32) -> Option<&Arc<Geometry>> {
        self.geometries.get(&id)
    }

    pub fn len(&self) -> usize {
        self.geometries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.geometries.is_empty()
    }

    /// Closest hit of `ray` within [`HIT_WINDOW`], or `None` on a miss.
    pub fn intersect(&self, ray: &Ray) -> Option<RayHit> {
        let mut rayhit = RayHit::new(ray, HIT_WINDOW);
        if let Err(err) = self.rtc.intersect1(&mut rayhit) {
            log::error!("Single ray query failed: {}", err);
            return None;
        }
        rayhit.is_hit().then_some(rayhit)
    }

    /// Trace the active lanes of a packet in one backend call.
    pub fn intersect_packet<const N: usize>(&self, valid: LaneMask, rayhit: &mut RayHitN<N>) {
        if let Err(err) = self.rtc.intersect_packet(valid, rayhit) {
            log::error!("{}-wide packet query failed: {}", N, err);
        }
    }

    /// Surface record and material for a backend hit of `ray`.
    ///
    /// Returns `None` for a miss or an identifier this scene never registered.
    pub fn resolve(&self, ray: &Ray, rayhit: &RayHit) -> Option<(HitInfo, &Material)> {
        let id = rayhit.hit_id()?;
        let geometry = self.geometries.get(&id)?;

        let t = rayhit.t_far();
        let info = geometry.hit_info(ray, ray.at(t), t, id);
        Some((info, geometry.material_by_id(id)))
    }
}
