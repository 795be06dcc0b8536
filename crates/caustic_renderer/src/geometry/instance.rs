//! Translated instances of scene primitives.

use std::sync::Arc;

use caustic_math::{InstanceTransform, Point3, Ray, Vec3};
use caustic_rtc::{Device, Geometry as RtcGeometry, Scene as RtcScene};

use super::Geometry;
use crate::hit_info::HitInfo;
use crate::material::Material;
use crate::scene::SceneError;

/// A primitive placed again under a translation.
///
/// The instance owns a one-geometry backend sub-scene holding the source
/// primitive and shares the source's material. Hit info is computed by the
/// source in its own space and moved back into world space, so no translated
/// copy of the primitive exists.
#[derive(Debug)]
pub struct Instance {
    source: Arc<Geometry>,
    transform: InstanceTransform,
    sub_scene: RtcScene,
    rtc: RtcGeometry,
}

impl Instance {
    /// Instance `source` shifted by `translation`.
    pub fn new(device: &Device, source: Arc<Geometry>, translation: Vec3) -> Result<Self, SceneError> {
        Self::with_transform(device, source, InstanceTransform::from_translation(translation))
    }

    /// Instance `source` under an affine transform; only translations are
    /// supported by the backend.
    pub fn with_transform(
        device: &Device,
        source: Arc<Geometry>,
        transform: InstanceTransform,
    ) -> Result<Self, SceneError> {
        match source.as_ref() {
            Geometry::Sphere(_) | Geometry::Quad(_) => {}
            other => return Err(SceneError::UnsupportedInstance(other.kind_name())),
        }

        let mut sub_scene = RtcScene::new(device);
        sub_scene.attach(source.rtc_geometry().clone())?;
        sub_scene.commit()?;
        let rtc = RtcGeometry::instance(device, &sub_scene, transform)?;

        Ok(Self {
            source,
            transform,
            sub_scene,
            rtc,
        })
    }

    /// The instanced primitive.
    pub fn source(&self) -> &Arc<Geometry> {
        &self.source
    }

    pub fn transform(&self) -> &InstanceTransform {
        &self.transform
    }

    pub fn translation(&self) -> Vec3 {
        self.transform.translation()
    }

    pub fn sub_scene(&self) -> &RtcScene {
        &self.sub_scene
    }

    pub(crate) fn rtc_geometry(&self) -> &RtcGeometry {
        &self.rtc
    }

    pub(crate) fn material_by_id(&self, hit_id: u32) -> &Material {
        self.source.material_by_id(hit_id)
    }

    pub(crate) fn hit_info(&self, ray: &Ray, point: Point3, t: f32, hit_id: u32) -> HitInfo {
        let local_ray = ray.offset_origin(-self.translation());
        let local_point = self.transform.invert_point(point);

        let mut info = self.source.hit_info(&local_ray, local_point, t, hit_id);
        info.position = point;
        info
    }
}
