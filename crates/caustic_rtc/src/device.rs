use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Handle to the intersection service.
///
/// Scenes and geometries are created against a device. The handle is cheap
/// to clone; it tracks how many scenes are alive so releases can be audited.
#[derive(Clone, Debug)]
pub struct Device {
    inner: Arc<DeviceInner>,
}

#[derive(Debug, Default)]
struct DeviceInner {
    live_scenes: AtomicUsize,
    live_geometries: AtomicUsize,
}

impl Device {
    /// Create a new device.
    pub fn new() -> Self {
        log::debug!("Intersection device created");
        Self {
            inner: Arc::new(DeviceInner::default()),
        }
    }

    /// Number of scenes created from this device that have not been released.
    pub fn live_scenes(&self) -> usize {
        self.inner.live_scenes.load(Ordering::Relaxed)
    }

    /// Number of geometries created from this device that have not been released.
    pub fn live_geometries(&self) -> usize {
        self.inner.live_geometries.load(Ordering::Relaxed)
    }

    pub(crate) fn retain_scene(&self) {
        self.inner.live_scenes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn release_scene(&self) {
        self.inner.live_scenes.fetch_sub(1, Ordering::Relaxed);
    }

    pub(crate) fn retain_geometry(&self) {
        self.inner.live_geometries.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn release_geometry(&self) {
        self.inner.live_geometries.fetch_sub(1, Ordering::Relaxed);
    }
}

impl Default for Device {
    fn default() -> Self {
        Self::new()
    }
}
