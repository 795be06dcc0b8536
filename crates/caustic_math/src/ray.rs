//! Rays fired by the camera and by every scattering event.
//!
//! A ray never changes once built; a bounce produces a new one.

use crate::Vec3;

/// `P(t) = origin + t * direction`, stamped with the shutter time it was fired at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    origin: Vec3,
    /// Not normalized; scattered rays keep whatever length the material produced
    direction: Vec3,
    time: f32,
}

impl Ray {
    #[inline]
    pub fn new(origin: Vec3, direction: Vec3, time: f32) -> Self {
        Self {
            origin,
            direction,
            time,
        }
    }

    /// Ray fired at time 0.
    #[inline]
    pub fn new_simple(origin: Vec3, direction: Vec3) -> Self {
        Self::new(origin, direction, 0.0)
    }

    #[inline]
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    #[inline]
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Point at parameter `t`.
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + t * self.direction
    }

    /// The same ray with its origin shifted by `offset`.
    ///
    /// Used to carry world rays into the local space of a translated instance.
    #[inline]
    pub fn offset_origin(&self, offset: Vec3) -> Self {
        Self::new(self.origin + offset, self.direction, self.time)
    }
}

impl Default for Ray {
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            direction: Vec3::Z,
            time: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_at_parameter() {
        let ray = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::new(2.0, 0.0, -1.0), 0.5);

        assert_eq!(ray.at(0.0), ray.origin());
        assert_eq!(ray.at(1.5), Vec3::new(3.0, 1.0, -1.5));
        assert_eq!(ray.time(), 0.5);
        assert_eq!(Ray::new_simple(Vec3::ZERO, Vec3::X).time(), 0.0);
    }

    #[test]
    fn test_offset_origin_keeps_direction() {
        let ray = Ray::new(Vec3::new(1.0, 1.0, 1.0), Vec3::new(0.0, 0.0, -1.0), 0.25);
        let moved = ray.offset_origin(Vec3::new(-1.0, 0.0, 2.0));

        assert_eq!(moved.origin(), Vec3::new(0.0, 1.0, 3.0));
        assert_eq!(moved.direction(), ray.direction());
        assert_eq!(moved.time(), 0.25);
    }
}
