// Instance transforms.
//
// Instances carry a 3x4 row-major affine matrix (12 floats). Only the
// translation column is honoured by the renderer today; the linear part is
// kept so callers can detect and reject anything else.

use crate::{Aabb, Mat3, Vec3};

/// A 3x4 row-major affine matrix: `[r00 r01 r02 tx, r10 r11 r12 ty, r20 r21 r22 tz]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstanceTransform {
    rows: [f32; 12],
}

impl InstanceTransform {
    /// Identity transform.
    pub const IDENTITY: InstanceTransform = InstanceTransform {
        rows: [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0,
        ],
    };

    /// Wrap a raw row-major 3x4 matrix.
    pub fn from_rows(rows: [f32; 12]) -> Self {
        Self { rows }
    }

    /// Pure translation by `offset`.
    pub fn from_translation(offset: Vec3) -> Self {
        let mut rows = Self::IDENTITY.rows;
        rows[3] = offset.x;
        rows[7] = offset.y;
        rows[11] = offset.z;
        Self { rows }
    }

    /// The translation column.
    #[inline]
    pub fn translation(&self) -> Vec3 {
        Vec3::new(self.rows[3], self.rows[7], self.rows[11])
    }

    /// The upper-left 3x3 block.
    pub fn linear(&self) -> Mat3 {
        let r = &self.rows;
        Mat3::from_cols(
            Vec3::new(r[0], r[4], r[8]),
            Vec3::new(r[1], r[5], r[9]),
            Vec3::new(r[2], r[6], r[10]),
        )
    }

    /// True when the linear part is the identity (within `1e-6`).
    pub fn is_pure_translation(&self) -> bool {
        self.linear().abs_diff_eq(Mat3::IDENTITY, 1e-6)
    }

    /// Raw row-major storage.
    pub fn as_rows(&self) -> &[f32; 12] {
        &self.rows
    }

    /// Move a local-space point to world space (translation only).
    #[inline]
    pub fn apply_point(&self, p: Vec3) -> Vec3 {
        p + self.translation()
    }

    /// Move a world-space point to local space (translation only).
    #[inline]
    pub fn invert_point(&self, p: Vec3) -> Vec3 {
        p - self.translation()
    }

    /// World-space bounds of a local-space box.
    pub fn transform_aabb(&self, aabb: &Aabb) -> Aabb {
        aabb.translate(self.translation())
    }
}

impl Default for InstanceTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}
