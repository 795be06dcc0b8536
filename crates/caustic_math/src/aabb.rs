use crate::{Interval, Ray, Vec3};

/// Minimum extent along any axis, so flat quads still have a slab to hit.
const MIN_EXTENT: f32 = 0.0001;

/// Axis-aligned bounds the intersection backend tests before exact geometry.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub x: Interval,
    pub y: Interval,
    pub z: Interval,
}

impl Aabb {
    /// Bounds enclosing nothing; folding with [`Aabb::surrounding`] starts here.
    pub const EMPTY: Aabb = Aabb {
        x: Interval::EMPTY,
        y: Interval::EMPTY,
        z: Interval::EMPTY,
    };

    /// Build from per-axis intervals, widening any axis thinner than the minimum extent.
    pub fn new(x: Interval, y: Interval, z: Interval) -> Self {
        let widen = |i: Interval| if i.size() < MIN_EXTENT { i.expand(MIN_EXTENT) } else { i };
        Self {
            x: widen(x),
            y: widen(y),
            z: widen(z),
        }
    }

    /// Bounds spanned by two opposite corners, in any order.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        let lo = a.min(b);
        let hi = a.max(b);
        Self::new(
            Interval::new(lo.x, hi.x),
            Interval::new(lo.y, hi.y),
            Interval::new(lo.z, hi.z),
        )
    }

    /// Bounds of a vertex list; an empty list yields [`Aabb::EMPTY`].
    pub fn enclosing(points: &[Vec3]) -> Self {
        let Some(&first) = points.first() else {
            return Aabb::EMPTY;
        };
        let (lo, hi) = points
            .iter()
            .fold((first, first), |(lo, hi), &p| (lo.min(p), hi.max(p)));
        Self::from_points(lo, hi)
    }

    pub fn surrounding(a: &Aabb, b: &Aabb) -> Self {
        Self {
            x: Interval::surrounding(&a.x, &b.x),
            y: Interval::surrounding(&a.y, &b.y),
            z: Interval::surrounding(&a.z, &b.z),
        }
    }

    pub fn translate(&self, offset: Vec3) -> Aabb {
        Aabb::new(
            self.x.shifted(offset.x),
            self.y.shifted(offset.y),
            self.z.shifted(offset.z),
        )
    }

    /// Slab test: does `ray` pass through the box somewhere inside `ray_t`?
    pub fn hit(&self, ray: &Ray, mut ray_t: Interval) -> bool {
        let origin = ray.origin();
        let direction = ray.direction();

        for (axis, slab) in [self.x, self.y, self.z].into_iter().enumerate() {
            let inv = 1.0 / direction[axis];
            let t0 = (slab.min - origin[axis]) * inv;
            let t1 = (slab.max - origin[axis]) * inv;
            let (near, far) = if inv < 0.0 { (t1, t0) } else { (t0, t1) };

            ray_t.min = ray_t.min.max(near);
            ray_t.max = ray_t.max.min(far);
            if ray_t.max <= ray_t.min {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points_orders_corners() {
        let bounds = Aabb::from_points(Vec3::new(2.0, -1.0, 4.0), Vec3::new(-2.0, 3.0, 0.0));

        assert_eq!(bounds.x, Interval::new(-2.0, 2.0));
        assert_eq!(bounds.y, Interval::new(-1.0, 3.0));
        assert_eq!(bounds.z, Interval::new(0.0, 4.0));
    }

    #[test]
    fn test_enclosing_flat_quad_has_thickness() {
        let bounds = Aabb::enclosing(&[
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::new(2.0, 0.0, 5.0),
            Vec3::new(2.0, 1.0, 5.0),
            Vec3::new(0.0, 1.0, 5.0),
        ]);

        assert_eq!(bounds.x, Interval::new(0.0, 2.0));
        assert!(bounds.z.size() > 0.0);
        assert!(bounds.z.contains(5.0));
        assert_eq!(Aabb::enclosing(&[]), Aabb::EMPTY);
    }

    #[test]
    fn test_slab_hit() {
        let bounds = Aabb::from_points(Vec3::splat(-1.0), Vec3::splat(1.0));
        let window = Interval::new(0.001, f32::INFINITY);

        let toward = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z, 0.0);
        let away = Ray::new(Vec3::new(0.0, 0.0, -5.0), -Vec3::Z, 0.0);
        let beside = Ray::new(Vec3::new(3.0, 0.0, -5.0), Vec3::Z, 0.0);

        assert!(bounds.hit(&toward, window));
        assert!(!bounds.hit(&away, window));
        assert!(!bounds.hit(&beside, window));
        assert!(!bounds.hit(&toward, Interval::new(0.001, 3.0)));
    }

    #[test]
    fn test_translate_and_surround() {
        let unit = Aabb::from_points(Vec3::ZERO, Vec3::ONE);
        let moved = unit.translate(Vec3::new(0.0, 0.0, -4.0));

        assert_eq!(moved.z, Interval::new(-4.0, -3.0));
        let both = Aabb::surrounding(&unit, &moved);
        assert_eq!(both.z, Interval::new(-4.0, 1.0));
        assert_eq!(Aabb::surrounding(&Aabb::EMPTY, &unit), unit);
    }
}
