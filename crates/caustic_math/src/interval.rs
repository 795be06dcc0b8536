/// Range of ray parameters (or of one coordinate of a bounding box).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub min: f32,
    pub max: f32,
}

impl Interval {
    /// Nothing lies inside; the identity for [`Interval::surrounding`].
    pub const EMPTY: Interval = Interval {
        min: f32::INFINITY,
        max: f32::NEG_INFINITY,
    };

    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn size(&self) -> f32 {
        self.max - self.min
    }

    /// `min <= x <= max`
    pub fn contains(&self, x: f32) -> bool {
        self.min <= x && x <= self.max
    }

    /// `min < x < max`; hit distances must fall strictly inside the query window.
    pub fn surrounds(&self, x: f32) -> bool {
        self.min < x && x < self.max
    }

    /// Grow by `delta` in total, half on each end.
    pub fn expand(&self, delta: f32) -> Interval {
        let half = 0.5 * delta;
        Interval::new(self.min - half, self.max + half)
    }

    /// Shift both ends by `offset`.
    pub fn shifted(&self, offset: f32) -> Interval {
        Interval::new(self.min + offset, self.max + offset)
    }

    /// Smallest interval covering both `a` and `b`.
    pub fn surrounding(a: &Interval, b: &Interval) -> Interval {
        Interval::new(a.min.min(b.min), a.max.max(b.max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_window_excludes_endpoints() {
        let window = Interval::new(0.001, 10.0);

        assert!(!window.surrounds(0.001));
        assert!(!window.surrounds(10.0));
        assert!(window.surrounds(0.5));
        assert!(window.contains(10.0));
        assert!(!window.contains(0.0));
    }

    #[test]
    fn test_expand_and_shift() {
        let grown = Interval::new(1.0, 1.0).expand(0.5);
        assert_eq!(grown, Interval::new(0.75, 1.25));
        assert_eq!(grown.size(), 0.5);

        assert_eq!(Interval::new(-1.0, 1.0).shifted(2.0), Interval::new(1.0, 3.0));
    }

    #[test]
    fn test_empty_is_surrounding_identity() {
        let a = Interval::new(-3.0, 2.0);

        assert!(!Interval::EMPTY.contains(0.0));
        assert_eq!(Interval::surrounding(&Interval::EMPTY, &a), a);
        assert_eq!(
            Interval::surrounding(&a, &Interval::new(1.0, 5.0)),
            Interval::new(-3.0, 5.0)
        );
    }
}
