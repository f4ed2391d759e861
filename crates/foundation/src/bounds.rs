use crate::math::Vec2;

/// Axis-aligned 2D bounding box.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb2 {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl Aabb2 {
    pub fn new(min: [f64; 2], max: [f64; 2]) -> Self {
        Aabb2 { min, max }
    }

    /// Smallest box containing every finite point, or `None` if there are none.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Vec2>,
    {
        let mut out: Option<Aabb2> = None;
        for p in points {
            if !(p.x.is_finite() && p.y.is_finite()) {
                continue;
            }
            out = Some(match out {
                None => Aabb2::new([p.x, p.y], [p.x, p.y]),
                Some(b) => b.including(p),
            });
        }
        out
    }

    pub fn including(self, p: Vec2) -> Self {
        Aabb2::new(
            [self.min[0].min(p.x), self.min[1].min(p.y)],
            [self.max[0].max(p.x), self.max[1].max(p.y)],
        )
    }

    pub fn width(&self) -> f64 {
        self.max[0] - self.min[0]
    }

    pub fn height(&self) -> f64 {
        self.max[1] - self.min[1]
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
        )
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min[0] && p.x <= self.max[0] && p.y >= self.min[1] && p.y <= self.max[1]
    }
}

#[cfg(test)]
mod tests {
    use super::Aabb2;
    use crate::math::Vec2;

    #[test]
    fn from_points_ignores_nan() {
        let b = Aabb2::from_points([
            Vec2::new(2.0, 5.0),
            Vec2::new(f64::NAN, 100.0),
            Vec2::new(-1.0, 7.0),
        ])
        .expect("bounds");
        assert_eq!(b, Aabb2::new([-1.0, 5.0], [2.0, 7.0]));
        assert_eq!(b.width(), 3.0);
        assert_eq!(b.center(), Vec2::new(0.5, 6.0));
        assert!(b.contains(Vec2::new(0.0, 6.0)));
        assert!(Aabb2::from_points(Vec::new()).is_none());
    }
}
