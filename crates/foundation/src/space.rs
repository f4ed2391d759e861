//! Render-space coordinate conventions.
//!
//! Cells are drawn either in their native data units or, for renderers with
//! limited float precision, in a normalized space where one shared linear
//! remap takes the data domain onto `[-1, 1]` on both axes. The forward map is
//! applied once when a grid enters the cache; the inverse is only used when a
//! position leaves the engine (tooltips, query envelopes, label scales).

use crate::bounds::Aabb2;
use crate::math::Vec2;

/// Shared `[min, max]` data domain mapped onto `[-1, 1]`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct NormalizedDomain {
    pub min: f64,
    pub max: f64,
}

impl NormalizedDomain {
    /// Domain spanning `min(xmin, ymin)..max(xmax, ymax)`. `None` when degenerate.
    pub fn from_bounds(bounds: &Aabb2) -> Option<Self> {
        let min = bounds.min[0].min(bounds.min[1]);
        let max = bounds.max[0].max(bounds.max[1]);
        (max > min && min.is_finite() && max.is_finite()).then_some(Self { min, max })
    }

    pub fn forward(&self, v: f64) -> f64 {
        (v - self.min) / (self.max - self.min) * 2.0 - 1.0
    }

    pub fn inverse(&self, v: f64) -> f64 {
        (v + 1.0) * 0.5 * (self.max - self.min) + self.min
    }

    pub fn length_forward(&self, len: f64) -> f64 {
        len * 2.0 / (self.max - self.min)
    }

    pub fn length_inverse(&self, len: f64) -> f64 {
        len * (self.max - self.min) * 0.5
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub enum SpaceKind {
    #[default]
    Native,
    Normalized(NormalizedDomain),
}

/// How world (render) coordinates relate to data and external coordinates.
///
/// External coordinates are data coordinates with the suppressed trailing
/// zeros restored: `external = data * 10^zeros_removed`.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct CoordinateSpace {
    pub kind: SpaceKind,
    pub zeros_removed: u32,
}

impl CoordinateSpace {
    pub fn native(zeros_removed: u32) -> Self {
        Self {
            kind: SpaceKind::Native,
            zeros_removed,
        }
    }

    pub fn normalized(domain: NormalizedDomain, zeros_removed: u32) -> Self {
        Self {
            kind: SpaceKind::Normalized(domain),
            zeros_removed,
        }
    }

    pub fn is_normalized(&self) -> bool {
        matches!(self.kind, SpaceKind::Normalized(_))
    }

    pub fn zeros_multiplier(&self) -> f64 {
        10f64.powi(self.zeros_removed as i32)
    }

    /// Data coordinates to world coordinates.
    pub fn to_world(&self, p: Vec2) -> Vec2 {
        match self.kind {
            SpaceKind::Native => p,
            SpaceKind::Normalized(d) => Vec2::new(d.forward(p.x), d.forward(p.y)),
        }
    }

    /// World coordinates back to data coordinates.
    pub fn to_data(&self, p: Vec2) -> Vec2 {
        match self.kind {
            SpaceKind::Native => p,
            SpaceKind::Normalized(d) => Vec2::new(d.inverse(p.x), d.inverse(p.y)),
        }
    }

    pub fn length_to_world(&self, len: f64) -> f64 {
        match self.kind {
            SpaceKind::Native => len,
            SpaceKind::Normalized(d) => d.length_forward(len),
        }
    }

    pub fn length_to_data(&self, len: f64) -> f64 {
        match self.kind {
            SpaceKind::Native => len,
            SpaceKind::Normalized(d) => d.length_inverse(len),
        }
    }

    /// World coordinates to the coordinates reported outside the engine.
    pub fn to_external(&self, p: Vec2) -> Vec2 {
        self.to_data(p).scale(self.zeros_multiplier())
    }

    pub fn from_external(&self, p: Vec2) -> Vec2 {
        let m = self.zeros_multiplier();
        self.to_world(Vec2::new(p.x / m, p.y / m))
    }

    pub fn length_to_external(&self, len: f64) -> f64 {
        self.length_to_data(len) * self.zeros_multiplier()
    }
}

#[cfg(test)]
mod tests {
    use super::{CoordinateSpace, NormalizedDomain};
    use crate::bounds::Aabb2;
    use crate::math::Vec2;

    fn assert_close(a: f64, b: f64, eps: f64) {
        assert!((a - b).abs() <= eps, "{a} != {b}");
    }

    #[test]
    fn domain_uses_shared_axis_range() {
        let b = Aabb2::new([4000.0, 1000.0], [6000.0, 3000.0]);
        let d = NormalizedDomain::from_bounds(&b).expect("domain");
        assert_eq!(d, NormalizedDomain { min: 1000.0, max: 6000.0 });
        assert_eq!(d.forward(1000.0), -1.0);
        assert_eq!(d.forward(6000.0), 1.0);
        assert!(NormalizedDomain::from_bounds(&Aabb2::new([1.0, 1.0], [1.0, 1.0])).is_none());
    }

    #[test]
    fn normalized_space_round_trips_points_and_lengths() {
        let d = NormalizedDomain { min: 1000.0, max: 6000.0 };
        let space = CoordinateSpace::normalized(d, 0);
        let p = Vec2::new(4321.0, 1234.5);
        let back = space.to_data(space.to_world(p));
        assert_close(back.x, p.x, 1e-9);
        assert_close(back.y, p.y, 1e-9);
        assert_close(space.length_to_world(1000.0), 0.4, 1e-12);
        assert_close(space.length_to_data(0.4), 1000.0, 1e-9);
    }

    #[test]
    fn external_restores_suppressed_zeros() {
        let space = CoordinateSpace::native(3);
        assert_eq!(space.to_external(Vec2::new(4321.0, 2999.0)), Vec2::new(4_321_000.0, 2_999_000.0));
        assert_eq!(space.from_external(Vec2::new(4_321_000.0, 0.0)), Vec2::new(4321.0, 0.0));
        assert_eq!(space.length_to_external(1.0), 1000.0);
        assert!(!space.is_normalized());
    }
}
