use foundation::color::Rgb;

/// Depth of the plane every point is drawn on.
pub const POINT_Z: f32 = 0.0;

/// Which attribute arrays changed since the renderer last uploaded them.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct DirtyAttributes {
    pub positions: bool,
    pub colors: bool,
    pub sizes: bool,
}

impl DirtyAttributes {
    pub const ALL: Self = Self {
        positions: true,
        colors: true,
        sizes: true,
    };

    pub fn any(self) -> bool {
        self.positions || self.colors || self.sizes
    }
}

/// Attributes of one point as handed to `PointBuffers::rebuild`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointAttributes {
    pub x: f64,
    pub y: f64,
    pub color: Rgb,
    pub size: f32,
}

/// Parallel render attribute arrays for the active point cloud.
///
/// Layout contract:
/// - `positions` and `colors` hold `3 * len()` floats, `sizes` holds `len()`.
/// - Index `i` in every array refers to cell `i` of the active grid.
#[derive(Debug, Clone, Default)]
pub struct PointBuffers {
    positions: Vec<f32>,
    colors: Vec<f32>,
    sizes: Vec<f32>,
    dirty: DirtyAttributes,
}

impl PointBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces all three arrays.
    pub fn rebuild<I>(&mut self, points: I)
    where
        I: IntoIterator<Item = PointAttributes>,
    {
        let points = points.into_iter();
        let (hint, _) = points.size_hint();
        self.positions.clear();
        self.colors.clear();
        self.sizes.clear();
        self.positions.reserve(hint * 3);
        self.colors.reserve(hint * 3);
        self.sizes.reserve(hint);

        for p in points {
            self.positions
                .extend_from_slice(&[p.x as f32, p.y as f32, POINT_Z]);
            self.colors.extend_from_slice(&p.color.to_array());
            self.sizes.push(p.size);
        }
        self.dirty = DirtyAttributes::ALL;
    }

    /// Rewrites every color in place; positions and sizes are untouched.
    pub fn update_colors<F>(&mut self, mut color_at: F)
    where
        F: FnMut(usize) -> Rgb,
    {
        for (i, rgb) in self.colors.chunks_exact_mut(3).enumerate() {
            rgb.copy_from_slice(&color_at(i).to_array());
        }
        self.dirty.colors = true;
    }

    /// Rewrites every size in place; positions and colors are untouched.
    pub fn update_sizes<F>(&mut self, mut size_at: F)
    where
        F: FnMut(usize) -> f32,
    {
        for (i, s) in self.sizes.iter_mut().enumerate() {
            *s = size_at(i);
        }
        self.dirty.sizes = true;
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn colors(&self) -> &[f32] {
        &self.colors
    }

    pub fn sizes(&self) -> &[f32] {
        &self.sizes
    }

    pub fn position(&self, index: usize) -> Option<[f32; 3]> {
        let p = self.positions.get(index * 3..index * 3 + 3)?;
        Some([p[0], p[1], p[2]])
    }

    pub fn color(&self, index: usize) -> Option<Rgb> {
        let c = self.colors.get(index * 3..index * 3 + 3)?;
        Some(Rgb::new(c[0], c[1], c[2]))
    }

    /// Overwrites one color triple. Returns `false` when out of range.
    pub fn set_color(&mut self, index: usize, color: Rgb) -> bool {
        let Some(c) = self.colors.get_mut(index * 3..index * 3 + 3) else {
            return false;
        };
        c.copy_from_slice(&color.to_array());
        self.dirty.colors = true;
        true
    }

    pub fn dirty(&self) -> DirtyAttributes {
        self.dirty
    }

    /// Returns and resets the dirty flags; called once per upload.
    pub fn take_dirty(&mut self) -> DirtyAttributes {
        std::mem::take(&mut self.dirty)
    }

    pub fn clear(&mut self) {
        self.positions.clear();
        self.colors.clear();
        self.sizes.clear();
        self.dirty = DirtyAttributes::ALL;
    }
}

#[cfg(test)]
mod tests {
    use super::{DirtyAttributes, POINT_Z, PointAttributes, PointBuffers};
    use foundation::color::Rgb;

    fn points(n: usize) -> Vec<PointAttributes> {
        (0..n)
            .map(|i| PointAttributes {
                x: i as f64 * 1000.0,
                y: 500.0,
                color: Rgb::new(0.1, 0.2, 0.3),
                size: 1000.0,
            })
            .collect()
    }

    #[test]
    fn rebuild_lays_out_parallel_arrays() {
        let mut b = PointBuffers::new();
        b.rebuild(points(4));
        assert_eq!(b.len(), 4);
        assert_eq!(b.positions().len(), 12);
        assert_eq!(b.colors().len(), 12);
        assert_eq!(b.sizes().len(), 4);
        assert_eq!(b.position(2), Some([2000.0, 500.0, POINT_Z]));
        assert_eq!(b.take_dirty(), DirtyAttributes::ALL);
        assert!(!b.dirty().any());
    }

    #[test]
    fn update_colors_leaves_positions_and_sizes_clean() {
        let mut b = PointBuffers::new();
        b.rebuild(points(3));
        b.take_dirty();
        let before = b.positions().to_vec();
        b.update_colors(|_| Rgb::WHITE);
        assert_eq!(b.positions(), &before[..]);
        assert_eq!(b.color(1), Some(Rgb::WHITE));
        assert_eq!(
            b.dirty(),
            DirtyAttributes {
                colors: true,
                ..DirtyAttributes::default()
            }
        );
    }

    #[test]
    fn update_sizes_marks_only_sizes() {
        let mut b = PointBuffers::new();
        b.rebuild(points(2));
        b.take_dirty();
        b.update_sizes(|i| i as f32);
        assert_eq!(b.sizes(), &[0.0, 1.0]);
        assert!(b.dirty().sizes && !b.dirty().colors && !b.dirty().positions);
    }

    #[test]
    fn set_color_out_of_range_is_rejected() {
        let mut b = PointBuffers::new();
        b.rebuild(points(1));
        assert!(!b.set_color(1, Rgb::WHITE));
        assert!(b.color(1).is_none());
    }
}
