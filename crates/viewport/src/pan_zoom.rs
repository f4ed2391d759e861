/// 2D affine gesture transform: screen = world * k + (x, y).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PanZoomTransform {
    pub x: f64,
    pub y: f64,
    pub k: f64,
}

impl Default for PanZoomTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl PanZoomTransform {
    pub const IDENTITY: PanZoomTransform = PanZoomTransform {
        x: 0.0,
        y: 0.0,
        k: 1.0,
    };

    pub fn new(x: f64, y: f64, k: f64) -> Self {
        Self { x, y, k }
    }

    pub fn apply(&self, p: [f64; 2]) -> [f64; 2] {
        [p[0] * self.k + self.x, p[1] * self.k + self.y]
    }

    pub fn invert(&self, p: [f64; 2]) -> [f64; 2] {
        [(p[0] - self.x) / self.k, (p[1] - self.y) / self.k]
    }
}

/// Wheel delta multiplier for pixel-mode wheel events.
pub const WHEEL_PIXEL_FACTOR: f64 = 0.002;

/// Constraints and derived operations for gesture transforms.
///
/// `scale_extent` bounds `k`; `extent` is the viewport rectangle in pixels
/// whose center anchors programmatic `scale_to` / `translate_to`. Translation
/// itself is not clamped.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PanZoomBehavior {
    pub scale_extent: [f64; 2],
    pub extent: [[f64; 2]; 2],
}

impl PanZoomBehavior {
    pub fn new(scale_extent: [f64; 2], width_px: f64, height_px: f64) -> Self {
        Self {
            scale_extent,
            extent: [[0.0, 0.0], [width_px, height_px]],
        }
    }

    pub fn center(&self) -> [f64; 2] {
        [
            (self.extent[0][0] + self.extent[1][0]) * 0.5,
            (self.extent[0][1] + self.extent[1][1]) * 0.5,
        ]
    }

    pub fn clamp_scale(&self, k: f64) -> f64 {
        k.clamp(self.scale_extent[0], self.scale_extent[1])
    }

    pub fn constrain(&self, t: PanZoomTransform) -> PanZoomTransform {
        PanZoomTransform::new(t.x, t.y, self.clamp_scale(t.k))
    }

    /// Rescales to `k` keeping the world point at screen position `anchor` fixed.
    pub fn scale_at(&self, t: PanZoomTransform, k: f64, anchor: [f64; 2]) -> PanZoomTransform {
        let k1 = self.clamp_scale(k);
        let world = t.invert(anchor);
        PanZoomTransform::new(anchor[0] - world[0] * k1, anchor[1] - world[1] * k1, k1)
    }

    /// Rescales to `k` about the extent center.
    pub fn scale_to(&self, t: PanZoomTransform, k: f64) -> PanZoomTransform {
        self.scale_at(t, k, self.center())
    }

    pub fn scale_by_at(&self, t: PanZoomTransform, factor: f64, anchor: [f64; 2]) -> PanZoomTransform {
        self.scale_at(t, t.k * factor, anchor)
    }

    /// Moves the transform so that world point `(x, y)` sits at the extent center.
    pub fn translate_to(&self, t: PanZoomTransform, x: f64, y: f64) -> PanZoomTransform {
        let c = self.center();
        PanZoomTransform::new(c[0] - t.k * x, c[1] - t.k * y, t.k)
    }

    /// Shifts the transform by a screen-space movement.
    pub fn translate_by(&self, t: PanZoomTransform, dx_px: f64, dy_px: f64) -> PanZoomTransform {
        PanZoomTransform::new(t.x + dx_px, t.y + dy_px, t.k)
    }

    /// Scale factor for a wheel event with the given vertical pixel delta.
    pub fn wheel_factor(delta_y_px: f64) -> f64 {
        2f64.powf(-delta_y_px * WHEEL_PIXEL_FACTOR)
    }
}

#[cfg(test)]
mod tests {
    use super::{PanZoomBehavior, PanZoomTransform};

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn apply_and_invert_are_inverse() {
        let t = PanZoomTransform::new(30.0, -12.0, 2.5);
        let p = t.invert(t.apply([7.0, 9.0]));
        assert_close(p[0], 7.0);
        assert_close(p[1], 9.0);
    }

    #[test]
    fn scale_is_clamped_to_extent() {
        let b = PanZoomBehavior::new([0.5, 4.0], 800.0, 600.0);
        assert_eq!(b.scale_to(PanZoomTransform::IDENTITY, 100.0).k, 4.0);
        assert_eq!(b.scale_to(PanZoomTransform::IDENTITY, 0.01).k, 0.5);
        assert_eq!(b.constrain(PanZoomTransform::new(1.0, 2.0, 9.0)), PanZoomTransform::new(1.0, 2.0, 4.0));
    }

    #[test]
    fn scale_at_keeps_anchor_fixed() {
        let b = PanZoomBehavior::new([0.1, 10.0], 800.0, 600.0);
        let t = PanZoomTransform::new(15.0, 40.0, 1.5);
        let anchor = [120.0, 330.0];
        let before = t.invert(anchor);
        let after = b.scale_by_at(t, 2.0, anchor);
        assert_close(after.k, 3.0);
        let world = after.invert(anchor);
        assert_close(world[0], before[0]);
        assert_close(world[1], before[1]);
    }

    #[test]
    fn translate_to_centers_world_point() {
        let b = PanZoomBehavior::new([0.1, 10.0], 800.0, 600.0);
        let t = b.translate_to(PanZoomTransform::new(0.0, 0.0, 2.0), 10.0, 20.0);
        assert_eq!(t.apply([10.0, 20.0]), [400.0, 300.0]);
    }

    #[test]
    fn wheel_down_zooms_out() {
        assert!(PanZoomBehavior::wheel_factor(100.0) < 1.0);
        assert!(PanZoomBehavior::wheel_factor(-100.0) > 1.0);
        assert_eq!(PanZoomBehavior::wheel_factor(0.0), 1.0);
    }
}
