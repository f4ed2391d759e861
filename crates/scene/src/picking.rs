use foundation::color::Rgb;
use foundation::math::Vec3;
use foundation::math::precision::stable_total_cmp_f64;

use crate::buffers::PointBuffers;
use crate::highlight::{Highlight, HighlightSlot};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self { origin, dir }
    }

    pub fn at(&self, t: f64) -> Vec3 {
        self.origin + self.dir.scale(t)
    }

    /// Intersection with the plane `z = plane_z`, if the ray is not parallel to it.
    pub fn intersect_z_plane(&self, plane_z: f64) -> Option<Vec3> {
        if self.dir.z.abs() < 1e-15 {
            return None;
        }
        let t = (plane_z - self.origin.z) / self.dir.z;
        (t >= 0.0).then(|| self.at(t))
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointHit {
    /// Index of the point in buffer (and cache) order.
    pub index: usize,
    /// Perpendicular distance from the point to the ray.
    pub distance_to_ray: f64,
    /// Distance along the ray to the closest approach.
    pub distance: f64,
    pub point: Vec3,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickOptions {
    /// Acceptance radius around each point, in world units.
    pub threshold: f64,
}

/// Ray picking against a flat `[x, y, z, x, y, z, ...]` position array.
///
/// Ordering contract:
/// - Only points strictly within `threshold` of the ray and in front of its
///   origin are candidates.
/// - The candidate with the smallest perpendicular distance to the ray wins.
/// - On equal distances the lower index (earlier in cache order) wins.
pub fn pick_points(positions: &[f32], ray: Ray, opts: PickOptions) -> Option<PointHit> {
    let dir = ray.dir.normalize()?;
    let mut best: Option<PointHit> = None;

    for (index, p) in positions.chunks_exact(3).enumerate() {
        let point = Vec3::new(p[0] as f64, p[1] as f64, p[2] as f64);
        let t = (point - ray.origin).dot(dir);
        if t < 0.0 {
            continue;
        }
        let closest = ray.origin + dir.scale(t);
        let distance_to_ray = (point - closest).length();
        if !(distance_to_ray < opts.threshold) {
            continue;
        }

        let better = match best {
            None => true,
            Some(b) => stable_total_cmp_f64(distance_to_ray, b.distance_to_ray).is_lt(),
        };
        if better {
            best = Some(PointHit {
                index,
                distance_to_ray,
                distance: t,
                point,
            });
        }
    }

    best
}

/// Screen picking wrapper.
///
/// The caller supplies the screen->ray mapping via `make_ray`.
pub fn pick_screen<F>(
    positions: &[f32],
    x_px: f64,
    y_px: f64,
    mut make_ray: F,
    opts: PickOptions,
) -> Option<PointHit>
where
    F: FnMut(f64, f64) -> Option<Ray>,
{
    let ray = make_ray(x_px, y_px)?;
    pick_points(positions, ray, opts)
}

/// Outcome of a pick, as reported to the UI layer.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PickEvent {
    Pick(PointHit),
    Clear,
}

/// Nearest-point picking plus the one-slot highlight it drives.
#[derive(Debug, Clone)]
pub struct PickingEngine {
    highlight_color: Rgb,
    slot: HighlightSlot,
}

impl PickingEngine {
    pub fn new(highlight_color: Rgb) -> Self {
        Self {
            highlight_color,
            slot: HighlightSlot::new(),
        }
    }

    pub fn highlight_color(&self) -> Rgb {
        self.highlight_color
    }

    pub fn highlight(&self) -> Option<Highlight> {
        self.slot.current()
    }

    /// Picks along `ray` and moves the highlight to the hit, or clears it on a miss.
    pub fn pick(&mut self, buffers: &mut PointBuffers, ray: Ray, opts: PickOptions) -> PickEvent {
        match pick_points(buffers.positions(), ray, opts) {
            Some(hit) => {
                self.slot.apply(buffers, hit.index, self.highlight_color);
                PickEvent::Pick(hit)
            }
            None => self.clear(buffers),
        }
    }

    pub fn clear(&mut self, buffers: &mut PointBuffers) -> PickEvent {
        self.slot.clear(buffers);
        PickEvent::Clear
    }

    /// Drops the highlight without restoring; used after the buffers were rebuilt.
    pub fn forget(&mut self) {
        self.slot.forget();
    }
}

#[cfg(test)]
mod tests {
    use super::{PickEvent, PickOptions, PickingEngine, Ray, pick_points};
    use crate::buffers::{PointAttributes, PointBuffers};
    use foundation::color::Rgb;
    use foundation::math::Vec3;

    fn down_from(x: f64, y: f64) -> Ray {
        Ray::new(Vec3::new(x, y, 100.0), Vec3::new(0.0, 0.0, -1.0))
    }

    fn buffers(xs: &[f64]) -> PointBuffers {
        let mut b = PointBuffers::new();
        b.rebuild(xs.iter().map(|x| PointAttributes {
            x: *x,
            y: 0.0,
            color: Rgb::new(0.2, 0.4, 0.6),
            size: 1.0,
        }));
        b
    }

    #[test]
    fn picks_strictly_nearest_within_threshold() {
        let b = buffers(&[0.0, 10.0, 13.0]);
        let hit = pick_points(b.positions(), down_from(12.0, 0.0), PickOptions { threshold: 5.0 })
            .expect("hit");
        assert_eq!(hit.index, 2);
        assert_eq!(hit.distance_to_ray, 1.0);
        assert_eq!(hit.distance, 100.0);
    }

    #[test]
    fn nothing_within_threshold_is_none() {
        let b = buffers(&[0.0, 10.0]);
        assert!(pick_points(b.positions(), down_from(5.0, 0.0), PickOptions { threshold: 5.0 }).is_none());
        assert!(pick_points(&[], down_from(0.0, 0.0), PickOptions { threshold: 5.0 }).is_none());
    }

    #[test]
    fn equal_distances_keep_first_in_order() {
        let b = buffers(&[4.0, 6.0]);
        let hit = pick_points(b.positions(), down_from(5.0, 0.0), PickOptions { threshold: 2.0 })
            .expect("hit");
        assert_eq!(hit.index, 0);
    }

    #[test]
    fn points_behind_origin_are_ignored() {
        let b = buffers(&[0.0]);
        let up = Ray::new(Vec3::new(0.0, 0.0, 100.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(pick_points(b.positions(), up, PickOptions { threshold: 1.0 }).is_none());
    }

    #[test]
    fn engine_highlights_then_clears_on_miss() {
        let mut b = buffers(&[0.0, 10.0]);
        let original = b.color(1).unwrap();
        let mut engine = PickingEngine::new(Rgb::parse("cyan").unwrap());

        let event = engine.pick(&mut b, down_from(10.2, 0.0), PickOptions { threshold: 1.0 });
        assert!(matches!(event, PickEvent::Pick(hit) if hit.index == 1));
        assert_eq!(b.color(1), Some(Rgb::new(0.0, 1.0, 1.0)));

        let event = engine.pick(&mut b, down_from(500.0, 0.0), PickOptions { threshold: 1.0 });
        assert_eq!(event, PickEvent::Clear);
        assert_eq!(b.color(1), Some(original));
        assert!(engine.highlight().is_none());
    }

    #[test]
    fn z_plane_intersection() {
        let r = Ray::new(Vec3::new(1.0, 2.0, 10.0), Vec3::new(0.5, 0.0, -1.0));
        assert_eq!(r.intersect_z_plane(0.0), Some(Vec3::new(6.0, 2.0, 0.0)));
        let flat = Ray::new(Vec3::new(0.0, 0.0, 1.0), Vec3::new(1.0, 0.0, 0.0));
        assert!(flat.intersect_z_plane(0.0).is_none());
    }
}
