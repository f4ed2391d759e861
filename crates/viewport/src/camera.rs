//! Perspective camera looking straight down the z axis at the `z = 0` plane.
//!
//! Zoom is expressed twice: as the camera distance `z` and as the gesture
//! scale `k` (screen pixels per world unit on the plane). The two convert
//! through the vertical field of view and the viewport height only.

use foundation::bounds::Aabb2;
use foundation::math::{Vec2, Vec3};
use scene::picking::Ray;

/// Vertical field of view used when none is configured (degrees).
pub const DEFAULT_FOV_DEG: f64 = 30.0;

/// Far plane distance per world unit of cell resolution.
pub const FAR_PER_RESOLUTION: f64 = 4000.0;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub width_px: f64,
    pub height_px: f64,
}

impl Viewport {
    pub fn new(width_px: f64, height_px: f64) -> Self {
        Self {
            width_px,
            height_px,
        }
    }

    pub fn aspect(&self) -> f64 {
        self.width_px / self.height_px
    }

    pub fn center_px(&self) -> [f64; 2] {
        [self.width_px * 0.5, self.height_px * 0.5]
    }

    /// Pixel position (origin top-left, y down) to normalized device coordinates.
    pub fn to_ndc(&self, x_px: f64, y_px: f64) -> [f64; 2] {
        [
            (x_px / self.width_px) * 2.0 - 1.0,
            -(y_px / self.height_px) * 2.0 + 1.0,
        ]
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ClipPlanes {
    pub near: f64,
    pub far: f64,
}

impl ClipPlanes {
    /// Planes used in the normalized coordinate space, where world units span `[-1, 1]`.
    pub const NORMALIZED: ClipPlanes = ClipPlanes {
        near: 0.0001,
        far: 5.0,
    };

    /// Planes for native coordinates at the given cell resolution.
    pub fn for_resolution(resolution: f64) -> Self {
        Self {
            near: 1.0,
            far: resolution * FAR_PER_RESOLUTION,
        }
    }

    /// Camera distance used when no zoom is configured.
    pub fn default_z(&self) -> f64 {
        self.far / 2.0 - 1.0
    }
}

/// Screen pixels per world unit at camera distance `z`.
pub fn scale_from_z(z: f64, fov_deg: f64, height_px: f64) -> f64 {
    let half_fov = (fov_deg * 0.5).to_radians();
    height_px / (2.0 * z * half_fov.tan())
}

/// Camera distance at which one world unit covers `scale` pixels.
pub fn z_from_scale(scale: f64, fov_deg: f64, height_px: f64) -> f64 {
    let half_fov = (fov_deg * 0.5).to_radians();
    height_px / (2.0 * scale * half_fov.tan())
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraState {
    pub position: Vec3,
    pub fov_deg: f64,
    pub clip: ClipPlanes,
}

impl CameraState {
    pub fn new(position: Vec3, fov_deg: f64, clip: ClipPlanes) -> Self {
        Self {
            position,
            fov_deg,
            clip,
        }
    }

    /// Point the camera looks at on the data plane.
    pub fn target(&self) -> Vec3 {
        Vec3::new(self.position.x, self.position.y, 0.0)
    }

    pub fn scale(&self, viewport: Viewport) -> f64 {
        scale_from_z(self.position.z, self.fov_deg, viewport.height_px)
    }

    /// Ray from the camera through a pixel.
    pub fn ray_through(&self, viewport: Viewport, x_px: f64, y_px: f64) -> Ray {
        let [nx, ny] = viewport.to_ndc(x_px, y_px);
        let tan = (self.fov_deg * 0.5).to_radians().tan();
        let dir = Vec3::new(nx * tan * viewport.aspect(), ny * tan, -1.0);
        Ray::new(self.position, dir.normalize().unwrap_or(Vec3::new(0.0, 0.0, -1.0)))
    }

    /// World position on the `z = 0` plane under a pixel.
    pub fn ground_point(&self, viewport: Viewport, x_px: f64, y_px: f64) -> Option<Vec2> {
        self.ray_through(viewport, x_px, y_px)
            .intersect_z_plane(0.0)
            .map(|p| p.xy())
    }

    /// World rectangle on the `z = 0` plane covered by the viewport.
    pub fn visible_bounds(&self, viewport: Viewport) -> Option<Aabb2> {
        let bottom_left = self.ground_point(viewport, 0.0, viewport.height_px)?;
        let top_right = self.ground_point(viewport, viewport.width_px, 0.0)?;
        Some(Aabb2::new(
            [bottom_left.x, bottom_left.y],
            [top_right.x, top_right.y],
        ))
    }
}
