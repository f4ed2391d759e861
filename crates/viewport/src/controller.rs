//! Gesture handling that keeps the pan/zoom transform and the 3D camera in lock-step.
//!
//! Gestures arrive as new `PanZoomTransform`s. A change of `k` moves the
//! camera along z while keeping the world point under the cursor fixed; a
//! change of translation only moves the camera in x/y by the pointer
//! movement converted at the current scale.

use foundation::bounds::Aabb2;
use foundation::math::{Vec2, Vec3};
use runtime::event_bus::{Event, EventBus};
use scene::picking::Ray;
use tracing::debug;

use crate::camera::{CameraState, ClipPlanes, Viewport, scale_from_z, z_from_scale};
use crate::pan_zoom::{PanZoomBehavior, PanZoomTransform};

/// Camera changes reported to the UI layer.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ViewportEvent {
    Pan { camera: Vec3 },
    Zoom { camera: Vec3, scale: f64 },
    /// Gesture finished; the place to refresh scale-dependent content.
    ZoomEnd { scale: f64, z: f64 },
    Home { camera: Vec3 },
}

/// Pointer details of the input that produced a gesture transform.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GestureSource {
    pub position_px: [f64; 2],
    pub movement_px: [f64; 2],
}

/// A gesture step. Events without a `source` were set programmatically and
/// leave the camera alone.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ZoomEvent {
    pub transform: PanZoomTransform,
    pub source: Option<GestureSource>,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct HomeView {
    pub transform: PanZoomTransform,
    pub camera: Vec3,
}

#[derive(Debug)]
pub struct ViewportController {
    viewport: Viewport,
    camera: CameraState,
    transform: PanZoomTransform,
    behavior: PanZoomBehavior,
    home: HomeView,
    gesture_active: bool,
    events: EventBus<ViewportEvent>,
}

impl ViewportController {
    pub fn new(viewport: Viewport, fov_deg: f64, clip: ClipPlanes) -> Self {
        let camera = CameraState::new(Vec3::new(0.0, 0.0, clip.default_z()), fov_deg, clip);
        let mut controller = Self {
            viewport,
            camera,
            transform: PanZoomTransform::IDENTITY,
            behavior: PanZoomBehavior::new([0.0, f64::INFINITY], viewport.width_px, viewport.height_px),
            home: HomeView {
                transform: PanZoomTransform::IDENTITY,
                camera: camera.position,
            },
            gesture_active: false,
            events: EventBus::new(),
        };
        controller.place(Vec2::ZERO, clip, None);
        controller
    }

    /// Sets clip planes, the scale extent and the initial view, and records
    /// that view as home.
    ///
    /// `zoom` is a camera distance; without it the camera sits at
    /// `far / 2 - 1`.
    pub fn place(&mut self, center: Vec2, clip: ClipPlanes, zoom: Option<f64>) -> HomeView {
        let z = zoom.unwrap_or_else(|| clip.default_z());
        self.refit(clip, center.extend(z), center.extend(z))
    }

    /// Adopts clip planes for another grid, moving the camera to `camera` and
    /// home to `home`. Both distances are clamped into the new planes and the
    /// scale extent and transforms are derived again.
    pub fn refit(&mut self, clip: ClipPlanes, camera: Vec3, home: Vec3) -> HomeView {
        let fov = self.camera.fov_deg;
        let height_px = self.viewport.height_px;
        self.behavior = PanZoomBehavior::new(
            [
                scale_from_z(clip.far, fov, height_px),
                scale_from_z(clip.near, fov, height_px),
            ],
            self.viewport.width_px,
            height_px,
        );

        let clamp = |p: Vec3| Vec3::new(p.x, p.y, p.z.clamp(clip.near, clip.far));
        self.camera = CameraState::new(clamp(camera), fov, clip);
        self.transform = self.transform_for(self.camera.position);
        let home = clamp(home);
        self.home = HomeView {
            transform: self.transform_for(home),
            camera: home,
        };
        self.gesture_active = false;
        debug!(near = clip.near, far = clip.far, "camera refit");
        self.home
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn camera(&self) -> &CameraState {
        &self.camera
    }

    pub fn transform(&self) -> PanZoomTransform {
        self.transform
    }

    pub fn behavior(&self) -> &PanZoomBehavior {
        &self.behavior
    }

    pub fn home_view(&self) -> HomeView {
        self.home
    }

    pub fn is_gesture_active(&self) -> bool {
        self.gesture_active
    }

    /// Current scale, derived from the camera distance.
    pub fn scale(&self) -> f64 {
        self.camera.scale(self.viewport)
    }

    pub fn z_for_scale(&self, scale: f64) -> f64 {
        z_from_scale(scale, self.camera.fov_deg, self.viewport.height_px)
    }

    /// Applies one gesture step.
    pub fn on_zoom(&mut self, event: ZoomEvent) {
        let previous = self.transform;
        self.transform = self.behavior.constrain(event.transform);
        self.gesture_active = true;

        let Some(source) = event.source else {
            return;
        };
        if self.transform.k != previous.k {
            self.zoom_camera(source.position_px);
        } else {
            self.pan_camera(source.movement_px);
        }
    }

    /// Ends the current gesture and reports the resulting scale.
    pub fn on_zoom_end(&mut self) -> f64 {
        self.gesture_active = false;
        let scale = self.scale();
        let z = self.camera.position.z;
        debug!(scale, z, "zoom gesture ended");
        self.events.emit(ViewportEvent::ZoomEnd { scale, z });
        scale
    }

    /// Mouse wheel at `position_px`; positive `delta_y_px` zooms out.
    pub fn wheel(&mut self, position_px: [f64; 2], delta_y_px: f64) {
        let transform = self.behavior.scale_by_at(
            self.transform,
            PanZoomBehavior::wheel_factor(delta_y_px),
            position_px,
        );
        self.on_zoom(ZoomEvent {
            transform,
            source: Some(GestureSource {
                position_px,
                movement_px: [0.0, 0.0],
            }),
        });
    }

    /// Two-finger pinch around `center_px` by `factor`.
    pub fn pinch(&mut self, center_px: [f64; 2], factor: f64) {
        let transform = self.behavior.scale_by_at(self.transform, factor, center_px);
        self.on_zoom(ZoomEvent {
            transform,
            source: Some(GestureSource {
                position_px: center_px,
                movement_px: [0.0, 0.0],
            }),
        });
    }

    /// Pointer drag by `movement_px` ending at `position_px`.
    pub fn drag(&mut self, position_px: [f64; 2], movement_px: [f64; 2]) {
        let transform = self
            .behavior
            .translate_by(self.transform, movement_px[0], movement_px[1]);
        self.on_zoom(ZoomEvent {
            transform,
            source: Some(GestureSource {
                position_px,
                movement_px,
            }),
        });
    }

    /// Restores the initial transform and camera together.
    pub fn home(&mut self) {
        self.transform = self.home.transform;
        self.camera.position = self.home.camera;
        self.gesture_active = false;
        self.events.emit(ViewportEvent::Home {
            camera: self.camera.position,
        });
    }

    /// Adopts a new viewport size, keeping the camera where it is.
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        let clip = self.camera.clip;
        let home = self.home.camera;
        self.refit(clip, self.camera.position, home);
    }

    pub fn ray_at(&self, x_px: f64, y_px: f64) -> Ray {
        self.camera.ray_through(self.viewport, x_px, y_px)
    }

    pub fn ground_point(&self, x_px: f64, y_px: f64) -> Option<Vec2> {
        self.camera.ground_point(self.viewport, x_px, y_px)
    }

    pub fn visible_bounds(&self) -> Option<Aabb2> {
        self.camera.visible_bounds(self.viewport)
    }

    pub fn drain_events(&mut self) -> Vec<Event<ViewportEvent>> {
        self.events.drain()
    }

    /// Transform whose scale matches a camera at `position` and whose
    /// translation centers its x/y, the way placement derives it.
    fn transform_for(&self, position: Vec3) -> PanZoomTransform {
        let [cx, cy] = self.viewport.center_px();
        let k = scale_from_z(position.z, self.camera.fov_deg, self.viewport.height_px);
        let t = self.behavior.scale_to(PanZoomTransform::IDENTITY, k);
        self.behavior.translate_to(t, position.x + cx, position.y + cy)
    }

    fn zoom_camera(&mut self, anchor_px: [f64; 2]) {
        let new_z = self.z_for_scale(self.transform.k);
        let ray = self.ray_at(anchor_px[0], anchor_px[1]);
        let distance = (new_z - ray.origin.z) / ray.dir.z;
        let p = ray.at(distance);
        self.camera.position = Vec3::new(p.x, p.y, new_z);
        self.events.emit(ViewportEvent::Zoom {
            camera: self.camera.position,
            scale: self.transform.k,
        });
    }

    fn pan_camera(&mut self, movement_px: [f64; 2]) {
        let scale = self.scale();
        self.camera.position.x -= movement_px[0] / scale;
        self.camera.position.y += movement_px[1] / scale;
        self.events.emit(ViewportEvent::Pan {
            camera: self.camera.position,
        });
    }
}
