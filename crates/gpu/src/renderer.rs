use foundation::color::Rgb;
use runtime::frame::Frame;
use scene::buffers::{DirtyAttributes, PointBuffers};
use tracing::info;
use viewport::camera::{CameraState, Viewport};

/// Everything a backend needs to draw one frame of the point cloud.
#[derive(Debug, Copy, Clone)]
pub struct DrawFrame<'a> {
    pub frame: Frame,
    pub camera: CameraState,
    pub viewport: Viewport,
    pub buffers: &'a PointBuffers,
    /// Attributes changed since the previous frame; backends re-upload only these.
    pub dirty: DirtyAttributes,
    pub background: Rgb,
}

/// Issues the actual draw calls.
pub trait RenderBackend {
    fn draw(&mut self, frame: &DrawFrame<'_>);
}

/// Draw tick scheduler. Once started it stays running for the lifetime of
/// the owner.
#[derive(Debug, Default)]
pub struct RenderLoop {
    started: bool,
    frame: Option<Frame>,
}

impl RenderLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the loop. Repeated calls are no-ops.
    pub fn ensure_started(&mut self) -> bool {
        if self.started {
            return false;
        }
        self.started = true;
        info!("render loop started");
        true
    }

    pub fn is_running(&self) -> bool {
        self.started
    }

    pub fn last_frame(&self) -> Option<Frame> {
        self.frame
    }

    /// Draws one frame. Returns `None` before the loop has been started.
    pub fn tick<B: RenderBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        camera: CameraState,
        viewport: Viewport,
        buffers: &mut PointBuffers,
        background: Rgb,
    ) -> Option<Frame> {
        if !self.started {
            return None;
        }
        let frame = self.frame.map_or_else(Frame::first, Frame::next);
        let dirty = buffers.take_dirty();
        backend.draw(&DrawFrame {
            frame,
            camera,
            viewport,
            buffers,
            dirty,
            background,
        });
        self.frame = Some(frame);
        Some(frame)
    }
}
