//! The viewer context: owns every piece of engine state for one container.
//!
//! Lifecycle is `Viewer::new` → any number of loads and interactions →
//! `dispose`. All calls are synchronous; asynchronous grid fetches are
//! modelled with `begin_load` / `complete_load` tickets so a superseded
//! completion can be recognised and dropped.

use foundation::bounds::Aabb2;
use foundation::color::Rgb;
use foundation::math::{Vec2, Vec3};
use foundation::space::CoordinateSpace;
use gpu::{RenderBackend, RenderLoop};
use layers::{
    BoundaryRequest, ColorRamp, ColorScaleKind, LoadOptions, PlacenameQuery, PointCloudStore,
    ScaleConfig, ScaleEngine, ScaleState, ThresholdScale, default_population_thresholds,
    prepare_layer,
};
use runtime::event_bus::{Event, EventBus};
use runtime::frame::Frame;
use scene::highlight::Highlight;
use scene::picking::{PickEvent, PickOptions, PickingEngine};
use streaming::cache::{CacheError, Cell, GridData, GridLayer};
use streaming::pipeline::{LoadPipeline, LoadTicket};
use streaming::residency::LoadState;
use tracing::{debug, error, info, warn};
use viewport::camera::{CameraState, ClipPlanes, Viewport};
use viewport::controller::{ViewportController, ViewportEvent};
use viewport::pan_zoom::PanZoomTransform;

use crate::config::ViewerConfig;
use crate::error::{ConfigError, ViewerError};
use crate::tooltip::{Tooltip, TooltipState};

/// Width assumed for the tooltip widget when placing it.
pub const TOOLTIP_WIDTH_PX: f64 = 200.0;

/// Notifications for the UI layer, in the order they happened.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEvent {
    Viewport(ViewportEvent),
    Pick { index: usize },
    PickCleared,
    Loaded {
        resolution: f64,
        cells: usize,
        replaced: bool,
    },
    LoadFailed {
        resolution: f64,
        reason: String,
    },
    ScalesRebuilt,
    PlacenamesRequested {
        query: PlacenameQuery,
        url: Option<String>,
    },
    BoundariesRequested {
        request: BoundaryRequest,
        url: String,
    },
}

#[derive(Debug)]
pub struct Viewer {
    config: ViewerConfig,
    scale_config: ScaleConfig,
    store: PointCloudStore,
    pipeline: LoadPipeline,
    controller: ViewportController,
    picking: PickingEngine,
    scales: Option<ScaleState>,
    tooltip: TooltipState,
    render: RenderLoop,
    events: EventBus<ViewerEvent>,
    placed: bool,
}

impl Viewer {
    pub fn new(config: ViewerConfig) -> Self {
        let clip = ClipPlanes::for_resolution(config.resolution.unwrap_or(1.0));
        let controller = ViewportController::new(config.viewport, config.fov_deg, clip);
        info!(
            width = config.viewport.width_px,
            height = config.viewport.height_px,
            epsg = config.epsg,
            "viewer created"
        );
        Self {
            scale_config: config.scale.clone(),
            picking: PickingEngine::new(config.highlight),
            config,
            store: PointCloudStore::new(),
            pipeline: LoadPipeline::new(),
            controller,
            scales: None,
            tooltip: TooltipState::Hidden,
            render: RenderLoop::new(),
            events: EventBus::new(),
            placed: false,
        }
    }

    /// Releases the grid caches and buffers.
    pub fn dispose(self) {
        info!(
            cached = self.store.cache().len(),
            pending = self.pipeline.pending_len(),
            "viewer disposed"
        );
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn scale_config(&self) -> &ScaleConfig {
        &self.scale_config
    }

    pub fn store(&self) -> &PointCloudStore {
        &self.store
    }

    pub fn controller(&self) -> &ViewportController {
        &self.controller
    }

    pub fn camera(&self) -> &CameraState {
        self.controller.camera()
    }

    pub fn transform(&self) -> PanZoomTransform {
        self.controller.transform()
    }

    pub fn scales(&self) -> Option<&ScaleState> {
        self.scales.as_ref()
    }

    pub fn tooltip(&self) -> &TooltipState {
        &self.tooltip
    }

    pub fn highlight(&self) -> Option<Highlight> {
        self.picking.highlight()
    }

    pub fn active_layer(&self) -> Option<&GridLayer> {
        self.store.active_layer()
    }

    pub fn cell_at(&self, index: usize) -> Option<&Cell> {
        self.store.cell_at(index)
    }

    /// True while the latest requested load has not finished.
    pub fn is_loading(&self) -> bool {
        self.pipeline.is_loading()
    }

    pub fn is_rendering(&self) -> bool {
        self.render.is_running()
    }

    // ---- loading ----

    pub fn begin_load(&mut self, resolution: f64) -> LoadTicket {
        let ticket = self.pipeline.begin(resolution);
        info!(resolution, request = ticket.request.0, "loading grid");
        ticket
    }

    /// Commits decoded data for `ticket` and shows it.
    ///
    /// Returns `Superseded` without touching any state when a newer load was
    /// requested in the meantime. The layer and its scales are built before
    /// anything is cached, so on error the viewer stays as it was.
    pub fn complete_load(
        &mut self,
        ticket: LoadTicket,
        data: GridData,
    ) -> Result<LoadState, ViewerError> {
        let state = self.pipeline.complete(ticket);
        if state != LoadState::Resident {
            return Ok(state);
        }
        let options = LoadOptions {
            color_field: self.scale_config.color_field.clone(),
            mode: self.config.coordinate_mode,
            zeros_removed: self.config.zeros_removed,
        };
        let scale_config = &self.scale_config;
        let prepared = prepare_layer(ticket.resolution, data, &options)
            .map_err(ViewerError::from)
            .and_then(|layer| {
                let scales = ScaleEngine::build(&layer, scale_config)?;
                Ok((layer, scales))
            });
        let (layer, scales) = match prepared {
            Ok(prepared) => prepared,
            Err(err) => {
                error!(resolution = ticket.resolution, %err, "grid load aborted");
                self.events.emit(ViewerEvent::LoadFailed {
                    resolution: ticket.resolution,
                    reason: err.to_string(),
                });
                return Err(err);
            }
        };

        let previous = self.active_layer().map(|l| l.space);
        let summary = self.store.insert(layer);
        info!(
            resolution = ticket.resolution,
            cells = summary.cells,
            "grid loaded"
        );
        self.events.emit(ViewerEvent::Loaded {
            resolution: ticket.resolution,
            cells: summary.cells,
            replaced: summary.replaced,
        });
        self.bind(ticket.resolution, scales, previous)?;
        Ok(LoadState::Resident)
    }

    /// Records a failed fetch or decode for `ticket`.
    pub fn fail_load(&mut self, ticket: LoadTicket, reason: &str) -> LoadState {
        let state = self.pipeline.fail(ticket);
        if state == LoadState::Failed {
            error!(resolution = ticket.resolution, reason, "grid load failed");
            self.events.emit(ViewerEvent::LoadFailed {
                resolution: ticket.resolution,
                reason: reason.to_string(),
            });
        }
        state
    }

    /// Loads already-decoded data in one step.
    pub fn load(&mut self, resolution: f64, data: GridData) -> Result<LoadState, ViewerError> {
        let ticket = self.begin_load(resolution);
        self.complete_load(ticket, data)
    }

    /// Binds the render buffers to a cached resolution and rebuilds scales.
    ///
    /// The scales are built before the switch, so a failure keeps the current
    /// resolution active. The camera is placed the first time any grid is
    /// shown; later switches keep the view and refit the clip planes.
    pub fn show_resolution(&mut self, resolution: f64) -> Result<(), ViewerError> {
        let layer = self
            .store
            .cache()
            .get(resolution)
            .ok_or(CacheError::UnknownResolution { resolution })?;
        let scales = ScaleEngine::build(layer, &self.scale_config)?;
        let previous = self.active_layer().map(|l| l.space);
        self.bind(resolution, scales, previous)
    }

    /// Activates `resolution` with scales already built against it.
    /// `previous` is the world space the camera currently sits in.
    fn bind(
        &mut self,
        resolution: f64,
        scales: ScaleState,
        previous: Option<CoordinateSpace>,
    ) -> Result<(), ViewerError> {
        self.store.activate(resolution)?;
        self.store.build_buffers(&scales)?;
        match previous {
            Some(space) if self.placed => self.refit_camera(space),
            _ => self.place_camera(),
        }
        self.picking.forget();
        self.tooltip = TooltipState::Hidden;
        self.scales = Some(scales);
        self.events.emit(ViewerEvent::ScalesRebuilt);
        self.render.ensure_started();
        Ok(())
    }

    fn clip_for(layer: &GridLayer) -> ClipPlanes {
        if layer.space.is_normalized() {
            ClipPlanes::NORMALIZED
        } else {
            ClipPlanes::for_resolution(layer.resolution)
        }
    }

    fn place_camera(&mut self) {
        let Some(layer) = self.store.active_layer() else {
            return;
        };
        let space = layer.space;
        let clip = Self::clip_for(layer);
        let center = match self.config.center {
            Some(c) => space.to_world(c),
            None => layer.middle_cell().map_or(Vec2::ZERO, Cell::position),
        };
        let zoom = self.config.zoom.map(|z| space.length_to_world(z));
        let home = self.controller.place(center, clip, zoom);
        debug!(camera = ?home.camera, k = home.transform.k, "camera placed");
        self.placed = true;

        if let Some(request) = self.boundary_request() {
            match request.url(&self.config.boundaries.base_url) {
                Ok(url) => {
                    self.events
                        .emit(ViewerEvent::BoundariesRequested { request, url });
                }
                Err(err) => warn!(%err, "boundary url rejected"),
            }
        }
    }

    /// Carries the camera and home view from `from` into the active layer's
    /// world space and adopts that layer's clip planes.
    fn refit_camera(&mut self, from: CoordinateSpace) {
        let Some(layer) = self.store.active_layer() else {
            return;
        };
        let to = layer.space;
        let clip = Self::clip_for(layer);
        let carry = |p: Vec3| {
            to.to_world(from.to_data(p.xy()))
                .extend(to.length_to_world(from.length_to_data(p.z)))
        };
        let camera = carry(self.controller.camera().position);
        let home = carry(self.controller.home_view().camera);
        self.controller.refit(clip, camera, home);
        debug!(far = clip.far, camera = ?self.controller.camera().position, "camera refit");
    }

    // ---- scales ----

    /// Applies `change` to a copy of the scale configuration and commits it
    /// only if the resulting scales build.
    fn reconfigure<F>(&mut self, colors: bool, sizes: bool, change: F) -> Result<(), ViewerError>
    where
        F: FnOnce(&mut ScaleConfig),
    {
        let mut next = self.scale_config.clone();
        change(&mut next);
        let Some(layer) = self.store.active_layer() else {
            self.scale_config = next;
            return Ok(());
        };
        let scales = ScaleEngine::build(layer, &next)?;
        if colors {
            self.store.update_colors(&scales)?;
            // Colors were rewritten underneath the highlight.
            self.picking.forget();
            self.tooltip = TooltipState::Hidden;
        }
        if sizes {
            self.store.update_sizes(&scales)?;
        }
        self.scale_config = next;
        self.scales = Some(scales);
        self.events.emit(ViewerEvent::ScalesRebuilt);
        Ok(())
    }

    pub fn set_color_field(&mut self, field: impl Into<String>) -> Result<(), ViewerError> {
        let field = field.into();
        self.reconfigure(true, false, |c| c.color_field = field)
    }

    pub fn set_size_field(&mut self, field: Option<String>) -> Result<(), ViewerError> {
        self.reconfigure(false, true, |c| c.size_field = field)
    }

    pub fn set_color_scheme(&mut self, name: &str) -> Result<(), ViewerError> {
        let ramp = ColorRamp::by_name(name).map_err(ConfigError::from)?;
        self.reconfigure(true, false, |c| c.ramp = ramp)
    }

    pub fn set_color_scale(&mut self, kind: ColorScaleKind) -> Result<(), ViewerError> {
        self.reconfigure(true, false, |c| c.kind = kind)
    }

    pub fn set_reverse_colors(&mut self, reverse: bool) -> Result<(), ViewerError> {
        self.reconfigure(true, false, |c| c.reverse = reverse)
    }

    /// Replaces the computed color scale with fixed threshold/color pairs, or
    /// goes back to the computed one with `None`.
    pub fn set_thresholds(&mut self, thresholds: Option<(Vec<f64>, Vec<Rgb>)>) -> Result<(), ViewerError> {
        let scale = thresholds
            .map(|(values, colors)| ThresholdScale::new(values, colors))
            .transpose()
            .map_err(ConfigError::from)?;
        self.reconfigure(true, false, |c| c.thresholds = scale)
    }

    /// Evenly spaced `(value, color)` pairs for an external legend.
    pub fn legend_stops(&self) -> Vec<(f64, Rgb)> {
        self.scales
            .as_ref()
            .map(|s| s.color.legend_stops(self.config.legend.cells))
            .unwrap_or_default()
    }

    // ---- gestures ----

    pub fn wheel(&mut self, position_px: [f64; 2], delta_y_px: f64) {
        self.controller.wheel(position_px, delta_y_px);
        self.forward_viewport_events();
    }

    pub fn pinch(&mut self, center_px: [f64; 2], factor: f64) {
        self.controller.pinch(center_px, factor);
        self.forward_viewport_events();
    }

    pub fn drag(&mut self, position_px: [f64; 2], movement_px: [f64; 2]) {
        self.controller.drag(position_px, movement_px);
        self.forward_viewport_events();
    }

    /// Ends a gesture: hides the tooltip and re-issues scale-dependent requests.
    pub fn zoom_end(&mut self) -> f64 {
        let scale = self.controller.on_zoom_end();
        self.tooltip = TooltipState::Hidden;
        self.forward_viewport_events();
        if let Some(query) = self.placename_query() {
            let url = match self.config.placenames.service_url.as_deref() {
                Some(base) => query
                    .to_url(base)
                    .inspect_err(|err| warn!(%err, "placename url rejected"))
                    .ok(),
                None => {
                    warn!("placenames enabled without a service url");
                    None
                }
            };
            self.events
                .emit(ViewerEvent::PlacenamesRequested { query, url });
        }
        scale
    }

    pub fn home(&mut self) {
        self.controller.home();
        self.forward_viewport_events();
    }

    pub fn resize(&mut self, width_px: f64, height_px: f64) {
        let viewport = Viewport::new(width_px, height_px);
        self.controller.resize(viewport);
        self.config.viewport = viewport;
    }

    fn forward_viewport_events(&mut self) {
        for event in self.controller.drain_events() {
            self.events.emit(ViewerEvent::Viewport(event.payload));
        }
    }

    // ---- picking ----

    /// Picks the cell under a pixel, moving the highlight and tooltip to it,
    /// or clears both when nothing is close enough.
    pub fn click(&mut self, x_px: f64, y_px: f64) -> &TooltipState {
        let Some(threshold) = self.store.active_layer().map(|l| l.resolution) else {
            return &self.tooltip;
        };
        let ray = self.controller.ray_at(x_px, y_px);
        let event = self
            .picking
            .pick(self.store.buffers_mut(), ray, PickOptions { threshold });
        match event {
            PickEvent::Pick(hit) => {
                self.tooltip = self
                    .tooltip_for(hit.index, [x_px, y_px])
                    .map_or(TooltipState::Hidden, TooltipState::Visible);
                self.events.emit(ViewerEvent::Pick { index: hit.index });
            }
            PickEvent::Clear => {
                self.tooltip = TooltipState::Hidden;
                self.events.emit(ViewerEvent::PickCleared);
            }
        }
        &self.tooltip
    }

    pub fn pointer_leave(&mut self) {
        self.picking.clear(self.store.buffers_mut());
        self.tooltip = TooltipState::Hidden;
        self.events.emit(ViewerEvent::PickCleared);
    }

    fn tooltip_for(&self, index: usize, pointer_px: [f64; 2]) -> Option<Tooltip> {
        let layer = self.store.active_layer()?;
        let cell = layer.cells.get(index)?;
        let field = self.scales.as_ref().map_or(usize::MAX, |s| s.color_field);
        let external = layer.space.to_external(cell.position());
        Some(Tooltip {
            index,
            color: cell.color,
            field: self.scale_config.color_field.clone(),
            value: cell.value(field),
            x: external.x.round(),
            y: external.y.round(),
            epsg: self.config.epsg,
            position_px: Tooltip::placement(pointer_px, TOOLTIP_WIDTH_PX, self.controller.viewport()),
        })
    }

    // ---- external requests ----

    /// Visible area on the data plane in external coordinates.
    pub fn view_envelope(&self) -> Option<Aabb2> {
        let space = self.store.active_layer()?.space;
        let bounds = self.controller.visible_bounds()?;
        let min = space.to_external(Vec2::new(bounds.min[0], bounds.min[1]));
        let max = space.to_external(Vec2::new(bounds.max[0], bounds.max[1]));
        Some(Aabb2::new([min.x, min.y], [max.x, max.y]))
    }

    /// Placename request for the current view, when placenames are enabled
    /// and the camera is within the far plane.
    pub fn placename_query(&self) -> Option<PlacenameQuery> {
        let options = &self.config.placenames;
        if !options.visible {
            return None;
        }
        let layer = self.store.active_layer()?;
        let camera = self.controller.camera();
        let z = camera.position.z;
        if !(z > 0.0 && z < camera.clip.far) {
            return None;
        }
        let distance = layer.space.length_to_data(z);
        let defaults;
        let thresholds = match &options.thresholds {
            Some(t) => t.as_slice(),
            None => {
                defaults = default_population_thresholds(layer.source_resolution);
                defaults.as_slice()
            }
        };
        PlacenameQuery::new(
            self.view_envelope()?,
            distance,
            thresholds,
            &options.fields,
            options.country.as_deref(),
            self.config.epsg,
        )
    }

    pub fn boundary_request(&self) -> Option<BoundaryRequest> {
        let options = &self.config.boundaries;
        options.visible.then(|| options.request(self.config.epsg))
    }

    // ---- output ----

    /// Draws one frame once content has been shown.
    pub fn render<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) -> Option<Frame> {
        let camera = *self.controller.camera();
        let viewport = self.controller.viewport();
        let background = self.config.background;
        self.render
            .tick(backend, camera, viewport, self.store.buffers_mut(), background)
    }

    pub fn drain_events(&mut self) -> Vec<Event<ViewerEvent>> {
        self.events.drain()
    }
}
