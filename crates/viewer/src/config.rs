//! Viewer configuration.
//!
//! `ViewerOptions` is the raw, serde-loadable surface with defaults for every
//! field. `ViewerConfig` is the validated form the engine runs on; it is only
//! produced by [`ViewerOptions::validate`] or [`ViewerConfigBuilder::build`].

use foundation::color::Rgb;
use foundation::math::Vec2;
use layers::{
    BoundaryRequest, ColorRamp, ColorScaleKind, CoordinateMode, NUTS2JSON_BASE, PlacenameFields,
    PopulationThreshold, ScaleConfig, ThresholdScale,
};
use serde::{Deserialize, Serialize};
use tracing::error;
use url::Url;
use viewport::camera::{DEFAULT_FOV_DEG, Viewport};

use crate::error::ConfigError;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LegendKind {
    #[default]
    Continuous,
    Cells,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LegendOrientation {
    #[default]
    Horizontal,
    Vertical,
}

/// Styling handed to the external legend renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LegendOptions {
    pub visible: bool,
    #[serde(rename = "type")]
    pub kind: LegendKind,
    pub width: f64,
    pub orientation: LegendOrientation,
    pub title: String,
    /// d3-format specifier for tick labels.
    pub format: String,
    pub cells: usize,
    pub shape_width: f64,
}

impl Default for LegendOptions {
    fn default() -> Self {
        Self {
            visible: true,
            kind: LegendKind::Continuous,
            width: 300.0,
            orientation: LegendOrientation::Horizontal,
            title: "Legend".into(),
            format: ".0s".into(),
            cells: 5,
            shape_width: 30.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlacenameOptions {
    pub visible: bool,
    /// Country code filter, e.g. `"FR"`.
    pub country: Option<String>,
    /// Overrides the resolution-derived defaults. Sorted by scale on validation.
    pub thresholds: Option<Vec<PopulationThreshold>>,
    pub fields: PlacenameFields,
    /// Feature-query endpoint, ending with `?`.
    pub service_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BoundaryOptions {
    pub visible: bool,
    pub country: Option<String>,
    pub level: u8,
    pub simplification: String,
    pub base_url: String,
}

impl Default for BoundaryOptions {
    fn default() -> Self {
        Self {
            visible: false,
            country: None,
            level: 0,
            simplification: "10M".into(),
            base_url: NUTS2JSON_BASE.into(),
        }
    }
}

impl BoundaryOptions {
    pub fn request(&self, epsg: u32) -> BoundaryRequest {
        BoundaryRequest {
            epsg,
            simplification: self.simplification.clone(),
            level: self.level,
            country: self.country.clone(),
        }
    }
}

/// Raw viewer options as loaded from JSON. Coordinates and `zoom` are in
/// data units (the units of the grid file).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewerOptions {
    pub container_id: Option<String>,
    pub width: f64,
    pub height: f64,
    pub background_color: String,
    pub line_color: String,
    pub highlight_color: String,
    pub center: Option<[f64; 2]>,
    /// Initial camera distance.
    pub zoom: Option<f64>,
    #[serde(rename = "EPSG", alias = "epsg")]
    pub epsg: u32,
    pub resolution: Option<f64>,
    /// Trailing zeros stripped from the grid's coordinates.
    pub zeros_removed: u32,
    pub coordinate_mode: CoordinateMode,
    pub fov: f64,
    pub color_field: String,
    pub size_field: Option<String>,
    pub color_scheme: String,
    pub reverse_colors: bool,
    pub color_scale: ColorScaleKind,
    pub exponent: f64,
    pub thresholds: Option<Vec<f64>>,
    pub threshold_colors: Option<Vec<String>>,
    pub legend: LegendOptions,
    pub placenames: PlacenameOptions,
    pub boundaries: BoundaryOptions,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self {
            container_id: None,
            width: 800.0,
            height: 600.0,
            background_color: "#000".into(),
            line_color: "#ffffff".into(),
            highlight_color: "cyan".into(),
            center: None,
            zoom: None,
            epsg: 3035,
            resolution: None,
            zeros_removed: 0,
            coordinate_mode: CoordinateMode::Native,
            fov: DEFAULT_FOV_DEG,
            color_field: String::new(),
            size_field: None,
            color_scheme: ColorRamp::DEFAULT_NAME.into(),
            reverse_colors: false,
            color_scale: ColorScaleKind::default(),
            exponent: 1.0,
            thresholds: None,
            threshold_colors: None,
            legend: LegendOptions::default(),
            placenames: PlacenameOptions::default(),
            boundaries: BoundaryOptions::default(),
        }
    }
}

impl ViewerOptions {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn validate(&self) -> Result<ViewerConfig, ConfigError> {
        self.try_validate()
            .inspect_err(|err| error!(%err, "rejected viewer configuration"))
    }

    fn try_validate(&self) -> Result<ViewerConfig, ConfigError> {
        if !(self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()) {
            return Err(ConfigError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if let Some(r) = self.resolution {
            if !(r.is_finite() && r > 0.0) {
                return Err(ConfigError::InvalidResolution(r));
            }
        }
        if !(self.fov > 0.0 && self.fov < 180.0) {
            return Err(ConfigError::InvalidFov(self.fov));
        }
        if self.color_field.trim().is_empty() {
            return Err(ConfigError::MissingColorField);
        }

        let thresholds = match (&self.thresholds, &self.threshold_colors) {
            (Some(values), colors) => {
                let colors = colors
                    .iter()
                    .flatten()
                    .map(|c| Rgb::parse(c))
                    .collect::<Result<Vec<_>, _>>()?;
                Some(ThresholdScale::new(values.clone(), colors)?)
            }
            (None, Some(_)) => return Err(ConfigError::ColorsWithoutThresholds),
            (None, None) => None,
        };

        let parse_url = |option: &'static str, url: &str| {
            Url::parse(url)
                .map(drop)
                .map_err(|source| ConfigError::InvalidUrl { option, source })
        };
        parse_url("boundaries.baseUrl", &self.boundaries.base_url)?;
        if let Some(url) = &self.placenames.service_url {
            parse_url("placenames.serviceUrl", url)?;
        }

        let mut placenames = self.placenames.clone();
        if let Some(t) = placenames.thresholds.as_mut() {
            t.sort_by(|a, b| a.scale.total_cmp(&b.scale));
        }

        Ok(ViewerConfig {
            container_id: self.container_id.clone(),
            viewport: Viewport::new(self.width, self.height),
            background: Rgb::parse(&self.background_color)?,
            line: Rgb::parse(&self.line_color)?,
            highlight: Rgb::parse(&self.highlight_color)?,
            center: self.center.map(|[x, y]| Vec2::new(x, y)),
            zoom: self.zoom,
            epsg: self.epsg,
            resolution: self.resolution,
            zeros_removed: self.zeros_removed,
            coordinate_mode: self.coordinate_mode,
            fov_deg: self.fov,
            scale: ScaleConfig {
                color_field: self.color_field.clone(),
                size_field: self.size_field.clone(),
                kind: self.color_scale,
                ramp: ColorRamp::by_name(&self.color_scheme)?,
                reverse: self.reverse_colors,
                exponent: self.exponent,
                thresholds,
            },
            legend: self.legend.clone(),
            placenames,
            boundaries: self.boundaries.clone(),
        })
    }
}

/// Validated, immutable viewer configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    pub container_id: Option<String>,
    pub viewport: Viewport,
    pub background: Rgb,
    pub line: Rgb,
    pub highlight: Rgb,
    pub center: Option<Vec2>,
    pub zoom: Option<f64>,
    pub epsg: u32,
    pub resolution: Option<f64>,
    pub zeros_removed: u32,
    pub coordinate_mode: CoordinateMode,
    pub fov_deg: f64,
    pub scale: ScaleConfig,
    pub legend: LegendOptions,
    pub placenames: PlacenameOptions,
    pub boundaries: BoundaryOptions,
}

impl ViewerConfig {
    pub fn builder(color_field: impl Into<String>) -> ViewerConfigBuilder {
        ViewerConfigBuilder::new(color_field)
    }
}

/// Chained construction of a [`ViewerConfig`].
#[derive(Debug, Clone, Default)]
pub struct ViewerConfigBuilder {
    options: ViewerOptions,
}

impl ViewerConfigBuilder {
    pub fn new(color_field: impl Into<String>) -> Self {
        Self {
            options: ViewerOptions {
                color_field: color_field.into(),
                ..ViewerOptions::default()
            },
        }
    }

    pub fn from_options(options: ViewerOptions) -> Self {
        Self { options }
    }

    pub fn container_id(mut self, id: impl Into<String>) -> Self {
        self.options.container_id = Some(id.into());
        self
    }

    pub fn size(mut self, width: f64, height: f64) -> Self {
        self.options.width = width;
        self.options.height = height;
        self
    }

    pub fn background_color(mut self, color: impl Into<String>) -> Self {
        self.options.background_color = color.into();
        self
    }

    pub fn line_color(mut self, color: impl Into<String>) -> Self {
        self.options.line_color = color.into();
        self
    }

    pub fn highlight_color(mut self, color: impl Into<String>) -> Self {
        self.options.highlight_color = color.into();
        self
    }

    pub fn center(mut self, x: f64, y: f64) -> Self {
        self.options.center = Some([x, y]);
        self
    }

    pub fn zoom(mut self, z: f64) -> Self {
        self.options.zoom = Some(z);
        self
    }

    pub fn epsg(mut self, code: u32) -> Self {
        self.options.epsg = code;
        self
    }

    pub fn resolution(mut self, resolution: f64) -> Self {
        self.options.resolution = Some(resolution);
        self
    }

    pub fn zeros_removed(mut self, zeros: u32) -> Self {
        self.options.zeros_removed = zeros;
        self
    }

    pub fn coordinate_mode(mut self, mode: CoordinateMode) -> Self {
        self.options.coordinate_mode = mode;
        self
    }

    pub fn fov(mut self, degrees: f64) -> Self {
        self.options.fov = degrees;
        self
    }

    pub fn size_field(mut self, field: impl Into<String>) -> Self {
        self.options.size_field = Some(field.into());
        self
    }

    pub fn color_scheme(mut self, name: impl Into<String>) -> Self {
        self.options.color_scheme = name.into();
        self
    }

    pub fn reverse_colors(mut self, reverse: bool) -> Self {
        self.options.reverse_colors = reverse;
        self
    }

    pub fn color_scale(mut self, kind: ColorScaleKind) -> Self {
        self.options.color_scale = kind;
        self
    }

    pub fn exponent(mut self, exponent: f64) -> Self {
        self.options.exponent = exponent;
        self
    }

    pub fn thresholds<S: Into<String>>(
        mut self,
        values: Vec<f64>,
        colors: impl IntoIterator<Item = S>,
    ) -> Self {
        self.options.thresholds = Some(values);
        self.options.threshold_colors = Some(colors.into_iter().map(Into::into).collect());
        self
    }

    pub fn legend(mut self, legend: LegendOptions) -> Self {
        self.options.legend = legend;
        self
    }

    pub fn placenames(mut self, placenames: PlacenameOptions) -> Self {
        self.options.placenames = placenames;
        self
    }

    pub fn boundaries(mut self, boundaries: BoundaryOptions) -> Self {
        self.options.boundaries = boundaries;
        self
    }

    pub fn options(&self) -> &ViewerOptions {
        &self.options
    }

    pub fn build(&self) -> Result<ViewerConfig, ConfigError> {
        self.options.validate()
    }
}
