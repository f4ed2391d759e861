//! Value-to-color and value-to-size mappings derived from grid extents.

use foundation::color::Rgb;
use foundation::math::precision::stable_total_cmp_f64;
use serde::{Deserialize, Serialize};
use streaming::cache::{Cell, GridLayer};
use thiserror::Error;
use tracing::debug;

use crate::ramps::ColorRamp;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScaleError {
    #[error("field {0:?} is not present in the grid")]
    UnknownField(String),
    #[error("field {0:?} has no finite values")]
    EmptyField(String),
    #[error("{thresholds} thresholds but {colors} colors")]
    ThresholdMismatch { thresholds: usize, colors: usize },
}

/// Continuous color scale families.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColorScaleKind {
    #[serde(alias = "scaleSequential")]
    Sequential,
    #[default]
    #[serde(alias = "scaleSequentialSqrt")]
    SequentialSqrt,
    #[serde(alias = "scaleSequentialLog")]
    SequentialLog,
    #[serde(alias = "scaleSequentialPow")]
    SequentialPow,
    #[serde(alias = "scaleSequentialQuantile")]
    SequentialQuantile,
    /// Domain `[min, 0, max]`.
    #[serde(alias = "scaleDiverging")]
    Diverging,
}

#[derive(Debug, Copy, Clone, PartialEq)]
enum Transform {
    Linear,
    Sqrt,
    Pow(f64),
    /// Reflected (`-ln(-x)`) when the domain is negative.
    Log { negative: bool },
}

impl Transform {
    fn apply(self, v: f64) -> f64 {
        match self {
            Transform::Linear => v,
            Transform::Sqrt => v.signum() * v.abs().sqrt(),
            Transform::Pow(e) => v.signum() * v.abs().powf(e),
            Transform::Log { negative: false } => v.ln(),
            Transform::Log { negative: true } => -(-v).ln(),
        }
    }
}

/// Fixed thresholds, each paired with one color.
///
/// Values below `thresholds[0]` take `colors[0]`; each threshold crossed
/// moves one color along. Values at or above the last threshold keep the
/// last color.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdScale {
    thresholds: Vec<f64>,
    colors: Vec<Rgb>,
}

impl ThresholdScale {
    pub fn new(thresholds: Vec<f64>, colors: Vec<Rgb>) -> Result<Self, ScaleError> {
        if thresholds.len() != colors.len() || colors.is_empty() {
            return Err(ScaleError::ThresholdMismatch {
                thresholds: thresholds.len(),
                colors: colors.len(),
            });
        }
        Ok(Self { thresholds, colors })
    }

    pub fn thresholds(&self) -> &[f64] {
        &self.thresholds
    }

    pub fn colors(&self) -> &[Rgb] {
        &self.colors
    }

    pub fn color(&self, v: f64) -> Option<Rgb> {
        if v.is_nan() {
            return None;
        }
        let i = self.thresholds.partition_point(|t| *t <= v);
        self.colors.get(i).or(self.colors.last()).copied()
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Mapping {
    Sequential { transform: Transform, domain: [f64; 2] },
    Quantile { sorted: Vec<f64> },
    Diverging { domain: [f64; 3] },
    Threshold(ThresholdScale),
}

/// A value-to-color function.
///
/// Continuous mappings produce a position `t ∈ [0, 1]` that is looked up in
/// the ramp; reversing flips `t`, so the domain stays `[min, max]` while the
/// ramp endpoints swap.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScale {
    mapping: Mapping,
    ramp: ColorRamp,
    reversed: bool,
}

impl ColorScale {
    /// Sequential or diverging scale over `extent`.
    ///
    /// `SequentialQuantile` needs every value; use [`ColorScale::quantile`].
    pub fn continuous(
        kind: ColorScaleKind,
        extent: [f64; 2],
        ramp: ColorRamp,
        reversed: bool,
        exponent: f64,
    ) -> Self {
        let [min, max] = extent;
        let mapping = match kind {
            ColorScaleKind::Diverging => Mapping::Diverging {
                domain: [min, 0.0, max],
            },
            ColorScaleKind::SequentialQuantile => Mapping::Quantile {
                sorted: vec![min, max],
            },
            ColorScaleKind::Sequential => Mapping::Sequential {
                transform: Transform::Linear,
                domain: extent,
            },
            ColorScaleKind::SequentialSqrt => Mapping::Sequential {
                transform: Transform::Sqrt,
                domain: extent,
            },
            ColorScaleKind::SequentialPow => Mapping::Sequential {
                transform: Transform::Pow(exponent),
                domain: extent,
            },
            ColorScaleKind::SequentialLog => Mapping::Sequential {
                transform: Transform::Log { negative: min < 0.0 },
                domain: extent,
            },
        };
        Self {
            mapping,
            ramp,
            reversed,
        }
    }

    /// Quantile scale over the finite `values`.
    pub fn quantile<I>(values: I, ramp: ColorRamp, reversed: bool) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let mut sorted: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
        sorted.sort_by(|a, b| stable_total_cmp_f64(*a, *b));
        Self {
            mapping: Mapping::Quantile { sorted },
            ramp,
            reversed,
        }
    }

    pub fn threshold(scale: ThresholdScale) -> Self {
        Self {
            mapping: Mapping::Threshold(scale),
            ramp: ColorRamp::default(),
            reversed: false,
        }
    }

    pub fn ramp(&self) -> ColorRamp {
        self.ramp
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    pub fn is_threshold(&self) -> bool {
        matches!(self.mapping, Mapping::Threshold(_))
    }

    /// Input domain: `[min, max]`, `[min, 0, max]` or the threshold list.
    pub fn domain(&self) -> Vec<f64> {
        match &self.mapping {
            Mapping::Sequential { domain, .. } => domain.to_vec(),
            Mapping::Quantile { sorted } => match (sorted.first(), sorted.last()) {
                (Some(a), Some(b)) => vec![*a, *b],
                _ => Vec::new(),
            },
            Mapping::Diverging { domain } => domain.to_vec(),
            Mapping::Threshold(t) => t.thresholds.clone(),
        }
    }

    /// Ramp position for `v`, after reversal. `None` for threshold scales
    /// and for values without a defined position.
    pub fn position(&self, v: f64) -> Option<f64> {
        let t = match &self.mapping {
            Mapping::Sequential { transform, domain } => {
                let t0 = transform.apply(domain[0]);
                let t1 = transform.apply(domain[1]);
                let k = if t0 == t1 { 0.0 } else { 1.0 / (t1 - t0) };
                (transform.apply(v) - t0) * k
            }
            Mapping::Quantile { sorted } => {
                if v.is_nan() {
                    return None;
                }
                if sorted.len() < 2 {
                    0.0
                } else {
                    let i = sorted.partition_point(|s| *s <= v).max(1);
                    (i - 1) as f64 / (sorted.len() - 1) as f64
                }
            }
            Mapping::Diverging { domain: [d0, mid, d2] } => {
                let s = if mid < d0 { -1.0 } else { 1.0 };
                let k10 = if d0 == mid { 0.0 } else { 0.5 / (mid - d0) };
                let k21 = if mid == d2 { 0.0 } else { 0.5 / (d2 - mid) };
                0.5 + (v - mid) * if s * v < s * mid { k10 } else { k21 }
            }
            Mapping::Threshold(_) => return None,
        };
        if t.is_nan() {
            return None;
        }
        Some(if self.reversed { 1.0 - t } else { t })
    }

    pub fn color(&self, v: f64) -> Option<Rgb> {
        match &self.mapping {
            Mapping::Threshold(t) => t.color(v),
            _ => self.ramp.at(self.position(v)?),
        }
    }

    /// `(value, color)` pairs for a legend: one per threshold, or `n` evenly
    /// spaced samples of the domain.
    pub fn legend_stops(&self, n: usize) -> Vec<(f64, Rgb)> {
        if let Mapping::Threshold(t) = &self.mapping {
            return t
                .thresholds
                .iter()
                .copied()
                .zip(t.colors.iter().copied())
                .collect();
        }
        let domain = self.domain();
        let (Some(&lo), Some(&hi)) = (domain.first(), domain.last()) else {
            return Vec::new();
        };
        let n = n.max(2);
        (0..n)
            .filter_map(|i| {
                let v = lo + (hi - lo) * i as f64 / (n - 1) as f64;
                Some((v, self.color(v)?))
            })
            .collect()
    }
}

/// Square-root value-to-size scale.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SizeScale {
    domain: [f64; 2],
    range: [f64; 2],
}

impl SizeScale {
    pub fn new(domain: [f64; 2], range: [f64; 2]) -> Self {
        Self { domain, range }
    }

    /// Range `[resolution / 3, resolution / 1.5]`.
    pub fn for_resolution(domain: [f64; 2], resolution: f64) -> Self {
        Self::new(domain, [resolution / 3.0, resolution / 1.5])
    }

    pub fn domain(&self) -> [f64; 2] {
        self.domain
    }

    pub fn range(&self) -> [f64; 2] {
        self.range
    }

    /// Not clamped: values outside the domain extrapolate.
    pub fn size(&self, v: f64) -> Option<f64> {
        let sqrt = |x: f64| Transform::Sqrt.apply(x);
        let (t0, t1) = (sqrt(self.domain[0]), sqrt(self.domain[1]));
        let k = if t0 == t1 { 0.0 } else { 1.0 / (t1 - t0) };
        let t = (sqrt(v) - t0) * k;
        let s = self.range[0] + (self.range[1] - self.range[0]) * t;
        s.is_finite().then_some(s)
    }
}

/// Everything a scale rebuild depends on besides the grid itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleConfig {
    pub color_field: String,
    pub size_field: Option<String>,
    pub kind: ColorScaleKind,
    pub ramp: ColorRamp,
    pub reverse: bool,
    /// Exponent for `SequentialPow`.
    pub exponent: f64,
    /// Overrides the computed color scale when present.
    pub thresholds: Option<ThresholdScale>,
}

impl ScaleConfig {
    pub fn new(color_field: impl Into<String>) -> Self {
        Self {
            color_field: color_field.into(),
            size_field: None,
            kind: ColorScaleKind::default(),
            ramp: ColorRamp::default(),
            reverse: false,
            exponent: 1.0,
            thresholds: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SizeBinding {
    pub field: usize,
    pub scale: SizeScale,
}

/// Color and size functions bound to field indices of one grid layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleState {
    pub color_field: usize,
    pub color: ColorScale,
    pub size: Option<SizeBinding>,
    /// Size used when no size scale applies.
    pub point_size: f64,
}

impl ScaleState {
    /// Color for `cell`, black when the scale has no color for its value.
    pub fn cell_color(&self, cell: &Cell) -> Rgb {
        self.color
            .color(cell.value(self.color_field))
            .unwrap_or(Rgb::BLACK)
    }

    pub fn cell_size(&self, cell: &Cell) -> f32 {
        self.size
            .as_ref()
            .and_then(|b| b.scale.size(cell.value(b.field)))
            .unwrap_or(self.point_size) as f32
    }
}

/// Builds `ScaleState`s. Pure: output depends only on the layer and config.
pub struct ScaleEngine;

impl ScaleEngine {
    pub fn build(layer: &GridLayer, config: &ScaleConfig) -> Result<ScaleState, ScaleError> {
        let (color_field, color) = Self::color_scale(layer, config)?;
        let size = Self::size_scale(layer, config)?;
        debug!(
            field = %config.color_field,
            domain = ?color.domain(),
            sized = size.is_some(),
            "rebuilt scales"
        );
        Ok(ScaleState {
            color_field,
            color,
            size,
            point_size: layer.resolution,
        })
    }

    pub fn color_scale(
        layer: &GridLayer,
        config: &ScaleConfig,
    ) -> Result<(usize, ColorScale), ScaleError> {
        let field = layer
            .field_index(&config.color_field)
            .ok_or_else(|| ScaleError::UnknownField(config.color_field.clone()))?;

        if let Some(thresholds) = &config.thresholds {
            return Ok((field, ColorScale::threshold(thresholds.clone())));
        }
        if config.kind == ColorScaleKind::SequentialQuantile {
            let scale = ColorScale::quantile(layer.field_values(field), config.ramp, config.reverse);
            if scale.domain().is_empty() {
                return Err(ScaleError::EmptyField(config.color_field.clone()));
            }
            return Ok((field, scale));
        }

        let extent = layer
            .extent(&config.color_field)
            .ok_or_else(|| ScaleError::EmptyField(config.color_field.clone()))?;
        Ok((
            field,
            ColorScale::continuous(config.kind, extent, config.ramp, config.reverse, config.exponent),
        ))
    }

    /// `None` without a size field, or when the field has no finite values.
    pub fn size_scale(
        layer: &GridLayer,
        config: &ScaleConfig,
    ) -> Result<Option<SizeBinding>, ScaleError> {
        let Some(name) = &config.size_field else {
            return Ok(None);
        };
        let field = layer
            .field_index(name)
            .ok_or_else(|| ScaleError::UnknownField(name.clone()))?;
        Ok(layer.extent(name).map(|extent| SizeBinding {
            field,
            scale: SizeScale::for_resolution(extent, layer.resolution),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ColorScale, ColorScaleKind, ScaleConfig, ScaleEngine, ScaleError, SizeScale,
        ThresholdScale,
    };
    use crate::ramps::ColorRamp;
    use foundation::color::Rgb;
    use foundation::space::CoordinateSpace;
    use pretty_assertions::assert_eq;
    use streaming::cache::{Cell, GridLayer};

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() <= 1e-9 * b.abs().max(1.0), "{a} != {b}");
    }

    fn layer(pop: &[f64]) -> GridLayer {
        GridLayer {
            source_resolution: 1000.0,
            resolution: 1000.0,
            space: CoordinateSpace::native(0),
            fields: vec!["x".into(), "y".into(), "pop".into()],
            cells: pop
                .iter()
                .enumerate()
                .map(|(i, p)| Cell::new(i as f64 * 1000.0, 0.0, vec![i as f64 * 1000.0, 0.0, *p]))
                .collect(),
        }
    }

    #[test]
    fn color_domain_is_field_extent() {
        let state = ScaleEngine::build(&layer(&[10.0, 20.0, 30.0, 40.0]), &ScaleConfig::new("pop")).unwrap();
        assert_eq!(state.color.domain(), vec![10.0, 40.0]);
        assert_eq!(state.color_field, 2);
        assert_eq!(state.point_size, 1000.0);
        assert!(state.size.is_none());
    }

    #[test]
    fn reversing_swaps_ramp_endpoints() {
        let l = layer(&[10.0, 20.0, 30.0, 40.0]);
        let mut config = ScaleConfig::new("pop");
        let forward = ScaleEngine::build(&l, &config).unwrap().color;
        config.reverse = true;
        let reversed = ScaleEngine::build(&l, &config).unwrap().color;

        assert_eq!(reversed.domain(), vec![10.0, 40.0]);
        assert_eq!(forward.color(10.0), reversed.color(40.0));
        assert_eq!(forward.color(40.0), reversed.color(10.0));
        assert_eq!(forward.color(10.0), ColorRamp::turbo().at(0.0));
        assert_eq!(reversed.color(10.0), ColorRamp::turbo().at(1.0));
    }

    #[test]
    fn sqrt_kind_positions() {
        let s = ColorScale::continuous(ColorScaleKind::SequentialSqrt, [0.0, 100.0], ColorRamp::turbo(), false, 1.0);
        assert_close(s.position(25.0).unwrap(), 0.5);
        assert_eq!(s.position(f64::NAN), None);
        assert_eq!(s.color(f64::NAN), None);
    }

    #[test]
    fn log_and_pow_kinds() {
        let log = ColorScale::continuous(ColorScaleKind::SequentialLog, [1.0, 100.0], ColorRamp::turbo(), false, 1.0);
        assert_close(log.position(10.0).unwrap(), 0.5);
        let pow = ColorScale::continuous(ColorScaleKind::SequentialPow, [0.0, 10.0], ColorRamp::turbo(), false, 2.0);
        assert_close(pow.position(5.0).unwrap(), 0.25);
    }

    #[test]
    fn degenerate_domain_maps_to_start() {
        let s = ColorScale::continuous(ColorScaleKind::Sequential, [5.0, 5.0], ColorRamp::turbo(), false, 1.0);
        assert_eq!(s.position(5.0), Some(0.0));
    }

    #[test]
    fn diverging_centers_zero() {
        let s = ColorScale::continuous(ColorScaleKind::Diverging, [-10.0, 40.0], ColorRamp::turbo(), false, 1.0);
        assert_eq!(s.domain(), vec![-10.0, 0.0, 40.0]);
        assert_close(s.position(0.0).unwrap(), 0.5);
        assert_close(s.position(-10.0).unwrap(), 0.0);
        assert_close(s.position(40.0).unwrap(), 1.0);
        assert_close(s.position(20.0).unwrap(), 0.75);
    }

    #[test]
    fn quantile_uses_rank() {
        let s = ColorScale::quantile([40.0, 10.0, f64::NAN, 30.0, 20.0], ColorRamp::turbo(), false);
        assert_eq!(s.domain(), vec![10.0, 40.0]);
        assert_close(s.position(10.0).unwrap(), 0.0);
        assert_close(s.position(25.0).unwrap(), 1.0 / 3.0);
        assert_close(s.position(40.0).unwrap(), 1.0);
    }

    #[test]
    fn thresholds_override_extent() {
        let red = Rgb::parse("red").unwrap();
        let blue = Rgb::parse("blue").unwrap();
        let t = ThresholdScale::new(vec![15.0, 35.0], vec![red, blue]).unwrap();
        let mut config = ScaleConfig::new("pop");
        config.thresholds = Some(t);
        let state = ScaleEngine::build(&layer(&[10.0, 20.0, 30.0, 40.0]), &config).unwrap();

        assert_eq!(state.color.domain(), vec![15.0, 35.0]);
        assert_eq!(state.color.color(10.0), Some(red));
        assert_eq!(state.color.color(15.0), Some(blue));
        assert_eq!(state.color.color(99.0), Some(blue));
        assert_eq!(state.color.color(f64::NAN), None);
        assert_eq!(state.color.legend_stops(5), vec![(15.0, red), (35.0, blue)]);
    }

    #[test]
    fn threshold_length_mismatch_is_rejected() {
        assert_eq!(
            ThresholdScale::new(vec![1.0, 2.0], vec![Rgb::BLACK]),
            Err(ScaleError::ThresholdMismatch { thresholds: 2, colors: 1 })
        );
    }

    #[test]
    fn size_scale_spans_resolution_fractions() {
        let mut config = ScaleConfig::new("pop");
        config.size_field = Some("pop".into());
        let state = ScaleEngine::build(&layer(&[0.0, 25.0, 100.0]), &config).unwrap();
        let size = state.size.expect("size scale").scale;
        assert_close(size.size(0.0).unwrap(), 1000.0 / 3.0);
        assert_close(size.size(100.0).unwrap(), 1000.0 / 1.5);
        assert_close(size.size(25.0).unwrap(), (1000.0 / 3.0 + 1000.0 / 1.5) / 2.0);
        assert_eq!(SizeScale::for_resolution([0.0, 1.0], 1000.0).size(f64::NAN), None);
    }

    #[test]
    fn nan_values_fall_back_per_cell() {
        let mut config = ScaleConfig::new("pop");
        config.size_field = Some("pop".into());
        let l = layer(&[10.0, f64::NAN, 40.0]);
        let state = ScaleEngine::build(&l, &config).unwrap();
        assert_eq!(state.cell_color(&l.cells[1]), Rgb::BLACK);
        assert_eq!(state.cell_size(&l.cells[1]), 1000.0);
    }

    #[test]
    fn unknown_field_is_an_error() {
        let err = ScaleEngine::build(&layer(&[1.0]), &ScaleConfig::new("nope")).unwrap_err();
        assert_eq!(err, ScaleError::UnknownField("nope".into()));
    }

    #[test]
    fn legend_stops_sample_domain() {
        let s = ColorScale::continuous(ColorScaleKind::Sequential, [0.0, 100.0], ColorRamp::turbo(), false, 1.0);
        let stops = s.legend_stops(5);
        assert_eq!(stops.iter().map(|(v, _)| *v).collect::<Vec<_>>(), vec![0.0, 25.0, 50.0, 75.0, 100.0]);
    }
}
