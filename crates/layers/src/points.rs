use foundation::bounds::Aabb2;
use foundation::color::Rgb;
use foundation::space::{CoordinateSpace, NormalizedDomain};
use scene::buffers::{PointAttributes, PointBuffers};
use serde::{Deserialize, Serialize};
use streaming::cache::{CacheError, Cell, GridData, GridLayer, ResolutionCache};
use thiserror::Error;
use tracing::info;

use crate::scale::ScaleState;

/// Which world space a grid is stored in.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CoordinateMode {
    #[default]
    Native,
    /// Coordinates remapped to `[-1, 1]` for renderers with limited float precision.
    Normalized,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    #[error("invalid resolution {0}")]
    InvalidResolution(f64),
    #[error("grid has no records")]
    Empty,
    #[error("required field {0:?} missing from the first record")]
    MissingField(String),
    #[error("grid coordinates span no area to normalize")]
    DegenerateExtent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadOptions {
    pub color_field: String,
    pub mode: CoordinateMode,
    pub zeros_removed: u32,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LoadSummary {
    pub cells: usize,
    /// Cell size in world units.
    pub resolution: f64,
    /// True when an existing entry for the same resolution was replaced.
    pub replaced: bool,
}

/// Validates decoded records and converts them into a world-space layer.
///
/// `x`, `y` and the color field must be present and finite on the first
/// record; later records are taken as-is with missing values as NaN.
pub fn prepare_layer(
    resolution: f64,
    data: GridData,
    options: &LoadOptions,
) -> Result<GridLayer, LoadError> {
    if !(resolution.is_finite() && resolution > 0.0) {
        return Err(LoadError::InvalidResolution(resolution));
    }
    let first = data.rows.first().ok_or(LoadError::Empty)?;
    let required = |name: &str| {
        data.field_index(name)
            .filter(|i| first.get(*i).is_some_and(|v| v.is_finite()))
            .ok_or_else(|| LoadError::MissingField(name.to_string()))
    };
    let xi = required("x")?;
    let yi = required("y")?;
    required(&options.color_field)?;

    let GridData { fields, rows } = data;
    let mut cells: Vec<Cell> = rows
        .into_iter()
        .map(|row| {
            let x = row.get(xi).copied().unwrap_or(f64::NAN);
            let y = row.get(yi).copied().unwrap_or(f64::NAN);
            Cell::new(x, y, row)
        })
        .collect();

    let space = match options.mode {
        CoordinateMode::Native => CoordinateSpace::native(options.zeros_removed),
        CoordinateMode::Normalized => {
            let domain = Aabb2::from_points(cells.iter().map(Cell::position))
                .and_then(|b| NormalizedDomain::from_bounds(&b))
                .ok_or(LoadError::DegenerateExtent)?;
            let space = CoordinateSpace::normalized(domain, options.zeros_removed);
            for cell in &mut cells {
                let p = space.to_world(cell.position());
                cell.x = p.x;
                cell.y = p.y;
            }
            space
        }
    };

    Ok(GridLayer {
        source_resolution: resolution,
        resolution: space.length_to_world(resolution),
        space,
        fields,
        cells,
    })
}

/// Per-resolution cell cache plus the render buffers of the active entry.
///
/// Buffer index `i` always refers to `active_layer().cells[i]`.
#[derive(Debug, Default)]
pub struct PointCloudStore {
    cache: ResolutionCache,
    buffers: PointBuffers,
}

impl PointCloudStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    pub fn buffers(&self) -> &PointBuffers {
        &self.buffers
    }

    pub fn buffers_mut(&mut self) -> &mut PointBuffers {
        &mut self.buffers
    }

    pub fn active_layer(&self) -> Option<&GridLayer> {
        self.cache.active()
    }

    pub fn cell_at(&self, index: usize) -> Option<&Cell> {
        self.cache.active()?.cells.get(index)
    }

    /// Replaces the cache entry for `resolution`. Nothing is stored on error.
    pub fn load(
        &mut self,
        resolution: f64,
        data: GridData,
        options: &LoadOptions,
    ) -> Result<LoadSummary, LoadError> {
        let layer = prepare_layer(resolution, data, options)?;
        Ok(self.insert(layer))
    }

    /// Stores an already prepared layer, replacing any entry at its resolution.
    pub fn insert(&mut self, layer: GridLayer) -> LoadSummary {
        let resolution = layer.source_resolution;
        let summary = LoadSummary {
            cells: layer.len(),
            resolution: layer.resolution,
            replaced: self.cache.insert(layer).is_some(),
        };
        info!(
            resolution,
            cells = summary.cells,
            replaced = summary.replaced,
            "grid cached"
        );
        summary
    }

    pub fn activate(&mut self, resolution: f64) -> Result<(), CacheError> {
        self.cache.activate(resolution)
    }

    /// Rebuilds positions, colors and sizes for the active layer and records
    /// each cell's drawn color.
    pub fn build_buffers(&mut self, scales: &ScaleState) -> Result<(), CacheError> {
        let layer = self
            .cache
            .active_mut()
            .ok_or(CacheError::NoActiveResolution)?;
        for cell in &mut layer.cells {
            cell.color = scales.cell_color(cell);
        }
        self.buffers
            .rebuild(layer.cells.iter().map(|c| PointAttributes {
                x: c.x,
                y: c.y,
                color: c.color,
                size: scales.cell_size(c),
            }));
        Ok(())
    }

    /// Recomputes only the color attribute.
    pub fn update_colors(&mut self, scales: &ScaleState) -> Result<(), CacheError> {
        if self.buffers_stale() {
            return self.build_buffers(scales);
        }
        let layer = self
            .cache
            .active_mut()
            .ok_or(CacheError::NoActiveResolution)?;
        for cell in &mut layer.cells {
            cell.color = scales.cell_color(cell);
        }
        let cells = &layer.cells;
        self.buffers
            .update_colors(|i| cells.get(i).map_or(Rgb::BLACK, |c| c.color));
        Ok(())
    }

    /// Recomputes only the size attribute.
    pub fn update_sizes(&mut self, scales: &ScaleState) -> Result<(), CacheError> {
        if self.buffers_stale() {
            return self.build_buffers(scales);
        }
        let layer = self.cache.active().ok_or(CacheError::NoActiveResolution)?;
        let cells = &layer.cells;
        let fallback = scales.point_size as f32;
        self.buffers
            .update_sizes(|i| cells.get(i).map_or(fallback, |c| scales.cell_size(c)));
        Ok(())
    }

    fn buffers_stale(&self) -> bool {
        self.cache
            .active()
            .is_none_or(|l| l.len() != self.buffers.len())
    }
}

#[cfg(test)]
mod tests {
    use super::{CoordinateMode, LoadError, LoadOptions, PointCloudStore, prepare_layer};
    use crate::scale::{ScaleConfig, ScaleEngine};
    use foundation::color::Rgb;
    use pretty_assertions::assert_eq;
    use scene::buffers::POINT_Z;
    use streaming::cache::{CacheError, GridData};

    fn options() -> LoadOptions {
        LoadOptions {
            color_field: "pop".into(),
            mode: CoordinateMode::Native,
            zeros_removed: 0,
        }
    }

    fn grid(rows: &[[f64; 3]]) -> GridData {
        let mut g = GridData::new(vec!["x".into(), "y".into(), "pop".into()]);
        for r in rows {
            g.push_row(r.to_vec());
        }
        g
    }

    fn four() -> GridData {
        grid(&[
            [0.0, 0.0, 10.0],
            [1000.0, 0.0, 20.0],
            [0.0, 1000.0, 30.0],
            [1000.0, 1000.0, 40.0],
        ])
    }

    #[test]
    fn missing_required_fields_are_rejected() {
        let mut g = GridData::new(vec!["x".into(), "pop".into()]);
        g.push_row(vec![1.0, 2.0]);
        assert_eq!(prepare_layer(1000.0, g, &options()), Err(LoadError::MissingField("y".into())));

        let g = grid(&[[0.0, f64::NAN, 1.0], [1.0, 1.0, 1.0]]);
        assert_eq!(prepare_layer(1000.0, g, &options()), Err(LoadError::MissingField("y".into())));

        let mut o = options();
        o.color_field = "density".into();
        assert_eq!(prepare_layer(1000.0, four(), &o), Err(LoadError::MissingField("density".into())));

        assert_eq!(prepare_layer(1000.0, grid(&[]), &options()), Err(LoadError::Empty));
        assert_eq!(prepare_layer(0.0, four(), &options()), Err(LoadError::InvalidResolution(0.0)));
    }

    #[test]
    fn failed_load_leaves_cache_untouched() {
        let mut store = PointCloudStore::new();
        store.load(1000.0, four(), &options()).unwrap();
        let bad = grid(&[[f64::NAN, 0.0, 1.0]]);
        assert!(store.load(1000.0, bad, &options()).is_err());
        assert_eq!(store.cache().get(1000.0).map(|l| l.len()), Some(4));
    }

    #[test]
    fn build_buffers_writes_parallel_arrays_and_cell_colors() {
        let mut store = PointCloudStore::new();
        store.load(1000.0, four(), &options()).unwrap();
        let inactive = ScaleEngine::build(store.cache().get(1000.0).unwrap(), &ScaleConfig::new("pop")).unwrap();
        assert_eq!(store.build_buffers(&inactive), Err(CacheError::NoActiveResolution));

        store.activate(1000.0).unwrap();
        let scales = ScaleEngine::build(store.active_layer().unwrap(), &ScaleConfig::new("pop")).unwrap();
        store.build_buffers(&scales).unwrap();

        let b = store.buffers();
        assert_eq!((b.positions().len(), b.colors().len(), b.sizes().len()), (12, 12, 4));
        assert_eq!(b.position(3), Some([1000.0, 1000.0, POINT_Z]));
        assert_eq!(b.sizes(), &[1000.0; 4]);
        for i in 0..4 {
            assert_eq!(b.color(i), store.cell_at(i).map(|c| c.color));
        }
    }

    #[test]
    fn nan_values_draw_black() {
        let mut store = PointCloudStore::new();
        store
            .load(1000.0, grid(&[[0.0, 0.0, 1.0], [1.0, 0.0, f64::NAN], [2.0, 0.0, 3.0]]), &options())
            .unwrap();
        store.activate(1000.0).unwrap();
        let scales = ScaleEngine::build(store.active_layer().unwrap(), &ScaleConfig::new("pop")).unwrap();
        store.build_buffers(&scales).unwrap();
        assert_eq!(store.buffers().color(1), Some(Rgb::BLACK));
        assert_eq!(store.cell_at(1).map(|c| c.color), Some(Rgb::BLACK));
    }

    #[test]
    fn update_colors_keeps_positions() {
        let mut store = PointCloudStore::new();
        store.load(1000.0, four(), &options()).unwrap();
        store.activate(1000.0).unwrap();
        let mut config = ScaleConfig::new("pop");
        let scales = ScaleEngine::build(store.active_layer().unwrap(), &config).unwrap();
        store.build_buffers(&scales).unwrap();
        store.buffers_mut().take_dirty();
        let positions = store.buffers().positions().to_vec();
        let first = store.buffers().color(0);

        config.reverse = true;
        let reversed = ScaleEngine::build(store.active_layer().unwrap(), &config).unwrap();
        store.update_colors(&reversed).unwrap();

        assert_eq!(store.buffers().positions(), &positions[..]);
        assert_eq!(store.buffers().color(3), first);
        assert!(!store.buffers().dirty().positions);
        assert!(store.buffers().dirty().colors);
    }

    #[test]
    fn update_sizes_applies_size_field() {
        let mut store = PointCloudStore::new();
        store.load(1000.0, four(), &options()).unwrap();
        store.activate(1000.0).unwrap();
        let mut config = ScaleConfig::new("pop");
        store
            .build_buffers(&ScaleEngine::build(store.active_layer().unwrap(), &config).unwrap())
            .unwrap();
        config.size_field = Some("pop".into());
        let sized = ScaleEngine::build(store.active_layer().unwrap(), &config).unwrap();
        store.update_sizes(&sized).unwrap();
        let sizes = store.buffers().sizes();
        assert!((sizes[0] - 1000.0 / 3.0).abs() < 1e-3);
        assert!((sizes[3] - 1000.0 / 1.5).abs() < 1e-3);
    }

    #[test]
    fn normalized_mode_rescales_coordinates_and_resolution() {
        let mut o = options();
        o.mode = CoordinateMode::Normalized;
        let layer = prepare_layer(1000.0, four(), &o).unwrap();
        assert!(layer.space.is_normalized());
        assert_eq!(layer.source_resolution, 1000.0);
        assert_eq!(layer.resolution, 2.0);
        assert_eq!((layer.cells[0].x, layer.cells[0].y), (-1.0, -1.0));
        assert_eq!((layer.cells[3].x, layer.cells[3].y), (1.0, 1.0));

        let p = layer.space.to_external(layer.cells[1].position());
        assert_eq!((p.x, p.y), (1000.0, 0.0));
    }

    #[test]
    fn csv_grid_loads_through_store() {
        let csv = "x,y,pop\n4000,2000,5\n4001,2000,\n";
        let data = formats::decode_grid_csv(csv.as_bytes()).unwrap();
        let mut store = PointCloudStore::new();
        let summary = store.load(1.0, data, &options()).unwrap();
        assert_eq!(summary.cells, 2);
        assert!(!summary.replaced);
        assert!(store.load(1.0, four(), &options()).unwrap().replaced);
    }
}
