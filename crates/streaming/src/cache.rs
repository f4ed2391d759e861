use std::collections::BTreeMap;

use foundation::bounds::Aabb2;
use foundation::color::Rgb;
use foundation::math::{StableF64, Vec2, finite_extent};
use foundation::space::CoordinateSpace;
use thiserror::Error;

/// Decoded tabular grid: one column per field, every value numeric.
///
/// Values that were empty or non-numeric in the source are NaN.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridData {
    pub fields: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl GridData {
    pub fn new(fields: Vec<String>) -> Self {
        Self {
            fields,
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<f64>) {
        self.rows.push(row);
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn value(&self, row: usize, field: &str) -> Option<f64> {
        let idx = self.field_index(field)?;
        self.rows.get(row)?.get(idx).copied()
    }
}

/// One grid cell.
///
/// `values` follows the owning layer's `fields`; `color` is the color last
/// written to the render buffers for this cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub x: f64,
    pub y: f64,
    pub values: Vec<f64>,
    pub color: Rgb,
}

impl Cell {
    pub fn new(x: f64, y: f64, values: Vec<f64>) -> Self {
        Self {
            x,
            y,
            values,
            color: Rgb::BLACK,
        }
    }

    /// Value of field `index`, NaN when the record had no such column.
    pub fn value(&self, index: usize) -> f64 {
        self.values.get(index).copied().unwrap_or(f64::NAN)
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// All cells loaded for one resolution, in world coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct GridLayer {
    /// Cell size as requested by the caller, in data units. Cache key.
    pub source_resolution: f64,
    /// Cell size in world units.
    pub resolution: f64,
    pub space: CoordinateSpace,
    pub fields: Vec<String>,
    pub cells: Vec<Cell>,
}

impl GridLayer {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == name)
    }

    pub fn field_values(&self, index: usize) -> impl Iterator<Item = f64> + '_ {
        self.cells.iter().map(move |c| c.value(index))
    }

    /// `[min, max]` over the finite values of a field.
    pub fn extent(&self, name: &str) -> Option<[f64; 2]> {
        let idx = self.field_index(name)?;
        finite_extent(self.field_values(idx))
    }

    pub fn bounds(&self) -> Option<Aabb2> {
        Aabb2::from_points(self.cells.iter().map(Cell::position))
    }

    /// The cell at `len / 2` in cache order.
    pub fn middle_cell(&self) -> Option<&Cell> {
        self.cells.get(self.cells.len() / 2)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CacheError {
    #[error("no grid cached for resolution {resolution}")]
    UnknownResolution { resolution: f64 },
    #[error("no active resolution")]
    NoActiveResolution,
}

/// Per-resolution grid cache with exactly one active entry.
///
/// Notes:
/// - Entries are keyed in a `BTreeMap` by source resolution for stable
///   traversal order.
/// - Inserting an existing resolution replaces the whole entry; cells are
///   never merged across loads.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: BTreeMap<StableF64, GridLayer>,
    active: Option<StableF64>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, resolution: f64) -> bool {
        self.entries.contains_key(&StableF64(resolution))
    }

    /// Stores `layer`, returning the entry it replaced.
    pub fn insert(&mut self, layer: GridLayer) -> Option<GridLayer> {
        self.entries
            .insert(StableF64(layer.source_resolution), layer)
    }

    pub fn get(&self, resolution: f64) -> Option<&GridLayer> {
        self.entries.get(&StableF64(resolution))
    }

    pub fn remove(&mut self, resolution: f64) -> Option<GridLayer> {
        let key = StableF64(resolution);
        if self.active == Some(key) {
            self.active = None;
        }
        self.entries.remove(&key)
    }

    /// Cached source resolutions in ascending order.
    pub fn resolutions(&self) -> Vec<f64> {
        self.entries.keys().map(|k| k.0).collect()
    }

    pub fn activate(&mut self, resolution: f64) -> Result<(), CacheError> {
        let key = StableF64(resolution);
        if !self.entries.contains_key(&key) {
            return Err(CacheError::UnknownResolution { resolution });
        }
        self.active = Some(key);
        Ok(())
    }

    pub fn active_resolution(&self) -> Option<f64> {
        self.active.map(|k| k.0)
    }

    pub fn active(&self) -> Option<&GridLayer> {
        self.entries.get(&self.active?)
    }

    pub fn active_mut(&mut self) -> Option<&mut GridLayer> {
        let key = self.active?;
        self.entries.get_mut(&key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.active = None;
    }
}

#[cfg(test)]
mod tests {
    use super::{CacheError, Cell, GridData, GridLayer, ResolutionCache};
    use foundation::space::CoordinateSpace;

    fn layer(resolution: f64, xs: &[f64]) -> GridLayer {
        GridLayer {
            source_resolution: resolution,
            resolution,
            space: CoordinateSpace::native(0),
            fields: vec!["pop".to_string()],
            cells: xs
                .iter()
                .map(|x| Cell::new(*x, 0.0, vec![*x * 10.0]))
                .collect(),
        }
    }

    #[test]
    fn reload_replaces_entry() {
        let mut cache = ResolutionCache::new();
        assert!(cache.insert(layer(1000.0, &[1.0, 2.0, 3.0])).is_none());
        let old = cache.insert(layer(1000.0, &[7.0])).expect("replaced");
        assert_eq!(old.len(), 3);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(1000.0).map(GridLayer::len), Some(1));
    }

    #[test]
    fn activate_requires_entry() {
        let mut cache = ResolutionCache::new();
        assert_eq!(
            cache.activate(5000.0),
            Err(CacheError::UnknownResolution { resolution: 5000.0 })
        );
        cache.insert(layer(5000.0, &[1.0]));
        cache.insert(layer(1000.0, &[1.0, 2.0]));
        cache.activate(5000.0).unwrap();
        assert_eq!(cache.active_resolution(), Some(5000.0));
        assert_eq!(cache.active().map(GridLayer::len), Some(1));
        assert_eq!(cache.resolutions(), vec![1000.0, 5000.0]);

        cache.remove(5000.0);
        assert!(cache.active().is_none());
    }

    #[test]
    fn layer_extent_and_middle_cell() {
        let l = layer(1000.0, &[4.0, 1.0, f64::NAN, 3.0]);
        assert_eq!(l.extent("pop"), Some([10.0, 40.0]));
        assert_eq!(l.extent("missing"), None);
        assert!(l.middle_cell().is_some_and(|c| c.x.is_nan()));
        assert!(l.cells[0].value(5).is_nan());
    }

    #[test]
    fn grid_data_lookup_by_name() {
        let mut g = GridData::new(vec!["x".into(), "y".into(), "pop".into()]);
        g.push_row(vec![1.0, 2.0, 3.0]);
        assert_eq!(g.value(0, "pop"), Some(3.0));
        assert_eq!(g.value(0, "nope"), None);
        assert_eq!(g.value(1, "x"), None);
    }
}
