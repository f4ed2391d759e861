use std::fs::File;
use std::io::Read;
use std::path::Path;

use streaming::cache::GridData;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum GridDecodeError {
    #[error("grid has no header row")]
    MissingHeader,
    #[error("grid records must be a JSON array of objects")]
    NotARecordArray,
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Decodes comma-separated records whose first row names the fields.
///
/// Every value is read as `f64`; empty or non-numeric values become NaN so a
/// sparse column never aborts the load.
pub fn decode_grid_csv<R: Read>(reader: R) -> Result<GridData, GridDecodeError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let fields: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    if fields.is_empty() || fields.iter().all(String::is_empty) {
        return Err(GridDecodeError::MissingHeader);
    }

    let mut grid = GridData::new(fields);
    let width = grid.fields.len();
    for record in rdr.records() {
        let record = record?;
        grid.push_row((0..width).map(|i| parse_value(record.get(i))).collect());
    }
    debug!(fields = width, rows = grid.len(), "decoded csv grid");
    Ok(grid)
}

pub fn read_grid_csv(path: impl AsRef<Path>) -> Result<GridData, GridDecodeError> {
    let path = path.as_ref();
    let grid = decode_grid_csv(File::open(path)?)?;
    info!(path = %path.display(), rows = grid.len(), "read grid");
    Ok(grid)
}

fn parse_value(raw: Option<&str>) -> f64 {
    raw.and_then(|s| s.parse::<f64>().ok()).unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::{GridDecodeError, decode_grid_csv};
    use pretty_assertions::assert_eq;

    #[test]
    fn header_names_fields() {
        let g = decode_grid_csv("x,y,pop\n1,2,3\n4,5,6\n".as_bytes()).unwrap();
        assert_eq!(g.fields, vec!["x", "y", "pop"]);
        assert_eq!(g.rows, vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
    }

    #[test]
    fn missing_and_text_values_are_nan() {
        let g = decode_grid_csv("x, y ,pop\n1,2,\n3,4,n/a\n5,6\n".as_bytes()).unwrap();
        assert_eq!(g.fields, vec!["x", "y", "pop"]);
        assert!(g.rows.iter().all(|r| r.len() == 3 && r[2].is_nan()));
        assert_eq!(g.value(2, "x"), Some(5.0));
    }

    #[test]
    fn empty_input_has_no_header() {
        assert!(matches!(
            decode_grid_csv("".as_bytes()),
            Err(GridDecodeError::MissingHeader)
        ));
    }
}
