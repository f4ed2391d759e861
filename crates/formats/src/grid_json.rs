use std::io::Read;

use serde_json::Value;
use streaming::cache::GridData;
use tracing::debug;

use crate::grid_csv::GridDecodeError;

/// Decodes a JSON array of flat records. Fields are the keys of the first
/// record; numbers and numeric strings are read, anything else is NaN.
pub fn decode_grid_json<R: Read>(reader: R) -> Result<GridData, GridDecodeError> {
    let value: Value = serde_json::from_reader(reader)?;
    let Value::Array(records) = value else {
        return Err(GridDecodeError::NotARecordArray);
    };
    let Some(Value::Object(first)) = records.first() else {
        return Err(GridDecodeError::MissingHeader);
    };

    let mut grid = GridData::new(first.keys().cloned().collect());
    for record in &records {
        let Value::Object(map) = record else {
            return Err(GridDecodeError::NotARecordArray);
        };
        let row = grid
            .fields
            .iter()
            .map(|f| map.get(f).map_or(f64::NAN, numeric))
            .collect();
        grid.push_row(row);
    }
    debug!(fields = grid.fields.len(), rows = grid.len(), "decoded json grid");
    Ok(grid)
}

fn numeric(v: &Value) -> f64 {
    match v {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => s.trim().parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

#[cfg(test)]
mod tests {
    use super::decode_grid_json;
    use crate::grid_csv::GridDecodeError;

    #[test]
    fn reads_numbers_and_numeric_strings() {
        let g = decode_grid_json(
            r#"[{"x": 1, "y": "2", "pop": 3.5}, {"x": 4, "y": 5, "pop": null}]"#.as_bytes(),
        )
        .unwrap();
        assert_eq!(g.len(), 2);
        assert_eq!(g.value(0, "y"), Some(2.0));
        assert_eq!(g.value(0, "pop"), Some(3.5));
        assert!(g.value(1, "pop").is_some_and(f64::is_nan));
    }

    #[test]
    fn rejects_non_arrays() {
        assert!(matches!(
            decode_grid_json(r#"{"x": 1}"#.as_bytes()),
            Err(GridDecodeError::NotARecordArray)
        ));
        assert!(matches!(
            decode_grid_json("[]".as_bytes()),
            Err(GridDecodeError::MissingHeader)
        ));
    }
}
