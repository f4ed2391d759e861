//! Population-filtered placename queries for the current view.
//!
//! The viewer only builds the request; fetching and drawing labels is left to
//! the embedding application.

use foundation::bounds::Aabb2;
use serde::{Deserialize, Serialize};
use url::{ParseError, Url};

/// Minimum population shown once the camera is at least `scale` away.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulationThreshold {
    pub scale: f64,
    pub min_population: u64,
}

const DEFAULT_STEPS: [(f64, u64); 11] = [
    (1.0, 10),
    (2.0, 1_000),
    (4.0, 5_000),
    (8.0, 10_000),
    (16.0, 100_000),
    (32.0, 500_000),
    (64.0, 1_000_000),
    (128.0, 1_000_000),
    (256.0, 2_000_000),
    (512.0, 2_000_000),
    (1024.0, 2_000_000),
];

/// Breakpoints expressed as multiples of the grid resolution.
pub fn default_population_thresholds(resolution: f64) -> Vec<PopulationThreshold> {
    DEFAULT_STEPS
        .iter()
        .map(|&(factor, min_population)| PopulationThreshold {
            scale: factor * resolution,
            min_population,
        })
        .collect()
}

/// Population floor for `scale`. `thresholds` must be sorted by scale.
///
/// Below the first breakpoint the first value applies; at or past the last,
/// the last value applies.
pub fn population_for_scale(thresholds: &[PopulationThreshold], scale: f64) -> Option<u64> {
    let first = thresholds.first()?;
    if !(scale >= first.scale) {
        return Some(first.min_population);
    }
    let idx = thresholds.partition_point(|t| t.scale <= scale);
    thresholds.get(idx - 1).map(|t| t.min_population)
}

/// Attribute names of the placename service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlacenameFields {
    pub population: String,
    pub country: String,
    pub name: String,
}

impl Default for PlacenameFields {
    fn default() -> Self {
        Self {
            population: "POPL_2011".into(),
            country: "CNTR_CODE".into(),
            name: "STTL_NAME".into(),
        }
    }
}

pub fn where_clause(fields: &PlacenameFields, country: Option<&str>, min_population: u64) -> String {
    let filter = format!("{} > {min_population}", fields.population);
    match country {
        Some(cc) => format!("{} = '{cc}' AND {filter}", fields.country),
        None => filter,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacenameQuery {
    /// View envelope in external coordinates.
    pub envelope: Aabb2,
    pub where_clause: String,
    pub epsg: u32,
    pub out_fields: Vec<String>,
}

impl PlacenameQuery {
    pub fn new(
        envelope: Aabb2,
        scale: f64,
        thresholds: &[PopulationThreshold],
        fields: &PlacenameFields,
        country: Option<&str>,
        epsg: u32,
    ) -> Option<Self> {
        let min_population = population_for_scale(thresholds, scale)?;
        Some(Self {
            envelope,
            where_clause: where_clause(fields, country, min_population),
            epsg,
            out_fields: vec![fields.name.clone(), fields.population.clone()],
        })
    }

    /// Feature-query URL against the service endpoint `base`.
    pub fn to_url(&self, base: &str) -> Result<String, ParseError> {
        let e = &self.envelope;
        let epsg = self.epsg.to_string();
        let mut url = Url::parse(base)?;
        url.query_pairs_mut()
            .append_pair("where", &self.where_clause)
            .append_pair("outSR", &epsg)
            .append_pair("inSR", &epsg)
            .append_pair(
                "geometry",
                &format!("{},{},{},{}", e.min[0], e.min[1], e.max[0], e.max[1]),
            )
            .append_pair("geometryType", "esriGeometryEnvelope")
            .append_pair("f", "json")
            .append_pair("outFields", &self.out_fields.join(","));
        Ok(url.into())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        PlacenameFields, PlacenameQuery, PopulationThreshold, default_population_thresholds,
        population_for_scale, where_clause,
    };
    use foundation::bounds::Aabb2;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_table_lookup() {
        let t = default_population_thresholds(1000.0);
        assert_eq!(t.len(), 11);
        assert_eq!(population_for_scale(&t, 10.0), Some(10));
        assert_eq!(population_for_scale(&t, 1000.0), Some(10));
        assert_eq!(population_for_scale(&t, 1999.0), Some(10));
        assert_eq!(population_for_scale(&t, 2000.0), Some(1_000));
        assert_eq!(population_for_scale(&t, 20_000.0), Some(100_000));
        assert_eq!(population_for_scale(&t, 1e9), Some(2_000_000));
        assert_eq!(population_for_scale(&[], 5.0), None);
    }

    #[test]
    fn user_table_overrides() {
        let t = vec![
            PopulationThreshold { scale: 100.0, min_population: 1 },
            PopulationThreshold { scale: 200.0, min_population: 2 },
        ];
        assert_eq!(population_for_scale(&t, 150.0), Some(1));
        assert_eq!(population_for_scale(&t, 250.0), Some(2));
    }

    #[test]
    fn where_clause_with_country() {
        let f = PlacenameFields::default();
        assert_eq!(where_clause(&f, None, 5000), "POPL_2011 > 5000");
        assert_eq!(
            where_clause(&f, Some("FR"), 10),
            "CNTR_CODE = 'FR' AND POPL_2011 > 10"
        );
    }

    #[test]
    fn url_carries_envelope_and_projection() {
        let q = PlacenameQuery::new(
            Aabb2::new([1.0, 2.0], [3.0, 4.0]),
            1.0,
            &default_population_thresholds(1.0),
            &PlacenameFields::default(),
            Some("LU"),
            3035,
        )
        .unwrap();
        assert_eq!(
            q.to_url("https://example.org/query").as_deref(),
            Ok("https://example.org/query?where=CNTR_CODE+%3D+%27LU%27+AND+POPL_2011+%3E+10\
                &outSR=3035&inSR=3035&geometry=1%2C2%2C3%2C4&geometryType=esriGeometryEnvelope\
                &f=json&outFields=STTL_NAME%2CPOPL_2011")
        );
    }

    #[test]
    fn url_rejects_relative_base() {
        let q = PlacenameQuery::new(
            Aabb2::new([0.0, 0.0], [1.0, 1.0]),
            1.0,
            &default_population_thresholds(1.0),
            &PlacenameFields::default(),
            None,
            4326,
        )
        .unwrap();
        assert!(q.to_url("query").is_err());
    }
}
