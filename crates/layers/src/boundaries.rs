use serde::{Deserialize, Serialize};
use url::{ParseError, Url};

/// Nuts2json topology root.
pub const NUTS2JSON_BASE: &str = "https://raw.githubusercontent.com/eurostat/Nuts2json/master/pub/v2/2021/";

/// Region id dropped when no country filter is set.
const EXCLUDED_REGION: &str = "TR";

/// Administrative boundary topology to overlay on the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundaryRequest {
    pub epsg: u32,
    /// Nuts2json simplification level, e.g. `"10M"` or `"20M"`.
    pub simplification: String,
    pub level: u8,
    pub country: Option<String>,
}

impl BoundaryRequest {
    /// Topology file under the directory `base`, which ends with `/`.
    pub fn url(&self, base: &str) -> Result<String, ParseError> {
        let path = format!("{}/{}/{}.json", self.epsg, self.simplification, self.level);
        Ok(Url::parse(base)?.join(&path)?.into())
    }

    /// Whether a region with `id` is drawn.
    pub fn retains(&self, id: &str) -> bool {
        match &self.country {
            Some(cc) => id.contains(cc.as_str()),
            None => id != EXCLUDED_REGION,
        }
    }

    pub fn filter_regions<'a, I>(&self, ids: I) -> Vec<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        ids.into_iter().filter(|id| self.retains(id)).collect()
    }
}
