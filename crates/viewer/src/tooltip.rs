use foundation::color::Rgb;
use serde::{Serialize, Serializer};
use url::{ParseError, Url};
use viewport::camera::Viewport;

const OFFSET_PX: [f64; 2] = [25.0, -10.0];
const FLIP_MARGIN_PX: f64 = 40.0;
const NOMINAL_HEIGHT_PX: f64 = 100.0;

/// Projections the region lookup service understands.
const LOOKUP_EPSG: [u32; 3] = [4326, 4258, 3035];

/// Data for the (external) tooltip widget describing one picked cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tooltip {
    pub index: usize,
    /// Color the cell was drawn with before it was highlighted.
    #[serde(serialize_with = "rgb_hex")]
    pub color: Rgb,
    pub field: String,
    pub value: f64,
    /// Cell position in external coordinates, rounded.
    pub x: f64,
    pub y: f64,
    pub epsg: u32,
    /// Top-left corner of the widget in container pixels.
    pub position_px: [f64; 2],
}

impl Tooltip {
    /// Places a widget of `width_px` next to the pointer, flipping left near
    /// the right edge and moving down when it would leave the top.
    pub fn placement(pointer_px: [f64; 2], width_px: f64, viewport: Viewport) -> [f64; 2] {
        let mut left = pointer_px[0] + OFFSET_PX[0];
        let mut top = pointer_px[1] + OFFSET_PX[1];
        if left > viewport.width_px - width_px {
            left -= width_px + FLIP_MARGIN_PX;
        }
        if top < 0.0 {
            top += NOMINAL_HEIGHT_PX;
        }
        [left, top]
    }

    /// NUTS and LAU lookup URLs for the cell, when the projection is supported.
    ///
    /// `base` is the lookup service directory and ends with `/`.
    pub fn secondary_lookups(&self, base: &str) -> Result<Vec<String>, ParseError> {
        if !LOOKUP_EPSG.contains(&self.epsg) {
            return Ok(Vec::new());
        }
        let base = Url::parse(base)?;
        [("nuts", "2021"), ("lau", "2019")]
            .into_iter()
            .map(|(service, year)| -> Result<String, ParseError> {
                let mut url = base.join(service)?;
                url.query_pairs_mut()
                    .append_pair("x", &self.x.to_string())
                    .append_pair("y", &self.y.to_string())
                    .append_pair("proj", &self.epsg.to_string())
                    .append_pair("year", year)
                    .append_pair("level", "3");
                Ok(url.into())
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "state", content = "tooltip", rename_all = "camelCase")]
pub enum TooltipState {
    #[default]
    Hidden,
    Visible(Tooltip),
}

impl TooltipState {
    pub fn is_visible(&self) -> bool {
        matches!(self, TooltipState::Visible(_))
    }

    pub fn tooltip(&self) -> Option<&Tooltip> {
        match self {
            TooltipState::Visible(t) => Some(t),
            TooltipState::Hidden => None,
        }
    }
}

fn rgb_hex<S: Serializer>(color: &Rgb, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&color.to_hex())
}

#[cfg(test)]
mod tests {
    use super::{Tooltip, TooltipState};
    use foundation::color::Rgb;
    use viewport::camera::Viewport;

    fn tooltip(epsg: u32) -> Tooltip {
        Tooltip {
            index: 3,
            color: Rgb::from_u8(255, 0, 0),
            field: "pop".into(),
            value: 40.0,
            x: 4_321_000.0,
            y: 3_210_000.0,
            epsg,
            position_px: [0.0, 0.0],
        }
    }

    #[test]
    fn placement_offsets_and_flips() {
        let vp = Viewport::new(800.0, 600.0);
        assert_eq!(Tooltip::placement([100.0, 100.0], 200.0, vp), [125.0, 90.0]);
        assert_eq!(Tooltip::placement([700.0, 100.0], 200.0, vp), [485.0, 90.0]);
        assert_eq!(Tooltip::placement([100.0, 5.0], 200.0, vp), [125.0, 95.0]);
    }

    #[test]
    fn lookups_only_for_supported_projections() {
        let urls = tooltip(3035).secondary_lookups("https://lookup.example/");
        assert_eq!(
            urls,
            Ok(vec![
                "https://lookup.example/nuts?x=4321000&y=3210000&proj=3035&year=2021&level=3"
                    .to_string(),
                "https://lookup.example/lau?x=4321000&y=3210000&proj=3035&year=2019&level=3"
                    .to_string(),
            ])
        );
        assert_eq!(tooltip(3857).secondary_lookups("b/"), Ok(Vec::new()));
        assert!(tooltip(3035).secondary_lookups("b/").is_err());
    }

    #[test]
    fn serializes_for_the_ui() {
        let json = serde_json::to_value(TooltipState::Visible(tooltip(3035))).unwrap();
        assert_eq!(json["state"], "visible");
        assert_eq!(json["tooltip"]["color"], "#ff0000");
        assert_eq!(json["tooltip"]["positionPx"][0], 0.0);
        assert_eq!(serde_json::to_value(TooltipState::Hidden).unwrap()["state"], "hidden");
    }
}
