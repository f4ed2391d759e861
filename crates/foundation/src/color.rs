//! Linear-interpolable RGB triples and CSS-style color parsing.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid color {input:?}")]
pub struct ColorParseError {
    pub input: String,
}

/// An RGB color with channels in `[0, 1]`, matching the render attribute layout.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

const NAMED: &[(&str, u32)] = &[
    ("black", 0x000000),
    ("white", 0xffffff),
    ("red", 0xff0000),
    ("green", 0x008000),
    ("lime", 0x00ff00),
    ("blue", 0x0000ff),
    ("navy", 0x000080),
    ("cyan", 0x00ffff),
    ("aqua", 0x00ffff),
    ("teal", 0x008080),
    ("magenta", 0xff00ff),
    ("fuchsia", 0xff00ff),
    ("purple", 0x800080),
    ("yellow", 0xffff00),
    ("olive", 0x808000),
    ("orange", 0xffa500),
    ("maroon", 0x800000),
    ("brown", 0xa52a2a),
    ("pink", 0xffc0cb),
    ("gray", 0x808080),
    ("grey", 0x808080),
    ("silver", 0xc0c0c0),
    ("lightgray", 0xd3d3d3),
    ("lightgrey", 0xd3d3d3),
    ("darkgray", 0xa9a9a9),
    ("darkgrey", 0xa9a9a9),
];

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);
    pub const WHITE: Rgb = Rgb::new(1.0, 1.0, 1.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn from_u8(r: u8, g: u8, b: u8) -> Self {
        Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
    }

    /// `0xRRGGBB`.
    pub fn from_hex(hex: u32) -> Self {
        Self::from_u8((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }

    /// Channels given on the 0-255 scale, rounded and clamped the way CSS does.
    pub fn from_255(r: f64, g: f64, b: f64) -> Self {
        let c = |v: f64| v.round().clamp(0.0, 255.0) as u8;
        Self::from_u8(c(r), c(g), c(b))
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    pub fn from_array(c: [f32; 3]) -> Self {
        Self::new(c[0], c[1], c[2])
    }

    pub fn is_finite(self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite()
    }

    pub fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let t = t as f32;
        Rgb::new(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
        )
    }

    /// Parses `#rgb`, `#rrggbb`, `rgb(r, g, b)` and a small set of CSS color names.
    pub fn parse(input: &str) -> Result<Self, ColorParseError> {
        let err = || ColorParseError {
            input: input.to_string(),
        };
        let s = input.trim();
        let lower = s.to_ascii_lowercase();

        if let Some(hex) = lower.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(err);
        }
        if let Some(body) = lower
            .strip_prefix("rgb(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let channels: Vec<f64> = body
                .split(',')
                .map(|c| c.trim().parse::<f64>())
                .collect::<Result<_, _>>()
                .map_err(|_| err())?;
            let [r, g, b] = channels[..] else {
                return Err(err());
            };
            if !(r.is_finite() && g.is_finite() && b.is_finite()) {
                return Err(err());
            }
            return Ok(Rgb::from_255(r, g, b));
        }
        NAMED
            .iter()
            .find(|(name, _)| *name == lower)
            .map(|(_, hex)| Rgb::from_hex(*hex))
            .ok_or_else(err)
    }

    /// `#rrggbb`, channels rounded to the nearest byte.
    pub fn to_hex(self) -> String {
        let b = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        format!("#{:02x}{:02x}{:02x}", b(self.r), b(self.g), b(self.b))
    }
}

fn parse_hex(hex: &str) -> Option<Rgb> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        3 => {
            let v = u32::from_str_radix(hex, 16).ok()?;
            let expand = |n: u32| ((n & 0xf) * 0x11) as u8;
            Some(Rgb::from_u8(expand(v >> 8), expand(v >> 4), expand(v)))
        }
        6 => u32::from_str_radix(hex, 16).ok().map(Rgb::from_hex),
        _ => None,
    }
}

impl FromStr for Rgb {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rgb::parse(s)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::Rgb;

    #[test]
    fn parses_hex_forms() {
        assert_eq!(Rgb::parse("#000").unwrap(), Rgb::BLACK);
        assert_eq!(Rgb::parse("#ffffff").unwrap(), Rgb::WHITE);
        assert_eq!(Rgb::parse("#0F0").unwrap(), Rgb::new(0.0, 1.0, 0.0));
        assert!(Rgb::parse("#12345").is_err());
        assert!(Rgb::parse("#zzzzzz").is_err());
    }

    #[test]
    fn parses_names_and_rgb_function() {
        assert_eq!(Rgb::parse("cyan").unwrap(), Rgb::new(0.0, 1.0, 1.0));
        assert_eq!(Rgb::parse(" Cyan ").unwrap(), Rgb::new(0.0, 1.0, 1.0));
        assert_eq!(
            Rgb::parse("rgb(255, 0, 127.6)").unwrap(),
            Rgb::from_u8(255, 0, 128)
        );
        assert!(Rgb::parse("rgb(NaN, NaN, NaN)").is_err());
        assert!(Rgb::parse("rgb(1, 2)").is_err());
        assert!(Rgb::parse("not-a-color").is_err());
    }

    #[test]
    fn hex_output_round_trips_bytes() {
        let c = Rgb::from_u8(18, 52, 86);
        assert_eq!(c.to_hex(), "#123456");
        assert_eq!(c.to_string().parse::<Rgb>().unwrap(), c);
    }

    #[test]
    fn lerp_midpoint() {
        let mid = Rgb::BLACK.lerp(Rgb::WHITE, 0.5);
        assert_eq!(mid, Rgb::new(0.5, 0.5, 0.5));
    }
}
