//! Named perceptual color interpolators.
//!
//! Every ramp maps `t ∈ [0, 1]` to a color; `t` outside that range is
//! clamped and NaN has no color. Names are matched case-insensitively and
//! may carry an `interpolate` prefix, so `interpolateTurbo`, `Turbo` and
//! `turbo` all resolve to the same ramp.

use std::f64::consts::PI;

use foundation::color::Rgb;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RampError {
    #[error("unknown color scheme {0:?}")]
    UnknownScheme(String),
}

#[derive(Debug, Copy, Clone, PartialEq)]
enum RampKind {
    Turbo,
    Sinebow,
    Rainbow,
    /// Long-way cubehelix interpolation between two `(h, s, l)` endpoints.
    Cubehelix([f64; 3], [f64; 3]),
    /// Evenly spaced color stops, linearly interpolated.
    Stops(&'static [u32]),
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ColorRamp {
    name: &'static str,
    kind: RampKind,
}

const BLUES: &[u32] = &[0xf7fbff, 0xdeebf7, 0xc6dbef, 0x9ecae1, 0x6baed6, 0x4292c6, 0x2171b5, 0x08519c, 0x08306b];
const GREENS: &[u32] = &[0xf7fcf5, 0xe5f5e0, 0xc7e9c0, 0xa1d99b, 0x74c476, 0x41ab5d, 0x238b45, 0x006d2c, 0x00441b];
const GREYS: &[u32] = &[0xffffff, 0xf0f0f0, 0xd9d9d9, 0xbdbdbd, 0x969696, 0x737373, 0x525252, 0x252525, 0x000000];
const ORANGES: &[u32] = &[0xfff5eb, 0xfee6ce, 0xfdd0a2, 0xfdae6b, 0xfd8d3c, 0xf16913, 0xd94801, 0xa63603, 0x7f2704];
const PURPLES: &[u32] = &[0xfcfbfd, 0xefedf5, 0xdadaeb, 0xbcbddc, 0x9e9ac8, 0x807dba, 0x6a51a3, 0x54278f, 0x3f007d];
const REDS: &[u32] = &[0xfff5f0, 0xfee0d2, 0xfcbba1, 0xfc9272, 0xfb6a4a, 0xef3b2c, 0xcb181d, 0xa50f15, 0x67000d];

const BU_GN: &[u32] = &[0xf7fcfd, 0xe5f5f9, 0xccece6, 0x99d8c9, 0x66c2a4, 0x41ae76, 0x238b45, 0x006d2c, 0x00441b];
const BU_PU: &[u32] = &[0xf7fcfd, 0xe0ecf4, 0xbfd3e6, 0x9ebcda, 0x8c96c6, 0x8c6bb1, 0x88419d, 0x810f7c, 0x4d004b];
const GN_BU: &[u32] = &[0xf7fcf0, 0xe0f3db, 0xccebc5, 0xa8ddb5, 0x7bccc4, 0x4eb3d3, 0x2b8cbe, 0x0868ac, 0x084081];
const OR_RD: &[u32] = &[0xfff7ec, 0xfee8c8, 0xfdd49e, 0xfdbb84, 0xfc8d59, 0xef6548, 0xd7301f, 0xb30000, 0x7f0000];
const PU_BU_GN: &[u32] = &[0xfff7fb, 0xece2f0, 0xd0d1e6, 0xa6bddb, 0x67a9cf, 0x3690c0, 0x02818a, 0x016c59, 0x014636];
const PU_BU: &[u32] = &[0xfff7fb, 0xece7f2, 0xd0d1e6, 0xa6bddb, 0x74a9cf, 0x3690c0, 0x0570b0, 0x045a8d, 0x023858];
const PU_RD: &[u32] = &[0xf7f4f9, 0xe7e1ef, 0xd4b9da, 0xc994c7, 0xdf65b0, 0xe7298a, 0xce1256, 0x980043, 0x67001f];
const RD_PU: &[u32] = &[0xfff7f3, 0xfde0dd, 0xfcc5c0, 0xfa9fb5, 0xf768a1, 0xdd3497, 0xae017e, 0x7a0177, 0x49006a];
const YL_GN_BU: &[u32] = &[0xffffd9, 0xedf8b1, 0xc7e9b4, 0x7fcdbb, 0x41b6c4, 0x1d91c0, 0x225ea8, 0x253494, 0x081d58];
const YL_GN: &[u32] = &[0xffffe5, 0xf7fcb9, 0xd9f0a3, 0xaddd8e, 0x78c679, 0x41ab5d, 0x238443, 0x006837, 0x004529];
const YL_OR_BR: &[u32] = &[0xffffe5, 0xfff7bc, 0xfee391, 0xfec44f, 0xfe9929, 0xec7014, 0xcc4c02, 0x993404, 0x662506];
const YL_OR_RD: &[u32] = &[0xffffcc, 0xffeda0, 0xfed976, 0xfeb24c, 0xfd8d3c, 0xfc4e2a, 0xe31a1c, 0xbd0026, 0x800026];

const BR_BG: &[u32] = &[0x543005, 0x8c510a, 0xbf812d, 0xdfc27d, 0xf6e8c3, 0xf5f5f5, 0xc7eae5, 0x80cdc1, 0x35978f, 0x01665e, 0x003c30];
const PR_GN: &[u32] = &[0x40004b, 0x762a83, 0x9970ab, 0xc2a5cf, 0xe7d4e8, 0xf7f7f7, 0xd9f0d3, 0xa6dba0, 0x5aae61, 0x1b7837, 0x00441b];
const PI_YG: &[u32] = &[0x8e0152, 0xc51b7d, 0xde77ae, 0xf1b6da, 0xfde0ef, 0xf7f7f7, 0xe6f5d0, 0xb8e186, 0x7fbc41, 0x4d9221, 0x276419];
const PU_OR: &[u32] = &[0x2d004b, 0x542788, 0x8073ac, 0xb2abd2, 0xd8daeb, 0xf7f7f7, 0xfee0b6, 0xfdb863, 0xe08214, 0xb35806, 0x7f3b08];
const RD_BU: &[u32] = &[0x67001f, 0xb2182b, 0xd6604d, 0xf4a582, 0xfddbc7, 0xf7f7f7, 0xd1e5f0, 0x92c5de, 0x4393c3, 0x2166ac, 0x053061];
const RD_GY: &[u32] = &[0x67001f, 0xb2182b, 0xd6604d, 0xf4a582, 0xfddbc7, 0xffffff, 0xe0e0e0, 0xbababa, 0x878787, 0x4d4d4d, 0x1a1a1a];
const RD_YL_BU: &[u32] = &[0xa50026, 0xd73027, 0xf46d43, 0xfdae61, 0xfee090, 0xffffbf, 0xe0f3f8, 0xabd9e9, 0x74add1, 0x4575b4, 0x313695];
const RD_YL_GN: &[u32] = &[0xa50026, 0xd73027, 0xf46d43, 0xfdae61, 0xfee08b, 0xffffbf, 0xd9ef8b, 0xa6d96a, 0x66bd63, 0x1a9850, 0x006837];
const SPECTRAL: &[u32] = &[0x9e0142, 0xd53e4f, 0xf46d43, 0xfdae61, 0xfee08b, 0xffffbf, 0xe6f598, 0xabdda4, 0x66c2a5, 0x3288bd, 0x5e4fa2];

const VIRIDIS: &[u32] = &[0x440154, 0x472d7b, 0x3b528b, 0x2c728e, 0x21918c, 0x28ae80, 0x5ec962, 0xaddc30, 0xfde725];
const MAGMA: &[u32] = &[0x000004, 0x1c1044, 0x4f127b, 0x812581, 0xb5367a, 0xe55064, 0xfb8761, 0xfec287, 0xfcfdbf];
const INFERNO: &[u32] = &[0x000004, 0x1f0c48, 0x550f6d, 0x88226a, 0xba3655, 0xe35933, 0xf98e09, 0xf9cb35, 0xfcffa4];
const PLASMA: &[u32] = &[0x0d0887, 0x41049d, 0x6a00a8, 0x8f0da4, 0xb12a90, 0xcc4778, 0xe16462, 0xf2844b, 0xfca636, 0xfcce25, 0xf0f921];
const CIVIDIS: &[u32] = &[0x00224e, 0x123570, 0x3b496c, 0x575d6d, 0x707173, 0x8a8678, 0xa59c74, 0xc3b369, 0xe1cc55, 0xfee838];

const RAMPS: &[ColorRamp] = &[
    ColorRamp::stops("BrBG", BR_BG),
    ColorRamp::stops("PRGn", PR_GN),
    ColorRamp::stops("PiYG", PI_YG),
    ColorRamp::stops("PuOr", PU_OR),
    ColorRamp::stops("RdBu", RD_BU),
    ColorRamp::stops("RdGy", RD_GY),
    ColorRamp::stops("RdYlBu", RD_YL_BU),
    ColorRamp::stops("RdYlGn", RD_YL_GN),
    ColorRamp::stops("Spectral", SPECTRAL),
    ColorRamp::stops("Blues", BLUES),
    ColorRamp::stops("Greens", GREENS),
    ColorRamp::stops("Greys", GREYS),
    ColorRamp::stops("Oranges", ORANGES),
    ColorRamp::stops("Purples", PURPLES),
    ColorRamp::stops("Reds", REDS),
    ColorRamp {
        name: "Turbo",
        kind: RampKind::Turbo,
    },
    ColorRamp::stops("Viridis", VIRIDIS),
    ColorRamp::stops("Inferno", INFERNO),
    ColorRamp::stops("Magma", MAGMA),
    ColorRamp::stops("Plasma", PLASMA),
    ColorRamp::stops("Cividis", CIVIDIS),
    ColorRamp {
        name: "Warm",
        kind: RampKind::Cubehelix([-100.0, 0.75, 0.35], [80.0, 1.5, 0.8]),
    },
    ColorRamp {
        name: "Cool",
        kind: RampKind::Cubehelix([260.0, 0.75, 0.35], [80.0, 1.5, 0.8]),
    },
    ColorRamp {
        name: "CubehelixDefault",
        kind: RampKind::Cubehelix([300.0, 0.5, 0.0], [-240.0, 0.5, 1.0]),
    },
    ColorRamp::stops("BuGn", BU_GN),
    ColorRamp::stops("BuPu", BU_PU),
    ColorRamp::stops("GnBu", GN_BU),
    ColorRamp::stops("OrRd", OR_RD),
    ColorRamp::stops("PuBuGn", PU_BU_GN),
    ColorRamp::stops("PuBu", PU_BU),
    ColorRamp::stops("PuRd", PU_RD),
    ColorRamp::stops("RdPu", RD_PU),
    ColorRamp::stops("YlGnBu", YL_GN_BU),
    ColorRamp::stops("YlGn", YL_GN),
    ColorRamp::stops("YlOrBr", YL_OR_BR),
    ColorRamp::stops("YlOrRd", YL_OR_RD),
    ColorRamp {
        name: "Rainbow",
        kind: RampKind::Rainbow,
    },
    ColorRamp {
        name: "Sinebow",
        kind: RampKind::Sinebow,
    },
];

impl ColorRamp {
    /// Default ramp for continuous color scales.
    pub const DEFAULT_NAME: &'static str = "interpolateTurbo";

    const fn stops(name: &'static str, stops: &'static [u32]) -> Self {
        Self {
            name,
            kind: RampKind::Stops(stops),
        }
    }

    pub fn by_name(name: &str) -> Result<Self, RampError> {
        let trimmed = name.trim();
        let bare = match trimmed.get(..11) {
            Some(prefix) if prefix.eq_ignore_ascii_case("interpolate") => &trimmed[11..],
            _ => trimmed,
        };
        RAMPS
            .iter()
            .find(|r| r.name.eq_ignore_ascii_case(bare))
            .copied()
            .ok_or_else(|| RampError::UnknownScheme(name.to_string()))
    }

    pub fn turbo() -> Self {
        Self {
            name: "Turbo",
            kind: RampKind::Turbo,
        }
    }

    /// Canonical scheme names, in menu order.
    pub fn names() -> impl Iterator<Item = &'static str> {
        RAMPS.iter().map(|r| r.name)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn at(&self, t: f64) -> Option<Rgb> {
        if t.is_nan() {
            return None;
        }
        let t = t.clamp(0.0, 1.0);
        Some(match self.kind {
            RampKind::Turbo => turbo(t),
            RampKind::Sinebow => sinebow(t),
            RampKind::Rainbow => rainbow(t),
            RampKind::Cubehelix(a, b) => cubehelix(
                a[0] + (b[0] - a[0]) * t,
                a[1] + (b[1] - a[1]) * t,
                a[2] + (b[2] - a[2]) * t,
            ),
            RampKind::Stops(stops) => interpolate_stops(stops, t),
        })
    }
}

impl Default for ColorRamp {
    fn default() -> Self {
        Self::turbo()
    }
}

fn interpolate_stops(stops: &[u32], t: f64) -> Rgb {
    let n = stops.len();
    if n == 1 {
        return Rgb::from_hex(stops[0]);
    }
    let scaled = t * (n - 1) as f64;
    let i = (scaled.floor() as usize).min(n - 2);
    Rgb::from_hex(stops[i]).lerp(Rgb::from_hex(stops[i + 1]), scaled - i as f64)
}

fn turbo(t: f64) -> Rgb {
    let r = 34.61 + t * (1172.33 - t * (10793.56 - t * (33300.12 - t * (38394.49 - t * 14825.05))));
    let g = 23.31 + t * (557.33 + t * (1225.33 - t * (3574.96 - t * (1073.77 + t * 707.56))));
    let b = 27.2 + t * (3211.1 - t * (15327.97 - t * (27814.0 - t * (22569.18 - t * 6838.66))));
    Rgb::from_255(r, g, b)
}

fn sinebow(t: f64) -> Rgb {
    let t = (0.5 - t) * PI;
    let channel = |offset: f64| {
        let s = (t + offset).sin();
        255.0 * s * s
    };
    Rgb::from_255(channel(0.0), channel(PI / 3.0), channel(PI * 2.0 / 3.0))
}

fn rainbow(t: f64) -> Rgb {
    let ts = (t - 0.5).abs();
    cubehelix(360.0 * t - 100.0, 1.5 - 1.5 * ts, 0.8 - 0.9 * ts)
}

/// Cubehelix `(hue°, saturation, lightness)` to RGB.
fn cubehelix(h: f64, s: f64, l: f64) -> Rgb {
    const A: f64 = -0.14861;
    const B: f64 = 1.78277;
    const C: f64 = -0.29227;
    const D: f64 = -0.90649;
    const E: f64 = 1.97294;

    let h = (h + 120.0).to_radians();
    let amp = s * l * (1.0 - l);
    let (sin_h, cos_h) = h.sin_cos();
    Rgb::from_255(
        255.0 * (l + amp * (A * cos_h + B * sin_h)),
        255.0 * (l + amp * (C * cos_h + D * sin_h)),
        255.0 * (l + amp * (E * cos_h)),
    )
}

#[cfg(test)]
mod tests {
    use super::{ColorRamp, RampError};
    use foundation::color::Rgb;

    #[test]
    fn resolves_prefixed_and_bare_names() {
        let a = ColorRamp::by_name("interpolateTurbo").unwrap();
        let b = ColorRamp::by_name("turbo").unwrap();
        assert_eq!(a, b);
        assert_eq!(ColorRamp::by_name("InterpolateYlOrRd").unwrap().name(), "YlOrRd");
        assert_eq!(
            ColorRamp::by_name("interpolateNope"),
            Err(RampError::UnknownScheme("interpolateNope".to_string()))
        );
        assert_eq!(ColorRamp::names().count(), 38);
    }

    #[test]
    fn stop_ramps_hit_their_endpoints() {
        let blues = ColorRamp::by_name("Blues").unwrap();
        assert_eq!(blues.at(0.0), Some(Rgb::from_hex(0xf7fbff)));
        assert_eq!(blues.at(1.0), Some(Rgb::from_hex(0x08306b)));
        assert_eq!(blues.at(-3.0), blues.at(0.0));
        assert_eq!(blues.at(7.0), blues.at(1.0));
        assert_eq!(blues.at(f64::NAN), None);
    }

    #[test]
    fn turbo_endpoints() {
        let turbo = ColorRamp::turbo();
        assert_eq!(turbo.at(0.0), Some(Rgb::from_u8(35, 23, 27)));
        assert_eq!(turbo.at(1.0), Some(Rgb::from_u8(144, 12, 0)));
    }

    #[test]
    fn every_ramp_yields_finite_colors() {
        for name in ColorRamp::names() {
            let ramp = ColorRamp::by_name(name).unwrap();
            for i in 0..=10 {
                let c = ramp.at(i as f64 / 10.0).unwrap();
                assert!(c.is_finite(), "{name} at {i}");
            }
        }
    }
}
