// src/color.rs

use crate::model::Bin;
use palette::{FromColor, Hsl, Srgb};
use std::fmt;

const COLD_HUE: f32 = 210.0; // blue
const HOT_HUE: f32 = 0.0; // red
const SATURATION: f32 = 0.85;
const LIGHTNESS: f32 = 0.50;
const MIN_ALPHA: f32 = 0.12;
const MAX_ALPHA: f32 = 0.34;

/// Background color with opacity, e.g. `rgba(19, 128, 236, 0.12)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub alpha: f32,
}

impl Rgba {
    /// Composite over an opaque background
    pub fn over(&self, background: [u8; 3]) -> [u8; 3] {
        let blend = |fg: u8, bg: u8| {
            (f32::from(fg) * self.alpha + f32::from(bg) * (1.0 - self.alpha)).round() as u8
        };
        [
            blend(self.r, background[0]),
            blend(self.g, background[1]),
            blend(self.b, background[2]),
        ]
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {:.2})", self.r, self.g, self.b, self.alpha)
    }
}

/// Blue-to-red color for a bin; hotter bins are also more opaque.
///
/// Depends only on `bin` and `max_bins`, so renderers may cache one style
/// per bin for as long as `max_bins` stays the same.
pub fn color_for_bin(bin: Bin, max_bins: Bin) -> Rgba {
    let t = if max_bins == 0 {
        0.0
    } else {
        f32::from(bin.min(max_bins)) / f32::from(max_bins)
    };
    let hue = COLD_HUE * (1.0 - t) + HOT_HUE * t;

    let hsl: Hsl = Hsl::new(hue, SATURATION, LIGHTNESS);
    let srgb: Srgb<f32> = Srgb::from_color(hsl);
    let (r, g, b) = srgb.into_components();
    let to_u8 = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;

    Rgba {
        r: to_u8(r),
        g: to_u8(g),
        b: to_u8(b),
        alpha: MIN_ALPHA + (MAX_ALPHA - MIN_ALPHA) * t,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MAX_BINS;

    #[test]
    fn colors_are_deterministic() {
        for bin in 0..=MAX_BINS {
            assert_eq!(color_for_bin(bin, MAX_BINS), color_for_bin(bin, MAX_BINS));
        }
    }

    #[test]
    fn coldest_bin_is_faint_blue() {
        let cold = color_for_bin(0, MAX_BINS);
        assert!(cold.b > cold.r && cold.b > cold.g);
        assert!((cold.alpha - 0.12).abs() < 1e-6);
        assert!(cold.to_string().ends_with(", 0.12)"));
    }

    #[test]
    fn hottest_bin_is_stronger_red() {
        let hot = color_for_bin(MAX_BINS, MAX_BINS);
        assert!(hot.r > hot.g && hot.r > hot.b);
        assert!((hot.alpha - 0.34).abs() < 1e-6);
        assert!(hot.alpha > color_for_bin(0, MAX_BINS).alpha);
        assert!(hot.to_string().starts_with("rgba("));
        assert!(hot.to_string().ends_with(", 0.34)"));
    }

    #[test]
    fn opacity_rises_with_heat() {
        let alphas: Vec<f32> = (0..=MAX_BINS).map(|b| color_for_bin(b, MAX_BINS).alpha).collect();
        assert!(alphas.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn out_of_range_bins_saturate() {
        assert_eq!(color_for_bin(42, MAX_BINS), color_for_bin(MAX_BINS, MAX_BINS));
    }

    #[test]
    fn compositing_respects_alpha() {
        let opaque = Rgba { r: 200, g: 100, b: 0, alpha: 1.0 };
        assert_eq!(opaque.over([0, 0, 0]), [200, 100, 0]);
        let clear = Rgba { r: 200, g: 100, b: 0, alpha: 0.0 };
        assert_eq!(clear.over([8, 8, 12]), [8, 8, 12]);
    }
}
