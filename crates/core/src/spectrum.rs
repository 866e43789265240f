//! Visible-spectrum colour approximation for a wavelength in nanometres.
//!
//! The mapping is piecewise linear over six half-open bands, scaled by an
//! intensity factor that fades in at the violet end and out at the red end,
//! then gamma corrected. A value sitting exactly on a band boundary takes the
//! upper band's formula.

use serde::{Deserialize, Serialize};

/// Lower end of the visible range (inclusive).
pub const MIN_WAVELENGTH: f64 = 380.0;
/// Upper end of the visible range (exclusive).
pub const MAX_WAVELENGTH: f64 = 781.0;

const GAMMA: f64 = 0.8;
const INTENSITY_MAX: f64 = 255.0;

/// 8-bit RGB colour.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb8 {
    pub const BLACK: Rgb8 = Rgb8::new(0, 0, 0);
    pub const WHITE: Rgb8 = Rgb8::new(255, 255, 255);
    pub const MAGENTA: Rgb8 = Rgb8::new(255, 0, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Formats the colour as `"#rrggbb"`.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Opaque RGBA8 bytes.
    pub fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, 255]
    }
}

/// The band of the spectrum a wavelength falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpectrumBand {
    /// [380, 440): red fades out over full blue.
    VioletBlue,
    /// [440, 490): green rises over full blue.
    BlueCyan,
    /// [490, 510): blue fades out over full green.
    CyanGreen,
    /// [510, 580): red rises over full green.
    GreenYellow,
    /// [580, 645): green fades out over full red.
    YellowRed,
    /// [645, 781): pure red.
    Red,
    /// Anything else, including NaN.
    Invisible,
}

impl SpectrumBand {
    /// Classifies a wavelength using half-open `[lo, hi)` bands.
    pub fn classify(wavelength: f64) -> Self {
        match wavelength {
            w if (380.0..440.0).contains(&w) => SpectrumBand::VioletBlue,
            w if (440.0..490.0).contains(&w) => SpectrumBand::BlueCyan,
            w if (490.0..510.0).contains(&w) => SpectrumBand::CyanGreen,
            w if (510.0..580.0).contains(&w) => SpectrumBand::GreenYellow,
            w if (580.0..645.0).contains(&w) => SpectrumBand::YellowRed,
            w if (645.0..MAX_WAVELENGTH).contains(&w) => SpectrumBand::Red,
            _ => SpectrumBand::Invisible,
        }
    }

    /// Raw (red, green, blue) in [0, 1] for a wavelength inside this band.
    fn raw_channels(self, w: f64) -> (f64, f64, f64) {
        match self {
            SpectrumBand::VioletBlue => (-(w - 440.0) / (440.0 - 380.0), 0.0, 1.0),
            SpectrumBand::BlueCyan => (0.0, (w - 440.0) / (490.0 - 440.0), 1.0),
            SpectrumBand::CyanGreen => (0.0, 1.0, -(w - 510.0) / (510.0 - 490.0)),
            SpectrumBand::GreenYellow => ((w - 510.0) / (580.0 - 510.0), 1.0, 0.0),
            SpectrumBand::YellowRed => (1.0, -(w - 645.0) / (645.0 - 580.0), 0.0),
            SpectrumBand::Red => (1.0, 0.0, 0.0),
            SpectrumBand::Invisible => (0.0, 0.0, 0.0),
        }
    }
}

/// Brightness multiplier: ramps 0.3 → 1 over [380, 420), holds 1 over
/// [420, 701), ramps back towards 0.3 over [701, 781), and is 0 elsewhere.
pub fn intensity_factor(wavelength: f64) -> f64 {
    match wavelength {
        w if (380.0..420.0).contains(&w) => 0.3 + 0.7 * (w - 380.0) / (420.0 - 380.0),
        w if (420.0..701.0).contains(&w) => 1.0,
        w if (701.0..MAX_WAVELENGTH).contains(&w) => 0.3 + 0.7 * (780.0 - w) / (780.0 - 700.0),
        _ => 0.0,
    }
}

/// Gamma-corrects one channel. An exact zero stays zero.
fn adjust(channel: f64, factor: f64) -> u8 {
    if channel == 0.0 {
        0
    } else {
        (INTENSITY_MAX * (channel * factor).powf(GAMMA)).round() as u8
    }
}

/// Maps a wavelength in nanometres to an approximate visible colour.
///
/// Wavelengths outside [380, 781), and NaN, map to black.
pub fn wavelength_to_rgb(wavelength: f64) -> Rgb8 {
    let (red, green, blue) = SpectrumBand::classify(wavelength).raw_channels(wavelength);
    let factor = intensity_factor(wavelength);
    Rgb8 {
        r: adjust(red, factor),
        g: adjust(green, factor),
        b: adjust(blue, factor),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- Reference points --

    #[test]
    fn green_550_has_saturated_green_channel() {
        let c = wavelength_to_rgb(550.0);
        assert_eq!(c.g, 255);
        assert_eq!(c.b, 0);
        assert!(c.r > 0 && c.r < 255, "r = {}", c.r);
    }

    #[test]
    fn green_550_red_channel_is_gamma_corrected() {
        // raw red = 40/70, factor = 1
        let expected = (255.0 * (40.0_f64 / 70.0).powf(0.8)).round() as u8;
        assert_eq!(wavelength_to_rgb(550.0).r, expected);
    }

    #[test]
    fn outside_visible_range_is_black() {
        assert_eq!(wavelength_to_rgb(300.0), Rgb8::BLACK);
        assert_eq!(wavelength_to_rgb(800.0), Rgb8::BLACK);
        assert_eq!(wavelength_to_rgb(379.999), Rgb8::BLACK);
        assert_eq!(wavelength_to_rgb(MAX_WAVELENGTH), Rgb8::BLACK);
    }

    #[test]
    fn non_finite_is_black() {
        assert_eq!(wavelength_to_rgb(f64::NAN), Rgb8::BLACK);
        assert_eq!(wavelength_to_rgb(f64::INFINITY), Rgb8::BLACK);
        assert_eq!(wavelength_to_rgb(f64::NEG_INFINITY), Rgb8::BLACK);
    }

    #[test]
    fn violet_edge_is_dim_magenta() {
        // raw (1, 0, 1) at factor 0.3
        let level = (255.0 * 0.3_f64.powf(0.8)).round() as u8;
        assert_eq!(wavelength_to_rgb(380.0), Rgb8::new(level, 0, level));
    }

    #[test]
    fn red_tail_just_below_781_is_not_black() {
        let c = wavelength_to_rgb(780.5);
        assert!(c.r > 0, "got {c:?}");
        assert_eq!((c.g, c.b), (0, 0));
    }

    #[test]
    fn pure_red_band_at_full_intensity() {
        assert_eq!(wavelength_to_rgb(650.0), Rgb8::new(255, 0, 0));
    }

    // -- Boundary convention --

    #[test]
    fn exactly_440_uses_blue_cyan_band() {
        assert_eq!(SpectrumBand::classify(440.0), SpectrumBand::BlueCyan);
        assert_eq!(SpectrumBand::classify(439.999), SpectrumBand::VioletBlue);
        assert_eq!(wavelength_to_rgb(440.0), Rgb8::new(0, 0, 255));
    }

    #[test]
    fn every_boundary_belongs_to_upper_band() {
        let cases = [
            (380.0, SpectrumBand::VioletBlue),
            (490.0, SpectrumBand::CyanGreen),
            (510.0, SpectrumBand::GreenYellow),
            (580.0, SpectrumBand::YellowRed),
            (645.0, SpectrumBand::Red),
            (781.0, SpectrumBand::Invisible),
        ];
        for (w, band) in cases {
            assert_eq!(SpectrumBand::classify(w), band, "wavelength {w}");
        }
    }

    #[test]
    fn nan_is_invisible_band() {
        assert_eq!(SpectrumBand::classify(f64::NAN), SpectrumBand::Invisible);
    }

    // -- Intensity factor --

    #[test]
    fn intensity_factor_plateau_and_ramps() {
        assert!((intensity_factor(380.0) - 0.3).abs() < 1e-12);
        assert!((intensity_factor(400.0) - 0.65).abs() < 1e-12);
        assert_eq!(intensity_factor(420.0), 1.0);
        assert_eq!(intensity_factor(700.999), 1.0);
        assert!((intensity_factor(701.0) - (0.3 + 0.7 * 79.0 / 80.0)).abs() < 1e-12);
        assert_eq!(intensity_factor(781.0), 0.0);
        assert_eq!(intensity_factor(379.0), 0.0);
    }

    // -- Rgb8 --

    #[test]
    fn rgb8_to_hex_formats_lowercase() {
        assert_eq!(Rgb8::new(255, 0, 171).to_hex(), "#ff00ab");
    }

    #[test]
    fn rgb8_to_rgba_is_opaque() {
        assert_eq!(Rgb8::new(1, 2, 3).to_rgba(), [1, 2, 3, 255]);
    }

    // -- Property-based tests --

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn visible_wavelengths_are_never_black(w in MIN_WAVELENGTH..MAX_WAVELENGTH) {
                prop_assert_ne!(wavelength_to_rgb(w), Rgb8::BLACK);
            }

            #[test]
            fn mapping_is_deterministic(w in -1000.0_f64..2000.0) {
                prop_assert_eq!(wavelength_to_rgb(w), wavelength_to_rgb(w));
            }

            #[test]
            fn intensity_factor_stays_in_unit_range(w in -1000.0_f64..2000.0) {
                let f = intensity_factor(w);
                prop_assert!((0.0..=1.0).contains(&f), "factor {f} at {w}");
            }
        }
    }
}
