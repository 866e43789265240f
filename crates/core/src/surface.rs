//! Heat-map rendering of a [`ScalarField`] onto a fixed pixel grid.
//!
//! Each pixel `(i, j)` samples `-field.forward(i, j)`, so values nearer the
//! minimum of the field come out "hotter". A first pass records the samples
//! and their finite min/max; a second pass maps each sample linearly onto
//! the visible spectrum and through [`wavelength_to_rgb`].

use tracing::debug;

use crate::error::SimError;
use crate::field::ScalarField;
use crate::spectrum::{wavelength_to_rgb, Rgb8, MAX_WAVELENGTH, MIN_WAVELENGTH};

/// Default surface width in pixels.
pub const SURFACE_WIDTH: usize = 400;
/// Default surface height in pixels.
pub const SURFACE_HEIGHT: usize = 400;

/// Wavelength used for every pixel when the field has no finite spread.
///
/// Every finite sample equals the minimum in that case, which the linear
/// map would send to the bottom of the range.
pub const DEGENERATE_WAVELENGTH: f64 = MIN_WAVELENGTH;

/// A precomputed RGB pixel buffer in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSurface {
    width: usize,
    height: usize,
    pixels: Vec<Rgb8>,
}

impl RenderSurface {
    /// Surface width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Surface height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Read-only access to the row-major pixels.
    pub fn pixels(&self) -> &[Rgb8] {
        &self.pixels
    }

    /// Pixel at column `x`, row `y`, or `None` outside the surface.
    pub fn get(&self, x: usize, y: usize) -> Option<Rgb8> {
        if x < self.width && y < self.height {
            Some(self.pixels[y * self.width + x])
        } else {
            None
        }
    }
}

/// Maps a sample linearly onto [380, 781] given the surface's min and max.
///
/// The maximum itself lands on 781, just past the red band, and renders black.
/// NaN passes through and renders black, whatever the span. Otherwise a span
/// that is not a positive finite number yields [`DEGENERATE_WAVELENGTH`], and
/// infinite samples clamp to the range ends.
pub fn value_to_wavelength(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        return value;
    }
    let span = max - min;
    if !(span > 0.0 && span.is_finite()) {
        return DEGENERATE_WAVELENGTH;
    }
    let wave = (value - min) * (MAX_WAVELENGTH - MIN_WAVELENGTH) / span + MIN_WAVELENGTH;
    wave.clamp(MIN_WAVELENGTH, MAX_WAVELENGTH)
}

/// Samples `field` over `[0, width) × [0, height)` and colours the result.
///
/// Returns `SimError::InvalidDimensions` if either dimension is zero, or if
/// the sample buffer for `width * height` pixels cannot be allocated.
pub fn render_surface(
    field: &dyn ScalarField,
    width: usize,
    height: usize,
) -> Result<RenderSurface, SimError> {
    if width == 0 || height == 0 {
        return Err(SimError::InvalidDimensions);
    }
    let len = width
        .checked_mul(height)
        .ok_or(SimError::InvalidDimensions)?;

    let mut values: Vec<f64> = Vec::new();
    values
        .try_reserve_exact(len)
        .map_err(|_| SimError::InvalidDimensions)?;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for j in 0..height {
        for i in 0..width {
            let v = -field.forward(i as f64, j as f64);
            if v.is_finite() {
                min = min.min(v);
                max = max.max(v);
            }
            values.push(v);
        }
    }
    debug!(width, height, min, max, "sampled field for render surface");

    let pixels = values
        .into_iter()
        .map(|v| wavelength_to_rgb(value_to_wavelength(v, min, max)))
        .collect();

    Ok(RenderSurface {
        width,
        height,
        pixels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{FieldKind, SingleCenterDistance};
    use glam::DVec2;
    use serde_json::json;

    /// Same value everywhere.
    struct Uniform(f64);

    impl ScalarField for Uniform {
        fn forward(&self, _x: f64, _y: f64) -> f64 {
            self.0
        }

        fn backward(&self, _x: f64, _y: f64) -> DVec2 {
            DVec2::ZERO
        }
    }

    /// NaN on the diagonal, distance to the origin elsewhere.
    struct HoleyDiagonal;

    impl ScalarField for HoleyDiagonal {
        fn forward(&self, x: f64, y: f64) -> f64 {
            if x == y {
                f64::NAN
            } else {
                x.hypot(y)
            }
        }

        fn backward(&self, _x: f64, _y: f64) -> DVec2 {
            DVec2::ZERO
        }
    }

    /// 5 everywhere except a NaN hole at the origin.
    struct FlatWithHole;

    impl ScalarField for FlatWithHole {
        fn forward(&self, x: f64, y: f64) -> f64 {
            if x == 0.0 && y == 0.0 {
                f64::NAN
            } else {
                5.0
            }
        }

        fn backward(&self, _x: f64, _y: f64) -> DVec2 {
            DVec2::ZERO
        }
    }

    // -- value_to_wavelength --

    #[test]
    fn wavelength_spans_visible_range() {
        assert_eq!(value_to_wavelength(-10.0, -10.0, 0.0), MIN_WAVELENGTH);
        assert_eq!(value_to_wavelength(0.0, -10.0, 0.0), MAX_WAVELENGTH);
        assert!((value_to_wavelength(-5.0, -10.0, 0.0) - 580.5).abs() < 1e-9);
    }

    #[test]
    fn degenerate_span_uses_fixed_wavelength() {
        assert_eq!(value_to_wavelength(3.0, 3.0, 3.0), DEGENERATE_WAVELENGTH);
        assert_eq!(
            value_to_wavelength(3.0, f64::INFINITY, f64::NEG_INFINITY),
            DEGENERATE_WAVELENGTH
        );
    }

    #[test]
    fn infinite_values_clamp_to_range_ends() {
        assert_eq!(value_to_wavelength(f64::INFINITY, 0.0, 1.0), MAX_WAVELENGTH);
        assert_eq!(value_to_wavelength(f64::NEG_INFINITY, 0.0, 1.0), MIN_WAVELENGTH);
    }

    #[test]
    fn nan_value_passes_through() {
        assert!(value_to_wavelength(f64::NAN, 0.0, 1.0).is_nan());
    }

    #[test]
    fn nan_value_passes_through_degenerate_span() {
        assert!(value_to_wavelength(f64::NAN, 5.0, 5.0).is_nan());
        assert!(value_to_wavelength(f64::NAN, f64::INFINITY, f64::NEG_INFINITY).is_nan());
    }

    // -- render_surface --

    #[test]
    fn surface_has_requested_dimensions() {
        let field = SingleCenterDistance::new(8.0, 4.0);
        let surface = render_surface(&field, 16, 8).unwrap();
        assert_eq!(surface.width(), 16);
        assert_eq!(surface.height(), 8);
        assert_eq!(surface.pixels().len(), 16 * 8);
    }

    #[test]
    fn zero_dimensions_return_error() {
        let field = SingleCenterDistance::new(0.0, 0.0);
        assert!(matches!(
            render_surface(&field, 0, 4),
            Err(SimError::InvalidDimensions)
        ));
        assert!(matches!(
            render_surface(&field, 4, 0),
            Err(SimError::InvalidDimensions)
        ));
    }

    #[test]
    fn overflowing_dimensions_return_error() {
        let field = SingleCenterDistance::new(0.0, 0.0);
        assert!(render_surface(&field, usize::MAX, 2).is_err());
    }

    #[test]
    fn unallocatable_pixel_count_returns_error() {
        // The pixel count fits in usize but its f64 samples do not fit in memory.
        let field = SingleCenterDistance::new(0.0, 0.0);
        assert!(matches!(
            render_surface(&field, usize::MAX / 2, 1),
            Err(SimError::InvalidDimensions)
        ));
    }

    #[test]
    fn uniform_field_renders_single_color() {
        let surface = render_surface(&Uniform(42.0), 32, 32).unwrap();
        let first = surface.pixels()[0];
        assert!(surface.pixels().iter().all(|&p| p == first));
        assert_eq!(first, wavelength_to_rgb(DEGENERATE_WAVELENGTH));
    }

    #[test]
    fn center_of_distance_field_is_hottest_and_maps_past_red() {
        // The maximum of -distance lands on 781, which is outside the red band.
        let field = FieldKind::from_name("distance", &json!({"cx": 20, "cy": 10})).unwrap();
        let surface = render_surface(&field, 40, 40).unwrap();
        assert_eq!(surface.get(20, 10), Some(Rgb8::BLACK));
    }

    #[test]
    fn farthest_pixel_maps_to_violet_edge() {
        let field = SingleCenterDistance::new(0.0, 0.0);
        let surface = render_surface(&field, 10, 10).unwrap();
        assert_eq!(surface.get(9, 9), Some(wavelength_to_rgb(MIN_WAVELENGTH)));
    }

    #[test]
    fn pixels_are_indexed_column_then_row() {
        let field = FieldKind::from_name("elliptic-bowl", &json!({"cx": 0, "cy": 0})).unwrap();
        let surface = render_surface(&field, 8, 8).unwrap();
        // forward(6, 0) = 36, forward(0, 3) = 36: equal samples, equal colours.
        assert_eq!(surface.get(6, 0), surface.get(0, 3));
        assert_ne!(surface.get(6, 0), surface.get(0, 6));
    }

    #[test]
    fn nan_samples_render_black_without_poisoning_range() {
        let surface = render_surface(&HoleyDiagonal, 8, 8).unwrap();
        assert_eq!(surface.get(3, 3), Some(Rgb8::BLACK));
        // Farthest finite sample still maps to the violet edge.
        assert_eq!(surface.get(7, 6), Some(wavelength_to_rgb(MIN_WAVELENGTH)));
    }

    #[test]
    fn nan_hole_in_flat_field_renders_black() {
        let surface = render_surface(&FlatWithHole, 4, 4).unwrap();
        assert_eq!(surface.get(0, 0), Some(Rgb8::BLACK));
        assert_eq!(surface.get(1, 0), Some(wavelength_to_rgb(DEGENERATE_WAVELENGTH)));
        assert_eq!(surface.get(3, 3), Some(wavelength_to_rgb(DEGENERATE_WAVELENGTH)));
    }

    #[test]
    fn get_out_of_bounds_is_none() {
        let surface = render_surface(&Uniform(0.0), 4, 4).unwrap();
        assert_eq!(surface.get(4, 0), None);
        assert_eq!(surface.get(0, 4), None);
    }

    #[test]
    fn rendering_is_deterministic() {
        let field = FieldKind::from_name("two-center", &json!({})).unwrap();
        let a = render_surface(&field, 64, 64).unwrap();
        let b = render_surface(&field, 64, 64).unwrap();
        assert_eq!(a, b);
    }
}
