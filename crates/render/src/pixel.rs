//! Pure-computation pixel buffer conversion from a [`RenderSurface`].
//!
//! This module is always available (no feature gate) so that both the `png`
//! snapshot path and the frame compositor share the same conversion.

use gradient_sim_core::surface::RenderSurface;

/// Expands a surface's RGB pixels into an opaque RGBA8 buffer.
///
/// The buffer length is `width * height * 4`, row-major.
pub fn surface_to_rgba(surface: &RenderSurface) -> Vec<u8> {
    surface
        .pixels()
        .iter()
        .flat_map(|&rgb| rgb.to_rgba())
        .collect()
}
