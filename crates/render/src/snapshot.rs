//! PNG output of render surfaces and composed frames.
//!
//! This module is feature-gated behind `png` (default on) so that embedders
//! with their own display path can skip the `image` crate. The pixel
//! conversion itself lives in [`crate::pixel`] (always available).

use gradient_sim_core::error::SimError;
use gradient_sim_core::surface::RenderSurface;
use std::path::Path;

use crate::frame::Frame;
use crate::pixel::surface_to_rgba;

/// Writes a row-major RGBA8 buffer as a PNG image.
///
/// Returns `SimError::InvalidDimensions` if the dimensions overflow `u32`,
/// or `SimError::Io` on a size mismatch or write failure.
fn write_rgba_png(width: usize, height: usize, rgba: Vec<u8>, path: &Path) -> Result<(), SimError> {
    let w = u32::try_from(width).map_err(|_| SimError::InvalidDimensions)?;
    let h = u32::try_from(height).map_err(|_| SimError::InvalidDimensions)?;
    let img = image::RgbaImage::from_raw(w, h, rgba)
        .ok_or_else(|| SimError::Io("RGBA buffer size mismatch".into()))?;
    img.save(path).map_err(|e| SimError::Io(e.to_string()))
}

/// Writes the bare heat map as a PNG image.
pub fn write_surface_png(surface: &RenderSurface, path: &Path) -> Result<(), SimError> {
    write_rgba_png(
        surface.width(),
        surface.height(),
        surface_to_rgba(surface),
        path,
    )
}

/// Writes a composed frame as a PNG image.
pub fn write_frame_png(frame: &Frame, path: &Path) -> Result<(), SimError> {
    write_rgba_png(frame.width(), frame.height(), frame.data().to_vec(), path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec2;
    use gradient_sim_core::agent::AgentSnapshot;
    use gradient_sim_core::field::SingleCenterDistance;
    use gradient_sim_core::surface::render_surface;

    #[test]
    fn write_surface_png_round_trip() {
        let surface = render_surface(&SingleCenterDistance::new(8.0, 8.0), 16, 16).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("surface.png");

        write_surface_png(&surface, &path).unwrap();

        let img = image::open(&path).unwrap().to_rgba8();
        assert_eq!(img.width(), 16);
        assert_eq!(img.height(), 16);
        let px = surface.get(3, 5).unwrap();
        assert_eq!(img.get_pixel(3, 5).0, px.to_rgba());
    }

    #[test]
    fn write_frame_png_keeps_marker() {
        let surface = render_surface(&SingleCenterDistance::new(0.0, 0.0), 64, 64).unwrap();
        let snapshot = AgentSnapshot {
            position: DVec2::new(32.0, 32.0),
            direction: 0.0,
            steps: 3,
        };
        let frame = crate::frame::compose(&surface, &snapshot, &[]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.png");

        write_frame_png(&frame, &path).unwrap();

        let img = image::open(&path).unwrap().to_rgba8();
        assert_eq!(img.get_pixel(32, 32).0, crate::frame::BODY_COLOR.to_rgba());
    }

    #[test]
    fn write_to_missing_directory_is_io_error() {
        let surface = render_surface(&SingleCenterDistance::new(0.0, 0.0), 4, 4).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("out.png");
        assert!(matches!(
            write_surface_png(&surface, &path),
            Err(SimError::Io(_))
        ));
    }
}
