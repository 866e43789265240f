#![deny(unsafe_code)]
//! Rendering side of the gradient-descent simulator.
//!
//! Turns a [`RenderSurface`](gradient_sim_core::RenderSurface) plus the
//! agent's published state into pixels: `pixel` expands the heat map to
//! RGBA8, `frame` composites the trace and the agent marker on top, and
//! `snapshot` (feature `png`) writes either to disk.

pub mod frame;
pub mod pixel;

#[cfg(feature = "png")]
pub mod snapshot;

pub use frame::{compose, Frame};
pub use pixel::surface_to_rgba;
