#![deny(unsafe_code)]
//! Core types for the gradient-descent simulator.
//!
//! Provides the `ScalarField` trait and its built-in variants (`FieldKind`),
//! the wavelength-to-colour `spectrum` mapping, the `RenderSurface` heat-map
//! renderer, the `DescentAgent` with its decimated `Trace`, and `SimConfig`.

pub mod agent;
pub mod config;
pub mod error;
pub mod field;
pub mod params;
pub mod spectrum;
pub mod surface;

pub use agent::{AgentSnapshot, DescentAgent, Trace};
pub use config::SimConfig;
pub use error::SimError;
pub use field::{EllipticBowl, FieldKind, ScalarField, SingleCenterDistance, TwoCenterWeightedDistance};
pub use spectrum::{wavelength_to_rgb, Rgb8};
pub use surface::{render_surface, RenderSurface};
