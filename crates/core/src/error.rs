//! Error types for the gradient-descent simulator core.
//!
//! Only construction and I/O are fallible. Numeric evaluation never returns
//! an error: non-finite values propagate through positions and pixels.

use thiserror::Error;

/// Errors produced while configuring or rendering a simulation.
#[derive(Debug, Error)]
pub enum SimError {
    /// Width or height was zero when creating a render surface.
    #[error("invalid dimensions: width and height must be non-zero")]
    InvalidDimensions,

    /// A field name was not found in the registry.
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// The learning rate was non-finite or not strictly positive.
    #[error("invalid learning rate {0}: must be finite and greater than zero")]
    InvalidLearningRate(f64),

    /// A periodic task was configured with a zero period.
    #[error("invalid {name} period of {millis} ms: must be greater than zero")]
    InvalidPeriod { name: String, millis: u64 },

    /// A configuration document could not be parsed.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Reading a config or writing an image failed.
    #[error("i/o error: {0}")]
    Io(String),
}
