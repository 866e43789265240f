#![deny(unsafe_code)]
//! Concurrent runtime for the gradient-descent simulator.
//!
//! A [`Simulator`] owns the agent and the precomputed surface. [`spawn`]
//! drives it with two tokio tasks: a fast model-update loop and a slower
//! redraw loop that only signals a [`RepaintSink`].

pub mod repaint;
pub mod scheduler;
pub mod simulator;

pub use repaint::{RepaintSignal, RepaintSink};
pub use scheduler::{spawn, RunSummary, SchedulerConfig, SimulationHandle};
pub use simulator::{FrameState, Simulator};
