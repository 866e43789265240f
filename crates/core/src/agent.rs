//! The descent agent: a point that walks downhill on a [`ScalarField`].
//!
//! Each [`DescentAgent::step`] takes one plain gradient-descent iteration
//! with a fixed learning rate. There is no convergence test and no clamping:
//! near a minimum the agent may overshoot and oscillate, at a singularity its
//! position becomes NaN, and on an unbounded field it may run off forever.

use std::f64::consts::TAU;
use std::fmt;
use std::sync::Arc;

use glam::DVec2;
use serde::Serialize;

use crate::error::SimError;
use crate::field::ScalarField;

/// Minimum distance between consecutive trace points (exclusive).
pub const TRACE_MIN_SPACING: f64 = 1.0;

/// Wraps an angle into `[0, 2π)`.
///
/// Equivalent to repeatedly adding or subtracting 2π, for any finite input.
/// Non-finite input yields NaN.
pub fn normalize_radians(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    // A tiny negative angle rounds up to exactly TAU.
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Heading from `from` to `to`, normalized into `[0, 2π)`.
pub fn angle_to(from: DVec2, to: DVec2) -> f64 {
    let d = to - from;
    normalize_radians(d.y.atan2(d.x))
}

/// Decimated polyline of visited positions.
///
/// A point is appended only when it lies more than [`TRACE_MIN_SPACING`]
/// from the last recorded point. Non-finite points are never recorded.
///
/// The points live behind an `Arc` so readers can hold a snapshot while the
/// agent keeps appending; the first append after a snapshot copies.
#[derive(Debug, Clone, Default)]
pub struct Trace {
    points: Arc<Vec<DVec2>>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `point` if it passes the spacing rule. Returns whether it was kept.
    pub fn push(&mut self, point: DVec2) -> bool {
        if !point.is_finite() {
            return false;
        }
        if let Some(last) = self.points.last() {
            if last.distance(point) <= TRACE_MIN_SPACING {
                return false;
            }
        }
        Arc::make_mut(&mut self.points).push(point);
        true
    }

    /// Drops every recorded point.
    pub fn clear(&mut self) {
        self.points = Arc::default();
    }

    pub fn points(&self) -> &[DVec2] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Shares the current points without copying.
    pub fn snapshot(&self) -> Arc<Vec<DVec2>> {
        Arc::clone(&self.points)
    }
}

/// Position and heading of the agent at one instant.
///
/// Published as a single record so readers never see the position of one
/// step paired with the heading of another.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AgentSnapshot {
    pub position: DVec2,
    /// Heading in radians, `[0, 2π)` (NaN once the position is NaN).
    pub direction: f64,
    /// Number of steps taken since construction.
    pub steps: u64,
}

/// A gradient-descent walker bound to one field.
pub struct DescentAgent {
    field: Arc<dyn ScalarField>,
    position: DVec2,
    direction: f64,
    learning_rate: f64,
    trace: Trace,
    steps: u64,
}

impl DescentAgent {
    /// Creates an agent at `start`, heading 0, with an empty trace.
    ///
    /// Returns `SimError::InvalidLearningRate` unless `learning_rate` is
    /// finite and strictly positive.
    pub fn new(
        field: Arc<dyn ScalarField>,
        start: DVec2,
        learning_rate: f64,
    ) -> Result<Self, SimError> {
        if !(learning_rate.is_finite() && learning_rate > 0.0) {
            return Err(SimError::InvalidLearningRate(learning_rate));
        }
        Ok(Self {
            field,
            position: start,
            direction: 0.0,
            learning_rate,
            trace: Trace::new(),
            steps: 0,
        })
    }

    /// Takes one descent step: `position -= backward(position) * learning_rate`.
    ///
    /// The heading becomes the angle of the move. The pre-step position seeds
    /// an empty trace; the new position is then offered to the trace.
    pub fn step(&mut self) -> AgentSnapshot {
        let grad = self.field.backward(self.position.x, self.position.y);
        let next = self.position - grad * self.learning_rate;
        self.direction = angle_to(self.position, next);
        if self.trace.is_empty() {
            self.trace.push(self.position);
        }
        self.position = next;
        self.trace.push(next);
        self.steps += 1;
        self.snapshot()
    }

    /// Moves the agent to `(x, y)` and clears the trace. The heading is kept
    /// until the next step.
    pub fn reposition(&mut self, x: f64, y: f64) -> AgentSnapshot {
        self.position = DVec2::new(x, y);
        self.trace.clear();
        self.snapshot()
    }

    pub fn position(&self) -> DVec2 {
        self.position
    }

    pub fn direction(&self) -> f64 {
        self.direction
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    pub fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            position: self.position,
            direction: self.direction,
            steps: self.steps,
        }
    }
}

impl fmt::Debug for DescentAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DescentAgent")
            .field("position", &self.position)
            .field("direction", &self.direction)
            .field("learning_rate", &self.learning_rate)
            .field("trace_len", &self.trace.len())
            .field("steps", &self.steps)
            .finish()
    }
}
