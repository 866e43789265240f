//! Shared simulation state: the agent, its published snapshot, and the
//! precomputed surface.
//!
//! The agent sits behind a mutex so a step and a reposition never interleave.
//! After every mutation the new [`AgentSnapshot`] is published, still under
//! that lock, through a `watch` channel; readers always see one whole record
//! (position and heading from the same step), never a mix of two.
//!
//! The trace is served separately as a shared `Arc`, cloned on demand.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use glam::DVec2;
use gradient_sim_core::agent::{AgentSnapshot, DescentAgent};
use gradient_sim_core::config::SimConfig;
use gradient_sim_core::error::SimError;
use gradient_sim_core::field::ScalarField;
use gradient_sim_core::surface::{render_surface, RenderSurface};
use tokio::sync::watch;
use tracing::{debug, warn};

/// Everything a painter needs for one frame.
#[derive(Debug, Clone)]
pub struct FrameState {
    pub surface: Arc<RenderSurface>,
    pub agent: AgentSnapshot,
    pub trace: Arc<Vec<DVec2>>,
}

/// One agent on one field, shareable across tasks via `Arc<Simulator>`.
pub struct Simulator {
    agent: Mutex<DescentAgent>,
    published: watch::Sender<AgentSnapshot>,
    surface: Arc<RenderSurface>,
}

impl Simulator {
    /// Renders the field's surface once and places the agent at `start`.
    ///
    /// Returns `SimError::InvalidDimensions` for an empty surface and
    /// `SimError::InvalidLearningRate` for a rate that is not finite and positive.
    pub fn new(
        field: Arc<dyn ScalarField>,
        start: DVec2,
        learning_rate: f64,
        width: usize,
        height: usize,
    ) -> Result<Self, SimError> {
        let agent = DescentAgent::new(Arc::clone(&field), start, learning_rate)?;
        let surface = Arc::new(render_surface(field.as_ref(), width, height)?);
        let (published, _) = watch::channel(agent.snapshot());
        debug!(width, height, learning_rate, x = start.x, y = start.y, "simulator built");
        Ok(Self {
            agent: Mutex::new(agent),
            published,
            surface,
        })
    }

    /// Validates `config`, resolves its field, and builds the simulator.
    pub fn from_config(config: &SimConfig) -> Result<Self, SimError> {
        config.validate()?;
        let field: Arc<dyn ScalarField> = Arc::new(config.build_field()?);
        Self::new(
            field,
            config.start_point(),
            config.learning_rate,
            config.width,
            config.height,
        )
    }

    // A panic elsewhere while holding the lock leaves the agent in a valid state.
    fn lock_agent(&self) -> MutexGuard<'_, DescentAgent> {
        self.agent.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, snapshot: AgentSnapshot) {
        let previous = self.published.send_replace(snapshot);
        if previous.position.is_finite() && !snapshot.position.is_finite() {
            warn!(
                steps = snapshot.steps,
                last_x = previous.position.x,
                last_y = previous.position.y,
                "agent position became non-finite"
            );
        }
    }

    /// Advances the agent one step and publishes the result.
    pub fn step(&self) -> AgentSnapshot {
        let mut agent = self.lock_agent();
        let snapshot = agent.step();
        self.publish(snapshot);
        snapshot
    }

    /// Moves the agent to `(x, y)`, clears its trace, and publishes.
    pub fn reposition(&self, x: f64, y: f64) -> AgentSnapshot {
        let mut agent = self.lock_agent();
        let snapshot = agent.reposition(x, y);
        self.publish(snapshot);
        debug!(x, y, steps = snapshot.steps, "agent repositioned");
        snapshot
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> AgentSnapshot {
        *self.published.borrow()
    }

    /// Receiver notified on every publication.
    pub fn subscribe(&self) -> watch::Receiver<AgentSnapshot> {
        self.published.subscribe()
    }

    /// Current trace, shared without copying.
    pub fn trace(&self) -> Arc<Vec<DVec2>> {
        self.lock_agent().trace().snapshot()
    }

    /// The heat map, computed once at construction.
    pub fn surface(&self) -> Arc<RenderSurface> {
        Arc::clone(&self.surface)
    }

    /// Snapshot and trace taken together under one lock.
    pub fn frame_state(&self) -> FrameState {
        let agent = self.lock_agent();
        FrameState {
            surface: self.surface(),
            agent: agent.snapshot(),
            trace: agent.trace().snapshot(),
        }
    }
}

impl fmt::Debug for Simulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulator")
            .field("snapshot", &self.snapshot())
            .field("surface_width", &self.surface.width())
            .field("surface_height", &self.surface.height())
            .finish()
    }
}
