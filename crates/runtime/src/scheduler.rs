//! Two independently timed tasks around one [`Simulator`].
//!
//! - model update: every `model_period` (10 ms by default), one agent step.
//! - redraw: every `redraw_period` (500 ms by default), one repaint request.
//!
//! The tasks share nothing but the simulator and a shutdown channel, so a
//! slow painter never delays model updates. Repositioning goes straight to
//! the simulator from whichever context handles the click. Late ticks are
//! delayed rather than bunched up. Stopping is cooperative: a task finishes
//! its current tick and exits before the next one.

use std::sync::Arc;
use std::time::Duration;

use gradient_sim_core::agent::AgentSnapshot;
use gradient_sim_core::config::SimConfig;
use gradient_sim_core::error::SimError;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, trace, warn};

use crate::repaint::RepaintSink;
use crate::simulator::Simulator;

/// Periods of the two tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub model_period: Duration,
    pub redraw_period: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            model_period: Duration::from_millis(10),
            redraw_period: Duration::from_millis(500),
        }
    }
}

impl SchedulerConfig {
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            model_period: config.model_period(),
            redraw_period: config.redraw_period(),
        }
    }

    /// Rejects zero periods.
    pub fn validate(&self) -> Result<(), SimError> {
        for (name, period) in [("model", self.model_period), ("redraw", self.redraw_period)] {
            if period.is_zero() {
                return Err(SimError::InvalidPeriod {
                    name: name.to_string(),
                    millis: 0,
                });
            }
        }
        Ok(())
    }
}

/// Tick counts of a stopped run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub model_ticks: u64,
    pub redraw_ticks: u64,
}

/// A running simulation. Dropping it cancels both tasks.
#[derive(Debug)]
pub struct SimulationHandle {
    simulator: Arc<Simulator>,
    shutdown: watch::Sender<bool>,
    model_task: JoinHandle<u64>,
    redraw_task: JoinHandle<u64>,
}

/// Starts the model-update and redraw tasks on the current tokio runtime.
///
/// Returns `SimError::InvalidPeriod` if either period is zero.
pub fn spawn(
    simulator: Arc<Simulator>,
    config: SchedulerConfig,
    sink: Arc<dyn RepaintSink>,
) -> Result<SimulationHandle, SimError> {
    config.validate()?;
    let (shutdown, _) = watch::channel(false);

    let model_task = tokio::spawn(run_model_updates(
        Arc::clone(&simulator),
        config.model_period,
        shutdown.subscribe(),
    ));
    let redraw_task = tokio::spawn(run_redraws(sink, config.redraw_period, shutdown.subscribe()));

    info!(
        model_period_ms = config.model_period.as_millis() as u64,
        redraw_period_ms = config.redraw_period.as_millis() as u64,
        "simulation started"
    );

    Ok(SimulationHandle {
        simulator,
        shutdown,
        model_task,
        redraw_task,
    })
}

impl SimulationHandle {
    pub fn simulator(&self) -> &Arc<Simulator> {
        &self.simulator
    }

    /// User-initiated move; races freely with in-flight model updates.
    pub fn reposition(&self, x: f64, y: f64) -> AgentSnapshot {
        self.simulator.reposition(x, y)
    }

    /// Signals both tasks to stop and waits for them to finish.
    pub async fn stop(self) -> RunSummary {
        self.shutdown.send_replace(true);
        let summary = RunSummary {
            model_ticks: join_ticks(self.model_task, "model-update").await,
            redraw_ticks: join_ticks(self.redraw_task, "redraw").await,
        };
        info!(
            model_ticks = summary.model_ticks,
            redraw_ticks = summary.redraw_ticks,
            "simulation stopped"
        );
        summary
    }
}

async fn join_ticks(task: JoinHandle<u64>, name: &str) -> u64 {
    match task.await {
        Ok(ticks) => ticks,
        Err(e) => {
            warn!(task = name, error = %e, "task ended abnormally");
            0
        }
    }
}

async fn run_model_updates(
    simulator: Arc<Simulator>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> u64 {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut ticks = 0_u64;
    loop {
        tokio::select! {
            biased;
            // Err means the handle was dropped.
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {
                let snapshot = simulator.step();
                ticks += 1;
                trace!(
                    steps = snapshot.steps,
                    x = snapshot.position.x,
                    y = snapshot.position.y,
                    "model update"
                );
            }
        }
    }
    debug!(ticks, "model-update task finished");
    ticks
}

async fn run_redraws(
    sink: Arc<dyn RepaintSink>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> u64 {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut ticks = 0_u64;
    loop {
        tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            _ = ticker.tick() => {
                sink.request_repaint();
                ticks += 1;
                trace!(ticks, "repaint requested");
            }
        }
    }
    debug!(ticks, "redraw task finished");
    ticks
}
