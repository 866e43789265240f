//! Startup configuration for a simulation.
//!
//! A [`SimConfig`] captures everything fixed at construction time: which
//! field to descend, its constants, the learning rate, the starting point,
//! the surface size, and the two task periods. It round-trips through JSON.

use std::time::Duration;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::field::FieldKind;
use crate::surface::{SURFACE_HEIGHT, SURFACE_WIDTH};

const DEFAULT_FIELD: &str = "distance";
const DEFAULT_LEARNING_RATE: f64 = 0.5;
const DEFAULT_MODEL_PERIOD_MS: u64 = 10;
const DEFAULT_REDRAW_PERIOD_MS: u64 = 500;

/// Construction parameters for one simulator.
///
/// Missing keys in a JSON document take the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Registry name of the field (see [`FieldKind::list_fields`]).
    pub field: String,
    /// Field constants, read by [`FieldKind::from_name`].
    pub params: serde_json::Value,
    pub learning_rate: f64,
    /// Initial agent position `[x, y]`.
    pub start: [f64; 2],
    /// Render surface width in pixels.
    pub width: usize,
    /// Render surface height in pixels.
    pub height: usize,
    /// Period of the model-update task.
    pub model_period_ms: u64,
    /// Period of the redraw task.
    pub redraw_period_ms: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            field: DEFAULT_FIELD.to_string(),
            params: serde_json::Value::Object(serde_json::Map::new()),
            learning_rate: DEFAULT_LEARNING_RATE,
            start: [0.0, 0.0],
            width: SURFACE_WIDTH,
            height: SURFACE_HEIGHT,
            model_period_ms: DEFAULT_MODEL_PERIOD_MS,
            redraw_period_ms: DEFAULT_REDRAW_PERIOD_MS,
        }
    }
}

impl SimConfig {
    /// Parses a JSON document and validates it.
    pub fn from_json_str(text: &str) -> Result<Self, SimError> {
        let config: SimConfig =
            serde_json::from_str(text).map_err(|e| SimError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks dimensions, learning rate, and periods.
    ///
    /// The field name is resolved separately by [`SimConfig::build_field`].
    pub fn validate(&self) -> Result<(), SimError> {
        if self.width == 0 || self.height == 0 {
            return Err(SimError::InvalidDimensions);
        }
        self.width
            .checked_mul(self.height)
            .ok_or(SimError::InvalidDimensions)?;
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(SimError::InvalidLearningRate(self.learning_rate));
        }
        for (name, millis) in [
            ("model", self.model_period_ms),
            ("redraw", self.redraw_period_ms),
        ] {
            if millis == 0 {
                return Err(SimError::InvalidPeriod {
                    name: name.to_string(),
                    millis,
                });
            }
        }
        Ok(())
    }

    /// Resolves the configured field from the registry.
    pub fn build_field(&self) -> Result<FieldKind, SimError> {
        FieldKind::from_name(&self.field, &self.params)
    }

    pub fn start_point(&self) -> DVec2 {
        DVec2::from_array(self.start)
    }

    pub fn model_period(&self) -> Duration {
        Duration::from_millis(self.model_period_ms)
    }

    pub fn redraw_period(&self) -> Duration {
        Duration::from_millis(self.redraw_period_ms)
    }
}
