//! CLI failures and their exit codes.
//!
//! - 0:  success
//! - 2:  clap arg parse error, including malformed `--click`/`--start` points
//! - 10: simulation settings rejected (unknown field, bad rate, period, or size)
//! - 11: file error (config unreadable, PNG not written)
//! - 12: unparseable input (config document, `--params` JSON)
//! - 13: stdout closed or unwritable while printing a JSON report

use gradient_sim_core::SimError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Sim(SimError),

    #[error("reading config {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A PNG could not be written; during `run` this aborts the run.
    #[error("writing {}: {source}", path.display())]
    Image { path: PathBuf, source: SimError },

    #[error("{0}")]
    Input(String),

    #[error("writing JSON report: {0}")]
    Output(#[from] serde_json::Error),
}

impl CliError {
    /// Returns the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Sim(_) => 10,
            CliError::ConfigRead { .. } | CliError::Image { .. } => 11,
            CliError::Input(_) => 12,
            CliError::Output(_) => 13,
        }
    }

    /// Wraps a PNG write failure with the path it was aimed at.
    pub fn image(path: impl Into<PathBuf>) -> impl FnOnce(SimError) -> Self {
        let path = path.into();
        move |source| CliError::Image { path, source }
    }
}

impl From<SimError> for CliError {
    fn from(e: SimError) -> Self {
        match e {
            SimError::InvalidConfig(msg) => CliError::Input(format!("invalid config: {msg}")),
            other => CliError::Sim(other),
        }
    }
}
