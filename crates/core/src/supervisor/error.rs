//! Error types for the supervisor module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the supervisor itself, as opposed to backend outcomes.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// The backend executable could not be started.
    #[error("Backend not available: {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O error while reading output or reaping the process.
    #[error("I/O error while supervising backend: {0}")]
    Io(#[from] std::io::Error),
}

impl SupervisorError {
    /// Creates a spawn error for the given program.
    pub fn spawn(program: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Spawn {
            program: program.into(),
            source,
        }
    }

    /// Whether the executable itself is missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Spawn { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}
