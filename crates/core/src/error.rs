//! Request-level error taxonomy.

use thiserror::Error;

use crate::backend::BackendKind;
use crate::fetch::FetchError;
use crate::resolver::MetadataError;
use crate::supervisor::{BackendOutcome, ExitInfo, SupervisorError};

/// Why an acquisition failed.
///
/// Only `RateLimited` from the primary backend is recovered from (by the
/// fallback router); every other variant ends the request.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    /// The backend executable is missing or could not be started.
    #[error("Backend not available ({program}): {reason}")]
    BackendUnavailable { program: String, reason: String },

    /// The backend exceeded its time budget and was killed.
    #[error("{backend} backend timed out after {elapsed_secs:.1}s")]
    Timeout {
        backend: BackendKind,
        elapsed_secs: f64,
        output: Vec<String>,
    },

    /// The backend reported rate limiting and no fallback was left.
    #[error("{backend} backend was rate limited")]
    RateLimited {
        backend: BackendKind,
        output: Vec<String>,
    },

    /// The backend failed (non-zero exit, or no audio file produced).
    #[error("{backend} backend failed: {reason}")]
    BackendFailed {
        backend: BackendKind,
        code: Option<i32>,
        reason: String,
        output: Vec<String>,
    },

    /// Backend output could not be parsed into track metadata.
    #[error("Could not parse track metadata: {0}")]
    MetadataUnparseable(#[from] MetadataError),

    /// An HTTP fetch failed.
    #[error("Network error: {0}")]
    NetworkError(#[from] FetchError),

    /// Rate limited, but no substitute query could be derived.
    #[error("Rate limited and could not derive fallback query")]
    NoFallbackPossible { output: Vec<String> },

    /// Local filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<SupervisorError> for AcquisitionError {
    fn from(err: SupervisorError) -> Self {
        match err {
            SupervisorError::Spawn { program, source } => Self::BackendUnavailable {
                program: program.display().to_string(),
                reason: source.to_string(),
            },
            SupervisorError::Io(e) => Self::Io(e),
        }
    }
}

impl AcquisitionError {
    /// Creates a backend failure that is not tied to an exit code.
    pub fn backend_failed(
        backend: BackendKind,
        reason: impl Into<String>,
        output: Vec<String>,
    ) -> Self {
        Self::BackendFailed {
            backend,
            code: None,
            reason: reason.into(),
            output,
        }
    }

    /// Backend output captured before the failure, if any.
    pub fn output(&self) -> &[String] {
        match self {
            Self::Timeout { output, .. }
            | Self::RateLimited { output, .. }
            | Self::BackendFailed { output, .. }
            | Self::NoFallbackPossible { output } => output,
            _ => &[],
        }
    }

    /// Error text followed by the captured backend output.
    pub fn diagnostic(&self) -> String {
        let mut message = self.to_string();
        let output = self.output();
        if !output.is_empty() {
            message.push_str("\nBackend output:\n");
            message.push_str(&output.join("\n"));
        }
        message
    }

    /// Short label used in metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::BackendUnavailable { .. } => "backend_unavailable",
            Self::Timeout { .. } => "timeout",
            Self::RateLimited { .. } => "rate_limited",
            Self::BackendFailed { .. } => "backend_failed",
            Self::MetadataUnparseable(_) => "metadata_unparseable",
            Self::NetworkError(_) => "network_error",
            Self::NoFallbackPossible { .. } => "no_fallback_possible",
            Self::Io(_) => "io",
        }
    }
}

/// Accepts a successful outcome and turns every other outcome into the
/// matching error.
pub fn require_success(
    backend: BackendKind,
    outcome: BackendOutcome,
) -> Result<ExitInfo, AcquisitionError> {
    match outcome {
        BackendOutcome::Success(info) => Ok(info),
        BackendOutcome::Timeout { elapsed, lines } => Err(AcquisitionError::Timeout {
            backend,
            elapsed_secs: elapsed.as_secs_f64(),
            output: lines,
        }),
        BackendOutcome::RateLimited { lines } => Err(AcquisitionError::RateLimited {
            backend,
            output: lines,
        }),
        BackendOutcome::Failed { code, lines } => Err(AcquisitionError::BackendFailed {
            backend,
            code,
            reason: match code {
                Some(code) => format!("exit code {}", code),
                None => "terminated by signal".to_string(),
            },
            output: lines,
        }),
    }
}
