//! Fallback routing between backends.
//!
//! Maps a [`BackendOutcome`] to the next step of an acquisition. Only a
//! rate-limited primary run is retried, and only once: runs at the
//! [`Stage::Fallback`] or [`Stage::Direct`] stage are always terminal.

use tracing::{info, warn};

use crate::backend::BackendKind;
use crate::error::{require_success, AcquisitionError};
use crate::orchestrator::AcquisitionRequest;
use crate::resolver::TitleLookup;
use crate::supervisor::{BackendOutcome, ExitInfo};

/// Which run of a request produced an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Primary backend run for a service URL; may fall back once.
    Primary,
    /// Secondary backend run after a fallback.
    Fallback,
    /// Secondary backend run for a free-text query.
    Direct,
}

impl Stage {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Primary)
    }
}

/// What the orchestrator does next.
#[derive(Debug)]
pub enum NextAction {
    /// The run succeeded.
    Accept(ExitInfo),
    /// Run the secondary pipeline with a derived request.
    Retry {
        request: AcquisitionRequest,
        backend: BackendKind,
    },
    /// Stop with this error.
    GiveUp(AcquisitionError),
}

/// Stateless router; the single-retry rule is carried by [`Stage`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackRouter;

impl FallbackRouter {
    pub fn new() -> Self {
        Self
    }

    pub async fn on_outcome(
        &self,
        stage: Stage,
        backend: BackendKind,
        outcome: BackendOutcome,
        request: &AcquisitionRequest,
        titles: &dyn TitleLookup,
    ) -> NextAction {
        let lines = match outcome {
            BackendOutcome::RateLimited { lines } if !stage.is_terminal() => lines,
            other => {
                return match require_success(backend, other) {
                    Ok(exit) => NextAction::Accept(exit),
                    Err(err) => NextAction::GiveUp(err),
                };
            }
        };

        let AcquisitionRequest::ServiceUrl(url) = request else {
            warn!("Rate limited on a free-text request, nothing to derive a query from");
            return NextAction::GiveUp(AcquisitionError::NoFallbackPossible { output: lines });
        };

        match titles.resolve_title_from_url(url).await {
            Some(title) => {
                info!(title = %title, "Rate limited, falling back to search");
                NextAction::Retry {
                    request: AcquisitionRequest::SearchQuery(title),
                    backend: BackendKind::Secondary,
                }
            }
            None => {
                warn!(url = %url, "Rate limited and no title could be derived");
                NextAction::GiveUp(AcquisitionError::NoFallbackPossible { output: lines })
            }
        }
    }
}
