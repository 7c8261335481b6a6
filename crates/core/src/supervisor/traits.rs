//! Trait definitions for the supervisor module.

use std::time::Duration;

use async_trait::async_trait;

use super::error::SupervisorError;
use super::types::{BackendOutcome, CommandSpec};

/// Predicate over one output line that signals rate limiting.
pub type LinePredicate<'a> = &'a (dyn Fn(&str) -> bool + Send + Sync);

/// Runs external backend commands under supervision.
///
/// [`super::ProcessSupervisor`] spawns real processes; tests substitute
/// [`crate::testing::MockProcessRunner`].
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Runs `command` until it exits, exceeds `timeout`, or prints a line
    /// matching `is_rate_limited`. The process is never left running.
    async fn run(
        &self,
        command: &CommandSpec,
        timeout: Duration,
        is_rate_limited: LinePredicate<'_>,
    ) -> Result<BackendOutcome, SupervisorError>;
}
