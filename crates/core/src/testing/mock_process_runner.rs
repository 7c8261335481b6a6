//! Mock process runner for testing.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::supervisor::{
    BackendOutcome, CommandSpec, ExitInfo, LinePredicate, ProcessRunner, SupervisorError,
};

/// A recorded backend run for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedRun {
    /// The command that was run.
    pub command: CommandSpec,
    /// The time budget it was given.
    pub timeout: Duration,
    /// When the run was requested.
    pub timestamp: chrono::DateTime<Utc>,
}

/// One scripted response.
#[derive(Debug)]
struct ScriptedRun {
    result: Result<BackendOutcome, SupervisorError>,
    /// Files created on disk when the run completes naturally.
    files: Vec<PathBuf>,
}

/// Mock implementation of the ProcessRunner trait.
///
/// Responses are consumed in FIFO order, one per `run` call. Lines of a
/// scripted `Success` or `Failed` outcome are checked against the caller's
/// rate-limit predicate the way the real supervisor checks live output: the
/// first matching line turns the run into `RateLimited` with the lines seen
/// so far, and no files are created.
///
/// # Example
///
/// ```rust,ignore
/// let runner = MockProcessRunner::new();
/// runner.push_success_with_files(vec!["[download] 100%"], vec![path]).await;
///
/// // ... drive the orchestrator ...
///
/// let commands = runner.recorded_commands().await;
/// assert_eq!(commands.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct MockProcessRunner {
    scripted: Arc<RwLock<VecDeque<ScriptedRun>>>,
    recorded: Arc<RwLock<Vec<RecordedRun>>>,
}

impl MockProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    async fn push(&self, result: Result<BackendOutcome, SupervisorError>, files: Vec<PathBuf>) {
        self.scripted
            .write()
            .await
            .push_back(ScriptedRun { result, files });
    }

    /// Queue a successful run printing `lines`.
    pub async fn push_success(&self, lines: Vec<&str>) {
        self.push_success_with_files(lines, Vec::new()).await;
    }

    /// Queue a successful run printing `lines` and creating `files`.
    pub async fn push_success_with_files(&self, lines: Vec<&str>, files: Vec<PathBuf>) {
        let outcome = BackendOutcome::Success(ExitInfo {
            elapsed: Duration::from_millis(10),
            lines: lines.into_iter().map(str::to_string).collect(),
        });
        self.push(Ok(outcome), files).await;
    }

    /// Queue an arbitrary outcome.
    pub async fn push_outcome(&self, outcome: BackendOutcome) {
        self.push(Ok(outcome), Vec::new()).await;
    }

    /// Queue a supervisor error, e.g. a missing executable.
    pub async fn push_error(&self, error: SupervisorError) {
        self.push(Err(error), Vec::new()).await;
    }

    /// Get all recorded runs.
    pub async fn recorded_runs(&self) -> Vec<RecordedRun> {
        self.recorded.read().await.clone()
    }

    /// Get the commands of all recorded runs.
    pub async fn recorded_commands(&self) -> Vec<CommandSpec> {
        self.recorded
            .read()
            .await
            .iter()
            .map(|r| r.command.clone())
            .collect()
    }

    /// Number of scripted responses not yet consumed.
    pub async fn remaining(&self) -> usize {
        self.scripted.read().await.len()
    }
}

/// Cuts a scripted outcome short at the first rate-limit line.
fn apply_rate_limit(outcome: BackendOutcome, is_rate_limited: LinePredicate<'_>) -> BackendOutcome {
    let lines: &[String] = match &outcome {
        BackendOutcome::Success(exit) => &exit.lines,
        BackendOutcome::Failed { lines, .. } => lines,
        _ => &[],
    };
    let cut = lines
        .iter()
        .position(|line| is_rate_limited(line))
        .map(|index| lines[..=index].to_vec());

    match cut {
        Some(lines) => BackendOutcome::RateLimited { lines },
        None => outcome,
    }
}

#[async_trait]
impl ProcessRunner for MockProcessRunner {
    async fn run(
        &self,
        command: &CommandSpec,
        timeout: Duration,
        is_rate_limited: LinePredicate<'_>,
    ) -> Result<BackendOutcome, SupervisorError> {
        self.recorded.write().await.push(RecordedRun {
            command: command.clone(),
            timeout,
            timestamp: Utc::now(),
        });

        let Some(scripted) = self.scripted.write().await.pop_front() else {
            return Ok(BackendOutcome::Failed {
                code: Some(127),
                lines: vec![format!("mock: no scripted run for {}", command)],
            });
        };

        let outcome = apply_rate_limit(scripted.result?, is_rate_limited);
        if !matches!(outcome, BackendOutcome::RateLimited { .. }) {
            for file in &scripted.files {
                if let Some(parent) = file.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(file, b"mock audio").await?;
            }
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn rate_limit(line: &str) -> bool {
        line.contains("rate limit")
    }

    #[tokio::test]
    async fn test_scripted_runs_in_order() {
        let runner = MockProcessRunner::new();
        runner.push_success(vec!["first"]).await;
        runner
            .push_outcome(BackendOutcome::Failed {
                code: Some(2),
                lines: vec![],
            })
            .await;

        let command = CommandSpec::new("tool").arg("x");
        let first = runner.run(&command, Duration::from_secs(1), &rate_limit).await.unwrap();
        let second = runner.run(&command, Duration::from_secs(1), &rate_limit).await.unwrap();
        let third = runner.run(&command, Duration::from_secs(1), &rate_limit).await.unwrap();

        assert!(first.is_success());
        assert!(matches!(second, BackendOutcome::Failed { code: Some(2), .. }));
        assert!(matches!(third, BackendOutcome::Failed { code: Some(127), .. }));
        assert_eq!(runner.recorded_runs().await.len(), 3);
        assert_eq!(runner.remaining().await, 0);
    }

    #[tokio::test]
    async fn test_rate_limit_line_cuts_output_and_skips_files() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("song.mp3");
        let runner = MockProcessRunner::new();
        runner
            .push_success_with_files(vec!["one", "two", "hit rate limit", "four"], vec![file.clone()])
            .await;

        let outcome = runner
            .run(&CommandSpec::new("tool"), Duration::from_secs(1), &rate_limit)
            .await
            .unwrap();

        assert_eq!(outcome.lines().len(), 3);
        assert!(matches!(outcome, BackendOutcome::RateLimited { .. }));
        assert!(!file.exists());
    }

    #[tokio::test]
    async fn test_success_creates_files() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("nested").join("song.mp3");
        let runner = MockProcessRunner::new();
        runner.push_success_with_files(vec![], vec![file.clone()]).await;

        runner
            .run(&CommandSpec::new("tool"), Duration::from_secs(1), &rate_limit)
            .await
            .unwrap();
        assert!(file.exists());
    }
}
