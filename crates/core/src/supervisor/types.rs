//! Types for the supervisor module.

use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// An external command to run: program plus argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// Program to execute (looked up on `PATH` when not absolute).
    pub program: PathBuf,
    /// Arguments, in order.
    pub args: Vec<OsString>,
}

impl CommandSpec {
    /// Creates a command with no arguments.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Appends one argument.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Arguments as lossy strings, for assertions and logs.
    pub fn args_lossy(&self) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Details of a process that exited on its own with status 0.
#[derive(Debug, Clone, PartialEq)]
pub struct ExitInfo {
    /// Wall-clock time from spawn to exit.
    pub elapsed: Duration,
    /// Every output line, stdout and stderr merged in arrival order.
    pub lines: Vec<String>,
}

/// Result of supervising one backend run.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendOutcome {
    /// Exit code 0.
    Success(ExitInfo),
    /// Killed after exceeding the time budget.
    Timeout {
        elapsed: Duration,
        lines: Vec<String>,
    },
    /// Killed as soon as a line matched the rate-limit predicate.
    RateLimited { lines: Vec<String> },
    /// Non-zero exit. `code` is `None` when the process died from a signal.
    Failed { code: Option<i32>, lines: Vec<String> },
}

impl BackendOutcome {
    /// Short label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::Timeout { .. } => "timeout",
            Self::RateLimited { .. } => "rate_limited",
            Self::Failed { .. } => "failed",
        }
    }

    /// Output captured before the outcome was decided.
    pub fn lines(&self) -> &[String] {
        match self {
            Self::Success(info) => &info.lines,
            Self::Timeout { lines, .. }
            | Self::RateLimited { lines }
            | Self::Failed { lines, .. } => lines,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_spec_builder() {
        let cmd = CommandSpec::new("yt-dlp")
            .arg("ytsearch1:foo")
            .args(["--dump-json", "--no-download"]);

        assert_eq!(cmd.program, PathBuf::from("yt-dlp"));
        assert_eq!(
            cmd.args_lossy(),
            vec!["ytsearch1:foo", "--dump-json", "--no-download"]
        );
        assert_eq!(
            cmd.to_string(),
            "yt-dlp ytsearch1:foo --dump-json --no-download"
        );
    }

    #[test]
    fn test_outcome_lines_and_labels() {
        let outcome = BackendOutcome::Failed {
            code: Some(2),
            lines: vec!["boom".to_string()],
        };
        assert_eq!(outcome.label(), "failed");
        assert_eq!(outcome.lines(), &["boom".to_string()]);
        assert!(!outcome.is_success());

        let outcome = BackendOutcome::Success(ExitInfo {
            elapsed: Duration::from_secs(1),
            lines: vec![],
        });
        assert!(outcome.is_success());
        assert!(outcome.lines().is_empty());
    }
}
