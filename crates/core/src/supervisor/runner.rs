//! Process supervisor backed by `tokio::process`.

use std::borrow::Cow;
use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use super::error::SupervisorError;
use super::handle::{ProcessHandle, Release, Released};
use super::traits::{LinePredicate, ProcessRunner};
use super::types::{BackendOutcome, CommandSpec, ExitInfo};

const READ_CHUNK: usize = 4096;

/// Longest backend line echoed to the log, in characters.
const ECHO_LIMIT: usize = 300;

/// Splits one output pipe into lossy UTF-8 lines.
///
/// Both `\n` and `\r` end a line, so progress output that redraws the
/// terminal line arrives as separate lines. Blank lines are dropped.
/// `read` is cancel safe, so a read abandoned by `select!` loses nothing.
struct LineStream<R> {
    reader: R,
    partial: Vec<u8>,
    ready: VecDeque<String>,
    open: bool,
}

impl<R: AsyncRead + Unpin> LineStream<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            partial: Vec::new(),
            ready: VecDeque::new(),
            open: true,
        }
    }

    async fn next_line(&mut self) -> io::Result<Option<String>> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            if let Some(line) = self.ready.pop_front() {
                return Ok(Some(line));
            }
            let n = self.reader.read(&mut chunk).await?;
            if n == 0 {
                return Ok(self.take_partial());
            }
            for &byte in &chunk[..n] {
                if byte == b'\n' || byte == b'\r' {
                    self.end_line();
                } else {
                    self.partial.push(byte);
                }
            }
        }
    }

    /// Everything read but not yet returned, including an unterminated tail.
    fn drain(&mut self) -> Vec<String> {
        self.end_line();
        self.ready.drain(..).collect()
    }

    fn end_line(&mut self) {
        if let Some(line) = self.take_partial() {
            self.ready.push_back(line);
        }
    }

    fn take_partial(&mut self) -> Option<String> {
        let line = String::from_utf8_lossy(&self.partial).trim().to_string();
        self.partial.clear();
        (!line.is_empty()).then_some(line)
    }
}

/// Cuts a line down to [`ECHO_LIMIT`] characters for logging.
fn echo_text(line: &str) -> Cow<'_, str> {
    match line.char_indices().nth(ECHO_LIMIT) {
        Some((cut, _)) => Cow::Owned(format!("{}... ({} bytes)", &line[..cut], line.len())),
        None => Cow::Borrowed(line),
    }
}

/// Why the read loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verdict {
    /// Both pipes closed; the process is exiting.
    Exiting,
    TimedOut,
    RateLimited,
}

/// Runs backends as child processes, watching their output and the clock.
#[derive(Debug, Clone, Default)]
pub struct ProcessSupervisor {
    verbose: bool,
}

impl ProcessSupervisor {
    /// Creates a supervisor. With `verbose` every backend line is logged at
    /// `info`, otherwise at `debug`.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    fn echo(&self, command: &CommandSpec, line: &str) {
        let backend = command.program.display();
        let text = echo_text(line);
        if self.verbose {
            info!(%backend, "  {}", text);
        } else {
            debug!(%backend, "  {}", text);
        }
    }

    /// Echoes and keeps one line. Returns true if it is a rate-limit signal.
    fn record(
        &self,
        command: &CommandSpec,
        line: String,
        lines: &mut Vec<String>,
        is_rate_limited: LinePredicate<'_>,
    ) -> bool {
        self.echo(command, &line);
        let limited = is_rate_limited(&line);
        lines.push(line);
        if limited {
            warn!(command = %command, "Rate limit detected, killing backend");
        }
        limited
    }
}

#[async_trait]
impl ProcessRunner for ProcessSupervisor {
    async fn run(
        &self,
        command: &CommandSpec,
        timeout: Duration,
        is_rate_limited: LinePredicate<'_>,
    ) -> Result<BackendOutcome, SupervisorError> {
        let start = Instant::now();
        let deadline = start + timeout;
        info!(command = %command, timeout_secs = timeout.as_secs(), "Running backend");

        let (handle, stdout, stderr) = ProcessHandle::spawn(command)?;
        let mut stdout = LineStream::new(stdout);
        let mut stderr = LineStream::new(stderr);
        let mut lines = Vec::new();

        let mut verdict = loop {
            if !stdout.open && !stderr.open {
                break Verdict::Exiting;
            }

            let (read, from_stdout) = tokio::select! {
                _ = sleep_until(deadline) => break Verdict::TimedOut,
                read = stdout.next_line(), if stdout.open => (read, true),
                read = stderr.next_line(), if stderr.open => (read, false),
            };

            match read {
                Ok(Some(line)) => {
                    if self.record(command, line, &mut lines, is_rate_limited) {
                        break Verdict::RateLimited;
                    }
                }
                Ok(None) => {
                    if from_stdout {
                        stdout.open = false;
                    } else {
                        stderr.open = false;
                    }
                }
                Err(e) => {
                    // A broken pipe ends that stream; the exit status still decides the outcome.
                    warn!(command = %command, error = %e, "Failed to read backend output");
                    if from_stdout {
                        stdout.open = false;
                    } else {
                        stderr.open = false;
                    }
                }
            }
        };

        if verdict == Verdict::TimedOut {
            // Output written without a line ending is still part of the run.
            for line in stdout.drain().into_iter().chain(stderr.drain()) {
                if self.record(command, line, &mut lines, is_rate_limited) {
                    verdict = Verdict::RateLimited;
                    break;
                }
            }
        }

        let release = match verdict {
            Verdict::Exiting => Release::Reap { deadline },
            Verdict::TimedOut | Verdict::RateLimited => Release::Kill,
        };
        let released = handle.release(release).await?;
        let elapsed = start.elapsed();

        let outcome = match (verdict, released) {
            (Verdict::RateLimited, _) => BackendOutcome::RateLimited { lines },
            (Verdict::TimedOut, _) | (Verdict::Exiting, Released::Killed) => {
                warn!(
                    command = %command,
                    elapsed_secs = elapsed.as_secs_f64(),
                    "Backend timed out, killed"
                );
                BackendOutcome::Timeout { elapsed, lines }
            }
            (Verdict::Exiting, Released::Exited(status)) if status.success() => {
                BackendOutcome::Success(ExitInfo { elapsed, lines })
            }
            (Verdict::Exiting, Released::Exited(status)) => BackendOutcome::Failed {
                code: status.code(),
                lines,
            },
        };

        info!(
            command = %command,
            outcome = outcome.label(),
            elapsed_secs = elapsed.as_secs_f64(),
            "Backend finished"
        );
        Ok(outcome)
    }
}
