//! Backend process supervision.
//!
//! Runs an external download backend, streams its merged stdout/stderr as
//! lines, and classifies the run as a [`BackendOutcome`]:
//!
//! - exit code 0 → `Success`
//! - non-zero exit → `Failed`
//! - wall-clock budget exceeded → `Timeout` (process killed)
//! - a line matching the rate-limit predicate → `RateLimited` (process killed)
//!
//! Every spawned process is owned by a [`ProcessHandle`], which is released
//! in exactly one place and kills the process if dropped unreleased.
//!
//! # Example
//!
//! ```ignore
//! use trackfetch_core::supervisor::{CommandSpec, ProcessRunner, ProcessSupervisor};
//!
//! let supervisor = ProcessSupervisor::new(true);
//! let command = CommandSpec::new("spotdl").arg(url).args(["--output", "downloads"]);
//! let outcome = supervisor
//!     .run(&command, Duration::from_secs(120), &|line| line.contains("429"))
//!     .await?;
//! ```

mod error;
mod handle;
mod runner;
mod traits;
mod types;

pub use error::SupervisorError;
pub use handle::{ProcessHandle, Release, Released};
pub use runner::ProcessSupervisor;
pub use traits::{LinePredicate, ProcessRunner};
pub use types::{BackendOutcome, CommandSpec, ExitInfo};
