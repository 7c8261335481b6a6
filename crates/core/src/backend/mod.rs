//! Download backend adapters.
//!
//! Each backend's argument contract and output format live behind
//! [`BackendAdapter`]:
//!
//! - [`SpotdlBackend`]: primary, takes a service URL, reports
//!   `Downloaded "Artist - Title": <url>` lines
//! - [`YtDlpBackend`]: secondary, searches and emits `--dump-json` records

mod spotdl;
mod traits;
mod ytdlp;

pub use spotdl::SpotdlBackend;
pub use traits::{is_rate_limit_line, BackendAdapter, BackendKind};
pub use ytdlp::YtDlpBackend;
