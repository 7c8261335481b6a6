pub mod backend;
pub mod config;
pub mod error;
pub mod fetch;
pub mod metrics;
pub mod orchestrator;
pub mod resolver;
pub mod router;
pub mod supervisor;
pub mod testing;

pub use backend::{BackendAdapter, BackendKind, SpotdlBackend, YtDlpBackend};
pub use config::{
    load_config, load_config_from_str, load_default_config, validate_config, Config, ConfigError,
};
pub use error::AcquisitionError;
pub use fetch::{FetchError, HttpFetcher, ReqwestFetcher};
pub use orchestrator::{AcquisitionOrchestrator, AcquisitionRequest, AcquisitionResult, BackendStatus};
pub use resolver::{MetadataResolver, TrackMetadata};
pub use supervisor::{BackendOutcome, ProcessRunner, ProcessSupervisor};
