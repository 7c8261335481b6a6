//! Acquisition orchestrator implementation.
//!
//! Drives one request through its state machine:
//! `START -> CLASSIFIED -> BACKEND_RUNNING -> OUTCOME_EVALUATED ->
//! [FALLBACK_RUNNING ->] DONE`. No state is revisited, and at most one
//! fallback happens per request.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::backend::{BackendAdapter, BackendKind, SpotdlBackend, YtDlpBackend};
use crate::config::Config;
use crate::error::AcquisitionError;
use crate::fetch::{FetchError, HttpFetcher, ReqwestFetcher};
use crate::metrics;
use crate::resolver::{MetadataResolver, TrackMetadata};
use crate::router::{FallbackRouter, NextAction, Stage};
use crate::supervisor::{BackendOutcome, CommandSpec, ExitInfo, ProcessRunner, ProcessSupervisor};

use super::files::{cover_extension, list_audio_files, newest_new_file, sanitize_filename};
use super::types::{Acquired, AcquisitionRequest, AcquisitionResult, Attempt, BackendStatus};

/// Budget for a backend's `--version` probe.
const VERSION_PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Top-level coordinator: turns one request into one [`AcquisitionResult`].
pub struct AcquisitionOrchestrator {
    runner: Arc<dyn ProcessRunner>,
    fetcher: Arc<dyn HttpFetcher>,
    resolver: MetadataResolver,
    router: FallbackRouter,
    primary: SpotdlBackend,
    secondary: YtDlpBackend,
    output_dir: PathBuf,
    audio_format: String,
    service_domain: String,
    primary_timeout: Duration,
    download_timeout: Duration,
    cover_timeout: Duration,
}

impl AcquisitionOrchestrator {
    /// Creates an orchestrator over the given process runner and fetcher.
    pub fn new(
        config: &Config,
        runner: Arc<dyn ProcessRunner>,
        fetcher: Arc<dyn HttpFetcher>,
    ) -> Self {
        let primary = SpotdlBackend::new(&config.primary, &config.output);
        let secondary = YtDlpBackend::new(&config.secondary, &config.output);
        let resolver = MetadataResolver::new(
            runner.clone(),
            fetcher.clone(),
            secondary.clone(),
            &config.secondary,
            &config.http,
        );

        Self {
            runner,
            fetcher,
            resolver,
            router: FallbackRouter::new(),
            primary,
            secondary,
            output_dir: config.output.dir.clone(),
            audio_format: config.output.audio_format.clone(),
            service_domain: config.primary.service_domain.clone(),
            primary_timeout: config.primary.timeout(),
            download_timeout: config.secondary.download_timeout(),
            cover_timeout: config.http.cover_timeout(),
        }
    }

    /// Creates an orchestrator that spawns real backends and uses reqwest.
    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        let runner = Arc::new(ProcessSupervisor::new(config.logging.verbose));
        let fetcher = Arc::new(ReqwestFetcher::new(&config.http.user_agent)?);
        Ok(Self::new(config, runner, fetcher))
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Classifies raw operator input against the configured service domain.
    pub fn classify(&self, input: &str) -> AcquisitionRequest {
        AcquisitionRequest::classify(input, &self.service_domain)
    }

    /// Runs one request to completion. Never fails: every error becomes a
    /// failed result carrying a diagnostic message.
    pub async fn acquire(&self, request: AcquisitionRequest) -> AcquisitionResult {
        let request_id = Uuid::new_v4();
        let span = info_span!("acquire", id = %request_id);
        self.acquire_inner(request_id, request).instrument(span).await
    }

    async fn acquire_inner(&self, request_id: Uuid, request: AcquisitionRequest) -> AcquisitionResult {
        let started_at = Utc::now();
        let start = Instant::now();
        debug!(state = "START", request = %request);
        info!("Processing {}", request);

        let mut attempt = Attempt::default();
        let outcome = self.run_request(&request, &mut attempt).await;
        let elapsed = start.elapsed();

        let result = match outcome {
            Ok(acquired) => {
                let mut message = format!("Downloaded {}", acquired.audio_path.display());
                if !attempt.notes.is_empty() {
                    message.push_str(&format!(" ({})", attempt.notes.join("; ")));
                }
                info!(
                    audio = %acquired.audio_path.display(),
                    backend = %acquired.backend,
                    fallback = attempt.used_fallback,
                    elapsed_secs = elapsed.as_secs_f64(),
                    "Acquisition succeeded"
                );
                metrics::ACQUISITIONS.with_label_values(&["success"]).inc();

                AcquisitionResult {
                    request_id,
                    request,
                    success: true,
                    audio_path: Some(acquired.audio_path),
                    cover_path: acquired.cover_path,
                    metadata: attempt.metadata,
                    message,
                    backend: Some(acquired.backend),
                    used_fallback: attempt.used_fallback,
                    started_at,
                    elapsed,
                }
            }
            Err(err) => {
                error!(error = %err, elapsed_secs = elapsed.as_secs_f64(), "Acquisition failed");
                metrics::ACQUISITIONS.with_label_values(&[err.label()]).inc();

                AcquisitionResult {
                    request_id,
                    request,
                    success: false,
                    audio_path: None,
                    cover_path: None,
                    metadata: attempt.metadata,
                    message: err.diagnostic(),
                    backend: None,
                    used_fallback: attempt.used_fallback,
                    started_at,
                    elapsed,
                }
            }
        };

        let success = if result.success { "true" } else { "false" };
        metrics::ACQUISITION_DURATION
            .with_label_values(&[success])
            .observe(elapsed.as_secs_f64());
        debug!(state = "DONE", success = result.success);
        result
    }

    async fn run_request(
        &self,
        request: &AcquisitionRequest,
        attempt: &mut Attempt,
    ) -> Result<Acquired, AcquisitionError> {
        tokio::fs::create_dir_all(&self.output_dir).await?;

        match request {
            AcquisitionRequest::ServiceUrl(url) => {
                debug!(state = "CLASSIFIED", route = "primary");
                self.run_primary(request, url, attempt).await
            }
            AcquisitionRequest::SearchQuery(query) => {
                debug!(state = "CLASSIFIED", route = "secondary");
                self.run_secondary(query, Stage::Direct, attempt).await
            }
        }
    }

    /// Service URL path: primary backend, with one fallback on rate limiting.
    async fn run_primary(
        &self,
        request: &AcquisitionRequest,
        url: &str,
        attempt: &mut Attempt,
    ) -> Result<Acquired, AcquisitionError> {
        let before: HashSet<PathBuf> = list_audio_files(&self.output_dir, &self.audio_format)
            .await?
            .into_iter()
            .map(|(path, _)| path)
            .collect();

        let command = self.primary.download_command(url, &self.output_dir);
        let outcome = self
            .run_backend(&self.primary, &command, self.primary_timeout)
            .await?;

        match self
            .router
            .on_outcome(Stage::Primary, BackendKind::Primary, outcome, request, &self.resolver)
            .await
        {
            NextAction::Accept(exit) => self.collect_primary(&before, exit, attempt).await,
            NextAction::Retry { request: derived, .. } => {
                attempt.used_fallback = true;
                metrics::FALLBACKS.inc();
                debug!(state = "FALLBACK_RUNNING", query = derived.text());
                info!("Retrying with {} on {}", derived, BackendKind::Secondary);
                self.run_secondary(derived.text(), Stage::Fallback, attempt)
                    .await
            }
            NextAction::GiveUp(err) => Err(err),
        }
    }

    /// Locates the primary backend's file and recovers what metadata its
    /// output carries.
    async fn collect_primary(
        &self,
        before: &HashSet<PathBuf>,
        exit: ExitInfo,
        attempt: &mut Attempt,
    ) -> Result<Acquired, AcquisitionError> {
        let metadata = match self.primary.parse_metadata(&exit.lines) {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                debug!(error = %e, "No metadata in primary output");
                None
            }
        };

        let after = list_audio_files(&self.output_dir, &self.audio_format).await?;
        let mut audio_path = newest_new_file(before, after);

        // spotdl skips tracks that already exist; accept the existing file.
        if audio_path.is_none() {
            if let Some(metadata) = &metadata {
                let existing = self.audio_path_for(&sanitize_filename(&metadata.display_name()));
                if tokio::fs::metadata(&existing).await.is_ok() {
                    debug!(path = %existing.display(), "Primary reused an existing file");
                    audio_path = Some(existing);
                }
            }
        }
        attempt.metadata = metadata;

        let audio_path = audio_path.ok_or_else(|| {
            AcquisitionError::backend_failed(
                BackendKind::Primary,
                "exited successfully but no audio file was produced",
                exit.lines,
            )
        })?;

        Ok(Acquired {
            audio_path,
            cover_path: None,
            backend: BackendKind::Primary,
        })
    }

    /// Secondary pipeline: resolve metadata, download audio, fetch cover.
    async fn run_secondary(
        &self,
        query: &str,
        stage: Stage,
        attempt: &mut Attempt,
    ) -> Result<Acquired, AcquisitionError> {
        let metadata = self.resolver.resolve_by_query(query).await?;
        attempt.metadata = Some(metadata.clone());

        let base = sanitize_filename(&metadata.display_name());
        let template = self.output_dir.join(format!("{}.%(ext)s", base));
        let command = self
            .secondary
            .download_command(metadata.source_url(), &template);
        let outcome = self
            .run_backend(&self.secondary, &command, self.download_timeout)
            .await?;

        let request = AcquisitionRequest::SearchQuery(query.to_string());
        let exit = match self
            .router
            .on_outcome(stage, BackendKind::Secondary, outcome, &request, &self.resolver)
            .await
        {
            NextAction::Accept(exit) => exit,
            NextAction::GiveUp(err) => return Err(err),
            NextAction::Retry { .. } => {
                warn!("Router asked for a second fallback, refusing");
                return Err(AcquisitionError::RateLimited {
                    backend: BackendKind::Secondary,
                    output: Vec::new(),
                });
            }
        };

        let audio_path = self.audio_path_for(&base);
        if tokio::fs::metadata(&audio_path).await.is_err() {
            return Err(AcquisitionError::backend_failed(
                BackendKind::Secondary,
                format!("expected audio file {} was not created", audio_path.display()),
                exit.lines,
            ));
        }

        let cover_path = self.fetch_cover(&metadata, &base, attempt).await;

        Ok(Acquired {
            audio_path,
            cover_path,
            backend: BackendKind::Secondary,
        })
    }

    async fn run_backend<B: BackendAdapter>(
        &self,
        backend: &B,
        command: &CommandSpec,
        timeout: Duration,
    ) -> Result<BackendOutcome, AcquisitionError> {
        debug!(state = "BACKEND_RUNNING", backend = %backend.kind());
        let is_rate_limited = |line: &str| backend.is_rate_limit_signal(line);
        let outcome = self.runner.run(command, timeout, &is_rate_limited).await?;
        metrics::record_backend_run(backend.kind(), outcome.label());
        debug!(state = "OUTCOME_EVALUATED", backend = %backend.kind(), outcome = outcome.label());
        Ok(outcome)
    }

    /// Downloads the selected thumbnail next to the audio file. Failures
    /// only add a note to the result.
    async fn fetch_cover(
        &self,
        metadata: &TrackMetadata,
        base: &str,
        attempt: &mut Attempt,
    ) -> Option<PathBuf> {
        let Some(url) = metadata.selected_thumbnail_url() else {
            metrics::COVER_DOWNLOADS.with_label_values(&["unavailable"]).inc();
            attempt.notes.push("no cover art available".to_string());
            return None;
        };

        let dest = self
            .output_dir
            .join(format!("{}.{}", base, cover_extension(url)));
        match self.fetcher.download(url, &dest, self.cover_timeout).await {
            Ok(bytes) => {
                info!(path = %dest.display(), bytes, "Saved cover art");
                metrics::COVER_DOWNLOADS.with_label_values(&["success"]).inc();
                Some(dest)
            }
            Err(e) => {
                warn!(url, error = %e, "Cover art download failed");
                metrics::COVER_DOWNLOADS.with_label_values(&["failed"]).inc();
                attempt.notes.push(format!("cover art missing: {}", e));
                None
            }
        }
    }

    fn audio_path_for(&self, base: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}.{}", base, self.audio_format))
    }

    /// Probes both backends with their version command.
    pub async fn check_backends(&self) -> Vec<BackendStatus> {
        vec![
            self.probe(&self.primary).await,
            self.probe(&self.secondary).await,
        ]
    }

    async fn probe<B: BackendAdapter>(&self, backend: &B) -> BackendStatus {
        let command = backend.version_command();
        let never = |_: &str| false;
        let result = self.runner.run(&command, VERSION_PROBE_TIMEOUT, &never).await;

        let (available, detail) = match result {
            Ok(BackendOutcome::Success(exit)) => {
                let version = exit.lines.into_iter().find(|l| !l.is_empty());
                (true, version)
            }
            Ok(other) => (false, Some(format!("version check {}", other.label()))),
            Err(e) => (false, Some(e.to_string())),
        };

        if available {
            info!(backend = backend.name(), "Backend available");
        } else {
            warn!(backend = backend.name(), detail = detail.as_deref().unwrap_or("-"), "Backend not available");
        }

        BackendStatus {
            kind: backend.kind(),
            name: backend.name().to_string(),
            available,
            detail,
        }
    }
}
