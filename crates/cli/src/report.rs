//! Operator-facing rendering of results.

use std::fmt::Write;

use anyhow::Result;
use trackfetch_core::metrics::SessionSummary;
use trackfetch_core::{AcquisitionResult, BackendKind, BackendStatus};

const INSTALL_HINT: &str = "Install the missing backends with: pip install spotdl yt-dlp";

fn duration_text(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

/// Renders one result, as JSON or as a short text block.
pub fn render(result: &AcquisitionResult, json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(result)?);
    }

    let mut out = String::new();
    if !result.success {
        let _ = write!(out, "FAILED: {}", result.message);
        return Ok(out);
    }

    let _ = writeln!(out, "OK: {}", result.message);
    if let Some(cover) = &result.cover_path {
        let _ = writeln!(out, "  Cover:    {}", cover.display());
    }
    if let Some(meta) = &result.metadata {
        let _ = writeln!(out, "  Track:    {}", meta.display_name());
        if let Some(album) = meta.album() {
            let _ = writeln!(out, "  Album:    {}", album);
        }
        if meta.duration_secs() > 0 {
            let _ = writeln!(out, "  Duration: {}", duration_text(meta.duration_secs()));
        }
        let _ = writeln!(out, "  Source:   {}", meta.source_url());
    }
    if let Some(backend) = result.backend {
        let via = if result.used_fallback && backend == BackendKind::Secondary {
            " (fallback)"
        } else {
            ""
        };
        let _ = writeln!(out, "  Backend:  {}{}", backend, via);
    }
    let _ = write!(out, "  Time:     {:.1}s", result.elapsed.as_secs_f64());
    Ok(out)
}

/// Renders the backend availability check.
pub fn render_check(statuses: &[BackendStatus]) -> String {
    let mut out = String::new();
    for status in statuses {
        let state = if status.available { "ok" } else { "MISSING" };
        let _ = write!(out, "{:<10} {:<8} {:<8}", status.kind, status.name, state);
        if let Some(detail) = &status.detail {
            let _ = write!(out, " {}", detail);
        }
        out.push('\n');
    }
    if statuses.iter().any(|s| !s.available) {
        out.push_str(INSTALL_HINT);
    } else {
        out.push_str("All backends available");
    }
    out
}

pub fn render_summary(summary: &SessionSummary) -> String {
    format!(
        "Session: {} succeeded, {} failed, {} fallbacks",
        summary.succeeded, summary.failed, summary.fallbacks
    )
}
