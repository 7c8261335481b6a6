use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Every timeout is non-zero
/// - Backend programs, audio format and service domain are non-empty
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let timeouts = [
        ("primary.timeout_secs", config.primary.timeout_secs),
        (
            "secondary.metadata_timeout_secs",
            config.secondary.metadata_timeout_secs,
        ),
        (
            "secondary.download_timeout_secs",
            config.secondary.download_timeout_secs,
        ),
        ("http.page_timeout_secs", config.http.page_timeout_secs),
        ("http.cover_timeout_secs", config.http.cover_timeout_secs),
    ];
    for (name, secs) in timeouts {
        if secs == 0 {
            return Err(ConfigError::ValidationError(format!("{} cannot be 0", name)));
        }
    }

    if config.primary.program.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "primary.program cannot be empty".to_string(),
        ));
    }
    if config.secondary.program.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "secondary.program cannot be empty".to_string(),
        ));
    }
    if config.primary.service_domain.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "primary.service_domain cannot be empty".to_string(),
        ));
    }
    if config.output.audio_format.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "output.audio_format cannot be empty".to_string(),
        ));
    }

    Ok(())
}
