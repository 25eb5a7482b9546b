use std::time::Duration;

use crate::error::AppError;

/// Tuning knobs for a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Maximum number of fetches in flight at once.
    pub max_concurrency: usize,
    /// Timeout applied to each fetch attempt.
    pub fetch_timeout: Duration,
    /// Extra attempts after a retryable fetch failure.
    pub max_retries: u32,
    /// Base delay before a retry; doubles on each further attempt.
    pub retry_backoff: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            fetch_timeout: Duration::from_secs(30),
            max_retries: 1,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

impl PipelineConfig {
    /// Read configuration from environment variables, falling back to defaults.
    ///
    /// - `VACANCY_MAX_CONCURRENCY` (optional, defaults to 4, must be at least 1)
    /// - `VACANCY_FETCH_TIMEOUT_SECS` (optional, defaults to 30, must be at least 1)
    /// - `VACANCY_FETCH_RETRIES` (optional, defaults to 1)
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = Self::default();

        let max_concurrency = match lookup("VACANCY_MAX_CONCURRENCY") {
            None => defaults.max_concurrency,
            Some(raw) => parse_positive("VACANCY_MAX_CONCURRENCY", &raw)? as usize,
        };

        let fetch_timeout = match lookup("VACANCY_FETCH_TIMEOUT_SECS") {
            None => defaults.fetch_timeout,
            Some(raw) => Duration::from_secs(parse_positive("VACANCY_FETCH_TIMEOUT_SECS", &raw)?),
        };

        let max_retries = match lookup("VACANCY_FETCH_RETRIES") {
            None => defaults.max_retries,
            Some(raw) => raw.trim().parse().map_err(|_| {
                AppError::ConfigError(format!(
                    "Invalid VACANCY_FETCH_RETRIES '{raw}': must be a non-negative integer"
                ))
            })?,
        };

        Ok(Self {
            max_concurrency,
            fetch_timeout,
            max_retries,
            retry_backoff: defaults.retry_backoff,
        })
    }

    /// Backoff before retry number `attempt` (1-indexed), capped at 8x the base.
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(3);
        self.retry_backoff * factor
    }
}

fn parse_positive(key: &str, raw: &str) -> Result<u64, AppError> {
    let parsed: u64 = raw.trim().parse().map_err(|_| {
        AppError::ConfigError(format!(
            "Invalid {key} '{raw}': must be a positive integer"
        ))
    })?;
    if parsed == 0 {
        return Err(AppError::ConfigError(format!("{key} must be at least 1")));
    }
    Ok(parsed)
}
