use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::json::WalkLimits;

/// Tunables for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Reference instant for the recency window.
    pub as_of: DateTime<Utc>,
    /// Draws older than `as_of - recency_window_days` are discarded.
    pub recency_window_days: i64,
    /// Cap on candidates the JSON mining lane emits per capture.
    pub json_max_records: usize,
    pub json_max_depth: usize,
    pub json_max_nodes: usize,
    /// Characters on each side of a bonus-label match searched for a date.
    pub scan_window: usize,
    /// Cap on embedded JSON spans tried per markup capture.
    pub max_json_spans: usize,
    /// Process captures one at a time instead of on the rayon pool.
    pub sequential: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            as_of: Utc::now(),
            recency_window_days: 14,
            json_max_records: 500,
            json_max_depth: 64,
            json_max_nodes: 20_000,
            scan_window: 2_500,
            max_json_spans: 64,
            sequential: false,
        }
    }
}

impl PipelineConfig {
    /// Defaults overridden by environment variables.
    ///
    /// - `TYCHE_RECENCY_DAYS` (optional, defaults to 14, must be at least 1)
    /// - `TYCHE_JSON_MAX_RECORDS` (optional, defaults to 500)
    /// - `TYCHE_SCAN_WINDOW` (optional, defaults to 2500)
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = Self::default();

        let recency_window_days =
            positive(&lookup, "TYCHE_RECENCY_DAYS", defaults.recency_window_days as usize)? as i64;
        let json_max_records =
            positive(&lookup, "TYCHE_JSON_MAX_RECORDS", defaults.json_max_records)?;
        let scan_window = positive(&lookup, "TYCHE_SCAN_WINDOW", defaults.scan_window)?;

        Ok(Self {
            recency_window_days,
            json_max_records,
            scan_window,
            ..defaults
        })
    }

    pub fn with_as_of(mut self, as_of: DateTime<Utc>) -> Self {
        self.as_of = as_of;
        self
    }

    pub fn with_recency_window(mut self, days: i64) -> Result<Self, AppError> {
        if days < 1 {
            return Err(AppError::ConfigError(
                "Recency window must be at least 1 day".into(),
            ));
        }
        self.recency_window_days = days;
        Ok(self)
    }

    pub fn with_sequential(mut self, sequential: bool) -> Self {
        self.sequential = sequential;
        self
    }

    pub fn walk_limits(&self) -> WalkLimits {
        WalkLimits {
            max_depth: self.json_max_depth,
            max_nodes: self.json_max_nodes,
        }
    }
}

fn positive(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: usize,
) -> Result<usize, AppError> {
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    let parsed: usize = raw.trim().parse().map_err(|_| {
        AppError::ConfigError(format!(
            "Invalid {key} '{raw}': must be a positive integer"
        ))
    })?;
    if parsed == 0 {
        return Err(AppError::ConfigError(format!("{key} must be at least 1")));
    }
    Ok(parsed)
}
