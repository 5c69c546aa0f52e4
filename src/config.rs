// src/config.rs
//! Runtime configuration for the triage pipeline.
//!
//! Every window, delay, threshold and budget lives here so acceptance tests
//! can pin exact values without touching call sites. Loaded from a TOML file
//! (`TRIAGE_CONFIG_PATH`, default `config/triage.toml`); a missing file or
//! missing keys fall back to the defaults below.

use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "config/triage.toml";
pub const ENV_CONFIG_PATH: &str = "TRIAGE_CONFIG_PATH";

fn default_own_source_id() -> String {
    "app.digest.notifications".to_string()
}

fn default_source_denylist() -> Vec<String> {
    [
        "com.android.systemui",
        "com.android.bluetooth",
        "com.android.providers.downloads",
        "com.android.mediacenter",
        "com.android.music",
        "android",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_dedup_window_secs() -> u64 {
    60
}
fn default_single_delay_secs() -> u64 {
    5
}
fn default_multiple_delay_secs() -> u64 {
    10
}
fn default_pause_secs() -> u64 {
    30
}
fn default_sweep_interval_secs() -> u64 {
    120
}
fn default_retention_sweep_interval_secs() -> u64 {
    3600
}
fn default_high_frequency_threshold() -> u32 {
    10
}
fn default_single_long_threshold() -> usize {
    26
}
fn default_single_budget_chars() -> usize {
    1000
}
fn default_batch_budget_chars() -> usize {
    2000
}
fn default_min_sanitized_chars() -> usize {
    3
}
fn default_retry_delay_secs() -> u64 {
    5
}
fn default_sweep_min_batch() -> usize {
    3
}
fn default_sweep_fetch_limit() -> usize {
    10
}
fn default_retention_days() -> i64 {
    7
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageConfig {
    /// Source id of the host app itself; its own events are never ingested.
    #[serde(default = "default_own_source_id")]
    pub own_source_id: String,
    /// Sources whose events are never informational (system UI, pairing,
    /// transport controls).
    #[serde(default = "default_source_denylist")]
    pub source_denylist: Vec<String>,

    /// Near-duplicate rejection window (same source, same title+body).
    #[serde(default = "default_dedup_window_secs")]
    pub dedup_window_secs: u64,

    /// Debounce delay for a single long notification.
    #[serde(default = "default_single_delay_secs")]
    pub single_delay_secs: u64,
    /// Debounce delay for a multi-notification burst.
    #[serde(default = "default_multiple_delay_secs")]
    pub multiple_delay_secs: u64,
    /// High-frequency pause length; the batch fires when it ends.
    #[serde(default = "default_pause_secs")]
    pub pause_secs: u64,

    /// Count above which a source enters the high-frequency pause.
    #[serde(default = "default_high_frequency_threshold")]
    pub high_frequency_threshold: u32,
    /// Body length (chars) above which one notification is worth a summary.
    #[serde(default = "default_single_long_threshold")]
    pub single_long_threshold: usize,

    /// Character budget handed to inference for a single long notification.
    #[serde(default = "default_single_budget_chars")]
    pub single_budget_chars: usize,
    /// Character budget for every batch scenario.
    #[serde(default = "default_batch_budget_chars")]
    pub batch_budget_chars: usize,

    /// Events whose sanitized title+body fall below this are dropped.
    #[serde(default = "default_min_sanitized_chars")]
    pub min_sanitized_chars: usize,

    /// Backoff before the single inference retry.
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    /// Low-frequency sweep cadence.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// Minimum unprocessed events before the sweep summarizes.
    #[serde(default = "default_sweep_min_batch")]
    pub sweep_min_batch: usize,
    /// How many unprocessed events one sweep pass may pick up.
    #[serde(default = "default_sweep_fetch_limit")]
    pub sweep_fetch_limit: usize,

    /// Retention purge cadence.
    #[serde(default = "default_retention_sweep_interval_secs")]
    pub retention_sweep_interval_secs: u64,
    /// Events and summaries older than this are purged.
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
}

impl Default for TriageConfig {
    fn default() -> Self {
        // Round-trip through serde so the field defaults stay the single
        // source of truth.
        toml::from_str("").expect("empty config table parses")
    }
}

impl TriageConfig {
    /// Load from `path`; falls back to defaults when the file is absent and
    /// errors only on present-but-invalid TOML.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        match std::fs::read_to_string(path.as_ref()) {
            Ok(data) => {
                let cfg: TriageConfig = toml::from_str(&data)?;
                Ok(cfg)
            }
            Err(_) => Ok(TriageConfig::default()),
        }
    }

    /// Resolve the config path from `TRIAGE_CONFIG_PATH` and load it.
    pub fn from_env() -> anyhow::Result<Self> {
        let path = std::env::var(ENV_CONFIG_PATH).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
        Self::load_from_file(path)
    }

    pub fn dedup_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.dedup_window_secs as i64)
    }

    pub fn retention_cutoff(&self, now: chrono::DateTime<chrono::Utc>) -> chrono::DateTime<chrono::Utc> {
        now - chrono::Duration::days(self.retention_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_trigger_constants() {
        let cfg = TriageConfig::default();
        assert_eq!(cfg.single_delay_secs, 5);
        assert_eq!(cfg.multiple_delay_secs, 10);
        assert_eq!(cfg.pause_secs, 30);
        assert_eq!(cfg.high_frequency_threshold, 10);
        assert_eq!(cfg.single_long_threshold, 26);
        assert_eq!(cfg.single_budget_chars, 1000);
        assert_eq!(cfg.batch_budget_chars, 2000);
        assert_eq!(cfg.dedup_window_secs, 60);
        assert_eq!(cfg.retention_days, 7);
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let cfg: TriageConfig = toml::from_str("dedup_window_secs = 120").unwrap();
        assert_eq!(cfg.dedup_window_secs, 120);
        assert_eq!(cfg.pause_secs, 30);
        assert!(!cfg.source_denylist.is_empty());
    }
}
