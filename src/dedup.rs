// src/dedup.rs
//! Dedup guard: rejects exact-id repeats and near-duplicates.
//!
//! Sources re-deliver the same notification on unrelated system triggers;
//! an event is a duplicate when its id already exists, or when the same
//! source stored identical (title, body) within the recency window.

use crate::config::TriageConfig;
use crate::store::EventStore;
use crate::types::Event;
use anyhow::Result;
use chrono::{DateTime, Utc};
use metrics::counter;

pub struct DedupGuard {
    window: chrono::Duration,
}

impl DedupGuard {
    pub fn new(cfg: &TriageConfig) -> Self {
        Self {
            window: cfg.dedup_window(),
        }
    }

    /// True when the event must be rejected (no-op, not persisted).
    pub async fn is_duplicate(
        &self,
        store: &dyn EventStore,
        event: &Event,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        if store.event_exists(&event.id).await? {
            counter!("triage_dedup_total").increment(1);
            tracing::debug!(id = %event.id, "duplicate id rejected");
            return Ok(true);
        }
        let since = now - self.window;
        if store
            .find_recent_duplicate(
                &event.source_id,
                event.title.as_deref(),
                event.body.as_deref(),
                since,
            )
            .await?
        {
            counter!("triage_dedup_total").increment(1);
            tracing::debug!(source = %event.source_id, "near-duplicate within window rejected");
            return Ok(true);
        }
        Ok(false)
    }
}
