// src/store/mod.rs
//! Narrow async interface to the persistent event/summary store.
//!
//! Durable storage is an external collaborator; the core only depends on
//! this trait. The in-memory implementation backs tests, demos and any
//! embedder that does not need persistence.

pub mod memory;

use crate::types::{Event, Summary};
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;

#[async_trait::async_trait]
pub trait EventStore: Send + Sync {
    /// Insert one event. The caller has already de-duplicated.
    async fn insert_event(&self, event: &Event) -> Result<()>;

    /// Exact-id existence check.
    async fn event_exists(&self, id: &str) -> Result<bool>;

    /// True if the same source stored an event with identical (title, body)
    /// at or after `since`.
    async fn find_recent_duplicate(
        &self,
        source_id: &str,
        title: Option<&str>,
        body: Option<&str>,
        since: DateTime<Utc>,
    ) -> Result<bool>;

    /// Events for one source arriving at or after `since`, newest first.
    async fn events_by_source(&self, source_id: &str, since: DateTime<Utc>) -> Result<Vec<Event>>;

    /// Up to `limit` events that have not yet contributed to a summary,
    /// newest first.
    async fn unprocessed(&self, limit: usize) -> Result<Vec<Event>>;

    /// Flip `processed` on every listed event.
    async fn mark_processed(&self, ids: &[String]) -> Result<()>;

    async fn insert_summary(&self, summary: &Summary) -> Result<()>;

    /// Most recent summaries, newest first.
    async fn recent_summaries(&self, limit: usize) -> Result<Vec<Summary>>;

    /// Drop events and summaries older than `cutoff`.
    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<()>;

    async fn count_events(&self) -> Result<usize>;
    async fn count_summaries(&self) -> Result<usize>;
}

pub type SharedStore = Arc<dyn EventStore>;
