// src/store/memory.rs
//! In-memory [`EventStore`] implementation.

use super::EventStore;
use crate::types::{Event, Summary};
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    // Insertion order is preserved; queries sort by arrival time.
    events: Vec<Event>,
    ids: HashMap<String, usize>,
    summaries: Vec<Summary>,
}

/// Process-local store; cheap to clone behind an `Arc`.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl EventStore for MemoryStore {
    async fn insert_event(&self, event: &Event) -> Result<()> {
        let mut g = self.inner.write().await;
        if g.ids.contains_key(&event.id) {
            return Ok(());
        }
        g.events.push(event.clone());
        let idx = g.events.len() - 1;
        g.ids.insert(event.id.clone(), idx);
        Ok(())
    }

    async fn event_exists(&self, id: &str) -> Result<bool> {
        Ok(self.inner.read().await.ids.contains_key(id))
    }

    async fn find_recent_duplicate(
        &self,
        source_id: &str,
        title: Option<&str>,
        body: Option<&str>,
        since: DateTime<Utc>,
    ) -> Result<bool> {
        let g = self.inner.read().await;
        Ok(g.events.iter().any(|e| {
            e.source_id == source_id
                && e.arrived_at >= since
                && e.title.as_deref() == title
                && e.body.as_deref() == body
        }))
    }

    async fn events_by_source(&self, source_id: &str, since: DateTime<Utc>) -> Result<Vec<Event>> {
        let g = self.inner.read().await;
        let mut out: Vec<Event> = g
            .events
            .iter()
            .filter(|e| e.source_id == source_id && e.arrived_at >= since)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.arrived_at.cmp(&a.arrived_at));
        Ok(out)
    }

    async fn unprocessed(&self, limit: usize) -> Result<Vec<Event>> {
        let g = self.inner.read().await;
        let mut out: Vec<Event> = g.events.iter().filter(|e| !e.processed).cloned().collect();
        out.sort_by(|a, b| b.arrived_at.cmp(&a.arrived_at));
        out.truncate(limit);
        Ok(out)
    }

    async fn mark_processed(&self, ids: &[String]) -> Result<()> {
        let mut g = self.inner.write().await;
        for e in g.events.iter_mut() {
            if ids.iter().any(|id| id == &e.id) {
                e.processed = true;
            }
        }
        Ok(())
    }

    async fn insert_summary(&self, summary: &Summary) -> Result<()> {
        self.inner.write().await.summaries.push(summary.clone());
        Ok(())
    }

    async fn recent_summaries(&self, limit: usize) -> Result<Vec<Summary>> {
        let g = self.inner.read().await;
        let mut out = g.summaries.clone();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        out.truncate(limit);
        Ok(out)
    }

    async fn purge_older_than(&self, cutoff: DateTime<Utc>) -> Result<()> {
        let mut g = self.inner.write().await;
        g.events.retain(|e| e.arrived_at >= cutoff);
        g.summaries.retain(|s| s.created_at >= cutoff);
        let ids: HashMap<String, usize> = g
            .events
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id.clone(), i))
            .collect();
        g.ids = ids;
        Ok(())
    }

    async fn count_events(&self) -> Result<usize> {
        Ok(self.inner.read().await.events.len())
    }

    async fn count_summaries(&self) -> Result<usize> {
        Ok(self.inner.read().await.summaries.len())
    }
}
