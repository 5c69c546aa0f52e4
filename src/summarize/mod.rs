// src/summarize/mod.rs
//! Summarization gateway.
//!
//! Takes a finalized batch of events (newest first) plus its scenario,
//! truncates to the scenario's character budget, asks the inference
//! collaborator, retries once, and otherwise falls back to the rule
//! classifier. The resulting summary is persisted, the contributing events
//! are marked processed, and the notifier mux is handed the summary
//! fire-and-forget.

pub mod client;
pub mod rules;

use crate::config::TriageConfig;
use crate::notify::NotifierMux;
use crate::store::SharedStore;
use crate::types::{Event, Scenario, Summary};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use client::DynInferenceClient;
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Wire contract of the inference collaborator. Field names are exact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SummarizeRequest {
    #[serde(rename = "currentTime")]
    pub current_time: String,
    pub events: Vec<EventPayload>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub time: String,
    #[serde(rename = "sourceId")]
    pub source_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InferenceReply {
    pub title: String,
    pub body: String,
    pub importance: u8,
}

impl InferenceReply {
    /// Malformed replies (blank text, out-of-range importance) are treated
    /// as inference failure, not clamped.
    pub fn is_well_formed(&self) -> bool {
        !self.title.trim().is_empty()
            && !self.body.trim().is_empty()
            && (1..=5).contains(&self.importance)
    }
}

/// Timestamp format shared with the inference endpoint.
const WIRE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Minimum budget left for the first overflowing event to be worth keeping
/// in truncated form.
const MIN_TRUNCATED_CHARS: usize = 50;

/// Sentence terminators for the truncation cut, CJK included.
const SENTENCE_ENDS: &[char] = &['.', '!', '?', '。', '！', '？'];

pub struct SummaryGateway {
    cfg: Arc<TriageConfig>,
    store: SharedStore,
    client: DynInferenceClient,
    notifier: Arc<NotifierMux>,
}

impl SummaryGateway {
    pub fn new(
        cfg: Arc<TriageConfig>,
        store: SharedStore,
        client: DynInferenceClient,
        notifier: Arc<NotifierMux>,
    ) -> Self {
        Self {
            cfg,
            store,
            client,
            notifier,
        }
    }

    /// Summarize one batch. Empty batches are a no-op (`Ok(None)`), never an
    /// error. A failed summary write aborts the cycle without marking
    /// anything processed; the periodic sweep will pick the events up again.
    pub async fn summarize_batch(
        &self,
        events: Vec<Event>,
        scenario: Scenario,
    ) -> Result<Option<Summary>> {
        if events.is_empty() {
            tracing::debug!(%scenario, "empty batch reached the gateway, skipping");
            return Ok(None);
        }

        let now = Utc::now();
        let budget = scenario.char_budget(&self.cfg);
        let truncated = truncate_batch(&events, budget);
        let request = build_request(now, &truncated);

        let reply = self.attempt_with_retry(&request).await;
        let (title, body, importance) = match reply {
            Some(r) => (r.title, r.body, r.importance),
            None => {
                counter!("triage_fallback_total").increment(1);
                tracing::info!(%scenario, "inference unavailable, using rule classifier");
                let c = rules::classify(&truncated);
                (c.title, c.body, c.importance)
            }
        };

        // The summary body honors the same budget as the input.
        let body = hard_truncate(&body, budget);
        let first = &events[0];
        let summary = Summary::new(
            first.source_id.clone(),
            first.source_label.clone(),
            title,
            body,
            importance,
            now,
        );

        self.store
            .insert_summary(&summary)
            .await
            .context("persist summary")?;

        let ids: Vec<String> = events.iter().map(|e| e.id.clone()).collect();
        self.store
            .mark_processed(&ids)
            .await
            .context("mark events processed")?;

        counter!("triage_summaries_total").increment(1);
        tracing::info!(
            %scenario,
            source = %summary.source_id,
            importance = summary.importance,
            events = events.len(),
            "summary produced"
        );

        // Display is fire-and-forget; the core does not await confirmation.
        let mux = Arc::clone(&self.notifier);
        let shown = summary.clone();
        tokio::spawn(async move {
            mux.display(&shown).await;
        });

        Ok(Some(summary))
    }

    async fn attempt_with_retry(&self, request: &SummarizeRequest) -> Option<InferenceReply> {
        if let Some(reply) = self.client.summarize(request).await {
            if reply.is_well_formed() {
                return Some(reply);
            }
            tracing::warn!(provider = self.client.provider_name(), "malformed inference reply");
        }

        tokio::time::sleep(std::time::Duration::from_secs(self.cfg.retry_delay_secs)).await;
        match self.client.summarize(request).await {
            Some(reply) if reply.is_well_formed() => Some(reply),
            Some(_) => {
                tracing::warn!(
                    provider = self.client.provider_name(),
                    "malformed inference reply on retry"
                );
                None
            }
            None => None,
        }
    }
}

/// Build the canonical request payload from the truncated batch.
pub fn build_request(now: DateTime<Utc>, events: &[Event]) -> SummarizeRequest {
    SummarizeRequest {
        current_time: now.format(WIRE_TIME_FORMAT).to_string(),
        events: events
            .iter()
            .map(|e| EventPayload {
                title: e.title.clone(),
                body: e.body.clone(),
                time: e.arrived_at.format(WIRE_TIME_FORMAT).to_string(),
                source_id: e.source_id.clone(),
            })
            .collect(),
    }
}

/// Accumulate events (newest first) while the running title+body char sum
/// stays under `budget`. The first overflowing event is included truncated
/// when enough budget remains; later events are dropped.
pub fn truncate_batch(events: &[Event], budget: usize) -> Vec<Event> {
    let mut total = 0usize;
    let mut out = Vec::with_capacity(events.len());

    for event in events {
        let len = event.text_len();
        if total + len <= budget {
            out.push(event.clone());
            total += len;
            continue;
        }

        let remaining = budget - total;
        if remaining >= MIN_TRUNCATED_CHARS {
            let title_len = event.title.as_deref().map_or(0, |t| t.chars().count());
            if title_len < remaining {
                let mut cut = event.clone();
                cut.body = cut
                    .body
                    .as_deref()
                    .map(|b| truncate_to_last_sentence(b, remaining - title_len))
                    .filter(|b| !b.is_empty());
                if cut.title.is_some() || cut.body.is_some() {
                    out.push(cut);
                }
            }
        }
        break;
    }

    out
}

/// Cut at the last sentence terminator within `max_chars`; hard cut when no
/// terminator is found.
pub fn truncate_to_last_sentence(content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        return content.to_string();
    }
    let head: String = content.chars().take(max_chars).collect();
    match head.char_indices().rev().find(|(_, c)| SENTENCE_ENDS.contains(c)) {
        Some((idx, c)) => head[..idx + c.len_utf8()].to_string(),
        None => head,
    }
}

fn hard_truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        s.chars().take(max_chars).collect()
    }
}
