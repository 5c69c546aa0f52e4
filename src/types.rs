// src/types.rs
//! Core data model: raw push-callback input, normalized events, summaries
//! and the trigger scenario classification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Shape delivered by the platform event source (push callback).
/// The core tolerates duplicate delivery and makes no ordering assumption
/// across sources.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawNotification {
    pub source_id: String,
    pub source_label: String,
    /// Stable per-delivery key from the platform (used for the event id).
    pub origin_id: String,
    pub title: Option<String>,
    pub body: Option<String>,
    pub arrived_at: DateTime<Utc>,
    /// The source marked this as ongoing / non-dismissable.
    #[serde(default)]
    pub is_persistent: bool,
}

/// One normalized, sanitized unit of incoming text attributed to a source.
/// Immutable once created; only `processed` flips (to true) when the event
/// has contributed to a summary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Event {
    pub id: String,
    pub source_id: String,
    pub source_label: String,
    pub title: Option<String>,
    pub body: Option<String>,
    pub arrived_at: DateTime<Utc>,
    pub is_persistent: bool,
    #[serde(default)]
    pub processed: bool,
}

impl Event {
    /// Stable key: source id + origin id + arrival millis.
    pub fn make_id(source_id: &str, origin_id: &str, arrived_at: DateTime<Utc>) -> String {
        format!("{}_{}_{}", source_id, origin_id, arrived_at.timestamp_millis())
    }

    /// Combined char length of title and body.
    pub fn text_len(&self) -> usize {
        self.title.as_deref().map_or(0, |t| t.chars().count())
            + self.body.as_deref().map_or(0, |b| b.chars().count())
    }

    /// Body char length (the single-long threshold looks at the body only).
    pub fn body_len(&self) -> usize {
        self.body.as_deref().map_or(0, |b| b.chars().count())
    }
}

/// Bounded, structured output of the summarization gateway.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Summary {
    pub id: String,
    pub source_id: String,
    pub source_label: String,
    pub title: String,
    pub body: String,
    /// 1 = lowest, 5 = highest (priority display).
    pub importance: u8,
    pub created_at: DateTime<Utc>,
}

impl Summary {
    pub fn new(
        source_id: impl Into<String>,
        source_label: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
        importance: u8,
        created_at: DateTime<Utc>,
    ) -> Self {
        let source_id = source_id.into();
        let id = format!("{}_summary_{}", source_id, created_at.timestamp_millis());
        Self {
            id,
            source_id,
            source_label: source_label.into(),
            title: title.into(),
            body: body.into(),
            importance: clamp_importance(importance),
            created_at,
        }
    }
}

/// Keep the invariant `importance ∈ [1,5]` at construction time.
pub fn clamp_importance(level: u8) -> u8 {
    level.clamp(1, 5)
}

/// Trigger classification deciding batching, delay and character budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scenario {
    SingleLong,
    Multiple,
    HighFrequency,
    LowFrequencyBatch,
}

impl Scenario {
    /// Character budget enforced by the gateway's truncation step.
    pub fn char_budget(self, cfg: &crate::config::TriageConfig) -> usize {
        match self {
            Scenario::SingleLong => cfg.single_budget_chars,
            _ => cfg.batch_budget_chars,
        }
    }

    /// Max events handed to the gateway for this scenario.
    pub fn batch_cap(self) -> usize {
        match self {
            Scenario::SingleLong => 1,
            Scenario::Multiple => 5,
            Scenario::HighFrequency => 10,
            Scenario::LowFrequencyBatch => 10,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Scenario::SingleLong => "single-long",
            Scenario::Multiple => "multiple",
            Scenario::HighFrequency => "high-frequency",
            Scenario::LowFrequencyBatch => "low-frequency-batch",
        }
    }
}

impl std::fmt::Display for Scenario {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn event_id_is_stable() {
        let at = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let id = Event::make_id("com.tencent.mm", "0|key|42", at);
        assert_eq!(id, format!("com.tencent.mm_0|key|42_{}", at.timestamp_millis()));
    }

    #[test]
    fn importance_is_clamped_into_range() {
        let at = Utc::now();
        let s = Summary::new("a", "A", "t", "b", 9, at);
        assert_eq!(s.importance, 5);
        let s = Summary::new("a", "A", "t", "b", 0, at);
        assert_eq!(s.importance, 1);
    }

    #[test]
    fn scenario_serializes_kebab_case() {
        let v = serde_json::to_value(Scenario::HighFrequency).unwrap();
        assert_eq!(v, serde_json::json!("high-frequency"));
        assert_eq!(Scenario::LowFrequencyBatch.to_string(), "low-frequency-batch");
    }

    #[test]
    fn text_len_counts_chars_not_bytes() {
        let e = Event {
            id: "x".into(),
            source_id: "s".into(),
            source_label: "S".into(),
            title: Some("你好".into()),
            body: Some("ab".into()),
            arrived_at: Utc::now(),
            is_persistent: false,
            processed: false,
        };
        assert_eq!(e.text_len(), 4);
    }
}
