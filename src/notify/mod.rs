// src/notify/mod.rs
//! Notifier collaborator: fire-and-forget display of finished summaries.
//!
//! The core never awaits display confirmation; sinks that fail just log.

use crate::types::Summary;
use std::sync::Arc;

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn display(&self, summary: &Summary);
    fn name(&self) -> &'static str;
}

/// Fans one summary out to every registered sink.
#[derive(Default, Clone)]
pub struct NotifierMux {
    sinks: Vec<Arc<dyn Notifier>>,
}

impl NotifierMux {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn Notifier>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Default wiring: log-only sink.
    pub fn log_only() -> Self {
        Self::new().with(Arc::new(LogNotifier))
    }

    pub async fn display(&self, summary: &Summary) {
        for sink in &self.sinks {
            sink.display(summary).await;
        }
    }
}

/// Structured-log sink; stands in for the platform's display surface.
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn display(&self, summary: &Summary) {
        tracing::info!(
            target: "notify",
            source = %summary.source_label,
            importance = summary.importance,
            title = %summary.title,
            body = %summary.body,
            "summary ready"
        );
    }
    fn name(&self) -> &'static str {
        "log"
    }
}

/// Collects displayed summaries; for tests and the demo binary.
#[derive(Default)]
pub struct CollectingNotifier {
    seen: std::sync::Mutex<Vec<Summary>>,
}

impl CollectingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collected(&self) -> Vec<Summary> {
        self.seen.lock().map(|g| g.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl Notifier for CollectingNotifier {
    async fn display(&self, summary: &Summary) {
        if let Ok(mut g) = self.seen.lock() {
            g.push(summary.clone());
        }
    }
    fn name(&self) -> &'static str {
        "collecting"
    }
}
