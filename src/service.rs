// src/service.rs
//! Service wiring: the push-callback entry point and background tasks.
//!
//! `TriageService` owns the whole pipeline: normalizer → sanitizer → dedup
//! guard → store → rate controller → gateway. `submit` dispatches each raw
//! notification onto the runtime so the delivery callback never blocks.

use crate::config::TriageConfig;
use crate::dedup::DedupGuard;
use crate::ingest;
use crate::notify::NotifierMux;
use crate::sanitize;
use crate::store::SharedStore;
use crate::summarize::client::DynInferenceClient;
use crate::summarize::SummaryGateway;
use crate::trigger::RateController;
use crate::types::RawNotification;
use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;
use tokio::task::JoinHandle;

pub struct TriageService {
    cfg: Arc<TriageConfig>,
    store: SharedStore,
    dedup: DedupGuard,
    controller: Arc<RateController>,
    background: std::sync::Mutex<Vec<JoinHandle<()>>>,
    weak: std::sync::Weak<TriageService>,
}

impl TriageService {
    pub fn new(
        cfg: TriageConfig,
        store: SharedStore,
        client: DynInferenceClient,
        notifier: NotifierMux,
    ) -> Arc<Self> {
        let cfg = Arc::new(cfg);
        let gateway = Arc::new(SummaryGateway::new(
            Arc::clone(&cfg),
            Arc::clone(&store),
            client,
            Arc::new(notifier),
        ));
        let dedup = DedupGuard::new(&cfg);
        let controller = RateController::new(Arc::clone(&cfg), Arc::clone(&store), gateway);
        Arc::new_cyclic(|weak| Self {
            cfg,
            store,
            dedup,
            controller,
            background: std::sync::Mutex::new(Vec::new()),
            weak: weak.clone(),
        })
    }

    /// Start the low-frequency and retention sweeps.
    pub fn start_background(&self) {
        let mut handles = match self.background.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        handles.push(self.controller.spawn_sweep());
        handles.push(self.controller.spawn_retention_sweep());
    }

    /// Push callback for the platform event source. Never blocks the
    /// caller: the pipeline runs on its own task.
    pub fn submit(&self, raw: RawNotification) {
        let Some(service) = self.weak.upgrade() else {
            return;
        };
        tokio::spawn(async move {
            if let Err(e) = service.ingest(raw).await {
                tracing::warn!(error = %e, "ingestion failed, event skipped");
            }
        });
    }

    /// Full ingestion path for one raw notification. Exposed for tests and
    /// embedders that want to await the outcome.
    pub async fn ingest(&self, raw: RawNotification) -> Result<()> {
        let Some(event) = ingest::normalize(&raw, &self.cfg) else {
            return Ok(());
        };
        let Some(event) = sanitize::sanitize_event(event, &self.cfg) else {
            return Ok(());
        };

        let now = Utc::now();
        if self
            .dedup
            .is_duplicate(self.store.as_ref(), &event, now)
            .await
            .context("dedup check")?
        {
            return Ok(());
        }

        self.store
            .insert_event(&event)
            .await
            .context("persist event")?;

        self.controller().on_event(&event);
        Ok(())
    }

    pub fn controller(&self) -> &Arc<RateController> {
        &self.controller
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn config(&self) -> &TriageConfig {
        &self.cfg
    }

    /// Cancel every pending trigger and background task. No partial
    /// summaries are emitted for cancelled work.
    pub fn shutdown(&self) {
        self.controller.shutdown();
        let mut handles = match self.background.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        for handle in handles.drain(..) {
            handle.abort();
        }
        tracing::info!("triage service stopped");
    }
}
