// src/trigger/mod.rs
//! Rate controller & trigger scheduler.
//!
//! One small state machine per source (`Idle → Counting → {Debouncing |
//! Paused} → Idle`) decides which summarization scenario applies and manages
//! a single cancellable delayed task per source. Cancellation is
//! generation-based: arming bumps the source's generation and aborts the
//! previous task; a fired task re-checks its captured generation under the
//! registry lock and becomes a no-op when superseded. Count increment and
//! trigger decision happen under the same lock, so concurrent arrivals
//! always observe a consistent count.
//!
//! A low-frequency sweep and a retention sweep run independently of the
//! per-source machines; the former guarantees no event is silently lost.

use crate::config::TriageConfig;
use crate::store::SharedStore;
use crate::summarize::SummaryGateway;
use crate::types::{Event, Scenario};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use metrics::counter;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Default)]
struct SourceState {
    recent_count: u32,
    paused_until: Option<DateTime<Utc>>,
    generation: u64,
    pending: Option<JoinHandle<()>>,
}

pub struct RateController {
    cfg: Arc<TriageConfig>,
    store: SharedStore,
    gateway: Arc<SummaryGateway>,
    sources: Mutex<HashMap<String, SourceState>>,
    // Handle to ourselves for the delayed tasks we spawn.
    weak: Weak<RateController>,
}

impl RateController {
    pub fn new(
        cfg: Arc<TriageConfig>,
        store: SharedStore,
        gateway: Arc<SummaryGateway>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            cfg,
            store,
            gateway,
            sources: Mutex::new(HashMap::new()),
            weak: weak.clone(),
        })
    }

    fn lock_sources(&self) -> std::sync::MutexGuard<'_, HashMap<String, SourceState>> {
        match self.sources.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Feed one accepted (normalized, sanitized, deduped, persisted) event
    /// into the per-source state machine.
    pub fn on_event(&self, event: &Event) {
        let source = event.source_id.clone();
        let now = Utc::now();

        let armed = {
            let mut sources = self.lock_sources();
            let state = sources.entry(source.clone()).or_default();
            state.recent_count += 1;

            // During an active pause events are stored but never trigger.
            if let Some(until) = state.paused_until {
                if until > now {
                    tracing::debug!(source = %source, "source paused, storing only");
                    return;
                }
                state.paused_until = None;
            }

            if state.recent_count > self.cfg.high_frequency_threshold {
                // High frequency takes precedence: pause the source, drop any
                // pending lower-priority task, batch when the pause ends.
                state.paused_until = Some(now + ChronoDuration::seconds(self.cfg.pause_secs as i64));
                state.recent_count = 0;
                Some((
                    Scenario::HighFrequency,
                    Duration::from_secs(self.cfg.pause_secs),
                    Self::rearm(state),
                ))
            } else if event.body_len() > self.cfg.single_long_threshold {
                Some((
                    Scenario::SingleLong,
                    Duration::from_secs(self.cfg.single_delay_secs),
                    Self::rearm(state),
                ))
            } else if state.recent_count >= 2 {
                Some((
                    Scenario::Multiple,
                    Duration::from_secs(self.cfg.multiple_delay_secs),
                    Self::rearm(state),
                ))
            } else {
                // Short, isolated event: store only.
                None
            }
        };

        if let Some((scenario, delay, generation)) = armed {
            tracing::debug!(source = %source, %scenario, ?delay, "arming delayed trigger");
            counter!("triage_triggers_armed_total").increment(1);
            let handle = self.spawn_delayed(source.clone(), scenario, delay, generation);
            let mut sources = self.lock_sources();
            if let Some(state) = sources.get_mut(&source) {
                if state.generation == generation {
                    state.pending = Some(handle);
                } else {
                    // Re-armed in the meantime; this task is already stale.
                    handle.abort();
                }
            }
        }
    }

    /// Bump the generation and cancel the previous pending task. Returns the
    /// new generation for the task about to be spawned.
    fn rearm(state: &mut SourceState) -> u64 {
        state.generation += 1;
        if let Some(prev) = state.pending.take() {
            prev.abort();
        }
        state.generation
    }

    fn spawn_delayed(
        &self,
        source: String,
        scenario: Scenario,
        delay: Duration,
        generation: u64,
    ) -> JoinHandle<()> {
        let weak = self.weak.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(controller) = weak.upgrade() {
                controller.fire(&source, scenario, generation).await;
            }
        })
    }

    /// Delayed-task body. Runs the generation check, resets the source state
    /// and hands the gathered batch to the gateway.
    async fn fire(&self, source: &str, scenario: Scenario, generation: u64) {
        {
            let mut sources = self.lock_sources();
            match sources.get(source) {
                Some(state) if state.generation == generation => {
                    // Task completed: the source goes back to Idle.
                    sources.remove(source);
                }
                _ => {
                    tracing::debug!(source, %scenario, "superseded trigger, skipping");
                    return;
                }
            }
        }

        let now = Utc::now();
        let window_secs = match scenario {
            Scenario::SingleLong => self.cfg.single_delay_secs + 1,
            Scenario::Multiple => self.cfg.multiple_delay_secs + 1,
            Scenario::HighFrequency => self.cfg.pause_secs + 1,
            // Never armed per source; the sweep feeds the gateway directly.
            Scenario::LowFrequencyBatch => return,
        };
        let since = now - ChronoDuration::seconds(window_secs as i64);

        let events = match self.store.events_by_source(source, since).await {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!(source, %scenario, error = %e, "store query failed, abandoning trigger");
                return;
            }
        };
        let mut eligible: Vec<Event> = events.into_iter().filter(|e| !e.processed).collect();
        eligible.truncate(scenario.batch_cap());

        match scenario {
            Scenario::SingleLong => {
                // More arrivals during the wait mean a later trigger owns
                // this window.
                if eligible.len() > 1 {
                    tracing::debug!(source, "newer events arrived, skipping single summarization");
                    return;
                }
            }
            Scenario::Multiple => {
                if eligible.len() < 2 {
                    tracing::debug!(source, "batch shrank below two eligible events, skipping");
                    return;
                }
            }
            _ => {}
        }
        if eligible.is_empty() {
            return;
        }

        if let Err(e) = self.gateway.summarize_batch(eligible, scenario).await {
            tracing::warn!(source, %scenario, error = %e, "summarization cycle abandoned");
        }
    }

    /// Low-frequency safety net: every `sweep_interval_secs`, summarize
    /// whatever unprocessed events accumulated across all sources.
    pub fn spawn_sweep(&self) -> JoinHandle<()> {
        let weak = self.weak.clone();
        let interval = Duration::from_secs(self.cfg.sweep_interval_secs);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately; skip it so a fresh start
            // does not summarize a half-filled backlog.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(controller) = weak.upgrade() else {
                    return;
                };
                controller.sweep_once().await;
            }
        })
    }

    /// One sweep pass; public so tests can drive it without the timer.
    pub async fn sweep_once(&self) {
        let events = match self.store.unprocessed(self.cfg.sweep_fetch_limit).await {
            Ok(events) => events,
            Err(e) => {
                tracing::warn!(error = %e, "sweep query failed");
                return;
            }
        };
        if events.len() < self.cfg.sweep_min_batch {
            return;
        }
        tracing::info!(count = events.len(), "low-frequency sweep summarizing backlog");
        if let Err(e) = self
            .gateway
            .summarize_batch(events, Scenario::LowFrequencyBatch)
            .await
        {
            tracing::warn!(error = %e, "sweep summarization abandoned");
        }
    }

    /// Retention sweep: purge events and summaries past the retention
    /// window.
    pub fn spawn_retention_sweep(&self) -> JoinHandle<()> {
        let weak = self.weak.clone();
        let interval = Duration::from_secs(self.cfg.retention_sweep_interval_secs);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(controller) = weak.upgrade() else {
                    return;
                };
                let cutoff = controller.cfg.retention_cutoff(Utc::now());
                if let Err(e) = controller.store.purge_older_than(cutoff).await {
                    tracing::warn!(error = %e, "retention purge failed");
                }
            }
        })
    }

    /// Cancel every pending per-source task. Cancelled tasks publish
    /// nothing.
    pub fn shutdown(&self) {
        let mut sources = self.lock_sources();
        for (source, state) in sources.iter_mut() {
            if let Some(handle) = state.pending.take() {
                tracing::debug!(source = %source, "cancelling pending trigger on shutdown");
                handle.abort();
            }
        }
        sources.clear();
    }

    /// Test/diagnostic helper: current recent-count for a source.
    pub fn recent_count(&self, source: &str) -> u32 {
        self.lock_sources().get(source).map_or(0, |s| s.recent_count)
    }

    /// Test/diagnostic helper: whether the source is inside an active pause.
    pub fn is_paused(&self, source: &str) -> bool {
        self.lock_sources()
            .get(source)
            .and_then(|s| s.paused_until)
            .is_some_and(|until| until > Utc::now())
    }
}
