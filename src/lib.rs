// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod config;
pub mod dedup;
pub mod ingest;
pub mod notify;
pub mod sanitize;
pub mod service;
pub mod store;
pub mod summarize;
pub mod trigger;
pub mod types;

// ---- Re-exports for stable public API ----
pub use crate::config::TriageConfig;
pub use crate::notify::{CollectingNotifier, LogNotifier, Notifier, NotifierMux};
pub use crate::service::TriageService;
pub use crate::store::{memory::MemoryStore, EventStore, SharedStore};
pub use crate::summarize::client::{
    build_client_from_env, DisabledClient, DynInferenceClient, HttpInferenceClient,
    InferenceClient, MockInferenceClient,
};
pub use crate::types::{Event, RawNotification, Scenario, Summary};
