//! Notification triage service — binary entrypoint.
//!
//! Reads raw notifications as JSON lines on stdin (one object per line,
//! the push-callback shape) and feeds them through the pipeline. Summaries
//! go to the log notifier; point `TRIAGE_INFERENCE_URL` at a summarization
//! endpoint to use real inference instead of the rule fallback.

use notification_digest::{
    build_client_from_env, MemoryStore, NotifierMux, RawNotification, SharedStore, TriageConfig,
    TriageService,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op elsewhere.
    let _ = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("notification_digest=info,warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cfg = TriageConfig::from_env()?;
    let store: SharedStore = Arc::new(MemoryStore::new());
    let client = build_client_from_env();
    let notifier = NotifierMux::log_only();

    let service = TriageService::new(cfg, store, client, notifier);
    service.start_background();
    tracing::info!("triage service started, reading notifications from stdin");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(line) if line.trim().is_empty() => continue,
                    Some(line) => match serde_json::from_str::<RawNotification>(&line) {
                        Ok(raw) => service.submit(raw),
                        Err(e) => tracing::warn!(error = %e, "undecodable notification line"),
                    },
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupt received");
                break;
            }
        }
    }

    // Give in-flight debounce windows a moment, then cancel the rest.
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    service.shutdown();
    Ok(())
}
