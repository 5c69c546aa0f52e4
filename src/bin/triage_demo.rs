//! Demo that replays the three trigger scenarios through the full pipeline
//! with the mock inference client (no endpoint needed).

use chrono::Utc;
use notification_digest::{
    CollectingNotifier, MemoryStore, MockInferenceClient, Notifier, NotifierMux, RawNotification,
    SharedStore, TriageConfig, TriageService,
};
use std::sync::Arc;

fn raw(source: &str, label: &str, n: u32, body: &str) -> RawNotification {
    RawNotification {
        source_id: source.to_string(),
        source_label: label.to_string(),
        origin_id: format!("demo-{n}"),
        title: Some(label.to_string()),
        body: Some(body.to_string()),
        arrived_at: Utc::now(),
        is_persistent: false,
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_target(false).init();

    let store: SharedStore = Arc::new(MemoryStore::new());
    let collector = Arc::new(CollectingNotifier::new());
    let notifier = NotifierMux::log_only().with(collector.clone() as Arc<dyn Notifier>);
    let service = TriageService::new(
        TriageConfig::default(),
        store,
        Arc::new(MockInferenceClient::default()),
        notifier,
    );

    // Scenario 1: one long message; the 5s debounce fires alone.
    service.submit(raw(
        "com.tencent.mm",
        "微信",
        1,
        "这是一条很长的测试通知内容，超过二十六个字符，应当触发单条摘要。",
    ));

    // Scenario 2: a short burst from another source; the 10s batch fires.
    for i in 0..3 {
        service.submit(raw("com.example.mail", "Mail", 100 + i, &format!("short note {i}")));
    }

    tokio::time::sleep(std::time::Duration::from_secs(12)).await;

    // Scenario 3: a high-frequency storm; pause, then one batch at ~30s.
    for i in 0..12 {
        service.submit(raw("com.example.group", "群聊", 200 + i, &format!("msg {i}")));
    }

    tokio::time::sleep(std::time::Duration::from_secs(32)).await;

    for summary in collector.collected() {
        println!(
            "[{}] {} — {} (importance {})",
            summary.source_label, summary.title, summary.body, summary.importance
        );
    }
    service.shutdown();
    println!("triage-demo done");
}
