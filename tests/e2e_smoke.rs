// tests/e2e_smoke.rs
// Whole pipeline: raw notification → filter → sanitize → dedup → store →
// trigger → gateway (mock inference) → notifier.

use chrono::Utc;
use notification_digest::{
    CollectingNotifier, MemoryStore, MockInferenceClient, Notifier, NotifierMux, RawNotification,
    SharedStore, TriageConfig, TriageService,
};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn long_message_flows_end_to_end() {
    let store: SharedStore = Arc::new(MemoryStore::new());
    let collector = Arc::new(CollectingNotifier::new());
    let notifier = NotifierMux::new().with(collector.clone() as Arc<dyn Notifier>);
    let service = TriageService::new(
        TriageConfig::default(),
        store,
        Arc::new(MockInferenceClient::default()),
        notifier,
    );

    let raw = RawNotification {
        source_id: "com.tencent.mm".to_string(),
        source_label: "微信".to_string(),
        origin_id: "0|key|77".to_string(),
        title: Some("项目群".to_string()),
        body: Some("会议改到明天上午十点，请大家带上各自的进度报告，准时参加。".to_string()),
        arrived_at: Utc::now(),
        is_persistent: false,
    };
    service.ingest(raw).await.unwrap();

    tokio::time::sleep(Duration::from_secs(6)).await;

    // Mock inference replied on the first attempt: no fallback involved.
    let summaries = service.store().recent_summaries(5).await.unwrap();
    assert_eq!(summaries.len(), 1);
    let s = &summaries[0];
    assert_eq!(s.title, "通知摘要");
    assert_eq!(s.source_label, "微信");
    assert_eq!(s.importance, 3);
    assert!(s.id.starts_with("com.tencent.mm_summary_"));

    // Store bookkeeping and display both happened.
    assert_eq!(service.store().count_events().await.unwrap(), 1);
    assert!(service.store().unprocessed(5).await.unwrap().is_empty());
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(collector.collected().len(), 1);

    service.shutdown();
}

#[tokio::test(start_paused = true)]
async fn sanitized_spam_still_summarizes_without_leaking() {
    let store: SharedStore = Arc::new(MemoryStore::new());
    let service = TriageService::new(
        TriageConfig::default(),
        store,
        Arc::new(MockInferenceClient::default()),
        NotifierMux::new(),
    );

    let raw = RawNotification {
        source_id: "com.vendor.promo".to_string(),
        source_label: "Promo".to_string(),
        origin_id: "p1".to_string(),
        title: None,
        body: Some("call 13812345678 now for 5000元 bonus and claim your prize".to_string()),
        arrived_at: Utc::now(),
        is_persistent: false,
    };
    service.ingest(raw).await.unwrap();

    // What was persisted carries masks, not the phone number.
    let stored = service.store().unprocessed(5).await.unwrap();
    assert_eq!(stored.len(), 1);
    let body = stored[0].body.as_deref().unwrap();
    assert!(!body.contains("13812345678"));
    assert!(body.contains("***"));

    service.shutdown();
}
