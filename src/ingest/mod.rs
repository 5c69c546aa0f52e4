// src/ingest/mod.rs
//! Event normalizer & noise filter.
//!
//! Turns a raw platform notification into a canonical [`Event`] or drops it:
//! own-app events, blank events, denylisted system/transport sources,
//! media-playback chatter and ongoing/pinned notifications carry nothing
//! worth summarizing.

use crate::config::TriageConfig;
use crate::types::{Event, RawNotification};
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;

/// Media transport phrases that mark a notification as playback chatter.
/// Case-insensitive substring match, primary language + English.
const MEDIA_KEYWORDS: &[&str] = &[
    "now playing",
    "paused",
    "next track",
    "previous track",
    "正在播放",
    "已暂停",
    "下一曲",
    "上一曲",
];

/// One-time metrics registration (so series show up even before traffic).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("triage_events_total", "Raw notifications offered to the pipeline.");
        describe_counter!("triage_kept_total", "Events kept after normalization + filtering.");
        describe_counter!(
            "triage_filtered_total",
            "Events dropped by the noise filter (own app, blank, denylist, media, ongoing)."
        );
    });
}

/// Normalize notification text: decode HTML entities, strip tags, collapse
/// whitespace, trim, cap length.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    // 3) Collapse whitespace
    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();
    out = out.trim().to_string();

    // 4) Length cap: 1500 chars
    if out.chars().count() > 1500 {
        out = out.chars().take(1500).collect();
    }

    out
}

fn contains_media_keyword(text: &str) -> bool {
    let lower = text.to_lowercase();
    MEDIA_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

fn is_denylisted(source_id: &str, denylist: &[String]) -> bool {
    denylist.iter().any(|d| d.eq_ignore_ascii_case(source_id))
}

/// Apply the noise-filter rules in order and build the canonical [`Event`].
/// Returns `None` for anything not worth keeping. Pure decision function:
/// nothing is written to storage here.
pub fn normalize(raw: &RawNotification, cfg: &TriageConfig) -> Option<Event> {
    ensure_metrics_described();
    counter!("triage_events_total").increment(1);

    // (a) our own app never feeds itself
    if raw.source_id == cfg.own_source_id {
        tracing::debug!(source = %raw.source_id, "dropping own-app notification");
        counter!("triage_filtered_total").increment(1);
        return None;
    }

    let title = raw
        .title
        .as_deref()
        .map(normalize_text)
        .filter(|t| !t.is_empty());
    let body = raw
        .body
        .as_deref()
        .map(normalize_text)
        .filter(|b| !b.is_empty());

    // (b) no usable text
    if title.is_none() && body.is_none() {
        tracing::debug!(source = %raw.source_id, "dropping notification with no usable text");
        counter!("triage_filtered_total").increment(1);
        return None;
    }

    // (c) system/transport sources are never informational
    if is_denylisted(&raw.source_id, &cfg.source_denylist) {
        tracing::debug!(source = %raw.source_id, "dropping denylisted source");
        counter!("triage_filtered_total").increment(1);
        return None;
    }

    // (d) media playback transport chatter
    let media_hit = title.as_deref().is_some_and(contains_media_keyword)
        || body.as_deref().is_some_and(contains_media_keyword);
    if media_hit {
        tracing::debug!(source = %raw.source_id, "dropping media-playback notification");
        counter!("triage_filtered_total").increment(1);
        return None;
    }

    // (e) ongoing/pinned events repeat what the user already sees
    if raw.is_persistent {
        tracing::debug!(source = %raw.source_id, "dropping ongoing notification");
        counter!("triage_filtered_total").increment(1);
        return None;
    }

    counter!("triage_kept_total").increment(1);
    Some(Event {
        id: Event::make_id(&raw.source_id, &raw.origin_id, raw.arrived_at),
        source_id: raw.source_id.clone(),
        source_label: raw.source_label.clone(),
        title,
        body,
        arrived_at: raw.arrived_at,
        is_persistent: raw.is_persistent,
        processed: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn raw(source: &str, title: Option<&str>, body: Option<&str>) -> RawNotification {
        RawNotification {
            source_id: source.to_string(),
            source_label: source.to_string(),
            origin_id: "k1".to_string(),
            title: title.map(|s| s.to_string()),
            body: body.map(|s| s.to_string()),
            arrived_at: Utc::now(),
            is_persistent: false,
        }
    }

    #[test]
    fn normalize_text_collapses_ws_and_entities() {
        let s = "  Hello,&nbsp;&nbsp; <b>world</b>  ";
        assert_eq!(normalize_text(s), "Hello, world");
    }

    #[test]
    fn own_app_is_dropped() {
        let cfg = TriageConfig::default();
        let r = raw(&cfg.own_source_id.clone(), Some("t"), Some("b"));
        assert!(normalize(&r, &cfg).is_none());
    }

    #[test]
    fn blank_after_trim_is_dropped() {
        let cfg = TriageConfig::default();
        let r = raw("com.example.chat", Some("   "), Some(" \t "));
        assert!(normalize(&r, &cfg).is_none());
    }

    #[test]
    fn denylisted_source_is_dropped() {
        let cfg = TriageConfig::default();
        let r = raw("com.android.systemui", Some("USB debugging"), None);
        assert!(normalize(&r, &cfg).is_none());
    }

    #[test]
    fn media_keywords_are_dropped_case_insensitive() {
        let cfg = TriageConfig::default();
        let r = raw("com.example.player", Some("Now Playing: song"), None);
        assert!(normalize(&r, &cfg).is_none());
        let r = raw("com.example.player", None, Some("下一曲 已就绪"));
        assert!(normalize(&r, &cfg).is_none());
    }

    #[test]
    fn ongoing_is_dropped() {
        let cfg = TriageConfig::default();
        let mut r = raw("com.example.nav", Some("Navigating"), Some("Turn left"));
        r.is_persistent = true;
        assert!(normalize(&r, &cfg).is_none());
    }

    #[test]
    fn normal_message_is_kept_with_stable_id() {
        let cfg = TriageConfig::default();
        let r = raw("com.tencent.mm", Some("Alice"), Some("see you at 6"));
        let ev = normalize(&r, &cfg).expect("kept");
        assert_eq!(ev.source_id, "com.tencent.mm");
        assert_eq!(ev.title.as_deref(), Some("Alice"));
        assert!(!ev.processed);
        assert!(ev.id.starts_with("com.tencent.mm_k1_"));
    }
}
