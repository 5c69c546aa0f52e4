// src/summarize/rules.rs
//! Deterministic rule-based fallback classifier.
//!
//! Total over its input domain: whatever batch reaches it, it produces a
//! title, a condensed body and an importance level. Used whenever inference
//! is unavailable, errors out or returns malformed output.
//!
//! Source classification is an ORDERED list; a source matching several
//! substrings takes the first rule. Keep it a slice, not a map.

use crate::types::{clamp_importance, Event};

/// Result of classification; the gateway turns this into a [`Summary`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub title: String,
    pub body: String,
    pub importance: u8,
}

/// Markers that bump a messaging notification to top importance.
const URGENT_MARKERS: &[&str] = &["@", "紧急", "重要", "急", "urgent", "asap"];

/// Maximum chars of the condensed body for a single event.
const SINGLE_BODY_CHARS: usize = 100;

/// High-importance summaries get this title prefix for priority display.
const PRIORITY_PREFIX: &str = "【首要通知】";

struct SourceRule {
    needles: &'static [&'static str],
    label: &'static str,
    importance: u8,
    /// Raised to this level when an urgency marker is present.
    urgent_importance: Option<u8>,
}

/// First match wins. Messaging before SMS so `messenger` never falls into
/// the SMS bucket; news last among the recognized groups.
const SOURCE_RULES: &[SourceRule] = &[
    SourceRule {
        needles: &[
            "tencent.mm",
            "weixin",
            "chat",
            "mobileqq",
            "telegram",
            "whatsapp",
            "signal",
            "messenger",
        ],
        label: "消息",
        importance: 3,
        urgent_importance: Some(5),
    },
    SourceRule {
        needles: &["gmail", "outlook", "mail"],
        label: "邮件",
        importance: 4,
        urgent_importance: None,
    },
    SourceRule {
        needles: &["sms", "mms", "messaging"],
        label: "短信",
        importance: 4,
        urgent_importance: None,
    },
    SourceRule {
        needles: &["news", "toutiao", "weibo"],
        label: "资讯",
        importance: 2,
        urgent_importance: None,
    },
];

fn match_rule(source_id: &str) -> Option<&'static SourceRule> {
    let lower = source_id.to_lowercase();
    SOURCE_RULES
        .iter()
        .find(|rule| rule.needles.iter().any(|n| lower.contains(n)))
}

fn has_urgent_marker(event: &Event) -> bool {
    let text = format!(
        "{} {}",
        event.title.as_deref().unwrap_or(""),
        event.body.as_deref().unwrap_or("")
    )
    .to_lowercase();
    URGENT_MARKERS.iter().any(|m| text.contains(m))
}

fn condense(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push('…');
    out
}

fn with_priority_prefix(title: String, importance: u8) -> String {
    if importance >= 4 {
        format!("{PRIORITY_PREFIX}{title}")
    } else {
        title
    }
}

fn classify_single(event: &Event) -> Classification {
    let text = event
        .body
        .as_deref()
        .or(event.title.as_deref())
        .unwrap_or("");

    let (label, importance) = match match_rule(&event.source_id) {
        Some(rule) => {
            let mut level = rule.importance;
            if let Some(raised) = rule.urgent_importance {
                if has_urgent_marker(event) {
                    level = raised;
                }
            }
            (rule.label.to_string(), level)
        }
        None => (event.source_label.clone(), 2),
    };

    Classification {
        title: with_priority_prefix(label, importance),
        body: condense(text, SINGLE_BODY_CHARS),
        importance: clamp_importance(importance),
    }
}

fn classify_single_source(events: &[Event]) -> Classification {
    let count = events.len();
    let label = &events[0].source_label;
    let importance = clamp_importance(count.min(5) as u8);
    Classification {
        title: with_priority_prefix(label.clone(), importance),
        body: format!("收到{count}条{label}通知"),
        importance,
    }
}

fn classify_multi_source(events: &[Event]) -> Classification {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for event in events {
        match counts.iter_mut().find(|(label, _)| *label == event.source_label) {
            Some((_, n)) => *n += 1,
            None => counts.push((event.source_label.clone(), 1)),
        }
    }
    // Busiest sources first; stable for equal counts (arrival order).
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    let body = counts
        .iter()
        .map(|(label, n)| format!("{label}({n})"))
        .collect::<Vec<_>>()
        .join("；");

    Classification {
        title: "多条通知".to_string(),
        body,
        importance: 3,
    }
}

/// Totalizing classifier over any batch (newest first, possibly empty).
pub fn classify(events: &[Event]) -> Classification {
    match events {
        [] => Classification {
            title: "通知摘要".to_string(),
            body: "收到新通知".to_string(),
            importance: 2,
        },
        [single] => classify_single(single),
        many => {
            let first_source = &many[0].source_id;
            if many.iter().all(|e| &e.source_id == first_source) {
                classify_single_source(many)
            } else {
                classify_multi_source(many)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn ev(source: &str, label: &str, body: &str) -> Event {
        Event {
            id: format!("{source}_{body}"),
            source_id: source.into(),
            source_label: label.into(),
            title: None,
            body: Some(body.into()),
            arrived_at: Utc::now(),
            is_persistent: false,
            processed: false,
        }
    }

    #[test]
    fn empty_batch_gets_placeholder() {
        let c = classify(&[]);
        assert_eq!(c.importance, 2);
        assert!(!c.title.is_empty());
        assert!(!c.body.is_empty());
    }

    #[test]
    fn messaging_app_is_level_three() {
        let c = classify(&[ev("com.tencent.mm", "微信", "晚上一起吃饭吗")]);
        assert_eq!(c.importance, 3);
        assert_eq!(c.title, "消息");
    }

    #[test]
    fn urgent_marker_raises_messaging_to_five() {
        let c = classify(&[ev("com.tencent.mm", "微信", "@你 紧急会议马上开始")]);
        assert_eq!(c.importance, 5);
        assert!(c.title.starts_with("【首要通知】"));
    }

    #[test]
    fn mail_and_sms_are_level_four() {
        let c = classify(&[ev("com.google.android.gm", "Gmail", "Quarterly report attached")]);
        assert_eq!(c.importance, 4);
        let c = classify(&[ev("com.android.sms", "短信", "您的验证码是 1234")]);
        assert_eq!(c.importance, 4);
    }

    #[test]
    fn first_matching_rule_wins_on_overlap() {
        // Matches both the messaging rule ("signal") and the SMS rule
        // ("messaging"); the ordered list resolves to messaging.
        let c = classify(&[ev("org.signal.messaging", "Signal", "hey")]);
        assert_eq!(c.importance, 3);
        assert_eq!(c.title, "消息");
    }

    #[test]
    fn news_is_capped_low_and_unknown_defaults() {
        let c = classify(&[ev("com.ss.android.news", "头条", "今日要闻")]);
        assert_eq!(c.importance, 2);
        let c = classify(&[ev("com.vendor.unknownapp", "SomeApp", "hello")]);
        assert_eq!(c.importance, 2);
        assert_eq!(c.title, "SomeApp");
    }

    #[test]
    fn single_event_body_is_condensed_with_ellipsis() {
        let long = "啊".repeat(150);
        let c = classify(&[ev("com.tencent.mm", "微信", &long)]);
        assert_eq!(c.body.chars().count(), 101);
        assert!(c.body.ends_with('…'));
    }

    #[test]
    fn one_source_batch_counts_and_scales_importance() {
        let batch: Vec<Event> = (0..3)
            .map(|i| ev("com.tencent.mm", "微信", &format!("m{i}")))
            .collect();
        let c = classify(&batch);
        assert_eq!(c.body, "收到3条微信通知");
        assert_eq!(c.importance, 3);

        let batch: Vec<Event> = (0..9)
            .map(|i| ev("com.tencent.mm", "微信", &format!("m{i}")))
            .collect();
        assert_eq!(classify(&batch).importance, 5);
    }

    #[test]
    fn multi_source_batch_lists_sources_busiest_first() {
        let mut batch = vec![
            ev("com.a", "AppA", "1"),
            ev("com.b", "AppB", "2"),
            ev("com.b", "AppB", "3"),
        ];
        batch.rotate_left(1);
        let c = classify(&batch);
        assert_eq!(c.importance, 3);
        assert_eq!(c.title, "多条通知");
        assert!(c.body.starts_with("AppB(2)"));
        assert!(c.body.contains("AppA(1)"));
    }
}
