// src/sanitize/mod.rs
//! Content sanitizer.
//!
//! Pure function pipeline that strips or redacts sensitive content from
//! notification text before anything is persisted or leaves the device.
//! Stages run in sequence, each on the output of the previous one:
//! banned-term masking, pattern-based redaction (phone numbers, id-like
//! digit runs, URLs, incentive/urgency phrasing), repeated-symbol collapse,
//! and a final mask/whitespace normalization pass.

pub mod terms;

use crate::config::TriageConfig;
use crate::types::Event;
use once_cell::sync::Lazy;
use regex::Regex;

/// Fixed 3-character replacement for redacted spans.
pub const MASK: &str = "***";
/// URLs get a distinct marker instead of the mask token.
pub const LINK_MARKER: &str = "[link removed]";

static RE_BANNED: Lazy<Regex> = Lazy::new(|| {
    let mut alts: Vec<String> = Vec::new();
    for term in terms::BANNED_ZH.iter().chain(terms::BANNED_EN.iter()) {
        alts.push(regex::escape(term));
    }
    Regex::new(&format!("(?i)(?:{})", alts.join("|"))).unwrap()
});

// Ordered redaction patterns. Order matters: phone numbers first so an
// 11-digit mobile is not half-eaten by the generic digit-run rule.
static RE_CN_MOBILE: Lazy<Regex> = Lazy::new(|| Regex::new(r"1[3-9]\d{9}").unwrap());
static RE_DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{8,19}").unwrap());
static RE_NATIONAL_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{17}[0-9Xx]").unwrap());
static RE_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(?:https?://|www\.)\S+").unwrap());
static RE_MONEY_INCENTIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\d+(?:\.\d+)?\s*(?:元|块钱?|万元?|美元|dollars?|usd|rmb|¥|\$)\s*(?:红包|奖金|现金|返现|奖励|补贴|bonus|cash|reward|prize)",
    )
    .unwrap()
});
static RE_URGENT_PAYMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:紧急|立即|马上|urgent|immediately)[^。！？.!?]{0,16}?(?:转账|汇款|付款|缴费|打款|transfer|payment|pay)",
    )
    .unwrap()
});

static RE_MASK_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*{12,}").unwrap());
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Stage 1: mask every banned term, case-insensitive, both languages.
fn mask_banned_terms(s: &str) -> String {
    RE_BANNED.replace_all(s, MASK).into_owned()
}

/// Stage 2: ordered pattern redaction.
fn redact_patterns(s: &str) -> String {
    let s = RE_CN_MOBILE.replace_all(s, MASK);
    let s = RE_DIGIT_RUN.replace_all(&s, MASK);
    let s = RE_NATIONAL_ID.replace_all(&s, MASK);
    let s = RE_URL.replace_all(&s, LINK_MARKER);
    let s = RE_MONEY_INCENTIVE.replace_all(&s, MASK);
    RE_URGENT_PAYMENT.replace_all(&s, MASK).into_owned()
}

fn is_symbol(c: char) -> bool {
    !c.is_alphanumeric() && !c.is_whitespace()
}

/// Stage 3: when symbols make up more than 30% of the string, collapse every
/// run of 4 or more consecutive symbol characters into the mask token.
fn collapse_symbol_runs(s: &str) -> String {
    let total = s.chars().count();
    if total == 0 {
        return String::new();
    }
    let symbols = s.chars().filter(|c| is_symbol(*c)).count();
    if symbols * 10 <= total * 3 {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut run = String::new();
    for c in s.chars() {
        if is_symbol(c) {
            run.push(c);
        } else {
            if run.chars().count() >= 4 {
                out.push_str(MASK);
            } else {
                out.push_str(&run);
            }
            run.clear();
            out.push(c);
        }
    }
    if run.chars().count() >= 4 {
        out.push_str(MASK);
    } else {
        out.push_str(&run);
    }
    out
}

/// Stage 4: collapse runs of 4+ mask tokens to exactly 3, squeeze
/// whitespace, trim.
fn normalize_masks(s: &str) -> String {
    let s = RE_MASK_RUN.replace_all(s, "*********");
    let s = RE_WS.replace_all(&s, " ");
    s.trim().to_string()
}

/// Full sanitizer pipeline over one string.
pub fn sanitize(text: &str) -> String {
    let s = mask_banned_terms(text);
    let s = redact_patterns(&s);
    let s = collapse_symbol_runs(&s);
    normalize_masks(&s)
}

/// Sanitize title and body independently. Returns `None` when sanitization
/// leaves less than `min_sanitized_chars` of combined text: a redaction can
/// turn a previously-valid event into noise.
pub fn sanitize_event(mut event: Event, cfg: &TriageConfig) -> Option<Event> {
    event.title = event
        .title
        .as_deref()
        .map(sanitize)
        .filter(|t| !t.is_empty());
    event.body = event
        .body
        .as_deref()
        .map(sanitize)
        .filter(|b| !b.is_empty());

    if event.text_len() < cfg.min_sanitized_chars {
        tracing::debug!(id = %event.id, "event reduced to noise by sanitization");
        return None;
    }
    Some(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn banned_terms_are_masked_in_both_languages() {
        let out = sanitize("免费赌博网站 join the casino chips table");
        assert!(!out.contains("赌博"));
        assert!(!out.to_lowercase().contains("casino chips"));
        assert!(out.contains(MASK));
    }

    #[test]
    fn cn_mobile_and_incentive_phrase_are_redacted() {
        let out = sanitize("call 13812345678 now for 5000元 bonus");
        assert!(!out.contains("13812345678"));
        assert!(!out.contains("5000元 bonus"));
        assert!(out.contains(MASK));
        // No 11-digit run survives anywhere in the output.
        assert!(!RE_CN_MOBILE.is_match(&out));
    }

    #[test]
    fn long_digit_runs_are_redacted() {
        let out = sanitize("账号 6222081234567890123 已到账");
        assert!(!out.contains("6222081234567890123"));
        assert!(out.contains(MASK));
    }

    #[test]
    fn urls_get_the_link_marker_not_the_mask() {
        let out = sanitize("详情见 https://example.com/a?b=c 哦");
        assert!(out.contains(LINK_MARKER));
        assert!(!out.contains("example.com"));
    }

    #[test]
    fn urgency_payment_phrasing_is_redacted() {
        let out = sanitize("请立即转账到指定账户");
        assert!(!out.contains("立即转账"));
        assert!(out.contains(MASK));
        let out = sanitize("URGENT: please transfer today");
        assert!(!out.to_lowercase().contains("urgent: please transfer"));
    }

    #[test]
    fn symbol_runs_collapse_only_when_density_is_high() {
        // ~70% symbols: the run collapses.
        let noisy = "!!!!$$$$####ok";
        let out = sanitize(noisy);
        assert!(!out.contains("!!!!"));
        assert!(out.contains(MASK));
        // Low density: punctuation is left alone.
        let calm = "well then.... see you tomorrow at the usual place";
        let out = sanitize(calm);
        assert!(out.contains("...."));
    }

    #[test]
    fn mask_runs_collapse_to_three_tokens() {
        let out = sanitize("赌博赌博赌博赌博赌博");
        assert_eq!(out, "*********");
    }

    #[test]
    fn whitespace_is_squeezed_and_trimmed() {
        assert_eq!(sanitize("  a   b  "), "a b");
    }

    #[test]
    fn event_is_dropped_when_reduced_to_noise() {
        let cfg = crate::config::TriageConfig::default();
        let ev = Event {
            id: "x".into(),
            source_id: "s".into(),
            source_label: "S".into(),
            title: None,
            body: Some("赌博".into()),
            arrived_at: Utc::now(),
            is_persistent: false,
            processed: false,
        };
        // The lone banned term collapses to the 3-char mask; that passes the
        // minimum, so extend the check with a fully-blank case too.
        assert!(sanitize_event(ev.clone(), &cfg).is_some());
        let ev2 = Event {
            body: Some("!!".into()),
            ..ev
        };
        let got = sanitize_event(ev2, &cfg);
        assert!(got.is_none());
    }
}
