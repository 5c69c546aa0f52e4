// tests/sanitize_safety.rs
// Sanitization safety: no banned term or matched PII pattern survives,
// and the documented collapse scenario behaves exactly as specified.

use notification_digest::sanitize::{sanitize, LINK_MARKER, MASK};

#[test]
fn spec_scenario_phone_and_incentive_collapse() {
    let out = sanitize("call 13812345678 now for 5000元 bonus");
    // No 11-digit run anywhere in the output.
    let digits: Vec<usize> = out
        .chars()
        .map(|c| usize::from(c.is_ascii_digit()))
        .collect();
    let longest_run = digits
        .split(|d| *d == 0)
        .map(|run| run.len())
        .max()
        .unwrap_or(0);
    assert!(longest_run < 8, "digit run of {longest_run} survived: {out}");
    // The currency-incentive phrase is gone, masks remain.
    assert!(!out.contains("5000元 bonus"));
    assert!(out.contains(MASK));
}

#[test]
fn banned_terms_never_survive_any_case() {
    for text in [
        "join the PONZI scheme today",
        "代开发票，高额回报",
        "best Casino Chips here",
    ] {
        let out = sanitize(text).to_lowercase();
        assert!(!out.contains("ponzi"), "{out}");
        assert!(!out.contains("代开发票"), "{out}");
        assert!(!out.contains("高额回报"), "{out}");
        assert!(!out.contains("casino chips"), "{out}");
    }
}

#[test]
fn national_id_like_runs_are_masked() {
    let out = sanitize("身份证 11010519491231002X 核验通过");
    assert!(!out.contains("11010519491231002"));
    assert!(out.contains(MASK));
}

#[test]
fn urls_use_their_own_marker() {
    let out = sanitize("点击 www.example-lottery.com 领取");
    assert!(out.contains(LINK_MARKER));
    assert!(!out.contains("example-lottery"));
    // The link marker is not the mask token.
    assert_ne!(LINK_MARKER, MASK);
}

#[test]
fn urgency_plus_payment_is_redacted_in_both_languages() {
    for text in ["请马上汇款以免逾期", "act IMMEDIATELY and pay the fee"] {
        let out = sanitize(text).to_lowercase();
        assert!(!out.contains("马上汇款"), "{out}");
        assert!(!out.contains("immediately and pay"), "{out}");
    }
}

#[test]
fn benign_text_passes_through_unchanged() {
    let text = "Your package arrives tomorrow between 9 and 11.";
    assert_eq!(sanitize(text), text);
}

#[test]
fn mask_runs_and_whitespace_are_normalized() {
    // Five adjacent banned terms would produce five masks; output holds
    // exactly three tokens.
    let out = sanitize("赌博博彩六合彩百家乐洗钱");
    assert_eq!(out, "*********");
    assert_eq!(sanitize("  spaced \t out  "), "spaced out");
}
