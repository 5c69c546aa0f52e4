// src/sanitize/terms.rs
//! Banned-term lists for the content sanitizer, grouped by category.
//! A primary-language (Chinese) list and an English list; matching is
//! case-insensitive substring, every hit becomes the mask token.

/// Primary-language banned terms.
pub const BANNED_ZH: &[&str] = &[
    // political
    "颠覆国家",
    "政变",
    "暴乱",
    // violent
    "杀人",
    "爆炸物",
    "枪支",
    "砍杀",
    // adult
    "色情",
    "裸聊",
    "援交",
    // narcotics
    "冰毒",
    "摇头丸",
    "大麻",
    "海洛因",
    // gambling
    "赌博",
    "博彩",
    "赌场",
    "六合彩",
    "百家乐",
    // fraud
    "刷单",
    "洗钱",
    "套现",
    "代开发票",
    "高额回报",
    // hate speech
    "种族歧视",
    // other illegal
    "代孕",
    "办证",
    "假证",
    "走私",
];

/// English banned terms.
pub const BANNED_EN: &[&str] = &[
    // political
    "coup d'etat",
    "insurrection",
    // violent
    "massacre",
    "bomb making",
    "gun for sale",
    // adult
    "porn",
    "escort service",
    // narcotics
    "cocaine",
    "heroin",
    "meth",
    "ecstasy pill",
    // gambling
    "casino chips",
    "betting odds",
    "jackpot win",
    // fraud
    "money laundering",
    "ponzi",
    "get rich quick",
    "wire fraud",
    // hate speech
    "ethnic cleansing",
    // other illegal
    "fake passport",
    "counterfeit",
    "smuggling",
];
