//! Rule-based guardrail and intent classifier
//!
//! Every free-text turn passes through here before any external call is
//! made. All checks are pure, synchronous, and total: unparseable or
//! empty input falls through to a safe default, never a panic.

pub mod patterns;

use crate::models::{GuardCategory, GuardrailVerdict, Intent, Severity};
use patterns::{
    TopicDefinition, ADVICE_PATTERNS, FINANCIAL_INDICATORS, INAPPROPRIATE_PATTERNS,
    INAPPROPRIATE_REDIRECT, INTENT_RULES, JAILBREAK_PATTERNS, JAILBREAK_REDIRECT,
    OFF_TOPIC_KEYWORDS, PII_PATTERNS, PII_REDIRECT, TOPICS,
};

/// Messages shorter than this (trimmed) are never run through topic
/// scoring; they are almost always numeric answers to the dialogue.
const SHORT_MESSAGE_CHARS: usize = 10;

/// The static topic table used by the dialogue layer.
pub fn topics() -> &'static [TopicDefinition] {
    &TOPICS[..]
}

/// Safety check, first match wins.
///
/// The returned verdict carries a canned redirect for blocked categories;
/// the financial-advice category passes through allowed, flagging the
/// caller to append a disclaimer.
pub fn check_guardrails(raw_text: &str) -> GuardrailVerdict {
    let text = raw_text.trim();

    // Trivial input cannot carry an attack and is usually a slot answer.
    if text.chars().count() < 2 {
        return GuardrailVerdict::allowed();
    }

    if JAILBREAK_PATTERNS.iter().any(|p| p.is_match(text)) {
        return GuardrailVerdict::blocked(
            GuardCategory::JailbreakAttempt,
            Severity::High,
            JAILBREAK_REDIRECT,
        );
    }

    if PII_PATTERNS.iter().any(|p| p.is_match(text)) {
        return GuardrailVerdict::blocked(GuardCategory::PiiRequest, Severity::Medium, PII_REDIRECT);
    }

    if INAPPROPRIATE_PATTERNS.iter().any(|p| p.is_match(text)) {
        return GuardrailVerdict::blocked(
            GuardCategory::Inappropriate,
            Severity::Medium,
            INAPPROPRIATE_REDIRECT,
        );
    }

    if ADVICE_PATTERNS.iter().any(|p| p.is_match(text)) {
        return GuardrailVerdict {
            allowed: true,
            category: GuardCategory::FinancialAdvice,
            severity: Some(Severity::Low),
            response: String::new(),
        };
    }

    GuardrailVerdict::allowed()
}

/// Weighted topic relevance.
///
/// Deliberately permissive: a message with no off-topic vocabulary is
/// on-topic regardless of score, so generic or ambiguous turns are not
/// blocked. Only a clear preponderance of off-topic words triggers a
/// redirect.
pub fn is_on_topic(raw_text: &str, topics: &[TopicDefinition]) -> bool {
    let text = raw_text.trim();
    if text.chars().count() < SHORT_MESSAGE_CHARS {
        return true;
    }

    let lowered = text.to_lowercase();

    let mut score: u32 = 0;
    for topic in topics {
        for keyword in topic.keywords {
            if lowered.contains(keyword) {
                score += topic.priority;
            }
        }
        for pattern in &topic.patterns {
            if pattern.is_match(text) {
                score += topic.priority * 2;
            }
        }
    }

    for indicator in FINANCIAL_INDICATORS {
        if lowered.contains(indicator) {
            score += 1;
        }
    }

    let off_topic_count = OFF_TOPIC_KEYWORDS
        .iter()
        .filter(|kw| lowered.contains(**kw))
        .count() as u32;

    score > off_topic_count * 2 || off_topic_count == 0
}

/// Ordered intent tests; first match wins, no match is General.
pub fn classify_intent(raw_text: &str) -> Intent {
    let text = raw_text.trim();
    for (intent, pattern) in INTENT_RULES.iter() {
        if pattern.is_match(text) {
            return *intent;
        }
    }
    Intent::General
}
