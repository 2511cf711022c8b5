// Unit tests for judgement extraction and verdict normalization.
//
// Covers the fallback chain for free-text judge output (fences, prose
// around JSON, garbage) and the repair rules for probability and signals.

use detectgate::detection::normalize::{
    extract_judgement, normalize, normalize_judgement, DEFAULT_PROBABILITY, DEFAULT_SIGNAL,
};
use detectgate::detection::traits::Judgement;
use serde_json::json;

// ============================================================
// normalize — probability
// ============================================================

#[test]
fn fractional_probability_scaled_to_percent() {
    let verdict = normalize(Some(&json!(0.9)), Some(&json!(["x"])));
    assert_eq!(verdict.probability(), 90);
    assert_eq!(verdict.signals(), ["x"]);
}

#[test]
fn out_of_range_probability_clamped_and_empty_signals_replaced() {
    let verdict = normalize(Some(&json!(150)), Some(&json!([])));
    assert_eq!(verdict.probability(), 100);
    assert_eq!(verdict.signals(), [DEFAULT_SIGNAL]);
}

#[test]
fn non_numeric_probability_defaults_and_blank_signals_dropped() {
    let verdict = normalize(Some(&json!("not a number")), Some(&json!(["a", "", "b"])));
    assert_eq!(verdict.probability(), DEFAULT_PROBABILITY);
    assert_eq!(verdict.signals(), ["a", "b"]);
}

#[test]
fn percentage_probability_rounded() {
    assert_eq!(normalize(Some(&json!(72.5)), None).probability(), 73);
    assert_eq!(normalize(Some(&json!(72.4)), None).probability(), 72);
}

#[test]
fn small_fraction_rounds_to_integer_percent() {
    assert_eq!(normalize(Some(&json!(0.004)), None).probability(), 0);
    assert_eq!(normalize(Some(&json!(0.255)), None).probability(), 26);
}

#[test]
fn object_probability_defaults() {
    let verdict = normalize(Some(&json!({ "value": 80 })), None);
    assert_eq!(verdict.probability(), DEFAULT_PROBABILITY);
}

// ============================================================
// normalize — signals
// ============================================================

#[test]
fn signals_not_a_list_replaced() {
    let verdict = normalize(Some(&json!(10)), Some(&json!("repetitive phrasing")));
    assert_eq!(verdict.signals(), [DEFAULT_SIGNAL]);
}

#[test]
fn signals_non_string_entries_dropped_in_order() {
    let verdict = normalize(
        Some(&json!(10)),
        Some(&json!([1, "first", null, "  ", { "k": "v" }, " second "])),
    );
    assert_eq!(verdict.signals(), ["first", "second"]);
}

#[test]
fn signals_all_unusable_replaced() {
    let verdict = normalize(Some(&json!(10)), Some(&json!(["", "   ", 3])));
    assert_eq!(verdict.signals(), [DEFAULT_SIGNAL]);
}

#[test]
fn missing_everything_gives_defaults() {
    let verdict = normalize_judgement(&Judgement::default());
    assert_eq!(verdict.probability(), DEFAULT_PROBABILITY);
    assert_eq!(verdict.signals(), [DEFAULT_SIGNAL]);
}

// ============================================================
// extract_judgement — fallback chain
// ============================================================

#[test]
fn extract_from_json_fence() {
    let raw = "```json\n{\"ai_probability\":83,\"signals\":[\"x\",\"y\"]}\n```";
    let judgement = extract_judgement(raw);
    assert_eq!(judgement.ai_probability, Some(json!(83)));
    assert_eq!(judgement.signals, Some(json!(["x", "y"])));
}

#[test]
fn extract_from_bare_fence() {
    let raw = "```\n{\"ai_probability\": 0.4, \"signals\": []}\n```";
    let judgement = extract_judgement(raw);
    assert_eq!(judgement.ai_probability, Some(json!(0.4)));
}

#[test]
fn extract_from_plain_json() {
    let judgement = extract_judgement(r#"{"ai_probability": 72, "signals": ["uniform style"]}"#);
    assert_eq!(judgement.ai_probability, Some(json!(72)));
    assert_eq!(judgement.signals, Some(json!(["uniform style"])));
}

#[test]
fn extract_from_prose_wrapped_json() {
    let raw = "Here is my assessment: {\"ai_probability\": 61, \"signals\": [\"flat tone\"]} Hope that helps!";
    let judgement = extract_judgement(raw);
    assert_eq!(judgement.ai_probability, Some(json!(61)));
    assert_eq!(judgement.signals, Some(json!(["flat tone"])));
}

#[test]
fn extract_nested_object_spans_to_last_brace() {
    let raw = "result: {\"ai_probability\": 20, \"meta\": {\"model\": \"m\"}, \"signals\": [\"a\"]}";
    let judgement = extract_judgement(raw);
    assert_eq!(judgement.ai_probability, Some(json!(20)));
    assert_eq!(judgement.signals, Some(json!(["a"])));
}

#[test]
fn extract_two_objects_in_prose_gives_empty() {
    // Greedy span covers both objects, which isn't valid JSON.
    let raw = "{\"ai_probability\": 1} and also {\"ai_probability\": 2}";
    assert!(extract_judgement(raw).is_empty());
}

#[test]
fn extract_garbage_gives_empty() {
    assert!(extract_judgement("I cannot evaluate this content.").is_empty());
    assert!(extract_judgement("").is_empty());
    assert!(extract_judgement("{not json at all}").is_empty());
}

#[test]
fn extract_object_without_fields_is_empty_judgement() {
    let judgement = extract_judgement(r#"{"verdict": "human"}"#);
    assert!(judgement.is_empty());
}

#[test]
fn extract_then_normalize_end_to_end() {
    let raw = "```json\n{\"ai_probability\": \"0.35\", \"signals\": [\"hedged claims\", \"\"]}\n```";
    let verdict = normalize_judgement(&extract_judgement(raw));
    assert_eq!(verdict.probability(), 35);
    assert_eq!(verdict.signals(), ["hedged claims"]);
}
