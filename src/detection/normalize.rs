// Judgement extraction and normalization.
//
// Judges are asked for strict JSON but routinely wrap it in a fenced code
// block, prefix it with prose, or report a fraction instead of a percentage.
// Extraction is an ordered chain of parse attempts, each of which either
// yields a judgement or falls through. Normalization never fails: anything
// unusable is replaced by a default, because a best-effort verdict beats a
// hard error for a soft heuristic.

use std::sync::OnceLock;

use regex_lite::Regex;
use serde_json::Value;

use super::traits::{DetectionVerdict, Judgement};

/// Substituted when a judgement carries no usable signals.
pub const DEFAULT_SIGNAL: &str = "generic model-based heuristic assessment";

/// Probability used when the raw value isn't a finite number.
pub const DEFAULT_PROBABILITY: u8 = 50;

fn fenced_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)^```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*?)\r?\n?[ \t]*```$")
            .expect("fence regex")
    })
}

fn object_span_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("object regex"))
}

/// Pull a `{ai_probability, signals}` judgement out of a judge's free text.
///
/// Returns an empty judgement if nothing parseable is found.
pub fn extract_judgement(raw_text: &str) -> Judgement {
    let text = strip_code_fence(raw_text.trim());

    parse_object(text)
        .or_else(|| {
            object_span_re()
                .find(text)
                .and_then(|span| parse_object(span.as_str()))
        })
        .unwrap_or_default()
}

/// Remove one surrounding ``` or ```json fence, if present.
fn strip_code_fence(text: &str) -> &str {
    match fenced_block_re().captures(text).and_then(|caps| caps.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => text,
    }
}

/// Strict parse; only a JSON object counts as a judgement.
fn parse_object(text: &str) -> Option<Judgement> {
    match serde_json::from_str::<Value>(text).ok()? {
        Value::Object(map) => Some(Judgement {
            ai_probability: map.get("ai_probability").cloned(),
            signals: map.get("signals").cloned(),
        }),
        _ => None,
    }
}

/// Turn raw probability and signals into a verdict.
pub fn normalize(raw_probability: Option<&Value>, raw_signals: Option<&Value>) -> DetectionVerdict {
    DetectionVerdict::new(
        normalize_probability(raw_probability),
        normalize_signals(raw_signals),
    )
}

/// Normalize a whole judgement.
pub fn normalize_judgement(judgement: &Judgement) -> DetectionVerdict {
    normalize(
        judgement.ai_probability.as_ref(),
        judgement.signals.as_ref(),
    )
}

/// Coerce to a percentage in 0..=100.
///
/// Values in [0, 1] are read as fractions and scaled; a judge may report
/// either form. Anything non-numeric becomes DEFAULT_PROBABILITY.
pub fn normalize_probability(raw: Option<&Value>) -> u8 {
    let numeric = match raw {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    let Some(value) = numeric.filter(|v| v.is_finite()) else {
        return DEFAULT_PROBABILITY;
    };

    let percent = if (0.0..=1.0).contains(&value) {
        value * 100.0
    } else {
        value
    };

    percent.clamp(0.0, 100.0).round() as u8
}

/// Keep non-blank string entries in order; fall back to the sentinel.
pub fn normalize_signals(raw: Option<&Value>) -> Vec<String> {
    let signals: Vec<String> = match raw {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };

    if signals.is_empty() {
        vec![DEFAULT_SIGNAL.to_string()]
    } else {
        signals
    }
}
