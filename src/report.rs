// Response shaping — the public result contract built from a verdict.
//
// Pure apart from the request id and timestamp: banding and explanation
// text depend only on the verdict.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::detection::traits::{DetectionVerdict, Modality};

pub const DISCLAIMER: &str = "Detection results are advisory only.";

const EXPLANATION_PREFIX: &str = "Possible indicator: ";

/// Coarse reading of the probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceBand {
    Low,
    Medium,
    High,
}

impl ConfidenceBand {
    pub fn from_probability(probability: u8) -> Self {
        if probability >= 70 {
            ConfidenceBand::High
        } else if probability >= 40 {
            ConfidenceBand::Medium
        } else {
            ConfidenceBand::Low
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConfidenceBand::Low => "low",
            ConfidenceBand::Medium => "medium",
            ConfidenceBand::High => "high",
        }
    }
}

/// What callers of the detect endpoints receive.
#[derive(Debug, Clone, Serialize)]
pub struct DetectionReport {
    #[serde(rename = "type")]
    pub modality: Modality,
    pub ai_probability: u8,
    pub confidence_band: ConfidenceBand,
    pub explanations: Vec<String>,
    pub disclaimer: String,
    pub request_id: String,
    pub processed_at: String,
}

impl DetectionReport {
    pub fn from_verdict(modality: Modality, verdict: &DetectionVerdict) -> Self {
        Self {
            modality,
            ai_probability: verdict.probability(),
            confidence_band: ConfidenceBand::from_probability(verdict.probability()),
            explanations: verdict
                .signals()
                .iter()
                .map(|signal| format!("{EXPLANATION_PREFIX}{signal}"))
                .collect(),
            disclaimer: DISCLAIMER.to_string(),
            request_id: Uuid::new_v4().to_string(),
            processed_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}
