// Detection backend trait — the swap-ready abstraction.
//
// A backend returns a raw Judgement (whatever the detector said, untrusted);
// the gateway turns that into a DetectionVerdict through the normalizer.
// Hard failures come back as ServiceError so the gateway never has to guess
// how to classify them.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ServiceError;

/// The kind of input being evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Text,
    Image,
}

impl std::fmt::Display for Modality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Modality::Text => write!(f, "text"),
            Modality::Image => write!(f, "image"),
        }
    }
}

/// Input for one detection call.
#[derive(Debug, Clone, Copy)]
pub enum Payload<'a> {
    Text(&'a str),
    Image(&'a [u8]),
}

impl Payload<'_> {
    pub fn modality(&self) -> Modality {
        match self {
            Payload::Text(_) => Modality::Text,
            Payload::Image(_) => Modality::Image,
        }
    }
}

/// A backend's raw assessment before normalization. Either field may be
/// missing or of the wrong type.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Judgement {
    #[serde(default)]
    pub ai_probability: Option<Value>,
    #[serde(default)]
    pub signals: Option<Value>,
}

impl Judgement {
    pub fn new(ai_probability: impl Into<Value>, signals: impl Into<Value>) -> Self {
        Self {
            ai_probability: Some(ai_probability.into()),
            signals: Some(signals.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ai_probability.is_none() && self.signals.is_none()
    }
}

/// The normalized result handed to callers.
///
/// `probability` is always in 0..=100 and `signals` is never empty. Only the
/// normalizer constructs one, so both hold for every value in circulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DetectionVerdict {
    probability: u8,
    signals: Vec<String>,
}

impl DetectionVerdict {
    pub(crate) fn new(probability: u8, signals: Vec<String>) -> Self {
        debug_assert!(probability <= 100);
        debug_assert!(!signals.is_empty());
        Self {
            probability,
            signals,
        }
    }

    pub fn probability(&self) -> u8 {
        self.probability
    }

    pub fn signals(&self) -> &[String] {
        &self.signals
    }
}

/// Trait for content-authenticity detectors. Async because most backends
/// call a remote service.
#[async_trait]
pub trait DetectionBackend: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    async fn detect_text(&self, text: &str) -> Result<Judgement, ServiceError>;

    async fn detect_image(&self, image: &[u8]) -> Result<Judgement, ServiceError>;

    /// Dispatch on the payload's modality.
    async fn detect(&self, payload: Payload<'_>) -> Result<Judgement, ServiceError> {
        match payload {
            Payload::Text(text) => self.detect_text(text).await,
            Payload::Image(image) => self.detect_image(image).await,
        }
    }
}
