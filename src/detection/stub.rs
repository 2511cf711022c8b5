// Deterministic offline backend.
//
// Scores are a pure function of input size, so results are reproducible
// without credentials or network. Used whenever no backend is configured.

use async_trait::async_trait;
use serde_json::json;

use super::traits::{DetectionBackend, Judgement};
use crate::error::ServiceError;

pub struct StubBackend;

impl StubBackend {
    /// Report `size mod 101` as a fraction so the normalizer scales every
    /// value the same way (a bare 1 would otherwise read as 100%).
    fn judgement(size: usize, signal: &str) -> Judgement {
        let percent = (size % 101) as f64;
        Judgement::new(percent / 100.0, json!([signal]))
    }
}

#[async_trait]
impl DetectionBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn detect_text(&self, text: &str) -> Result<Judgement, ServiceError> {
        Ok(Self::judgement(text.chars().count(), "repetitive structure"))
    }

    async fn detect_image(&self, image: &[u8]) -> Result<Judgement, ServiceError> {
        Ok(Self::judgement(image.len(), "uniform texture statistics"))
    }
}
