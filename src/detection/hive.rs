// Hive backend skeleton.
//
// The wiring and credential check exist, but the remote contract isn't
// finalized: with a key configured every call fails as not implemented.

use async_trait::async_trait;

use super::traits::{DetectionBackend, Judgement, Modality};
use crate::error::ServiceError;

pub struct HiveBackend {
    api_key: Option<String>,
}

impl HiveBackend {
    pub fn new(api_key: Option<String>) -> Self {
        Self { api_key }
    }

    fn unavailable(&self, modality: Modality) -> ServiceError {
        if self.api_key.is_none() {
            return ServiceError::config("Hive API key is required for hive provider");
        }
        ServiceError::internal(format!(
            "Hive {modality} provider skeleton is configured but not implemented yet"
        ))
    }
}

#[async_trait]
impl DetectionBackend for HiveBackend {
    fn name(&self) -> &'static str {
        "hive"
    }

    async fn detect_text(&self, _text: &str) -> Result<Judgement, ServiceError> {
        Err(self.unavailable(Modality::Text))
    }

    async fn detect_image(&self, _image: &[u8]) -> Result<Judgement, ServiceError> {
        Err(self.unavailable(Modality::Image))
    }
}
