// Provider gateway — resolve a backend per modality, call it, normalize.
//
// Backend choice is made once, when the gateway is built from config, into
// the closed Backend enum. Per-call work is just "pick text or image
// backend". Backends already speak ServiceError, so nothing untyped can
// escape; the gateway only adds logging and normalization.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::hive::HiveBackend;
use super::llm_judge::LlmJudgeBackend;
use super::normalize::normalize_judgement;
use super::stub::StubBackend;
use super::traits::{DetectionBackend, DetectionVerdict, Judgement, Modality, Payload};
use crate::config::{BackendKind, BackendSelection};
use crate::error::ServiceError;

/// The configured backend variants.
pub enum Backend {
    Stub(StubBackend),
    Hive(HiveBackend),
    LlmJudge(LlmJudgeBackend),
}

impl Backend {
    /// Build the backend for `kind` using the credentials in `selection`.
    pub fn from_kind(kind: BackendKind, selection: &BackendSelection) -> Result<Self> {
        Ok(match kind {
            BackendKind::Stub => Backend::Stub(StubBackend),
            BackendKind::Hive => Backend::Hive(HiveBackend::new(selection.hive_api_key.clone())),
            BackendKind::LlmJudge => {
                Backend::LlmJudge(LlmJudgeBackend::new(selection.judge.clone())?)
            }
        })
    }

    fn inner(&self) -> &dyn DetectionBackend {
        match self {
            Backend::Stub(b) => b,
            Backend::Hive(b) => b,
            Backend::LlmJudge(b) => b,
        }
    }
}

#[async_trait]
impl DetectionBackend for Backend {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    async fn detect_text(&self, text: &str) -> Result<Judgement, ServiceError> {
        self.inner().detect_text(text).await
    }

    async fn detect_image(&self, image: &[u8]) -> Result<Judgement, ServiceError> {
        self.inner().detect_image(image).await
    }
}

/// Dispatches detection requests to the backend configured per modality.
#[derive(Clone)]
pub struct ProviderGateway {
    text: Arc<dyn DetectionBackend>,
    image: Arc<dyn DetectionBackend>,
}

impl Default for ProviderGateway {
    /// Stub for both modalities.
    fn default() -> Self {
        Self::with_backend(Arc::new(Backend::Stub(StubBackend)))
    }
}

impl ProviderGateway {
    /// Use explicit backends per modality.
    pub fn new(text: Arc<dyn DetectionBackend>, image: Arc<dyn DetectionBackend>) -> Self {
        Self { text, image }
    }

    /// Use one backend for both modalities.
    pub fn with_backend(backend: Arc<dyn DetectionBackend>) -> Self {
        Self {
            text: backend.clone(),
            image: backend,
        }
    }

    /// Resolve both backends from configuration.
    pub fn from_selection(selection: &BackendSelection) -> Result<Self> {
        let text = Backend::from_kind(selection.text, selection)?;
        let image = Backend::from_kind(selection.image, selection)?;
        info!(
            text = text.name(),
            image = image.name(),
            "Detection backends configured"
        );
        Ok(Self::new(Arc::new(text), Arc::new(image)))
    }

    pub fn backend_for(&self, modality: Modality) -> &dyn DetectionBackend {
        match modality {
            Modality::Text => self.text.as_ref(),
            Modality::Image => self.image.as_ref(),
        }
    }

    /// Run detection and normalize the backend's judgement.
    pub async fn detect(&self, payload: Payload<'_>) -> Result<DetectionVerdict, ServiceError> {
        let modality = payload.modality();
        let backend = self.backend_for(modality);

        match backend.detect(payload).await {
            Ok(judgement) => {
                let verdict = normalize_judgement(&judgement);
                debug!(
                    backend = backend.name(),
                    %modality,
                    probability = verdict.probability(),
                    signals = verdict.signals().len(),
                    "Detection complete"
                );
                Ok(verdict)
            }
            Err(err) => {
                warn!(
                    backend = backend.name(),
                    %modality,
                    code = %err.code,
                    message = %err.message,
                    "Detection failed"
                );
                Err(err)
            }
        }
    }

    pub async fn detect_text(&self, text: &str) -> Result<DetectionVerdict, ServiceError> {
        self.detect(Payload::Text(text)).await
    }

    pub async fn detect_image(&self, image: &[u8]) -> Result<DetectionVerdict, ServiceError> {
        self.detect(Payload::Image(image)).await
    }
}
