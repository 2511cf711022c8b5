// LLM judge backend over an OpenAI-style Responses API.
//
// One POST per request: a system instruction demanding strict JSON
// {"ai_probability", "signals"}, and a user message carrying the text or an
// inline base64 image. The assistant's free text goes through
// extract_judgement, since judges don't reliably honor "strict JSON".
//
// A non-2xx reply is surfaced as UPSTREAM_ERROR with the upstream body
// attached untouched; quota and billing failures are only diagnosable from
// that body.

use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::normalize::extract_judgement;
use super::traits::{DetectionBackend, Judgement};
use crate::config::JudgeSettings;
use crate::error::{ServiceError, UpstreamPayload};

const TEXT_INSTRUCTION: &str = "You are an AI-content judge. Return strict JSON only: \
    {\"ai_probability\": number, \"signals\": string[]}.";

const IMAGE_INSTRUCTION: &str = "You are an AI-image judge. Return strict JSON only: \
    {\"ai_probability\": number, \"signals\": string[]}.";

const IMAGE_PROMPT: &str = "Evaluate whether this image appears AI-generated.";

/// Responses API judge.
pub struct LlmJudgeBackend {
    client: Client,
    settings: JudgeSettings,
}

impl LlmJudgeBackend {
    /// Build the backend. Fails only if the configured proxy URL is invalid;
    /// a missing API key is reported per call, as a config error.
    pub fn new(settings: JudgeSettings) -> Result<Self> {
        // TODO: add a request timeout; a hung upstream call currently hangs
        // the inbound request with it.
        let builder = Client::builder().user_agent(concat!("detectgate/", env!("CARGO_PKG_VERSION")));
        let builder = match &settings.proxy_url {
            Some(url) => builder.proxy(
                reqwest::Proxy::all(url)
                    .with_context(|| format!("Invalid judge proxy URL: {url}"))?,
            ),
            None => builder.no_proxy(),
        };
        let client = builder.build().context("Failed to build HTTP client")?;

        Ok(Self { client, settings })
    }

    fn endpoint(&self) -> String {
        format!("{}/responses", self.settings.base_url.trim_end_matches('/'))
    }

    fn api_key(&self) -> Result<&str, ServiceError> {
        self.settings
            .api_key
            .as_deref()
            .ok_or_else(|| ServiceError::config("ChatGPT API key is required for chatgpt provider"))
    }

    /// Send one judge request and interpret the reply.
    async fn judge(&self, instruction: &str, user_content: Value) -> Result<Judgement, ServiceError> {
        let api_key = self.api_key()?;

        let request = json!({
            "model": self.settings.model,
            "input": [
                {
                    "role": "system",
                    "content": [{ "type": "input_text", "text": instruction }]
                },
                {
                    "role": "user",
                    "content": user_content
                }
            ]
        });

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Judge request failed before a response arrived");
                ServiceError::upstream("Upstream provider request failed", None)
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            warn!(status = status.as_u16(), error = %e, "Failed to read judge response body");
            ServiceError::upstream("Upstream provider request failed", None)
        })?;

        interpret_response(status.as_u16(), &body)
    }
}

#[async_trait]
impl DetectionBackend for LlmJudgeBackend {
    fn name(&self) -> &'static str {
        "llm-judge"
    }

    async fn detect_text(&self, text: &str) -> Result<Judgement, ServiceError> {
        debug!(
            chars = text.chars().count(),
            text_preview = %text.chars().take(50).collect::<String>(),
            "Judging text"
        );
        let content = json!([
            { "type": "input_text", "text": format!("Evaluate this text:\n{text}") }
        ]);
        self.judge(TEXT_INSTRUCTION, content).await
    }

    async fn detect_image(&self, image: &[u8]) -> Result<Judgement, ServiceError> {
        debug!(bytes = image.len(), "Judging image");
        let content = json!([
            { "type": "input_text", "text": IMAGE_PROMPT },
            {
                "type": "input_image",
                "image_url": format!("data:image/jpeg;base64,{}", STANDARD.encode(image))
            }
        ]);
        self.judge(IMAGE_INSTRUCTION, content).await
    }
}

/// Turn a judge reply (status + raw body) into a judgement or a typed failure.
pub fn interpret_response(status: u16, body: &str) -> Result<Judgement, ServiceError> {
    if !(200..300).contains(&status) {
        warn!(status, body, "Judge returned an error response");
        return Err(ServiceError::upstream(
            format!("Upstream provider returned status {status}"),
            UpstreamPayload::from_body(body),
        ));
    }

    debug!(status, body, "Judge raw response");

    let payload: Value = serde_json::from_str(body).map_err(|e| {
        warn!(error = %e, "Judge response body is not JSON");
        ServiceError::upstream(
            "Upstream provider returned an unreadable response",
            UpstreamPayload::from_body(body),
        )
    })?;

    Ok(extract_judgement(output_text(&payload).unwrap_or("{}")))
}

/// The assistant's text: the combined `output_text` field if present,
/// otherwise the first textual content block among the `output` items.
pub fn output_text(payload: &Value) -> Option<&str> {
    if let Some(text) = payload.get("output_text").and_then(Value::as_str) {
        return Some(text);
    }

    payload
        .get("output")?
        .as_array()?
        .iter()
        .filter_map(|item| item.get("content").and_then(Value::as_array))
        .flatten()
        .find(|block| {
            matches!(
                block.get("type").and_then(Value::as_str),
                Some("output_text") | Some("text") | None
            ) && block.get("text").map(Value::is_string).unwrap_or(false)
        })
        .and_then(|block| block.get("text"))
        .and_then(Value::as_str)
}
