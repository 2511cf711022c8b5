use std::env;

use tracing::warn;

use crate::throttle::{ThrottleConfig, DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW_MS};

pub const DEFAULT_JUDGE_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_JUDGE_MODEL: &str = "gpt-4.1-mini";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// Which detection backend serves a modality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// Deterministic offline backend (default). Needs no credentials or network.
    #[default]
    Stub,
    /// Hive skeleton. Requires HIVE_API_KEY; not yet wired to the remote API.
    Hive,
    /// LLM judge over the Responses API. Requires CHATGPT_API_KEY.
    LlmJudge,
}

impl BackendKind {
    /// Parse a configured kind. Unset maps to the stub silently; anything
    /// unrecognized maps to the stub with a warning.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
            return BackendKind::Stub;
        };
        match raw.to_ascii_lowercase().as_str() {
            "fake" | "stub" => BackendKind::Stub,
            "hive" => BackendKind::Hive,
            "chatgpt" | "llm-judge" | "llm_judge" => BackendKind::LlmJudge,
            other => {
                warn!(kind = other, "Unknown provider kind, using stub backend");
                BackendKind::Stub
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::Stub => "stub",
            BackendKind::Hive => "hive",
            BackendKind::LlmJudge => "llm-judge",
        }
    }
}

/// Settings for the LLM judge backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JudgeSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    /// Outbound proxy for judge traffic; None means connect directly.
    pub proxy_url: Option<String>,
}

impl Default for JudgeSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_JUDGE_BASE_URL.to_string(),
            model: DEFAULT_JUDGE_MODEL.to_string(),
            proxy_url: None,
        }
    }
}

/// Backend selection per modality plus backend credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendSelection {
    pub text: BackendKind,
    pub image: BackendKind,
    pub hive_api_key: Option<String>,
    pub judge: JudgeSettings,
}

/// Central configuration loaded from environment variables.
///
/// All secrets come from env vars (never hardcoded). The .env file
/// is loaded by the binary at startup via dotenvy, before this runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub backends: BackendSelection,
    pub throttle: ThrottleConfig,
    pub bind_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let judge = JudgeSettings {
            api_key: non_blank("CHATGPT_API_KEY"),
            base_url: non_blank("CHATGPT_BASE_URL")
                .unwrap_or_else(|| DEFAULT_JUDGE_BASE_URL.to_string()),
            model: non_blank("CHATGPT_MODEL").unwrap_or_else(|| DEFAULT_JUDGE_MODEL.to_string()),
            proxy_url: resolve_outgoing_proxy(&lookup),
        };

        let throttle = ThrottleConfig::new(
            parse_positive(lookup("RATE_LIMIT_WINDOW_MS").as_deref(), DEFAULT_WINDOW_MS),
            parse_positive(lookup("RATE_LIMIT_MAX").as_deref(), DEFAULT_MAX_REQUESTS),
        );

        Self {
            backends: BackendSelection {
                text: BackendKind::parse(lookup("TEXT_PROVIDER").as_deref()),
                image: BackendKind::parse(lookup("IMAGE_PROVIDER").as_deref()),
                hive_api_key: non_blank("HIVE_API_KEY"),
                judge,
            },
            throttle,
            bind_addr: non_blank("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
        }
    }

    /// Human-readable summary with secrets redacted.
    pub fn describe(&self) -> Vec<(&'static str, String)> {
        let redact = |secret: &Option<String>| match secret {
            Some(_) => "set".to_string(),
            None => "not set".to_string(),
        };
        vec![
            ("text provider", self.backends.text.as_str().to_string()),
            ("image provider", self.backends.image.as_str().to_string()),
            ("hive api key", redact(&self.backends.hive_api_key)),
            ("judge api key", redact(&self.backends.judge.api_key)),
            ("judge base url", self.backends.judge.base_url.clone()),
            ("judge model", self.backends.judge.model.clone()),
            (
                "judge proxy",
                self.backends
                    .judge
                    .proxy_url
                    .clone()
                    .unwrap_or_else(|| "direct".to_string()),
            ),
            (
                "throttle window",
                format!("{}ms", self.throttle.window.as_millis()),
            ),
            ("throttle max", self.throttle.max_requests.to_string()),
            ("bind address", self.bind_addr.clone()),
        ]
    }
}

/// Parse a positive integer, falling back to `default` for anything missing,
/// malformed, zero or negative.
pub fn parse_positive<T>(raw: Option<&str>, default: T) -> T
where
    T: std::str::FromStr + PartialOrd + Default,
{
    raw.and_then(|s| s.trim().parse::<T>().ok())
        .filter(|v| *v > T::default())
        .unwrap_or(default)
}

/// Pick the outbound proxy for judge traffic.
///
/// CHATGPT_PROXY_ENABLED=false|0|off disables proxying outright. Otherwise
/// the first non-blank of CHATGPT_PROXY_URL, HTTPS_PROXY, HTTP_PROXY wins.
pub fn resolve_outgoing_proxy<F>(lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    let disabled = lookup("CHATGPT_PROXY_ENABLED")
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "false" | "0" | "off"))
        .unwrap_or(false);
    if disabled {
        return None;
    }

    ["CHATGPT_PROXY_URL", "HTTPS_PROXY", "HTTP_PROXY"]
        .into_iter()
        .filter_map(|key| lookup(key))
        .map(|v| v.trim().to_string())
        .find(|v| !v.is_empty())
}
