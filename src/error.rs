// Error taxonomy — the stable, wire-level failure contract.
//
// Every hard failure (missing credential, upstream non-2xx, transport error,
// throttling, bad input) becomes a ServiceError. Soft problems in a judge's
// output never land here; the normalizer repairs those with defaults.

use serde::de::IgnoredAny;
use serde_json::json;
use thiserror::Error;

/// Coarse classification of a failure. Decides the HTTP status and body shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    BadRequest,
    RateLimited,
    ConfigError,
    UpstreamError,
    Internal,
}

impl StatusClass {
    /// HTTP status code for this class.
    pub fn http_status(self) -> u16 {
        match self {
            StatusClass::BadRequest => 400,
            StatusClass::RateLimited => 429,
            StatusClass::ConfigError => 500,
            StatusClass::UpstreamError => 502,
            StatusClass::Internal => 500,
        }
    }
}

pub const RATE_LIMITED: &str = "RATE_LIMITED";
pub const PROVIDER_CONFIG_ERROR: &str = "PROVIDER_CONFIG_ERROR";
pub const UPSTREAM_ERROR: &str = "UPSTREAM_ERROR";
pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";

/// Message used for every unclassified failure, so internals never leak.
pub const GENERIC_INTERNAL_MESSAGE: &str = "Unexpected server error";

/// An upstream response body, held as the exact text the backend sent.
///
/// Always valid JSON: a JSON body is kept as is, any other non-blank body is
/// wrapped as a JSON string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamPayload(String);

impl UpstreamPayload {
    /// Capture `body` for pass-through. A blank body carries nothing worth
    /// surfacing and yields None.
    pub fn from_body(body: &str) -> Option<Self> {
        if body.trim().is_empty() {
            return None;
        }
        if serde_json::from_str::<IgnoredAny>(body).is_ok() {
            return Some(Self(body.to_string()));
        }
        serde_json::to_string(body).ok().map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A terminal, classified failure. Once built it is only ever mapped to a
/// wire response.
#[derive(Debug, Clone, Error)]
#[error("{code}: {message}")]
pub struct ServiceError {
    pub status_class: StatusClass,
    pub code: String,
    pub message: String,
    /// Upstream response body, surfaced to the caller verbatim on 502.
    pub raw_upstream_payload: Option<UpstreamPayload>,
}

impl ServiceError {
    fn new(status_class: StatusClass, code: &str, message: impl Into<String>) -> Self {
        Self {
            status_class,
            code: code.to_string(),
            message: message.into(),
            raw_upstream_payload: None,
        }
    }

    pub fn rate_limited() -> Self {
        Self::new(StatusClass::RateLimited, RATE_LIMITED, "Too many requests")
    }

    /// Caller input defect. `code` is the validation code sent on the wire.
    pub fn bad_request(code: &str, message: impl Into<String>) -> Self {
        Self::new(StatusClass::BadRequest, code, message)
    }

    /// Deployment defect, e.g. a backend selected without its credential.
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(StatusClass::ConfigError, PROVIDER_CONFIG_ERROR, message)
    }

    /// The remote backend failed. `payload` is its response body, if any.
    pub fn upstream(message: impl Into<String>, payload: Option<UpstreamPayload>) -> Self {
        Self {
            raw_upstream_payload: payload,
            ..Self::new(StatusClass::UpstreamError, UPSTREAM_ERROR, message)
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusClass::Internal, INTERNAL_ERROR, message)
    }

    /// Classify an arbitrary failure. Anything that is not already a
    /// ServiceError is treated as an unclassified internal error.
    pub fn from_failure(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<ServiceError>() {
            Some(service_error) => service_error.clone(),
            None => Self::internal(GENERIC_INTERNAL_MESSAGE),
        }
    }

    /// Map to `(http_status, json_body)`. An upstream payload is emitted
    /// byte for byte.
    pub fn to_wire(&self) -> (u16, String) {
        let status = self.status_class.http_status();
        let body = match self.status_class {
            StatusClass::RateLimited => json!({ "error": RATE_LIMITED, "message": self.message }),
            StatusClass::BadRequest => json!({ "error": self.code, "message": self.message }),
            StatusClass::ConfigError => {
                json!({ "error": PROVIDER_CONFIG_ERROR, "message": self.message })
            }
            StatusClass::UpstreamError => match &self.raw_upstream_payload {
                Some(payload) => return (status, payload.as_str().to_string()),
                None => json!({ "error": UPSTREAM_ERROR, "message": self.message }),
            },
            StatusClass::Internal => {
                json!({ "error": INTERNAL_ERROR, "message": GENERIC_INTERNAL_MESSAGE })
            }
        };
        (status, body.to_string())
    }
}

#[cfg(feature = "web")]
impl axum::response::IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::{header, StatusCode};

        let (status, body) = self.to_wire();
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
    }
}
