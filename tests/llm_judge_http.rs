// LLM judge backend against an in-process upstream.
//
// A throwaway axum server plays the Responses API on 127.0.0.1 so the real
// reqwest path is exercised: request shape, success parsing, and upstream
// error pass-through.

#![cfg(feature = "web")]

use std::sync::{Arc, Mutex};

use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use detectgate::config::JudgeSettings;
use detectgate::detection::gateway::ProviderGateway;
use detectgate::detection::llm_judge::LlmJudgeBackend;
use detectgate::error::{StatusClass, UpstreamPayload};
use serde_json::{json, Value};

#[derive(Clone, Default)]
struct Captured {
    requests: Arc<Mutex<Vec<(HeaderMap, Value)>>>,
}

/// Serve `body` with `status` on POST /v1/responses; returns the base URL.
async fn spawn_upstream(status: u16, body: String) -> (String, Captured) {
    let captured = Captured::default();
    let seen = captured.clone();
    let app = Router::new().route(
        "/v1/responses",
        post(move |headers: HeaderMap, Json(request): Json<Value>| {
            let seen = seen.clone();
            let body = body.clone();
            async move {
                seen.requests.lock().unwrap().push((headers, request));
                (
                    StatusCode::from_u16(status).unwrap(),
                    [(header::CONTENT_TYPE, "application/json")],
                    body,
                )
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}/v1"), captured)
}

fn gateway(base_url: String) -> ProviderGateway {
    let backend = LlmJudgeBackend::new(JudgeSettings {
        api_key: Some("test-key".into()),
        base_url,
        model: "judge-model".into(),
        proxy_url: None,
    })
    .unwrap();
    ProviderGateway::with_backend(Arc::new(backend))
}

#[tokio::test]
async fn parses_output_text_field() {
    let body = json!({ "output_text": "{\"ai_probability\": 72, \"signals\": [\"uniform style\"]}" });
    let (base_url, _) = spawn_upstream(200, body.to_string()).await;

    let verdict = gateway(base_url)
        .detect_text("This is a long enough sample text for provider test.")
        .await
        .unwrap();
    assert_eq!(verdict.probability(), 72);
    assert_eq!(verdict.signals(), ["uniform style"]);
}

#[tokio::test]
async fn parses_structured_output_items() {
    let body = json!({
        "output": [{
            "type": "message",
            "role": "assistant",
            "content": [{
                "type": "output_text",
                "text": "{\"ai_probability\": 83, \"signals\": [\"repetitive phrasing\", \"uniform sentence rhythm\"]}"
            }]
        }]
    });
    let (base_url, _) = spawn_upstream(200, body.to_string()).await;

    let verdict = gateway(base_url).detect_text("sample").await.unwrap();
    assert_eq!(verdict.probability(), 83);
    assert_eq!(
        verdict.signals(),
        ["repetitive phrasing", "uniform sentence rhythm"]
    );
}

#[tokio::test]
async fn parses_fenced_output_and_scales_fraction() {
    let body = json!({ "output_text": "```json\n{\"ai_probability\": 0.9, \"signals\": [\"high coherence\"]}\n```" });
    let (base_url, _) = spawn_upstream(200, body.to_string()).await;

    let verdict = gateway(base_url).detect_text("sample").await.unwrap();
    assert_eq!(verdict.probability(), 90);
}

#[tokio::test]
async fn unparseable_judge_text_falls_back_to_defaults() {
    let body = json!({ "output_text": "I'm not able to judge this." });
    let (base_url, _) = spawn_upstream(200, body.to_string()).await;

    let verdict = gateway(base_url).detect_text("sample").await.unwrap();
    assert_eq!(verdict.probability(), 50);
    assert_eq!(verdict.signals().len(), 1);
}

#[tokio::test]
async fn upstream_error_payload_preserved() {
    let upstream = json!({
        "error": {
            "message": "You exceeded your current quota.",
            "type": "insufficient_quota",
            "code": "insufficient_quota"
        }
    });
    let (base_url, _) = spawn_upstream(429, upstream.to_string()).await;

    let err = gateway(base_url).detect_text("sample").await.unwrap_err();
    assert_eq!(err.status_class, StatusClass::UpstreamError);
    assert_eq!(err.code, "UPSTREAM_ERROR");
    assert_eq!(
        err.raw_upstream_payload.as_ref().map(UpstreamPayload::as_str),
        Some(upstream.to_string().as_str())
    );

    let (status, body) = err.to_wire();
    assert_eq!(status, 502);
    assert_eq!(body, upstream.to_string());
}

#[tokio::test]
async fn upstream_error_bytes_survive_unchanged() {
    let upstream = "{\n    \"error\": {\n        \"message\": \"You exceeded your current quota.\",\n        \"code\": \"insufficient_quota\",\n        \"request_id\": 123456789012345678901234567890,\n        \"ratio\": 1.10\n    }\n}\n";
    let (base_url, _) = spawn_upstream(429, upstream.to_string()).await;

    let err = gateway(base_url).detect_text("sample").await.unwrap_err();
    assert_eq!(err.to_wire(), (502, upstream.to_string()));
}

#[tokio::test]
async fn empty_error_body_falls_back_to_upstream_code() {
    let (base_url, _) = spawn_upstream(503, String::new()).await;

    let err = gateway(base_url).detect_text("sample").await.unwrap_err();
    assert!(err.raw_upstream_payload.is_none());

    let (status, body) = err.to_wire();
    assert_eq!(status, 502);
    let body: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(body["error"], "UPSTREAM_ERROR");
}

#[tokio::test]
async fn text_request_shape() {
    let (base_url, captured) = spawn_upstream(200, json!({ "output_text": "{}" }).to_string()).await;
    gateway(base_url).detect_text("Some words to judge").await.unwrap();

    let requests = captured.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let (headers, request) = &requests[0];

    assert_eq!(headers[header::AUTHORIZATION], "Bearer test-key");
    assert_eq!(headers[header::CONTENT_TYPE], "application/json");
    assert_eq!(request["model"], "judge-model");
    assert_eq!(request["input"][0]["role"], "system");
    assert_eq!(request["input"][0]["content"][0]["type"], "input_text");
    assert!(request["input"][0]["content"][0]["text"]
        .as_str()
        .unwrap()
        .contains("ai_probability"));
    assert_eq!(request["input"][1]["role"], "user");
    assert_eq!(
        request["input"][1]["content"][0]["text"],
        "Evaluate this text:\nSome words to judge"
    );
}

#[tokio::test]
async fn image_request_carries_inline_base64() {
    let (base_url, captured) = spawn_upstream(200, json!({ "output_text": "{}" }).to_string()).await;
    gateway(base_url).detect_image(b"abc").await.unwrap();

    let requests = captured.requests.lock().unwrap();
    let (_, request) = &requests[0];
    let user = &request["input"][1]["content"];
    assert_eq!(user[0]["type"], "input_text");
    assert_eq!(user[1]["type"], "input_image");
    assert_eq!(user[1]["image_url"], "data:image/jpeg;base64,YWJj");
}

#[tokio::test]
async fn unreachable_upstream_is_upstream_error_without_payload() {
    // Bind then drop to get a port nothing is listening on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = gateway(format!("http://{addr}/v1"))
        .detect_text("sample")
        .await
        .unwrap_err();
    assert_eq!(err.status_class, StatusClass::UpstreamError);
    assert!(err.raw_upstream_payload.is_none());
    let body: Value = serde_json::from_str(&err.to_wire().1).unwrap();
    assert_eq!(body["error"], "UPSTREAM_ERROR");
}

#[tokio::test]
async fn judge_traffic_goes_through_configured_proxy() {
    // The local server stands in for a forward proxy; the judge host itself
    // does not resolve, so only a proxied request can succeed.
    let body = json!({ "output_text": "{\"ai_probability\": 61, \"signals\": [\"via proxy\"]}" });
    let (proxy_base, captured) = spawn_upstream(200, body.to_string()).await;
    let proxy_url = proxy_base.trim_end_matches("/v1").to_string();

    let backend = LlmJudgeBackend::new(JudgeSettings {
        api_key: Some("test-key".into()),
        base_url: "http://judge.invalid/v1".into(),
        model: "judge-model".into(),
        proxy_url: Some(proxy_url),
    })
    .unwrap();
    let verdict = ProviderGateway::with_backend(Arc::new(backend))
        .detect_text("sample")
        .await
        .unwrap();
    assert_eq!(verdict.probability(), 61);

    let requests = captured.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let (headers, request) = &requests[0];
    assert_eq!(headers[header::HOST], "judge.invalid");
    assert_eq!(headers[header::AUTHORIZATION], "Bearer test-key");
    assert_eq!(request["model"], "judge-model");
}
