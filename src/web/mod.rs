// Web server — thin Axum HTTP surface over DetectionService.
//
// Routes:
//   GET  /health              liveness
//   POST /api/detect/text     JSON { text }
//   POST /api/detect/image    multipart, field `image_file`
//
// Every failure is a ServiceError rendered through its wire mapping, so the
// status codes and bodies here are exactly the taxonomy's. The detect routes
// sit behind `admit_request`, which throttles before any body is read.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{ConnectInfo, DefaultBodyLimit, FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::ServiceError;
use crate::service::DetectionService;
use crate::validate::MAX_IMAGE_BYTES;

pub mod handlers;

/// Shared application state threaded through all Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<DetectionService>,
}

impl AppState {
    pub fn new(service: DetectionService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

/// Start the Axum web server and block until it exits.
pub async fn run_server(service: DetectionService, bind: &str) -> Result<()> {
    let app = build_router(AppState::new(service));

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    info!("detectgate listening on http://{bind}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    let detect = Router::new()
        .route("/api/detect/text", post(handlers::detect::detect_text))
        .route("/api/detect/image", post(handlers::detect::detect_image))
        .route_layer(middleware::from_fn_with_state(state.clone(), admit_request));

    Router::new()
        .route("/health", get(health))
        .merge(detect)
        // Room for a maximum-size image plus multipart framing.
        .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + 64 * 1024))
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([header::CONTENT_TYPE]),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Count the request against the caller's window before the handler
/// extracts (and buffers) the body.
async fn admit_request(
    State(state): State<AppState>,
    client: ClientAddr,
    request: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    state.service.admit(client.as_deref())?;
    Ok(next.run(request).await)
}

/// Liveness probe. Always 200.
async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        axum::Json(serde_json::json!({ "status": "ok" })),
    )
}

/// The caller's identity for throttling: the peer IP, when the server was
/// started with connect info.
#[derive(Debug, Clone)]
pub struct ClientAddr(pub Option<String>);

impl ClientAddr {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl<S> FromRequestParts<S> for ClientAddr
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let addr = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());
        Ok(ClientAddr(addr))
    }
}
