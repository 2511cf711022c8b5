// POST /api/detect/text and POST /api/detect/image.
//
// Requests reach these handlers already admitted by the throttle middleware,
// so a body that can't be read has still cost the caller one request.

use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use tracing::debug;

use crate::detection::traits::Payload;
use crate::error::ServiceError;
use crate::report::DetectionReport;
use crate::validate::{INVALID_IMAGE, INVALID_TEXT};
use crate::web::AppState;

/// Multipart field carrying the uploaded image.
pub const IMAGE_FIELD: &str = "image_file";

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: String,
}

/// POST /api/detect/text detects on a JSON `{ "text": ... }` body.
pub async fn detect_text(
    State(state): State<AppState>,
    body: Result<Json<TextRequest>, JsonRejection>,
) -> Result<Json<DetectionReport>, ServiceError> {
    let Json(request) = body.map_err(|rejection| {
        debug!(error = %rejection, "Rejected text request body");
        ServiceError::bad_request(INVALID_TEXT, "Request body must be JSON with a text field")
    })?;

    let report = state
        .service
        .report_admitted(Payload::Text(&request.text))
        .await?;
    Ok(Json(report))
}

/// POST /api/detect/image detects on the multipart `image_file` field.
pub async fn detect_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<DetectionReport>, ServiceError> {
    let image = match multipart {
        Ok(multipart) => read_image_field(multipart).await,
        Err(rejection) => Err(format!("Request body must be multipart: {rejection}")),
    }
    .map_err(|message| {
        debug!(error = %message, "Rejected image request body");
        ServiceError::bad_request(INVALID_IMAGE, message)
    })?;

    let report = state
        .service
        .report_admitted(Payload::Image(&image))
        .await?;
    Ok(Json(report))
}

/// Pull the bytes of the image field out of the multipart body.
async fn read_image_field(mut multipart: Multipart) -> Result<Vec<u8>, String> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| format!("Malformed multipart body: {e}"))?
    {
        if field.name() == Some(IMAGE_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| format!("Failed to read {IMAGE_FIELD}: {e}"))?;
            return Ok(bytes.to_vec());
        }
    }
    Err(format!("Missing multipart field {IMAGE_FIELD}"))
}
