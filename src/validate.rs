// Input checks that run before any backend sees a payload.

use crate::detection::traits::Payload;
use crate::error::ServiceError;

pub const INVALID_TEXT: &str = "INVALID_TEXT";
pub const INVALID_IMAGE: &str = "INVALID_IMAGE";

pub const MIN_TEXT_CHARS: usize = 20;
pub const MAX_TEXT_CHARS: usize = 20_000;
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

pub fn validate_text(text: &str) -> Result<(), ServiceError> {
    let chars = text.chars().count();
    if chars < MIN_TEXT_CHARS {
        return Err(ServiceError::bad_request(
            INVALID_TEXT,
            format!("Text must be at least {MIN_TEXT_CHARS} characters"),
        ));
    }
    if chars > MAX_TEXT_CHARS {
        return Err(ServiceError::bad_request(
            INVALID_TEXT,
            format!("Text must be at most {MAX_TEXT_CHARS} characters"),
        ));
    }
    Ok(())
}

pub fn validate_image(image: &[u8]) -> Result<(), ServiceError> {
    if image.is_empty() {
        return Err(ServiceError::bad_request(INVALID_IMAGE, "Image file is empty"));
    }
    if image.len() > MAX_IMAGE_BYTES {
        return Err(ServiceError::bad_request(
            INVALID_IMAGE,
            format!("Image must be at most {} MiB", MAX_IMAGE_BYTES / (1024 * 1024)),
        ));
    }
    Ok(())
}

pub fn validate(payload: Payload<'_>) -> Result<(), ServiceError> {
    match payload {
        Payload::Text(text) => validate_text(text),
        Payload::Image(image) => validate_image(image),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StatusClass;

    #[test]
    fn test_rejects_empty_text() {
        let err = validate_text("").unwrap_err();
        assert_eq!(err.status_class, StatusClass::BadRequest);
        assert_eq!(err.code, INVALID_TEXT);
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        // 20 two-byte characters
        assert!(validate_text(&"é".repeat(20)).is_ok());
        assert!(validate_text(&"é".repeat(19)).is_err());
    }

    #[test]
    fn test_text_upper_bound() {
        assert!(validate_text(&"a".repeat(MAX_TEXT_CHARS)).is_ok());
        assert!(validate_text(&"a".repeat(MAX_TEXT_CHARS + 1)).is_err());
    }

    #[test]
    fn test_image_bounds() {
        assert_eq!(validate_image(&[]).unwrap_err().code, INVALID_IMAGE);
        assert!(validate_image(&[1, 2, 3]).is_ok());
        assert!(validate_image(&vec![0u8; MAX_IMAGE_BYTES + 1]).is_err());
    }
}
