#[cfg(feature = "http")]
use axum::http::StatusCode;
#[cfg(feature = "http")]
use axum::response::{IntoResponse, Response};
use thiserror::Error;

// ── Error codes ─────────────────────────────────────────────────────
//
// Stable, machine-readable identifiers. Clients match on these,
// never on the human-readable message string.

/// Stable error code constants.
///
/// Clients should match on `code` from `{"code": "SLOT_OCCUPIED", "message": "..."}`.
/// Codes never change; messages may be reworded.
pub mod error_code {
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const VALIDATION_FAILED: &str = "VALIDATION_FAILED";
    pub const MISSING_DOCUMENT: &str = "MISSING_DOCUMENT";
    pub const PAYLOAD_TOO_LARGE: &str = "PAYLOAD_TOO_LARGE";
    pub const SLOT_OCCUPIED: &str = "SLOT_OCCUPIED";
    pub const DUPLICATE_PRODUCT_NO: &str = "DUPLICATE_PRODUCT_NO";
    pub const NOT_ELIGIBLE: &str = "NOT_ELIGIBLE";
    pub const UPLOAD_FAILED: &str = "UPLOAD_FAILED";
    pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
    pub const INTERNAL: &str = "INTERNAL";
}

// ── ServiceError ────────────────────────────────────────────────────

/// Unified service error type used across the server.
///
/// Each variant maps to a stable error code (see [`error_code`]) and an
/// HTTP status code. The JSON response always includes both:
///
/// ```json
/// {"code": "NOT_ELIGIBLE", "message": "...", "missing": ["QC Form PDF"]}
/// ```
///
/// `SlotOccupied` and `DuplicateProductNo` are conflicts with other
/// records (409); `Validation` and `MissingDocument` are problems with
/// the request itself (400).
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Resource does not exist (or is not active). HTTP 404.
    #[error("{0}")]
    NotFound(String),

    /// Input data is invalid. HTTP 400.
    #[error("{0}")]
    Validation(String),

    /// A required document payload was absent or empty. HTTP 400.
    #[error("{0}")]
    MissingDocument(String),

    /// The request body exceeds the configured upload limit. HTTP 413.
    #[error("{0}")]
    PayloadTooLarge(String),

    /// The target block already holds an active machine. HTTP 409.
    #[error("{0}")]
    SlotOccupied(String),

    /// The product number is already used by another machine. HTTP 409.
    #[error("{0}")]
    DuplicateProductNo(String),

    /// Completion prerequisites are unmet. HTTP 422.
    #[error("{message}")]
    NotEligible {
        message: String,
        missing: Vec<String>,
    },

    /// Document storage failed. HTTP 502.
    #[error("{0}")]
    UploadFailed(String),

    /// Storage backend failure. HTTP 500.
    #[error("{0}")]
    Storage(String),

    /// Unexpected internal error. HTTP 500.
    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    /// Build a `NotEligible` error from the list of unmet prerequisite labels.
    pub fn not_eligible(subject: &str, missing: Vec<String>) -> Self {
        ServiceError::NotEligible {
            message: format!("{} cannot be completed, missing: {}", subject, missing.join(", ")),
            missing,
        }
    }

    /// Stable, machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            ServiceError::NotFound(_) => error_code::NOT_FOUND,
            ServiceError::Validation(_) => error_code::VALIDATION_FAILED,
            ServiceError::MissingDocument(_) => error_code::MISSING_DOCUMENT,
            ServiceError::PayloadTooLarge(_) => error_code::PAYLOAD_TOO_LARGE,
            ServiceError::SlotOccupied(_) => error_code::SLOT_OCCUPIED,
            ServiceError::DuplicateProductNo(_) => error_code::DUPLICATE_PRODUCT_NO,
            ServiceError::NotEligible { .. } => error_code::NOT_ELIGIBLE,
            ServiceError::UploadFailed(_) => error_code::UPLOAD_FAILED,
            ServiceError::Storage(_) => error_code::STORAGE_ERROR,
            ServiceError::Internal(_) => error_code::INTERNAL,
        }
    }

    /// HTTP status code for this error.
    #[cfg(feature = "http")]
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::MissingDocument(_) => StatusCode::BAD_REQUEST,
            ServiceError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ServiceError::SlotOccupied(_) => StatusCode::CONFLICT,
            ServiceError::DuplicateProductNo(_) => StatusCode::CONFLICT,
            ServiceError::NotEligible { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::UploadFailed(_) => StatusCode::BAD_GATEWAY,
            ServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(feature = "http")]
impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut body = serde_json::json!({
            "code": self.error_code(),
            "message": self.to_string(),
        });
        if let ServiceError::NotEligible { missing, .. } = &self {
            body["missing"] = serde_json::json!(missing);
        }
        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "http")]
    #[test]
    fn status_code_mapping() {
        assert_eq!(ServiceError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(ServiceError::Validation("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ServiceError::MissingDocument("x".into()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ServiceError::PayloadTooLarge("x".into()).status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(ServiceError::SlotOccupied("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(ServiceError::DuplicateProductNo("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ServiceError::not_eligible("m", vec!["QC Form PDF".into()]).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(ServiceError::UploadFailed("x".into()).status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(ServiceError::Storage("x".into()).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ServiceError::Internal("x".into()).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn error_code_mapping() {
        assert_eq!(ServiceError::NotFound("x".into()).error_code(), "NOT_FOUND");
        assert_eq!(ServiceError::Validation("x".into()).error_code(), "VALIDATION_FAILED");
        assert_eq!(ServiceError::MissingDocument("x".into()).error_code(), "MISSING_DOCUMENT");
        assert_eq!(ServiceError::PayloadTooLarge("x".into()).error_code(), "PAYLOAD_TOO_LARGE");
        assert_eq!(ServiceError::SlotOccupied("x".into()).error_code(), "SLOT_OCCUPIED");
        assert_eq!(ServiceError::DuplicateProductNo("x".into()).error_code(), "DUPLICATE_PRODUCT_NO");
        assert_eq!(ServiceError::not_eligible("m", vec![]).error_code(), "NOT_ELIGIBLE");
        assert_eq!(ServiceError::UploadFailed("x".into()).error_code(), "UPLOAD_FAILED");
        assert_eq!(ServiceError::Storage("x".into()).error_code(), "STORAGE_ERROR");
        assert_eq!(ServiceError::Internal("x".into()).error_code(), "INTERNAL");
    }

    #[test]
    fn not_eligible_message_lists_missing() {
        let err = ServiceError::not_eligible("machine 7", vec!["QC Form PDF".into()]);
        assert_eq!(err.to_string(), "machine 7 cannot be completed, missing: QC Form PDF");
    }

    #[cfg(feature = "http")]
    #[tokio::test]
    async fn not_eligible_json_carries_missing() {
        let err = ServiceError::not_eligible(
            "machine 7",
            vec!["Master Card PDF".into(), "QC Form PDF".into()],
        );
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let bytes = axum::body::to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["code"], "NOT_ELIGIBLE");
        assert_eq!(json["missing"], serde_json::json!(["Master Card PDF", "QC Form PDF"]));
    }

    #[cfg(feature = "http")]
    #[tokio::test]
    async fn plain_errors_omit_missing() {
        let resp = ServiceError::SlotOccupied("block 3 is occupied".into()).into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let bytes = axum::body::to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["code"], "SLOT_OCCUPIED");
        assert_eq!(json["message"], "block 3 is occupied");
        assert!(json.get("missing").is_none());
    }
}
