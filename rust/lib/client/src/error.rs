use serde::Deserialize;

/// What went wrong, decoded from the server's stable error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    MissingDocument,
    PayloadTooLarge,
    NotFound,
    SlotOccupied,
    DuplicateProductNo,
    NotEligible,
    UploadFailed,
    Storage,
    Internal,
    /// The request never got a response (connect, timeout, reset).
    Network,
    /// A response arrived but its body could not be decoded.
    Decode,
    /// A non-success response without a recognizable error body.
    Unexpected,
}

impl ErrorKind {
    pub fn from_code(code: &str) -> Self {
        match code {
            "VALIDATION_FAILED" => ErrorKind::Validation,
            "MISSING_DOCUMENT" => ErrorKind::MissingDocument,
            "PAYLOAD_TOO_LARGE" => ErrorKind::PayloadTooLarge,
            "NOT_FOUND" => ErrorKind::NotFound,
            "SLOT_OCCUPIED" => ErrorKind::SlotOccupied,
            "DUPLICATE_PRODUCT_NO" => ErrorKind::DuplicateProductNo,
            "NOT_ELIGIBLE" => ErrorKind::NotEligible,
            "UPLOAD_FAILED" => ErrorKind::UploadFailed,
            "STORAGE_ERROR" => ErrorKind::Storage,
            "INTERNAL" => ErrorKind::Internal,
            _ => ErrorKind::Unexpected,
        }
    }

    /// True for transactional conflicts where the same input may succeed on
    /// a later attempt (another machine left the block, storage recovered,
    /// the network came back). Input problems return false.
    pub fn is_retryable_with_same_input(&self) -> bool {
        matches!(
            self,
            ErrorKind::SlotOccupied | ErrorKind::UploadFailed | ErrorKind::Network
        )
    }
}

/// Error returned by every client and board call.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind:?}: {message}")]
pub struct ClientError {
    pub kind: ErrorKind,
    /// HTTP status, when a response was received.
    pub status: Option<u16>,
    pub message: String,
    /// Unmet prerequisites, only for `NotEligible`.
    pub missing: Vec<String>,
}

/// Error body produced by the server.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(default)]
    missing: Vec<String>,
}

impl ClientError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            message: message.into(),
            missing: Vec::new(),
        }
    }

    /// Local refusal to complete a machine that is not eligible.
    pub fn not_eligible(missing: Vec<String>) -> Self {
        Self {
            kind: ErrorKind::NotEligible,
            status: None,
            message: format!("cannot be completed, missing: {}", missing.join(", ")),
            missing,
        }
    }

    /// Decode a non-success response body.
    pub fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(b) => Self {
                kind: ErrorKind::from_code(&b.code),
                status: Some(status),
                message: b.message,
                missing: b.missing,
            },
            Err(_) => Self {
                kind: ErrorKind::Unexpected,
                status: Some(status),
                message: format!("HTTP {}: {}", status, body),
                missing: Vec::new(),
            },
        }
    }

    pub fn is_retryable_with_same_input(&self) -> bool {
        self.kind.is_retryable_with_same_input()
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        let kind = if e.is_decode() {
            ErrorKind::Decode
        } else {
            ErrorKind::Network
        };
        Self {
            kind,
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
            missing: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_server_error_body() {
        let err = ClientError::from_response(
            422,
            r#"{"code":"NOT_ELIGIBLE","message":"machine 1234567 cannot be completed, missing: QC Form PDF","missing":["QC Form PDF"]}"#,
        );
        assert_eq!(err.kind, ErrorKind::NotEligible);
        assert_eq!(err.status, Some(422));
        assert_eq!(err.missing, vec!["QC Form PDF"]);

        let err = ClientError::from_response(409, r#"{"code":"SLOT_OCCUPIED","message":"block 3 is already occupied"}"#);
        assert_eq!(err.kind, ErrorKind::SlotOccupied);
        assert!(err.missing.is_empty());

        let err = ClientError::from_response(413, r#"{"code":"PAYLOAD_TOO_LARGE","message":"upload exceeds 1024 bytes"}"#);
        assert_eq!(err.kind, ErrorKind::PayloadTooLarge);
        assert_eq!(err.status, Some(413));
    }

    #[test]
    fn unknown_bodies_are_unexpected() {
        let err = ClientError::from_response(500, "upstream exploded");
        assert_eq!(err.kind, ErrorKind::Unexpected);
        assert!(err.message.contains("upstream exploded"));

        let err = ClientError::from_response(418, r#"{"code":"TEAPOT","message":"short and stout"}"#);
        assert_eq!(err.kind, ErrorKind::Unexpected);
    }

    #[test]
    fn retryable_kinds() {
        let retryable = [ErrorKind::SlotOccupied, ErrorKind::UploadFailed, ErrorKind::Network];
        for kind in retryable {
            assert!(kind.is_retryable_with_same_input(), "{:?}", kind);
        }
        for kind in [
            ErrorKind::Validation,
            ErrorKind::MissingDocument,
            ErrorKind::PayloadTooLarge,
            ErrorKind::NotFound,
            ErrorKind::DuplicateProductNo,
            ErrorKind::NotEligible,
            ErrorKind::Decode,
        ] {
            assert!(!kind.is_retryable_with_same_input(), "{:?}", kind);
        }
    }
}
