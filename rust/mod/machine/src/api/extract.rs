//! Body extractors whose rejections follow the `{code, message}` error contract.

use axum::extract::{FromRequest, Multipart, Request};
use axum::http::StatusCode;
use axum::Json;
use serde::de::DeserializeOwned;

use shopfloor_core::ServiceError;

/// `Json<T>` that rejects with `ServiceError` instead of axum's plain text.
pub(crate) struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(e) => Err(body_error(e.status(), &e.body_text())),
        }
    }
}

/// `Multipart` that rejects with `ServiceError`.
pub(crate) struct ApiMultipart(pub Multipart);

impl<S> FromRequest<S> for ApiMultipart
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Multipart::from_request(req, state).await {
            Ok(multipart) => Ok(Self(multipart)),
            Err(e) => Err(body_error(e.status(), &e.body_text())),
        }
    }
}

/// Map a body rejection. Oversized bodies keep their own code so clients can
/// tell them apart from malformed input.
pub(crate) fn body_error(status: StatusCode, detail: &str) -> ServiceError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        ServiceError::PayloadTooLarge(format!("request body too large: {}", detail))
    } else {
        ServiceError::Validation(format!("invalid request body: {}", detail))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oversized_bodies_keep_their_status() {
        let err = body_error(StatusCode::PAYLOAD_TOO_LARGE, "length limit exceeded");
        assert!(matches!(err, ServiceError::PayloadTooLarge(_)));
        assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);

        for status in [StatusCode::BAD_REQUEST, StatusCode::UNPROCESSABLE_ENTITY, StatusCode::UNSUPPORTED_MEDIA_TYPE] {
            let err = body_error(status, "bad");
            assert!(matches!(err, ServiceError::Validation(_)));
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        }
    }
}
