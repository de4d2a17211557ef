//! Error types for the HTTP trigger
//!
//! Failures are reported as `500` with the failure detail as a plain-text
//! body, matching the success body of a plain `OK`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::any::Any;
use thiserror::Error;
use tracing::error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// sheetkeeper-common error (config, sheets, storage, failed run)
    #[error(transparent)]
    Common(#[from] sheetkeeper_common::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Text of a panic payload (`panic!` with a literal or a formatted message)
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Response for a handler panic caught by `CatchPanicLayer`
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic_message(&*payload);
    error!(panic = %message, "Request handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Internal error: {}", message),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetkeeper_common::Error;

    #[test]
    fn test_common_error_keeps_detail() {
        let err = ApiError::from(Error::RunFailed("1 of 1 sheets failed".to_string()));
        assert_eq!(err.to_string(), "Run failed: 1 of 1 sheets failed");

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_panic_message_payloads() {
        assert_eq!(panic_message(&"literal"), "literal");
        assert_eq!(panic_message(&format!("row {}", 3)), "row 3");
        assert_eq!(panic_message(&42_u32), "unknown panic payload");
    }

    #[tokio::test]
    async fn test_handle_panic_is_plain_500() {
        use http_body_util::BodyExt;

        let response = handle_panic(Box::new("gateway exploded"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"Internal error: gateway exploded");
    }
}
