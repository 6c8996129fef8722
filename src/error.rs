use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Application-level error surfaced to HTTP clients as `{kind, message}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Invalid email or password")]
    BadCredentials,

    #[error("Please verify your email")]
    Unverified,

    #[error("{0}")]
    InvalidToken(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    kind: &'static str,
    message: String,
}

impl ApiError {
    fn kind(&self) -> &'static str {
        match self {
            ApiError::InvalidInput(_) => "InvalidInput",
            ApiError::NotFound(_) => "NotFound",
            ApiError::BadCredentials => "BadCredentials",
            ApiError::Unverified => "Unverified",
            ApiError::InvalidToken(_) => "InvalidToken",
            ApiError::Conflict(_) => "Conflict",
            ApiError::Internal(_) => "Internal",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadCredentials | ApiError::Unverified | ApiError::InvalidToken(_) => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Internal details go to the log, never to the client.
        let message = match &self {
            ApiError::Internal(e) => {
                error!(error = %e, "internal error");
                "internal error".to_string()
            }
            other => other.to_string(),
        };
        let body = ErrorBody {
            kind: self.kind(),
            message,
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[test]
    fn kinds_map_to_expected_statuses() {
        assert_eq!(
            ApiError::InvalidInput("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::NotFound("missing".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(ApiError::BadCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Unverified.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::InvalidToken("expired".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Conflict("taken".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn bad_credentials_message_does_not_distinguish_cause() {
        assert_eq!(
            ApiError::BadCredentials.to_string(),
            "Invalid email or password"
        );
        assert_eq!(ApiError::Unverified.to_string(), "Please verify your email");
    }

    #[tokio::test]
    async fn response_body_carries_kind_and_message() {
        let response = ApiError::Unverified.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["kind"], "Unverified");
        assert_eq!(body["message"], "Please verify your email");
    }

    #[tokio::test]
    async fn internal_error_body_is_redacted() {
        let err = ApiError::Internal(anyhow::anyhow!("connection refused to db at 10.0.0.1"));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["kind"], "Internal");
        assert_eq!(body["message"], "internal error");
        assert!(!body.to_string().contains("10.0.0.1"));
    }
}
