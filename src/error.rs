use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Every handler failure funnels through this enum so the client always
/// receives the same `{ "message": ..., "success": false }` envelope.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(&'static str),
    #[error("user already exists")]
    UserExists,
    #[error("{0}")]
    NotFound(&'static str),
    #[error("password does not match")]
    PasswordMismatch,
    #[error("did not find token in cookie")]
    MissingSession,
    #[error("invalid or expired session token")]
    InvalidSession,
    #[error("email not sent")]
    Mail(#[source] anyhow::Error),
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_)
            | ApiError::UserExists
            | ApiError::NotFound(_)
            | ApiError::PasswordMismatch => StatusCode::BAD_REQUEST,
            ApiError::MissingSession | ApiError::InvalidSession => StatusCode::UNAUTHORIZED,
            ApiError::Mail(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Sources stay in the logs; clients only ever see the public message.
        match &self {
            ApiError::Mail(source) => error!(%source, "sending email failed"),
            ApiError::Internal(source) => error!(%source, "unhandled internal error"),
            _ => {}
        }
        let body = Json(json!({
            "message": self.to_string(),
            "success": false,
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod error_tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn validation_maps_to_bad_request_envelope() {
        let (status, body) = body_json(ApiError::Validation("all fields are required")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "all fields are required");
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn session_errors_map_to_unauthorized() {
        let (status, body) = body_json(ApiError::MissingSession).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "did not find token in cookie");

        let (status, body) = body_json(ApiError::InvalidSession).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "invalid or expired session token");
    }

    #[tokio::test]
    async fn mail_failure_hides_source_from_client() {
        let (status, body) =
            body_json(ApiError::Mail(anyhow::anyhow!("connection refused"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "email not sent");
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn store_failure_surfaces_as_internal_error() {
        // Repos return anyhow, so driver errors arrive through the From impl.
        let err = ApiError::from(anyhow::Error::from(sqlx::Error::PoolClosed));
        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "internal server error");
        assert_eq!(body["success"], false);
    }
}
