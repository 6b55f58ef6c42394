use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Request-level error surfaced to the client.
///
/// `Validation` and `PermissionDenied` are distinct families: the first means
/// the submitted data broke a field rule (the client can fix and resubmit),
/// the second means the actor is not allowed to perform the action at all.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Validation { field: &'static str, message: String },
    #[error("{0}")]
    PermissionDenied(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn permission_denied(detail: impl Into<String>) -> Self {
        Self::PermissionDenied(detail.into())
    }

    pub fn internal<E: Into<anyhow::Error>>(err: E) -> Self {
        Self::Internal(err.into())
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        Self::Internal(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                json!({ "detail": message, "field": field }),
            ),
            Self::PermissionDenied(detail) => {
                (StatusCode::FORBIDDEN, json!({ "detail": detail }))
            }
            Self::Unauthorized(detail) => {
                (StatusCode::UNAUTHORIZED, json!({ "detail": detail }))
            }
            Self::NotFound(_) => (StatusCode::NOT_FOUND, json!({ "detail": self.to_string() })),
            Self::Conflict(detail) => (StatusCode::CONFLICT, json!({ "detail": detail })),
            Self::Internal(err) => {
                tracing::error!(error = %err, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "detail": "internal error" }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_400() {
        let res = ApiError::validation("title", "bad title").into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn permission_denied_maps_to_403() {
        let res = ApiError::permission_denied("nope").into_response();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn not_found_maps_to_404() {
        let res = ApiError::NotFound("post").into_response();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::NotFound("post").to_string(), "post not found");
    }

    #[test]
    fn conflict_maps_to_409() {
        let res = ApiError::Conflict("username taken".into()).into_response();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }
}
