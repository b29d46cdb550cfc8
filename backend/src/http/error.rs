//! HTTP error handling and response types.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::db::repository::RepositoryError;
use crate::db::TimetableError;
use crate::services::{AccessGrantError, SessionError};

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Subject of the assignment a rejected timetable write collided with
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflicting_with: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            conflicting_with: None,
        }
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Invalid request (validation error)
    BadRequest(String),
    /// The request collides with existing data
    Conflict {
        message: String,
        conflicting_with: Option<String>,
    },
    /// A feature whose backing service is not configured
    Unavailable(String),
    /// The external access-grant service failed or refused the call
    Upstream(String),
    /// Repository error
    Repository(RepositoryError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", msg)),
            AppError::Conflict {
                message,
                conflicting_with,
            } => {
                let mut body = ApiError::new("CONFLICT", message);
                body.conflicting_with = conflicting_with;
                (StatusCode::CONFLICT, body)
            }
            AppError::Unavailable(msg) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ApiError::new("SERVICE_UNAVAILABLE", msg),
            ),
            AppError::Upstream(msg) => {
                error!("access-grant service failure: {}", msg);
                (StatusCode::BAD_GATEWAY, ApiError::new("UPSTREAM_ERROR", msg))
            }
            AppError::Repository(e) => match e {
                RepositoryError::NotFound { message, .. } => {
                    (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", message))
                }
                RepositoryError::ValidationError { message, .. } => {
                    (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", message))
                }
                RepositoryError::ConflictError { message, context } => {
                    let mut body = ApiError::new("CONFLICT", message);
                    body.details = context.details;
                    (StatusCode::CONFLICT, body)
                }
                other => {
                    error!(error = %other, "repository failure");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiError::new("REPOSITORY_ERROR", "Repository operation failed"),
                    )
                }
            },
        };

        (status, Json(error)).into_response()
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        AppError::Repository(err)
    }
}

impl From<TimetableError> for AppError {
    fn from(err: TimetableError) -> Self {
        match err {
            TimetableError::Conflict(conflict) => AppError::Conflict {
                message: conflict.to_string(),
                conflicting_with: Some(conflict.conflicting_subject().to_string()),
            },
            TimetableError::Invalid(_) | TimetableError::UnknownReference { .. } => {
                AppError::BadRequest(err.to_string())
            }
            TimetableError::Repository(e) => AppError::Repository(e),
        }
    }
}

// Extractor rejections are client errors regardless of what axum would pick.

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<AccessGrantError> for AppError {
    fn from(err: AccessGrantError) -> Self {
        match err {
            AccessGrantError::MissingUsername => AppError::BadRequest(err.to_string()),
            AccessGrantError::NotConfigured | AccessGrantError::Session(SessionError::NotInitialized) => {
                AppError::Unavailable(err.to_string())
            }
            AccessGrantError::Session(_) | AccessGrantError::Rejected { .. } | AccessGrantError::Transport(_) => {
                AppError::Upstream(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::ErrorContext;

    #[test]
    fn test_repository_errors_map_to_status() {
        let cases = [
            (
                RepositoryError::not_found_with_context("gone", ErrorContext::new("get_school")),
                StatusCode::NOT_FOUND,
            ),
            (RepositoryError::validation("bad"), StatusCode::BAD_REQUEST),
            (
                RepositoryError::conflict_with_context("in use", ErrorContext::new("delete_school")),
                StatusCode::CONFLICT,
            ),
            (RepositoryError::configuration("bad backend"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(AppError::from(err).into_response().status(), expected);
        }
    }

    #[test]
    fn test_conflict_body_serialization() {
        let mut body = ApiError::new("CONFLICT", "Time conflict");
        body.conflicting_with = Some("Algebra".to_string());
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["code"], "CONFLICT");
        assert_eq!(json["conflicting_with"], "Algebra");
        assert!(json.get("details").is_none());
    }

    #[test]
    fn test_access_grant_errors_map_to_status() {
        let cases = [
            (AccessGrantError::MissingUsername, StatusCode::BAD_REQUEST),
            (AccessGrantError::NotConfigured, StatusCode::SERVICE_UNAVAILABLE),
            (
                AccessGrantError::Session(SessionError::NotInitialized),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                AccessGrantError::Session(SessionError::MissingCsrfToken),
                StatusCode::BAD_GATEWAY,
            ),
            (
                AccessGrantError::Rejected {
                    status: 403,
                    body: "forbidden".to_string(),
                },
                StatusCode::BAD_GATEWAY,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(AppError::from(err).into_response().status(), expected);
        }
    }
}
