use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use thiserror::Error;

/// Shown to the user whenever a failure carries no readable message of its own.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

/// RemoteError
///
/// Every way a call to the LMS backend can fail. All of them are terminal for the attempt:
/// nothing in this crate retries.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The request never produced a response (connection refused, timeout, TLS, ...).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("backend returned {status}")]
    Status {
        status: u16,
        message: Option<String>,
    },

    /// A 2xx response whose body could not be decoded.
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// The error body shape the backend uses: `{ "message": "..." }`.
#[derive(Deserialize)]
struct ErrorPayload {
    message: Option<String>,
}

impl RemoteError {
    /// Builds a `Status` error from a non-2xx response body, keeping the payload's
    /// `message` when the body is JSON and carries one.
    pub fn from_payload(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorPayload>(body)
            .ok()
            .and_then(|payload| payload.message)
            .filter(|message| !message.trim().is_empty());
        RemoteError::Status { status, message }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteError::Status { status, .. } => Some(*status),
            RemoteError::Network(e) => e.status().map(|s| s.as_u16()),
            RemoteError::Malformed(_) => None,
        }
    }

    /// True when the backend rejected the caller's session (401/403).
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }

    /// The human-readable text surfaced on rollback.
    pub fn user_message(&self) -> String {
        match self {
            RemoteError::Status {
                message: Some(message),
                ..
            } => message.clone(),
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

/// PathError
///
/// Raised when a course-scoped path does not yield a course identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("no course identifier in path `{0}`")]
    MissingCourseId(String),
}

/// MutationError
///
/// Precondition failures. These are detected before anything is applied locally, so the
/// collection is untouched when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    #[error("no entity with id `{0}` in this list")]
    UnknownEntity(String),

    #[error("entity `{0}` cannot move further in that direction")]
    OutOfBounds(String),
}

/// AppError
///
/// The top-level boundary for handlers. Unexpected failures are logged in full and
/// converted into a generic message; the detail never reaches the browser.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Mutation(#[from] MutationError),

    #[error("forbidden")]
    Forbidden,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Forbidden => (StatusCode::FORBIDDEN, "Forbidden".to_string()),
            AppError::Mutation(MutationError::UnknownEntity(_)) => {
                (StatusCode::NOT_FOUND, self.to_string())
            }
            AppError::Mutation(MutationError::OutOfBounds(_)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, self.to_string())
            }
            AppError::Remote(e) => match e.status() {
                Some(401) => (StatusCode::UNAUTHORIZED, e.user_message()),
                Some(403) => (StatusCode::FORBIDDEN, e.user_message()),
                Some(404) => (StatusCode::NOT_FOUND, e.user_message()),
                _ => {
                    tracing::error!("backend call failed: {:?}", e);
                    (StatusCode::BAD_GATEWAY, e.user_message())
                }
            },
        };

        (status, Json(serde_json::json!({ "message": message }))).into_response()
    }
}
