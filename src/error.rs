//! Error handling for the API.
//!
//! Every model operation and endpoint returns a [CrescendoResult]. Prefer
//! adding a variant over forcing a failure into `Validation` or `Server`,
//! and document the status code and JSON body it produces.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};

/// The error enum for all error handling across the API.
///
/// Every variant is rendered as a JSON body carrying at least
/// `message` and `statusCode`.
#[derive(Debug, thiserror::Error)]
pub enum CrescendoError {
    /// \[400\] The submitted data failed validation.
    ///
    /// ```json
    /// {
    ///     "message": "validation failed",
    ///     "statusCode": 400,
    ///     "reason": <reason>
    /// }
    /// ```
    #[error("validation failed")]
    Validation(String),
    /// \[401\] The username or password was wrong. Which one is never revealed.
    #[error("Invalid username or password.")]
    InvalidCredentials,
    /// \[401\] The endpoint requires a logged-in user.
    #[error("login required")]
    LoginRequired,
    /// \[403\] The user is logged in but may not perform the action.
    ///
    /// ```json
    /// {
    ///     "message": "access forbidden",
    ///     "statusCode": 403,
    ///     "reason": <reason>
    /// }
    /// ```
    #[error("access forbidden")]
    Forbidden(String),
    /// \[404\] The requested resource does not exist.
    #[error("resource not found")]
    NotFound(String),
    /// \[409\] The write would violate a uniqueness or state constraint.
    #[error("conflict")]
    Conflict(String),
    /// \[500\] The database failed. Details are logged, not returned.
    #[error("database error")]
    Store(#[from] sqlx::Error),
    /// \[500\] Reading or writing a stored file failed.
    #[error("file error")]
    Io(#[from] std::io::Error),
    /// \[500\] Anything else that went wrong while handling the request.
    #[error("server error")]
    Server(String),
}

/// The return type for all endpoints and model operations.
pub type CrescendoResult<T> = Result<T, CrescendoError>;

impl CrescendoError {
    pub fn status(&self) -> StatusCode {
        match self {
            CrescendoError::Validation(_) => StatusCode::BAD_REQUEST,
            CrescendoError::InvalidCredentials | CrescendoError::LoginRequired => {
                StatusCode::UNAUTHORIZED
            }
            CrescendoError::Forbidden(_) => StatusCode::FORBIDDEN,
            CrescendoError::NotFound(_) => StatusCode::NOT_FOUND,
            CrescendoError::Conflict(_) => StatusCode::CONFLICT,
            CrescendoError::Store(_) | CrescendoError::Io(_) | CrescendoError::Server(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn as_response(&self) -> (StatusCode, Value) {
        let mut json_val = match self {
            CrescendoError::Validation(reason)
            | CrescendoError::Forbidden(reason)
            | CrescendoError::Conflict(reason) => json!({ "reason": reason }),
            CrescendoError::NotFound(what) => json!({ "reason": what }),
            CrescendoError::InvalidCredentials
            | CrescendoError::LoginRequired
            | CrescendoError::Store(_)
            | CrescendoError::Io(_)
            | CrescendoError::Server(_) => json!({}),
        };

        let status = self.status();
        json_val["statusCode"] = json!(status.as_u16());
        json_val["message"] = json!(self.to_string());

        (status, json_val)
    }

    /// Maps a unique-index violation to a [Conflict](CrescendoError::Conflict),
    /// passing every other database error through.
    pub fn conflict_on_unique(error: sqlx::Error, reason: impl Into<String>) -> Self {
        match &error {
            sqlx::Error::Database(db_error) if db_error.is_unique_violation() => {
                CrescendoError::Conflict(reason.into())
            }
            _ => CrescendoError::Store(error),
        }
    }
}

impl IntoResponse for CrescendoError {
    fn into_response(self) -> Response {
        match &self {
            CrescendoError::Store(error) => tracing::error!(?error, "database error"),
            CrescendoError::Io(error) => tracing::error!(?error, "file error"),
            CrescendoError::Server(error) => tracing::error!(%error, "server error"),
            other => tracing::debug!(error = %other, status = %other.status(), "request rejected"),
        }

        let (status, body) = self.as_response();
        (status, Json(body)).into_response()
    }
}
