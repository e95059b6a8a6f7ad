//! Error types for the request path.
//!
//! [`AiError`] describes remote-model failures, [`StoreError`] describes
//! database failures, and [`AppError`] is what handlers return. Every
//! [`AppError`] variant decides one HTTP status; the response body is always
//! `{ "message": "..." }`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Failures of the remote generative-language API.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("API credential is not configured: {0}")]
    Configuration(String),

    #[error("API key was rejected by the remote service: {0}")]
    Auth(String),

    #[error("remote API quota exhausted: {0}")]
    Quota(String),

    #[error("remote API timed out: {0}")]
    Timeout(String),

    #[error("network error talking to remote API: {0}")]
    Network(String),

    #[error("remote API error: {0}")]
    Remote(String),
}

impl From<reqwest::Error> for AiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AiError::Timeout(err.to_string())
        } else if err.is_connect() || err.is_request() {
            AiError::Network(err.to_string())
        } else {
            AiError::Remote(err.to_string())
        }
    }
}

/// Failures of the relational store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("topic {0} does not exist")]
    MissingTopic(i64),

    #[error("conflicting write, retry the request: {0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Classify a sqlx error raised by an insert referencing `topic_id`.
    pub fn from_insert(err: sqlx::Error, topic_id: Option<i64>) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.is_unique_violation() {
                return StoreError::Conflict(db.message().to_string());
            }
            if db.is_foreign_key_violation() {
                if let Some(id) = topic_id {
                    return StoreError::MissingTopic(id);
                }
            }
        }
        StoreError::Database(err)
    }
}

/// Error returned by request handlers and the processing workflow.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Ai(#[from] AiError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Ai(AiError::Timeout(_)) | AppError::Ai(AiError::Network(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AppError::Ai(AiError::Quota(_)) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Ai(AiError::Configuration(_))
            | AppError::Ai(AiError::Auth(_))
            | AppError::Ai(AiError::Remote(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to API clients. Internal details stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::Ai(AiError::Configuration(_)) | AppError::Ai(AiError::Auth(_)) => {
                "The AI service credential is missing or invalid. Contact the administrator."
                    .to_string()
            }
            AppError::Ai(AiError::Quota(_)) => {
                "The AI service request limit was reached. Try again later.".to_string()
            }
            AppError::Ai(AiError::Timeout(_)) | AppError::Ai(AiError::Network(_)) => {
                "Could not reach the AI service. Try again later.".to_string()
            }
            AppError::Ai(AiError::Remote(_)) => {
                "The AI service failed to process the text.".to_string()
            }
            AppError::Store(_) => "Database problem. Try again later.".to_string(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "request rejected");
        }
        let body = ErrorBody {
            message: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (
                AiError::Configuration("no key".into()).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AiError::Auth("invalid".into()).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                AiError::Quota("exhausted".into()).into(),
                StatusCode::TOO_MANY_REQUESTS,
            ),
            (
                AiError::Timeout("slow".into()).into(),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                AiError::Network("refused".into()).into(),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                AiError::Remote("boom".into()).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                StoreError::Conflict("dup".into()).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                StoreError::MissingTopic(9).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.status(), expected, "wrong status for {:?}", err);
        }
    }

    #[test]
    fn test_validation_message_is_passed_through() {
        let err = AppError::Validation("text must not be empty".into());
        assert_eq!(err.public_message(), "text must not be empty");
    }

    #[test]
    fn test_internal_details_not_exposed() {
        let err: AppError = AiError::Auth("key AIza-secret rejected".into()).into();
        assert!(!err.public_message().contains("AIza-secret"));
    }
}
