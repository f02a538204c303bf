use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

use crate::models::ErrorBody;

/// Failures raised by a `Storage` backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[allow(dead_code)]
    #[error("storage lock poisoned")]
    LockPoisoned,

    #[error("invalid product {name:?}: {reason}")]
    InvalidProduct { name: String, reason: &'static str },

    #[allow(dead_code)]
    #[error("username {0:?} is already taken")]
    UsernameTaken(String),

    #[error("credential hashing failed: {0}")]
    Hashing(#[from] argon2::Error),
}

/// Errors a handler can answer with. Server-side details stay in the log.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(&'static str),

    #[error("not found: {0}")]
    NotFound(&'static str),

    #[error("{context}: {source}")]
    Internal {
        context: &'static str,
        #[source]
        source: StorageError,
    },
}

impl ApiError {
    /// Wraps a storage failure with the message the client will see.
    pub fn internal(context: &'static str) -> impl FnOnce(StorageError) -> ApiError {
        move |source| ApiError::Internal { context, source }
    }

    fn public_message(&self) -> &'static str {
        match self {
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) => *msg,
            ApiError::Internal { context, .. } => *context,
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Internal { source, .. } = self {
            log::error!("{}: {}", self.public_message(), source);
        }
        HttpResponse::build(self.status_code()).json(ErrorBody {
            message: self.public_message().to_string(),
        })
    }
}

/// Failures while reading process configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be a valid port number, got {value:?}")]
    InvalidPort { name: &'static str, value: String },
}
