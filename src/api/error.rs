use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::{persist::StorageError, repo::RepoError};

/// Error half of every handler. Renders as `{"error": "..."}`.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Blank or missing name.
    #[error("Name is required")]
    NameRequired,

    /// Body was not the expected JSON shape.
    #[error("Invalid request body")]
    MalformedPayload,

    /// Wrong or missing admin password.
    #[error("Unauthorized")]
    Unauthorized,

    /// Backend failure. Only `message` reaches the client.
    #[error("{message}")]
    Storage {
        /// Generic, operation-specific message.
        message: &'static str,
        /// Logged cause.
        source: StorageError,
    },
}

impl ApiError {
    /// Maps a repository error, attaching the message used if storage failed.
    pub fn from_repo(err: RepoError, message: &'static str) -> Self {
        match err {
            RepoError::NameRequired => Self::NameRequired,
            RepoError::Unauthorized => Self::Unauthorized,
            RepoError::Storage(source) => Self::Storage { message, source },
        }
    }

    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NameRequired | Self::MalformedPayload => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Storage { message, source } = &self {
            error!(error = %source, "{message}");
        }
        let status = self.status();
        (status, Json(ErrorBody { error: self.to_string() })).into_response()
    }
}
