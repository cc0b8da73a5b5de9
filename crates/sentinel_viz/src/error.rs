//! Error types for the Sentinel visualization server and client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// A specialized `Result` type for visualization operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Defines the errors that can occur within the `sentinel_viz` crate.
#[derive(Error, Debug)]
pub enum Error {
    /// An error related to the web server (e.g., binding to a port).
    #[error("Server error: {0}")]
    Server(String),

    /// An error that occurred during data serialization or deserialization.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An error from the underlying I/O system.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The story transform rejected its input.
    #[error("Story error: {0}")]
    Story(#[from] sentinel_story::Error),

    /// The HTTP request to the backend could not be completed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("Backend returned {status} for {url}")]
    Backend {
        /// HTTP status code.
        status: u16,
        /// Requested URL.
        url: String,
    },

    /// A requested resource was not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// An error related to the server's configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// The JSON body returned for failed API requests.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// A human-readable error message.
    pub error: String,
    /// A machine-readable error code string.
    pub code: &'static str,
}

impl Error {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Story(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Backend { .. } | Error::Http(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a machine-readable error code string for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Server(_) => "SERVER_ERROR",
            Error::Serialization(_) => "SERIALIZATION_ERROR",
            Error::Io(_) => "IO_ERROR",
            Error::Story(_) => "STORY_ERROR",
            Error::Http(_) => "HTTP_ERROR",
            Error::Backend { .. } => "BACKEND_ERROR",
            Error::NotFound(_) => "NOT_FOUND",
            Error::Config(_) => "CONFIG_ERROR",
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("API error: {}", self);
        }
        let body = ErrorResponse {
            error: self.to_string(),
            code: self.error_code(),
        };
        (status, Json(body)).into_response()
    }
}
