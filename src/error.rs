//! Error types for the mech catalog.
//!
//! Every failure the catalog can report is a variant of [`CatalogError`].
//! Using `thiserror` keeps the messages next to the variants and lets `?`
//! convert I/O, JSON and HTTP errors automatically.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Custom error type for catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Source text is not valid JSON.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Valid JSON, but not a recognisable mech record.
    #[error("invalid mech format{}: {reason}", field_suffix(.field))]
    InvalidFormat {
        /// Offending field, when it can be determined.
        field: Option<String>,
        reason: String,
    },

    /// Requested record id is absent from the dataset.
    #[error("mech with id \"{0}\" not found")]
    NotFound(String),

    /// Dataset fetch failed or returned a non-success status.
    #[error("data source unavailable: {0}")]
    SourceUnavailable(String),

    /// Request was understood but cannot be carried out as sent.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Error reading or writing files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error serializing or parsing JSON we produce ourselves.
    #[error("JSON error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Error making HTTP requests.
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// Template rendering failed.
    #[error("render error: {0}")]
    Render(#[from] tera::Error),
}

fn field_suffix(field: &Option<String>) -> String {
    match field {
        Some(name) => format!(" (field `{}`)", name),
        None => String::new(),
    }
}

impl CatalogError {
    /// Shorthand for an [`CatalogError::InvalidFormat`] naming a missing field.
    pub fn missing_field(field: &str) -> Self {
        CatalogError::InvalidFormat {
            field: Some(field.to_string()),
            reason: "required field is missing".to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            CatalogError::MalformedInput(_)
            | CatalogError::InvalidFormat { .. }
            | CatalogError::BadRequest(_) => StatusCode::BAD_REQUEST,
            CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
            CatalogError::SourceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            CatalogError::Io(_)
            | CatalogError::JsonParse(_)
            | CatalogError::HttpRequest(_)
            | CatalogError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for CatalogError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("request failed: {}", self);
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
