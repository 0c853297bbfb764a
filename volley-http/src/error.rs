//! HTTP error types and their wire form.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use volley_dispatch::DispatchError;

/// Request-level failures: the batch never started.
///
/// These map to a non-2xx response carrying a single opaque error
/// string, per the frontend contract. Per-recipient failures are never
/// errors at this level; they ride inside the results array.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The recipient list was empty or contained malformed tokens.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// The priority field was not one of the form's values.
    #[error("invalid priority {0:?}, expected \"1\", \"3\", or \"5\"")]
    InvalidPriority(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": self.to_string() })),
        )
            .into_response()
    }
}

/// Failures of the server itself.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("failed to bind to {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Server(String),
}
