//! Error types for alert formatting and delivery.

use thiserror::Error;

/// Error type for HTTP operations.
///
/// Describes what went wrong without dictating recovery strategy.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Network connection failed (DNS, refused, TLS, reset).
    #[error("Connection error: {0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The server did not respond in time.
    #[error("Request timed out")]
    Timeout,

    /// The request URL could not be built or was rejected by the client.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Delivery failure for a single recipient.
///
/// Failures are logged and isolated per recipient; they are never retried.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The HTTP request could not be completed.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// The service answered with a non-success status.
    #[error("Rejected with status {status}: {}", description.as_deref().unwrap_or("no description"))]
    Rejected {
        /// HTTP status returned by the service
        status: http::StatusCode,
        /// Error description from the response body, if any
        description: Option<String>,
    },

    /// The request body could not be encoded.
    #[error("Failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Invalid alert template.
#[derive(Debug, Error)]
pub enum AlertTemplateError {
    /// The template does not parse.
    #[error("Invalid template syntax: {0}")]
    Syntax(String),

    /// The template parses but fails to render (e.g. unknown variable).
    #[error("Template does not render: {0}")]
    Render(String),
}
