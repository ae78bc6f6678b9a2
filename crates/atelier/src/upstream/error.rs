//! Error types for upstream gallery API operations.

use std::time::Duration;

use thiserror::Error;

use crate::http::HttpError;

/// Errors that can occur when talking to the gallery API.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Transport-level failure (connect, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    /// Response body did not match the expected shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Non-success status other than 429.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The API answered 429 Too Many Requests.
    #[error("Rate limited (429 Too Many Requests){}", retry_after_suffix(.retry_after))]
    RateLimited { retry_after: Option<Duration> },

    /// Invalid client configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

fn retry_after_suffix(retry_after: &Option<Duration>) -> String {
    match retry_after {
        Some(d) => format!(", retry after {}s", d.as_secs()),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, UpstreamError>;

impl UpstreamError {
    /// Whether the error signals upstream throttling.
    ///
    /// Structured signals win; error bodies that merely mention throttling
    /// are caught by [`is_rate_limited_message`].
    pub fn is_rate_limited(&self) -> bool {
        match self {
            UpstreamError::RateLimited { .. } => true,
            UpstreamError::Api { status: 429, .. } => true,
            UpstreamError::Api { message, .. } => is_rate_limited_message(message),
            UpstreamError::Http(e) => is_rate_limited_message(&e.to_string()),
            UpstreamError::Json(_) | UpstreamError::Config(_) => false,
        }
    }

    /// Short description suitable for progress lines.
    pub fn short_message(&self) -> String {
        match self {
            UpstreamError::Http(_) => "Network error".to_string(),
            UpstreamError::Json(_) => "JSON parse error".to_string(),
            UpstreamError::Api { status, message } => {
                if message.chars().count() > 50 {
                    let truncated: String = message.chars().take(47).collect();
                    format!("HTTP {}: {}...", status, truncated)
                } else {
                    format!("HTTP {}: {}", status, message)
                }
            }
            UpstreamError::RateLimited { .. } => "Rate limited".to_string(),
            UpstreamError::Config(msg) => format!("Config: {}", msg),
        }
    }
}

/// Loose textual throttling check for errors that lost their structure.
pub fn is_rate_limited_message(message: &str) -> bool {
    message.contains("429") || message.contains("RATE_LIMIT") || message.contains("Too many")
}
