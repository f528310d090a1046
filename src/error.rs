//! Error types for calls against the odorok backend
//!
//! `ApiError` is what every supplier handed to the response cache fails with.
//! It is `Clone` so the single-flight cache can hand the exact same failure to
//! every caller that joined an in-flight request.

use thiserror::Error;

/// Errors that can occur when calling the backend
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// No response was received (connect failure, timeout, DNS)
    #[error("Transport error: {0}")]
    Transport(String),

    /// A response was received with a non-2xx status
    #[error("HTTP {status}: {body}")]
    HttpStatus {
        /// Numeric status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// A response was received but its payload could not be interpreted
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        // A body read that timed out is a slow response, not a bad payload
        if e.is_timeout() {
            ApiError::Transport(e.to_string())
        } else if e.is_decode() || e.is_body() {
            ApiError::Decode(e.to_string())
        } else {
            ApiError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}

impl ApiError {
    /// Returns the HTTP status code, if a response was received
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    pub fn is_forbidden(&self) -> bool {
        self.status() == Some(403)
    }

    /// Whether a later retry has a reasonable chance of succeeding
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Transport(_) => true,
            ApiError::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            ApiError::Decode(_) => false,
        }
    }

    /// Message suitable for showing to an end user
    ///
    /// 400, 422 and unlisted statuses prefer the `message` field of a JSON
    /// error body when the backend supplied one.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Transport(_) => "Check your network connection.".to_string(),
            ApiError::Decode(_) => "The server sent a response that could not be read.".to_string(),
            ApiError::HttpStatus { status, body } => {
                let server_message = body_message(body);
                match status {
                    400 => server_message.unwrap_or_else(|| "Bad request.".to_string()),
                    401 => "Login required.".to_string(),
                    403 => "You do not have permission to access this resource.".to_string(),
                    404 => "The requested resource was not found.".to_string(),
                    409 => "The data already exists.".to_string(),
                    422 => server_message.unwrap_or_else(|| "The submitted data is invalid.".to_string()),
                    429 => "Too many requests. Please try again shortly.".to_string(),
                    500 => "Internal server error.".to_string(),
                    502..=504 => "The server is temporarily unavailable.".to_string(),
                    other => server_message.unwrap_or_else(|| format!("Server error ({}).", other)),
                }
            }
        }
    }
}

/// Extracts a non-empty `message` string from a JSON error body
fn body_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .and_then(|m| m.as_str())
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}
