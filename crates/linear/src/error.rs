//! Typed errors for the tracker seam.
//!
//! Every failure coming back from the remote tracker is classified once, at
//! the adapter boundary, into a closed set of kinds. Callers branch on the
//! kind instead of inspecting message text.

use thiserror::Error;

/// Error returned by [`Tracker`](crate::Tracker) operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackerError {
    /// The entity already exists (lost a creation race, or re-created a link).
    #[error("already exists: {0}")]
    Duplicate(String),

    /// A referenced entity does not exist or is not visible to the credentials.
    #[error("not found: {0}")]
    NotFound(String),

    /// Network failure, timeout, rate limit or server-side error. Retrying may help.
    #[error("transient tracker failure: {0}")]
    Transient(String),

    /// Anything else: authentication, validation, malformed responses.
    #[error("tracker error: {0}")]
    Other(String),
}

impl TrackerError {
    /// Classify a GraphQL error from its message and optional extension code.
    #[must_use]
    pub fn classify(message: &str, code: Option<&str>) -> Self {
        let lower = message.to_lowercase();
        let code = code.map(str::to_uppercase);

        if lower.contains("duplicate") || lower.contains("already exists") {
            return Self::Duplicate(message.to_string());
        }

        match code.as_deref() {
            Some("RATELIMITED" | "INTERNAL_SERVER_ERROR" | "TIMEOUT") => {
                return Self::Transient(message.to_string());
            }
            Some("ENTITY_NOT_FOUND" | "NOT_FOUND") => return Self::NotFound(message.to_string()),
            _ => {}
        }

        if lower.contains("not found") || lower.contains("could not find") {
            Self::NotFound(message.to_string())
        } else if lower.contains("rate limit") || lower.contains("timed out") {
            Self::Transient(message.to_string())
        } else {
            Self::Other(message.to_string())
        }
    }

    /// Classify a non-success HTTP status.
    #[must_use]
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = format!("HTTP {status}: {body}");
        match status {
            404 => Self::NotFound(message),
            408 | 429 | 500..=599 => Self::Transient(message),
            _ => Self::Other(message),
        }
    }

    #[must_use]
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate(_))
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Whether repeating the same call may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

impl From<reqwest::Error> for TrackerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            Self::Transient(err.to_string())
        } else {
            Self::Other(err.to_string())
        }
    }
}

/// Result alias for tracker operations.
pub type TrackerResult<T> = Result<T, TrackerError>;
