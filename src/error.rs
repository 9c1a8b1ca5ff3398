//! Failure taxonomy for talking to the tracking server.
//!
//! Every variant is recoverable: the grid keeps its last good page and shows a
//! toast. Stale responses are not errors at all and never reach this type.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("server returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("{0}")]
    Unavailable(String),
}

/// Coarse classification used for logging and user-facing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    FetchFailure,
    MalformedResponse,
}

impl FetchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            FetchError::Malformed(_) => FailureKind::MalformedResponse,
            FetchError::Transport(_)
            | FetchError::Timeout(_)
            | FetchError::Status { .. }
            | FetchError::Unavailable(_) => FailureKind::FetchFailure,
        }
    }

    /// Message shown in the error toast.
    pub fn user_message(&self) -> String {
        match self.kind() {
            FailureKind::FetchFailure => format!("Could not load runs: {self}"),
            FailureKind::MalformedResponse => format!("Server sent an unexpected response ({self})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_is_classified_separately() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(FetchError::from(err).kind(), FailureKind::MalformedResponse);
    }

    #[test]
    fn status_and_timeout_are_fetch_failures() {
        let status = FetchError::Status {
            status: 502,
            body: "bad gateway".to_string(),
        };
        assert_eq!(status.kind(), FailureKind::FetchFailure);
        assert_eq!(FetchError::Timeout(30).kind(), FailureKind::FetchFailure);
    }

    #[test]
    fn user_message_mentions_status() {
        let err = FetchError::Status {
            status: 500,
            body: "boom".to_string(),
        };
        let msg = err.user_message();
        assert!(msg.starts_with("Could not load runs"));
        assert!(msg.contains("500"));
    }
}
