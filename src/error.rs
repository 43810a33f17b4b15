//! Failure taxonomy recorded by the request coordinator.

use std::fmt;

use thiserror::Error;

/// Broad class of a failed user action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Required input was empty or unusable; no request was sent.
    Validation,
    /// Connectivity failure or non-success HTTP status.
    Transport,
    /// The response body did not have the expected shape.
    Format,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Transport => write!(f, "transport"),
            Self::Format => write!(f, "format"),
        }
    }
}

/// A classified failure, detached from the underlying I/O error so that it can be
/// stored in an operation's terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("{0}")]
    Validation(String),

    #[error("request failed: {0}")]
    Transport(String),

    #[error("unexpected response: {0}")]
    Format(String),
}

impl RequestError {
    /// Returns the class of this failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Transport(_) => ErrorKind::Transport,
            Self::Format(_) => ErrorKind::Format,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        assert_eq!(
            RequestError::Validation("x".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            RequestError::Transport("x".into()).kind(),
            ErrorKind::Transport
        );
        assert_eq!(RequestError::Format("x".into()).kind(), ErrorKind::Format);
    }

    #[test]
    fn display_is_user_readable() {
        let error = RequestError::Transport("HTTP error: status 500".into());
        assert_eq!(error.to_string(), "request failed: HTTP error: status 500");
        assert_eq!(
            RequestError::Validation("Please enter a question".into()).to_string(),
            "Please enter a question"
        );
    }
}
