//! Error types for channel delivery

use std::fmt;

use crate::config::ChannelType;

/// Result type alias for delivery operations
pub type InformResult<T> = Result<T, InformError>;

/// Errors that can occur while delivering a rendered message
#[derive(Debug)]
pub enum InformError {
    /// The channel endpoint could not be reached
    Transport(reqwest::Error),

    /// The channel endpoint answered with a non-2xx status
    Rejected { status: u16, body: String },

    /// The informer was handed a channel of a different kind
    MismatchedChannel { expected: ChannelType },
}

impl fmt::Display for InformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InformError::Transport(err) => {
                write!(f, "failed to reach channel endpoint: {}", err)
            }
            InformError::Rejected { status, body } => {
                write!(
                    f,
                    "channel endpoint rejected the message with status {}: {}",
                    status, body
                )
            }
            InformError::MismatchedChannel { expected } => {
                write!(
                    f,
                    "channel kind does not match this informer (expected {})",
                    expected
                )
            }
        }
    }
}

impl std::error::Error for InformError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InformError::Transport(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for InformError {
    fn from(err: reqwest::Error) -> Self {
        InformError::Transport(err)
    }
}
