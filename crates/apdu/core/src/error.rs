//! Core error type for all APDU operations
//!
//! All error variants are consolidated here so callers can classify a failed
//! exchange in one match: an empty reader, a card that refused the command,
//! or a broken transport.

use crate::response::error::ResponseError;
use crate::response::status::StatusWord;
use crate::transport::TransportError;

/// Core error type that encompasses all possible errors in the crate
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    /// Transport related errors
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Response related errors, including non-success status words
    #[error(transparent)]
    Response(#[from] ResponseError),

    /// Invalid command length
    #[error("Invalid command length: {0}")]
    InvalidCommandLength(usize),

    /// Parse error when processing a response payload
    #[error("Parse error: {0}")]
    ParseError(&'static str),
}

impl Error {
    /// Create a new parse error
    pub const fn parse(message: &'static str) -> Self {
        Self::ParseError(message)
    }

    /// Check if this error only signals an empty reader
    pub const fn is_no_card(&self) -> bool {
        matches!(self, Self::Transport(TransportError::NoCard))
    }

    /// The status word the card answered with, if the card rejected the command
    pub const fn status(&self) -> Option<StatusWord> {
        match self {
            Self::Response(ResponseError::Status(status)) => Some(status.status_word()),
            _ => None,
        }
    }
}

/// Result type alias for APDU operations
pub type Result<T, E = Error> = std::result::Result<T, E>;
