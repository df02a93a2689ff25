//! Error types specific to APDU responses

use thiserror::Error;

use super::status::StatusWord;

/// Error for status words in APDU responses
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Status error {status} ({})", status.description())]
pub struct StatusError {
    /// Status word that caused the error
    pub status: StatusWord,
}

impl StatusError {
    /// Create a new status error
    pub const fn new(sw1: u8, sw2: u8) -> Self {
        Self {
            status: StatusWord::new(sw1, sw2),
        }
    }

    /// Get the status word
    pub const fn status_word(&self) -> StatusWord {
        self.status
    }
}

/// Error for APDU response processing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResponseError {
    /// Incomplete response (less than 2 bytes)
    #[error("Incomplete response")]
    Incomplete,

    /// Status error
    #[error(transparent)]
    Status(#[from] StatusError),
}
