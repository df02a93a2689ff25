//! Core traits and types for APDU exchanges with contactless card readers
//!
//! This crate provides the foundational types used to talk to a PC/SC style
//! reader such as the ACS ACR122U:
//!
//! - Building short APDU commands, including the reader's pseudo-APDUs
//! - Parsing responses and interpreting status words
//! - The [`CardTransport`] abstraction implemented by concrete transports
//! - The [`Uid`] type and the [`get_uid`] exchange
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![forbid(unsafe_code)]
#![warn(missing_docs, rustdoc::missing_crate_level_docs)]

// Re-export bytes for convenience
pub use bytes::{Bytes, BytesMut};

pub mod command;
pub mod response;
pub mod transport;
pub mod uid;

mod error;
pub use error::{Error, Result};

pub use command::Command;
pub use response::error::{ResponseError, StatusError};
pub use response::status::StatusWord;
pub use response::{Response, utils};
pub use transport::{CardTransport, TransportError};
pub use uid::{Uid, get_uid};

/// Prelude module containing commonly used traits and types
pub mod prelude {
    pub use crate::{
        Bytes, Command, Error, Response, Result, StatusWord, Uid, get_uid,
        transport::{CardTransport, TransportError},
    };
}
