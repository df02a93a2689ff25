//! Transport traits for APDU communication with cards
//!
//! This module provides abstractions for communicating with smart cards through
//! different transport mechanisms.

pub mod error;

use std::fmt;

use bytes::Bytes;
pub use error::TransportError;
use tracing::{debug, trace};

/// Trait for basic card transports
///
/// A transport is responsible for sending and receiving raw APDU bytes.
/// It owns at most one card session, opened lazily on the first transmit
/// and kept across calls until [`CardTransport::disconnect`] drops it.
pub trait CardTransport: Send + fmt::Debug {
    /// Error type returned by the transport
    type Error: Into<TransportError> + fmt::Debug;

    /// Send raw APDU bytes to card and return response bytes
    fn transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, Self::Error> {
        trace!(command = %hex::encode_upper(command), "Transmitting raw command");
        let result = self.do_transmit_raw(command);
        match &result {
            Ok(response) => {
                trace!(response = %hex::encode_upper(response), "Received raw response");
            }
            Err(e) => {
                debug!(error = ?e, "Transport error during transmission");
            }
        }
        result
    }

    /// Internal implementation of transmit_raw
    /// This is the method that concrete implementations should override
    fn do_transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, Self::Error>;

    /// Check if the transport currently holds a card session
    fn is_connected(&self) -> bool;

    /// Drop the current card session so the next transmit opens a fresh one
    fn disconnect(&mut self);
}

#[cfg(test)]
#[derive(Debug, Clone)]
#[allow(missing_docs, unreachable_pub)]
pub struct MockTransport {
    /// Mock results to return, in order
    pub responses: Vec<Result<Bytes, TransportError>>,
    /// Commands that were sent
    pub commands: Vec<Bytes>,
    /// Whether the transport holds a session
    pub connected: bool,
}

#[cfg(test)]
impl MockTransport {
    /// Create a new mock transport that answers with the given raw responses
    pub fn new(responses: Vec<Result<Bytes, TransportError>>) -> Self {
        Self {
            responses,
            commands: Vec::new(),
            connected: false,
        }
    }

    /// Create a new mock transport that always returns the given response
    pub fn with_response(response: &'static [u8]) -> Self {
        Self::new(vec![Ok(Bytes::from_static(response))])
    }
}

#[cfg(test)]
impl CardTransport for MockTransport {
    type Error = TransportError;

    fn do_transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, Self::Error> {
        self.commands.push(Bytes::copy_from_slice(command));

        let result = if self.responses.len() == 1 {
            self.responses[0].clone()
        } else if self.responses.is_empty() {
            Err(TransportError::Transmission)
        } else {
            self.responses.remove(0)
        };
        self.connected = result.is_ok();
        result
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn disconnect(&mut self) {
        self.connected = false;
    }
}
