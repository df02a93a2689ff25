//! Card unique identifiers and the GET UID exchange

use std::fmt;

use bytes::Bytes;
use tracing::{Level, debug, info, instrument, warn};

use crate::command::Command;
use crate::response::Response;
use crate::response::status::StatusWord;
use crate::transport::CardTransport;
use crate::{Error, Result};

/// Unique identifier of a contactless card
///
/// Rendered as uppercase hexadecimal without separators.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Uid(Bytes);

impl Uid {
    /// Create a UID from its raw bytes
    ///
    /// # Errors
    /// Returns a parse error if `bytes` is empty.
    pub fn new(bytes: impl Into<Bytes>) -> Result<Self> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(Error::parse("empty UID"));
        }
        Ok(Self(bytes))
    }

    /// Raw UID bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Number of UID bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false, a UID holds at least one byte
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Uppercase hexadecimal rendering, e.g. `04A1B2C3`
    pub fn to_hex(&self) -> String {
        hex::encode_upper(&self.0)
    }

    /// Big-endian unsigned decimal rendering of the first eight bytes
    pub fn to_decimal(&self) -> String {
        self.0
            .iter()
            .take(8)
            .fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte))
            .to_string()
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uid({})", self.to_hex())
    }
}

/// Ask the reader for the UID of the card in the field
///
/// Sends `FF CA 00 00 00` and returns the payload of a `90 00` response.
/// An empty reader surfaces as [`Error::is_no_card`], a rejected command as
/// [`Error::status`]. The transport's session is left untouched either way;
/// dropping it after a transport fault is up to the caller.
#[instrument(level = "trace", skip_all)]
pub fn get_uid<T: CardTransport>(transport: &mut T) -> Result<Uid> {
    let command = Command::get_uid();
    let raw = transport
        .transmit_raw(&command.to_bytes())
        .map_err(|e| Error::Transport(e.into()))?;

    let response = Response::from_bytes(&raw)?;
    let status = response.status();
    let payload = response.into_bytes_result().map_err(|e| {
        log_rejected(status);
        Error::Response(e.into())
    })?;

    Uid::new(payload)
}

/// Log a refused GET UID at the severity its status word calls for
fn log_rejected(status: StatusWord) {
    let level = status.tracing_level();
    if level == Level::WARN {
        warn!(%status, "GET UID rejected: {}", status.description());
    } else if level == Level::INFO {
        info!(%status, "GET UID rejected: {}", status.description());
    } else {
        debug!(%status, "GET UID rejected: {}", status.description());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{MockTransport, TransportError};

    #[test]
    fn test_uid_rendering() {
        let uid = Uid::new(Bytes::from_static(&[0x04, 0xA1, 0xB2, 0xC3])).unwrap();
        assert_eq!(uid.to_hex(), "04A1B2C3");
        assert_eq!(uid.to_string(), "04A1B2C3");
        assert_eq!(uid.to_decimal(), "77705923");
        assert_eq!(uid.len(), 4);
    }

    #[test]
    fn test_uid_rejects_empty() {
        assert!(Uid::new(Bytes::new()).is_err());
    }

    #[test]
    fn test_get_uid_success() {
        let mut transport = MockTransport::with_response(&[0x04, 0xA1, 0xB2, 0xC3, 0x90, 0x00]);
        let uid = get_uid(&mut transport).unwrap();

        assert_eq!(uid.to_hex(), "04A1B2C3");
        assert_eq!(
            transport.commands[0].as_ref(),
            &[0xFF, 0xCA, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_get_uid_rejected_status_keeps_session() {
        let mut transport = MockTransport::with_response(&[0x63, 0x00]);
        let err = get_uid(&mut transport).unwrap_err();

        assert_eq!(err.status().map(|sw| sw.to_u16()), Some(0x6300));
        assert!(!err.is_no_card());
        assert!(transport.is_connected());
    }

    #[test]
    fn test_get_uid_no_card() {
        let mut transport = MockTransport::new(vec![Err(TransportError::NoCard)]);
        let err = get_uid(&mut transport).unwrap_err();

        assert!(err.is_no_card());
        assert!(err.status().is_none());
    }

    #[test]
    fn test_get_uid_truncated_response() {
        let mut transport = MockTransport::with_response(&[0x90]);
        assert!(matches!(
            get_uid(&mut transport),
            Err(Error::Response(_))
        ));
    }
}
