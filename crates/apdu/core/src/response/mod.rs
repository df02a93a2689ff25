//! APDU response definitions
//!
//! This module provides types for working with APDU responses
//! according to ISO/IEC 7816-4.

pub mod error;
pub mod status;
pub mod utils;

use bytes::Bytes;
use tracing::trace;

use error::{ResponseError, StatusError};
use status::StatusWord;

/// Basic APDU response structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Response payload data
    payload: Bytes,
    /// Status word
    status: StatusWord,
}

impl Response {
    /// Create a new response with payload and status
    pub fn new(payload: impl Into<Bytes>, status: impl Into<StatusWord>) -> Self {
        Self {
            payload: payload.into(),
            status: status.into(),
        }
    }

    /// Create a success response
    pub fn success(payload: impl Into<Bytes>) -> Self {
        Self::new(payload, status::common::SUCCESS)
    }

    /// Create an error response from a status word
    pub fn error(status: impl Into<StatusWord>) -> Self {
        Self::new(Bytes::new(), status)
    }

    /// Parse response from raw bytes (including status word)
    pub fn from_bytes(data: &Bytes) -> Result<Self, ResponseError> {
        let (status, payload) = utils::extract_status_and_payload(data)?;

        trace!(
            sw1 = format_args!("{:#04x}", status.sw1),
            sw2 = format_args!("{:#04x}", status.sw2),
            payload_len = payload.len(),
            "Parsed APDU response"
        );

        Ok(Self {
            payload: data.slice(..payload.len()),
            status,
        })
    }

    /// Get the response payload data
    pub const fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Get the status word
    pub const fn status(&self) -> StatusWord {
        self.status
    }

    /// Check if the response indicates success
    pub const fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Convert to the payload if the status word indicates success
    pub fn into_bytes_result(self) -> Result<Bytes, StatusError> {
        if self.is_success() {
            Ok(self.payload)
        } else {
            Err(StatusError::new(self.status.sw1, self.status.sw2))
        }
    }
}

impl TryFrom<&[u8]> for Response {
    type Error = ResponseError;

    fn try_from(data: &[u8]) -> Result<Self, ResponseError> {
        Self::from_bytes(&Bytes::copy_from_slice(data))
    }
}

impl TryFrom<Bytes> for Response {
    type Error = ResponseError;

    fn try_from(data: Bytes) -> Result<Self, ResponseError> {
        Self::from_bytes(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_from_bytes() {
        let data = Bytes::from_static(&[0x04, 0xA1, 0xB2, 0xC3, 0x90, 0x00]);
        let resp = Response::from_bytes(&data).unwrap();
        assert_eq!(resp.payload().as_ref(), &[0x04, 0xA1, 0xB2, 0xC3]);
        assert_eq!(resp.status(), StatusWord::new(0x90, 0x00));
        assert!(resp.is_success());

        let data = Bytes::from_static(&[0x63, 0x00]);
        let resp = Response::from_bytes(&data).unwrap();
        assert!(resp.payload().is_empty());
        assert!(!resp.is_success());

        let data = Bytes::from_static(&[0x01]);
        assert!(Response::from_bytes(&data).is_err());
    }

    #[test]
    fn test_response_into_result() {
        let success = Response::success(Bytes::from_static(&[0x01, 0x02, 0x03]));
        assert_eq!(
            success.into_bytes_result().unwrap().as_ref(),
            &[0x01, 0x02, 0x03]
        );

        let error = Response::error((0x6A, 0x81));
        let result = error.into_bytes_result();
        assert_eq!(result.unwrap_err().status.to_u16(), 0x6A81);
    }
}
