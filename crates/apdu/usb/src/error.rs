//! Error types for the direct USB transport

use tapwedge_apdu_core::TransportError;
use thiserror::Error;

/// Errors from direct USB communication with the reader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UsbError {
    /// USB error (from rusb)
    #[error("USB error: {0}")]
    Usb(#[from] rusb::Error),

    /// No device with the expected vendor and product ID is attached
    #[error("Device {vendor_id:04x}:{product_id:04x} not found")]
    DeviceNotFound {
        /// USB vendor ID searched for
        vendor_id: u16,
        /// USB product ID searched for
        product_id: u16,
    },

    /// The transport holds no open device
    #[error("Device not open")]
    DeviceNotOpen,

    /// The first interface lacks a bulk IN/OUT endpoint pair
    #[error("Bulk endpoints not found")]
    EndpointsNotFound,

    /// Bulk transfer failed
    #[error("Bulk transfer failed: {0}")]
    BulkTransfer(rusb::Error),

    /// Fewer bytes were written than requested
    #[error("Short write: expected {expected} bytes, wrote {actual}")]
    ShortWrite {
        /// Number of bytes in the frame
        expected: usize,
        /// Number of bytes the device accepted
        actual: usize,
    },

    /// Read timeout
    #[error("Read timeout")]
    ReadTimeout,

    /// Write timeout
    #[error("Write timeout")]
    WriteTimeout,
}

impl UsbError {
    /// Check whether this is a timeout error
    pub const fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::ReadTimeout
                | Self::WriteTimeout
                | Self::Usb(rusb::Error::Timeout)
                | Self::BulkTransfer(rusb::Error::Timeout)
        )
    }

    /// Check whether the device handle should be discarded and reopened
    pub const fn invalidates_device(&self) -> bool {
        !matches!(self, Self::ReadTimeout)
    }
}

impl From<UsbError> for TransportError {
    fn from(error: UsbError) -> Self {
        match error {
            // Nothing answered within the read window, so no card is in the field
            UsbError::ReadTimeout => Self::NoCard,
            UsbError::WriteTimeout => Self::Timeout,
            UsbError::DeviceNotFound { .. }
            | UsbError::DeviceNotOpen
            | UsbError::EndpointsNotFound
            | UsbError::Usb(rusb::Error::NoDevice | rusb::Error::NotFound) => Self::Device,
            UsbError::BulkTransfer(_) | UsbError::ShortWrite { .. } => Self::Transmission,
            UsbError::Usb(rusb::Error::Access | rusb::Error::Busy) => Self::Connection,
            other => Self::other(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usb_error_from_rusb_error() {
        let err: UsbError = rusb::Error::NotFound.into();
        assert_eq!(err, UsbError::Usb(rusb::Error::NotFound));
    }

    #[test]
    fn test_is_timeout() {
        assert!(UsbError::ReadTimeout.is_timeout());
        assert!(UsbError::WriteTimeout.is_timeout());
        assert!(UsbError::Usb(rusb::Error::Timeout).is_timeout());
        assert!(!UsbError::DeviceNotOpen.is_timeout());
        assert!(!UsbError::BulkTransfer(rusb::Error::Pipe).is_timeout());
    }

    #[test]
    fn test_read_timeout_means_no_card() {
        let err: TransportError = UsbError::ReadTimeout.into();
        assert!(err.is_no_card());
        assert!(!UsbError::ReadTimeout.invalidates_device());
        assert!(UsbError::BulkTransfer(rusb::Error::Io).invalidates_device());
    }

    #[test]
    fn test_display() {
        let err = UsbError::DeviceNotFound {
            vendor_id: 0x072F,
            product_id: 0x2200,
        };
        assert_eq!(err.to_string(), "Device 072f:2200 not found");

        let err = UsbError::ShortWrite {
            expected: 9,
            actual: 4,
        };
        assert!(err.to_string().contains('9'));
    }
}
