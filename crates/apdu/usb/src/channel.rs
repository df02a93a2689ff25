//! Seams between the transport and the physical USB device

use std::fmt;
use std::time::Duration;

use crate::device::{ACR122U_PRODUCT_ID, ACR122U_VENDOR_ID, AcrUsbDevice};
use crate::error::UsbError;

/// A claimed device exposing a bulk OUT/IN endpoint pair
pub trait BulkChannel: Send + fmt::Debug {
    /// Write `data` to the bulk-OUT endpoint, returning the number of bytes sent
    fn write_bulk(&self, data: &[u8], timeout: Duration) -> Result<usize, UsbError>;

    /// Read from the bulk-IN endpoint into `buf`, returning the number of bytes received
    fn read_bulk(&self, buf: &mut [u8], timeout: Duration) -> Result<usize, UsbError>;
}

/// Factory for bulk channels, invoked whenever the transport needs a fresh device
pub trait DeviceOpener: Send + fmt::Debug {
    /// Channel type produced by this opener
    type Channel: BulkChannel;

    /// Locate, claim and return the device
    fn open(&self) -> Result<Self::Channel, UsbError>;
}

/// Opens an ACR122U by vendor and product ID
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcrUsbOpener {
    /// USB vendor ID
    pub vendor_id: u16,
    /// USB product ID
    pub product_id: u16,
}

impl AcrUsbOpener {
    /// Create an opener for a specific vendor and product ID
    pub const fn new(vendor_id: u16, product_id: u16) -> Self {
        Self {
            vendor_id,
            product_id,
        }
    }
}

impl Default for AcrUsbOpener {
    fn default() -> Self {
        Self::new(ACR122U_VENDOR_ID, ACR122U_PRODUCT_ID)
    }
}

impl DeviceOpener for AcrUsbOpener {
    type Channel = AcrUsbDevice;

    fn open(&self) -> Result<AcrUsbDevice, UsbError> {
        AcrUsbDevice::open(self.vendor_id, self.product_id)
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use super::*;

    /// Shared record of what the transport did with its channels
    #[derive(Debug, Default)]
    pub(crate) struct MockState {
        pub(crate) reads: VecDeque<Result<Vec<u8>, UsbError>>,
        pub(crate) writes: Vec<Vec<u8>>,
        pub(crate) opens: usize,
        pub(crate) fail_open: bool,
    }

    #[derive(Debug, Clone, Default)]
    pub(crate) struct MockOpener {
        pub(crate) state: Arc<Mutex<MockState>>,
    }

    impl MockOpener {
        pub(crate) fn with_reads(reads: Vec<Result<Vec<u8>, UsbError>>) -> Self {
            let opener = Self::default();
            opener.state.lock().unwrap().reads = reads.into();
            opener
        }

        pub(crate) fn opens(&self) -> usize {
            self.state.lock().unwrap().opens
        }

        pub(crate) fn writes(&self) -> Vec<Vec<u8>> {
            self.state.lock().unwrap().writes.clone()
        }
    }

    #[derive(Debug)]
    pub(crate) struct MockChannel {
        state: Arc<Mutex<MockState>>,
    }

    impl DeviceOpener for MockOpener {
        type Channel = MockChannel;

        fn open(&self) -> Result<MockChannel, UsbError> {
            let mut state = self.state.lock().unwrap();
            if state.fail_open {
                return Err(UsbError::DeviceNotFound {
                    vendor_id: ACR122U_VENDOR_ID,
                    product_id: ACR122U_PRODUCT_ID,
                });
            }
            state.opens += 1;
            Ok(MockChannel {
                state: Arc::clone(&self.state),
            })
        }
    }

    impl BulkChannel for MockChannel {
        fn write_bulk(&self, data: &[u8], _timeout: Duration) -> Result<usize, UsbError> {
            self.state.lock().unwrap().writes.push(data.to_vec());
            Ok(data.len())
        }

        fn read_bulk(&self, buf: &mut [u8], _timeout: Duration) -> Result<usize, UsbError> {
            let next = self
                .state
                .lock()
                .unwrap()
                .reads
                .pop_front()
                .unwrap_or(Err(UsbError::ReadTimeout));
            let data = next?;
            buf[..data.len()].copy_from_slice(&data);
            Ok(data.len())
        }
    }
}
