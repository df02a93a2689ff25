//! CardTransport over direct USB bulk transfers

use bytes::Bytes;
use std::time::Duration;
use tapwedge_apdu_core::CardTransport;
use tracing::{debug, warn};

use crate::channel::{BulkChannel, DeviceOpener};
use crate::error::UsbError;

/// How long to wait for the reader to answer; expiry means no card
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// How long a bulk-OUT write may take
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_millis(1000);

/// Size of the bulk-IN read buffer
const READ_BUFFER_SIZE: usize = 256;

/// Transport writing pseudo-APDUs straight to the reader's bulk endpoints
///
/// The device is opened on the first transmit. Any fault other than a read
/// timeout drops it, and the next transmit reopens it from scratch.
#[derive(Debug)]
pub struct UsbTransport<O: DeviceOpener> {
    opener: O,
    channel: Option<O::Channel>,
    read_timeout: Duration,
    write_timeout: Duration,
}

impl<O: DeviceOpener> UsbTransport<O> {
    /// Create a transport using the default timeouts
    pub const fn new(opener: O) -> Self {
        Self {
            opener,
            channel: None,
            read_timeout: DEFAULT_READ_TIMEOUT,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }

    /// Open the device unless it is already open
    pub fn open(&mut self) -> Result<(), UsbError> {
        if self.channel.is_none() {
            self.channel = Some(self.opener.open()?);
            debug!("USB device opened");
        }
        Ok(())
    }

    fn exchange(&mut self, command: &[u8]) -> Result<Bytes, UsbError> {
        self.open()?;
        let channel = self.channel.as_ref().ok_or(UsbError::DeviceNotOpen)?;

        let written = channel.write_bulk(command, self.write_timeout)?;
        if written != command.len() {
            return Err(UsbError::ShortWrite {
                expected: command.len(),
                actual: written,
            });
        }

        let mut buf = [0u8; READ_BUFFER_SIZE];
        let len = channel.read_bulk(&mut buf, self.read_timeout)?;
        Ok(Bytes::copy_from_slice(&buf[..len]))
    }
}

impl<O: DeviceOpener> CardTransport for UsbTransport<O> {
    type Error = UsbError;

    fn do_transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, Self::Error> {
        self.exchange(command).inspect_err(|e| {
            if e.invalidates_device() {
                warn!(error = %e, "USB exchange failed, dropping device");
                self.channel = None;
            }
        })
    }

    fn is_connected(&self) -> bool {
        self.channel.is_some()
    }

    fn disconnect(&mut self) {
        if self.channel.take().is_some() {
            debug!("USB device closed");
        }
    }
}
