//! UID sources: one card reader backend behind a common interface

use std::fmt;
use tapwedge_apdu_core::{CardTransport, Error, Uid, get_uid};
use tapwedge_apdu_transport_usb::read_uid_direct;
use tracing::{error, warn};

/// Outcome of a single UID read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UidRead {
    /// A card answered with this UID
    Present(Uid),
    /// No card is in the field
    NoCard,
    /// A card may be present but its UID could not be read
    Failed,
}

impl UidRead {
    /// The UID, if one was read
    pub const fn uid(&self) -> Option<&Uid> {
        match self {
            Self::Present(uid) => Some(uid),
            Self::NoCard | Self::Failed => None,
        }
    }
}

/// A reader backend able to fetch the UID of the card in its field
///
/// Implementations absorb every per-read fault: a broken session is
/// dropped and reopened by the next read.
pub trait UidSource: fmt::Debug {
    /// Read the UID of the card currently in the field
    fn read_uid(&mut self) -> UidRead;

    /// The card left the field; any session bound to it must not be reused
    fn card_removed(&mut self);
}

/// Reads UIDs with the reader's `FF CA 00 00 00` pseudo-APDU
#[derive(Debug)]
pub struct PcscUidSource<T> {
    transport: T,
}

impl<T: CardTransport> PcscUidSource<T> {
    /// Wrap a transport bound to the selected reader
    pub const fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Access the underlying transport
    pub const fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T: CardTransport> UidSource for PcscUidSource<T> {
    fn read_uid(&mut self) -> UidRead {
        match get_uid(&mut self.transport) {
            Ok(uid) => UidRead::Present(uid),
            Err(e) if e.is_no_card() => UidRead::NoCard,
            Err(e) => {
                if let Some(status) = e.status() {
                    // The session is fine, the card just refused the command
                    warn!(
                        "Failed to read card: SW1={:02X}, SW2={:02X}",
                        status.sw1, status.sw2
                    );
                } else if let Error::Transport(transport_error) = &e {
                    warn!(error = %transport_error, "Card connection failed, reconnecting on next read");
                    self.transport.disconnect();
                } else {
                    warn!(error = %e, "Invalid UID response");
                }
                UidRead::Failed
            }
        }
    }

    fn card_removed(&mut self) {
        self.transport.disconnect();
    }
}

/// Reads UIDs by driving the reader's PN533 directly over USB
#[derive(Debug)]
pub struct UsbUidSource<T> {
    transport: T,
}

impl<T: CardTransport> UsbUidSource<T> {
    /// Wrap a direct USB transport
    pub const fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Access the underlying transport
    pub const fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T: CardTransport> UidSource for UsbUidSource<T> {
    fn read_uid(&mut self) -> UidRead {
        match read_uid_direct(&mut self.transport) {
            Ok(Some(uid)) => UidRead::Present(uid),
            Ok(None) => UidRead::NoCard,
            Err(e) => {
                error!(error = %e, "Error in direct USB communication");
                // The transport drops a faulted device itself; make sure of it
                // for transports that do not
                self.transport.disconnect();
                UidRead::Failed
            }
        }
    }

    fn card_removed(&mut self) {}
}
