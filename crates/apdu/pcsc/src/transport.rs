//! PC/SC transport implementation

use bytes::Bytes;
use pcsc::{Card, Context, MAX_BUFFER_SIZE};
use std::{ffi::CString, fmt};
use tapwedge_apdu_core::CardTransport;
use tracing::{debug, trace};

use crate::{config::PcscConfig, error::PcscError};

/// Transport implementation using PC/SC
///
/// The card connection is opened lazily and reused across transmits until the
/// card is removed or [`CardTransport::disconnect`] is called.
pub struct PcscTransport {
    /// PC/SC context
    context: Context,
    /// Card connection, if established
    card: Option<Card>,
    /// Reader name
    reader_name: String,
    /// Reader name as passed to SCardConnect
    reader_cstr: CString,
    /// Configuration
    config: PcscConfig,
}

impl fmt::Debug for PcscTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PcscTransport")
            .field("reader_name", &self.reader_name)
            .field("has_card", &self.card.is_some())
            .field("config", &self.config)
            .finish()
    }
}

impl PcscTransport {
    /// Create a new PC/SC transport for the specified reader
    ///
    /// No connection is attempted until the first transmit.
    pub(crate) fn new(
        context: Context,
        reader_name: &str,
        config: PcscConfig,
    ) -> Result<Self, PcscError> {
        let reader_cstr = CString::new(reader_name)
            .map_err(|_| PcscError::InvalidReaderName(reader_name.to_string()))?;

        Ok(Self {
            context,
            card: None,
            reader_name: reader_name.to_string(),
            reader_cstr,
            config,
        })
    }

    /// Get the reader name
    pub fn reader_name(&self) -> &str {
        &self.reader_name
    }

    /// Connect to the card unless a connection is already held
    ///
    /// An empty reader yields [`PcscError::NoCard`].
    pub fn connect(&mut self) -> Result<(), PcscError> {
        if self.card.is_some() {
            return Ok(());
        }

        match self.context.connect(
            &self.reader_cstr,
            self.config.share_mode.into(),
            self.config.protocols,
        ) {
            Ok(card) => {
                trace!(reader = %self.reader_name, "Connected to card");
                self.card = Some(card);
                Ok(())
            }
            Err(pcsc::Error::NoSmartcard | pcsc::Error::RemovedCard) => {
                Err(PcscError::NoCard(self.reader_name.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Transmit a command to the card
    fn transmit_command(&mut self, command: &[u8]) -> Result<Bytes, PcscError> {
        self.connect()?;

        let card = match &mut self.card {
            Some(card) => card,
            None => return Err(PcscError::NoCard(self.reader_name.clone())),
        };

        let mut response_buffer = [0u8; MAX_BUFFER_SIZE];

        match card.transmit(command, &mut response_buffer) {
            Ok(response) => Ok(Bytes::copy_from_slice(response)),
            Err(e) => {
                // A reset or removed card invalidates the handle for good
                if matches!(e, pcsc::Error::ResetCard | pcsc::Error::RemovedCard) {
                    debug!(reader = %self.reader_name, error = %e, "Dropping stale card handle");
                    self.card = None;
                    return Err(PcscError::CardRemoved);
                }

                Err(e.into())
            }
        }
    }
}

impl CardTransport for PcscTransport {
    type Error = PcscError;

    fn do_transmit_raw(&mut self, command: &[u8]) -> Result<Bytes, Self::Error> {
        self.transmit_command(command)
    }

    fn is_connected(&self) -> bool {
        self.card.is_some()
    }

    fn disconnect(&mut self) {
        if let Some(card) = self.card.take() {
            if let Err((_, e)) = card.disconnect(self.config.disposition) {
                debug!(reader = %self.reader_name, error = %e, "Card disconnect failed");
            }
        }
    }
}

impl Drop for PcscTransport {
    fn drop(&mut self) {
        self.disconnect();
    }
}
