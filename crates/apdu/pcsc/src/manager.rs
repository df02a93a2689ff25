//! Device manager for PC/SC operations

use pcsc::{Context, ReaderState, Scope, State};
use tracing::{debug, info};

use crate::config::PcscConfig;
use crate::error::PcscError;
use crate::monitor::PcscMonitor;
use crate::reader::PcscReader;
use crate::transport::PcscTransport;

/// Manager for PC/SC device operations
pub struct PcscDeviceManager {
    /// PC/SC context
    context: Context,
}

impl std::fmt::Debug for PcscDeviceManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PcscDeviceManager").finish_non_exhaustive()
    }
}

impl PcscDeviceManager {
    /// Create a new PC/SC device manager
    ///
    /// Fails when the PC/SC service is not running.
    pub fn new() -> Result<Self, PcscError> {
        let context = Context::establish(Scope::User)?;
        Ok(Self { context })
    }

    /// List all available card readers
    pub fn list_readers(&self) -> Result<Vec<PcscReader>, PcscError> {
        let readers = match self.context.list_readers_owned() {
            Ok(readers) => readers,
            Err(pcsc::Error::NoReadersAvailable) => return Err(PcscError::NoReadersAvailable),
            Err(e) => return Err(e.into()),
        };
        if readers.is_empty() {
            return Err(PcscError::NoReadersAvailable);
        }

        let mut result = Vec::with_capacity(readers.len());

        for reader_name in readers {
            // Query the current state to learn whether a card is present
            let mut reader_states = vec![ReaderState::new(reader_name.as_c_str(), State::UNAWARE)];

            match self.context.get_status_change(None, &mut reader_states) {
                Ok(()) => {
                    result.push(PcscReader::from_reader_state(&reader_states[0]));
                }
                Err(e) => {
                    debug!(error = %e, "Reader status unavailable, assuming no card");
                    result.push(PcscReader::new(
                        reader_name.to_string_lossy().into_owned(),
                        false,
                        None,
                    ));
                }
            }
        }

        Ok(result)
    }

    /// Find the first reader whose name contains one of `patterns`
    ///
    /// Every enumerated reader is logged so a mismatch can be diagnosed.
    pub fn find_reader<S: AsRef<str>>(&self, patterns: &[S]) -> Result<PcscReader, PcscError> {
        let readers = self.list_readers()?;

        info!("Found {} reader(s):", readers.len());
        for (i, reader) in readers.iter().enumerate() {
            info!("  {}. {}", i + 1, reader.name());
        }

        readers
            .into_iter()
            .find(|reader| reader.matches_any(patterns))
            .ok_or_else(|| {
                PcscError::ReaderNotFound(patterns.iter().map(|p| p.as_ref().to_string()).collect())
            })
    }

    /// Open a transport bound to a specific reader
    pub fn open_reader(&self, reader_name: &str) -> Result<PcscTransport, PcscError> {
        self.open_reader_with_config(reader_name, PcscConfig::default())
    }

    /// Open a transport bound to a specific reader with custom configuration
    pub fn open_reader_with_config(
        &self,
        reader_name: &str,
        config: PcscConfig,
    ) -> Result<PcscTransport, PcscError> {
        // Clone the context to provide ownership to the transport
        let context = self.context.clone();
        PcscTransport::new(context, reader_name, config)
    }

    /// Create a monitor for card insertion and removal events
    ///
    /// The monitor establishes its own context: pcsc-lite serializes calls
    /// per context, so a status wait on a shared one would stall the
    /// transports opened by this manager.
    pub fn monitor(&self) -> Result<PcscMonitor, PcscError> {
        PcscMonitor::create()
    }
}
