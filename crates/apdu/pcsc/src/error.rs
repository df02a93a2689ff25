//! Error types for PC/SC transport

use tapwedge_apdu_core::TransportError;

/// PC/SC-specific errors
#[derive(Debug, thiserror::Error)]
pub enum PcscError {
    /// PC/SC error
    #[error("PC/SC error: {0}")]
    Pcsc(#[from] pcsc::Error),

    /// No readers available
    #[error("No readers available")]
    NoReadersAvailable,

    /// No reader name matched any of the requested patterns
    #[error("No reader matching {0:?} found")]
    ReaderNotFound(Vec<String>),

    /// No card present in reader
    #[error("No card present in reader: {0}")]
    NoCard(String),

    /// Card was removed or reset during an exchange
    #[error("Card was removed")]
    CardRemoved,

    /// The monitor already has a running thread
    #[error("Monitor is already running")]
    MonitorRunning,

    /// The monitoring thread could not be spawned
    #[error("Failed to spawn monitor thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// Reader name contains an interior NUL byte
    #[error("Invalid reader name: {0}")]
    InvalidReaderName(String),
}

impl PcscError {
    /// Check if the PC/SC service itself is missing or stopped
    pub const fn is_service_unavailable(&self) -> bool {
        matches!(
            self,
            Self::Pcsc(pcsc::Error::NoService | pcsc::Error::ServiceStopped)
        )
    }
}

impl From<PcscError> for TransportError {
    fn from(error: PcscError) -> Self {
        match error {
            PcscError::NoCard(_) | PcscError::Pcsc(pcsc::Error::NoSmartcard) => Self::NoCard,
            PcscError::CardRemoved
            | PcscError::Pcsc(pcsc::Error::RemovedCard | pcsc::Error::ResetCard) => {
                Self::Connection
            }
            PcscError::Pcsc(pcsc::Error::Timeout) => Self::Timeout,
            PcscError::Pcsc(pcsc::Error::ReaderUnavailable | pcsc::Error::UnknownReader) => {
                Self::Device
            }
            other => Self::other(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_card_maps_to_transport_no_card() {
        let err: TransportError = PcscError::NoCard("ACS ACR122U".into()).into();
        assert!(err.is_no_card());

        let err: TransportError = PcscError::Pcsc(pcsc::Error::NoSmartcard).into();
        assert!(err.is_no_card());
    }

    #[test]
    fn test_removed_card_maps_to_connection_fault() {
        let err: TransportError = PcscError::Pcsc(pcsc::Error::RemovedCard).into();
        assert_eq!(err, TransportError::Connection);
        assert!(!err.is_no_card());
    }

    #[test]
    fn test_service_unavailable() {
        assert!(PcscError::Pcsc(pcsc::Error::NoService).is_service_unavailable());
        assert!(!PcscError::NoReadersAvailable.is_service_unavailable());
    }
}
