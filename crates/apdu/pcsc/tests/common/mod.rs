//! Shared helpers for hardware-backed tests

use tapwedge_apdu_transport_pcsc::{PcscDeviceManager, PcscTransport};

/// Reader name fragments the tests look for
pub const READER_PATTERNS: &[&str] = &["ACR122U", "ACS ACR122", "ACS Reader"];

/// Establish a PC/SC context, or `None` when the service is not running
pub fn manager() -> Option<PcscDeviceManager> {
    PcscDeviceManager::new().ok()
}

/// Open a transport on the first matching reader that holds a card
pub fn get_test_transport() -> Option<PcscTransport> {
    let manager = manager()?;
    let reader = manager.find_reader(READER_PATTERNS).ok()?;
    if !reader.has_card() {
        return None;
    }
    manager.open_reader(reader.name()).ok()
}
