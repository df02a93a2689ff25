//! Reader discovery across the PC/SC and direct USB backends

use clap::ValueEnum;
use tapwedge_apdu_transport_pcsc::{PcscDeviceManager, PcscError, PcscReader};
use tapwedge_apdu_transport_usb::{AcrUsbOpener, UsbError, UsbTransport};
use thiserror::Error;
use tracing::{error, info, warn};

/// Reader name fragments identifying an ACR122U under PC/SC
pub const READER_PATTERNS: [&str; 3] = ["ACR122U", "ACS ACR122", "ACS Reader"];

/// Which backend to use for talking to the reader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Backend {
    /// PC/SC first, direct USB if PC/SC has no matching reader
    #[default]
    Auto,
    /// PC/SC only
    Pcsc,
    /// Direct USB only
    Usb,
}

/// A reader ready for use
#[derive(Debug)]
pub enum Discovered {
    /// A PC/SC reader whose name matched
    Pcsc {
        /// Manager holding the PC/SC context
        manager: PcscDeviceManager,
        /// The selected reader
        reader: PcscReader,
    },
    /// A directly claimed USB device
    Usb(UsbTransport<AcrUsbOpener>),
}

/// No usable reader was found
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// PC/SC was requested but found no matching reader
    #[error("ACR122U reader not found via PC/SC: {0}")]
    Pcsc(#[source] PcscError),

    /// Direct USB was requested but the device is unavailable
    #[error("ACR122U not available over USB: {0}")]
    Usb(#[source] UsbError),

    /// Both backends failed
    #[error("No ACR122U reader found (PC/SC: {pcsc}; USB: {usb})")]
    NotFound {
        /// Why PC/SC discovery failed
        pcsc: PcscError,
        /// Why USB discovery failed
        usb: UsbError,
    },
}

/// Find a reader using `backend`
///
/// `patterns` replaces [`READER_PATTERNS`] when not empty.
pub fn discover<S: AsRef<str>>(
    backend: Backend,
    patterns: &[S],
) -> Result<Discovered, DiscoveryError> {
    select_backend(backend, || discover_pcsc(patterns), discover_usb)
}

/// Try the lookups `backend` allows, PC/SC before direct USB
fn select_backend<T>(
    backend: Backend,
    pcsc: impl FnOnce() -> Result<T, PcscError>,
    usb: impl FnOnce() -> Result<T, UsbError>,
) -> Result<T, DiscoveryError> {
    match backend {
        Backend::Pcsc => pcsc().map_err(DiscoveryError::Pcsc),
        Backend::Usb => usb().map_err(DiscoveryError::Usb),
        Backend::Auto => match pcsc() {
            Ok(found) => Ok(found),
            Err(pcsc) => {
                warn!(error = %pcsc, "PC/SC discovery failed, trying direct USB");
                usb().map_err(|usb| DiscoveryError::NotFound { pcsc, usb })
            }
        },
    }
}

fn discover_pcsc<S: AsRef<str>>(patterns: &[S]) -> Result<Discovered, PcscError> {
    let manager = PcscDeviceManager::new()?;

    let reader = if patterns.is_empty() {
        manager.find_reader(&READER_PATTERNS)
    } else {
        manager.find_reader(patterns)
    }
    .inspect_err(|e| error!(error = %e, "ACR122U reader not found"))?;

    info!("Found ACR122U reader: {}", reader.name());
    Ok(Discovered::Pcsc { manager, reader })
}

fn discover_usb() -> Result<Discovered, UsbError> {
    info!("Attempting direct USB communication...");
    let mut transport = UsbTransport::new(AcrUsbOpener::default());
    transport
        .open()
        .inspect_err(|e| error!(error = %e, "Error setting up direct USB"))?;

    info!("Direct USB communication set up successfully");
    Ok(Discovered::Usb(transport))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tapwedge_apdu_transport_usb::{ACR122U_PRODUCT_ID, ACR122U_VENDOR_ID};

    fn reader_not_found() -> PcscError {
        PcscError::ReaderNotFound(vec!["ACR122U".into()])
    }

    const fn device_not_found() -> UsbError {
        UsbError::DeviceNotFound {
            vendor_id: ACR122U_VENDOR_ID,
            product_id: ACR122U_PRODUCT_ID,
        }
    }

    #[test]
    fn test_auto_prefers_pcsc() {
        let mut usb_tried = false;
        let found = select_backend(
            Backend::Auto,
            || Ok("pcsc"),
            || {
                usb_tried = true;
                Ok("usb")
            },
        );
        assert_eq!(found.unwrap(), "pcsc");
        assert!(!usb_tried);
    }

    #[test]
    fn test_auto_falls_back_to_usb() {
        let found = select_backend(Backend::Auto, || Err(reader_not_found()), || Ok("usb"));
        assert_eq!(found.unwrap(), "usb");
    }

    #[test]
    fn test_auto_reports_both_failures() {
        let result: Result<(), _> = select_backend(
            Backend::Auto,
            || Err(PcscError::NoReadersAvailable),
            || Err(device_not_found()),
        );
        assert!(matches!(
            result,
            Err(DiscoveryError::NotFound {
                pcsc: PcscError::NoReadersAvailable,
                usb: UsbError::DeviceNotFound { .. },
            })
        ));
    }

    #[test]
    fn test_forced_pcsc_never_tries_usb() {
        let mut usb_tried = false;
        let result = select_backend(
            Backend::Pcsc,
            || Err(reader_not_found()),
            || {
                usb_tried = true;
                Ok("usb")
            },
        );
        assert!(matches!(result, Err(DiscoveryError::Pcsc(PcscError::ReaderNotFound(_)))));
        assert!(!usb_tried);
    }

    #[test]
    fn test_forced_usb_skips_pcsc() {
        let mut pcsc_tried = false;
        let result = select_backend(
            Backend::Usb,
            || {
                pcsc_tried = true;
                Ok("pcsc")
            },
            || Err(device_not_found()),
        );
        assert!(matches!(result, Err(DiscoveryError::Usb(UsbError::DeviceNotFound { .. }))));
        assert!(!pcsc_tried);
    }
}
