//! Direct USB transport for ACS ACR122U readers
//!
//! Used when no PC/SC service is available. Pseudo-APDUs are written to the
//! reader's bulk-OUT endpoint and the answer is read back from bulk-IN with a
//! short timeout; a timeout simply means no card answered.
//!
//! ```no_run
//! use tapwedge_apdu_transport_usb::{AcrUsbOpener, UsbTransport, read_uid_direct};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut transport = UsbTransport::new(AcrUsbOpener::default());
//! if let Some(uid) = read_uid_direct(&mut transport)? {
//!     println!("UID: {uid}");
//! }
//! # Ok(())
//! # }
//! ```
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![warn(missing_docs)]

mod channel;
mod device;
mod error;
pub mod frame;
mod transport;
mod uid;

pub use channel::{AcrUsbOpener, BulkChannel, DeviceOpener};
pub use device::{ACR122U_PRODUCT_ID, ACR122U_VENDOR_ID, AcrUsbDevice};
pub use error::UsbError;
pub use transport::{DEFAULT_READ_TIMEOUT, DEFAULT_WRITE_TIMEOUT, UsbTransport};
pub use uid::read_uid_direct;
