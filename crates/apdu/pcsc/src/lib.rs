//! PC/SC transport implementation for contactless card readers
//!
//! This crate implements the `CardTransport` trait from `tapwedge-apdu-core`
//! on top of the platform PC/SC service, and provides a background monitor
//! that reports card insertion and removal as [`CardEvent`]s.
//!
//! # Examples
//!
//! ```no_run
//! use tapwedge_apdu_core::get_uid;
//! use tapwedge_apdu_transport_pcsc::PcscDeviceManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = PcscDeviceManager::new()?;
//! let reader = manager.find_reader(&["ACR122U"])?;
//!
//! let mut transport = manager.open_reader(reader.name())?;
//! match get_uid(&mut transport) {
//!     Ok(uid) => println!("UID: {uid}"),
//!     Err(e) if e.is_no_card() => println!("No card on the reader"),
//!     Err(e) => println!("Error: {e}"),
//! }
//! # Ok(())
//! # }
//! ```
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![warn(missing_docs)]

mod config;
mod error;
pub mod event;
mod manager;
mod monitor;
mod reader;
mod transport;

// Public exports
pub use config::{PcscConfig, ShareMode};
pub use error::PcscError;
pub use event::CardEvent;
pub use manager::PcscDeviceManager;
pub use monitor::{PcscMonitor, PresenceTracker};
pub use reader::PcscReader;
pub use transport::PcscTransport;

// Re-export some pcsc types for convenience
pub use pcsc::{Disposition, Protocols};
