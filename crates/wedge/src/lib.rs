//! Keyboard wedge for ACS ACR122U contactless readers
//!
//! Waits for a card on the reader, reads its UID and types it into the
//! focused application, framed by a configurable prefix and suffix.
//!
//! The reader is reached through PC/SC when a matching reader is exposed
//! there, and otherwise by claiming the USB device directly. PC/SC readers
//! report insertion and removal events; the USB path polls.

pub mod config;
pub mod discovery;
pub mod emit;
pub mod layout;
pub mod logging;
pub mod runner;
pub mod slot;
pub mod source;

pub use config::{Config, ConfigError, ConfigSource, LogLevel, UidFormat};
pub use discovery::{Backend, Discovered, DiscoveryError, discover};
pub use emit::{EmitError, Emitter, Keyboard, StdoutKeyboard};
pub use runner::{DEFAULT_POLL_INTERVAL, REMOVAL_MISSES, RunError, Wedge};
pub use slot::CardSlot;
pub use source::{PcscUidSource, UidRead, UidSource, UsbUidSource};
