//! Card loops feeding UIDs from a source to the keyboard
//!
//! PC/SC readers drive the loop with insertion and removal events. The
//! direct USB path has no events and polls instead; there a run of
//! [`REMOVAL_MISSES`] polls finding no card after a UID was read counts as
//! the card leaving.

use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};
use tapwedge_apdu_transport_pcsc::CardEvent;
use thiserror::Error;
use tracing::{debug, error, info, trace};

use crate::emit::{Emitter, Keyboard};
use crate::slot::CardSlot;
use crate::source::{UidRead, UidSource};

/// Longest time the loops go without checking for shutdown
const SHUTDOWN_CHECK: Duration = Duration::from_secs(1);

/// Poll granularity while sleeping between USB polls
const SLEEP_STEP: Duration = Duration::from_millis(100);

/// Default interval between reads on the polling path
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Consecutive empty polls needed before an active card counts as removed
///
/// A single 100 ms read timeout can happen with the card still in the field.
pub const REMOVAL_MISSES: u32 = 3;

/// Errors that end a card loop early
#[derive(Debug, Error)]
pub enum RunError {
    /// The card event monitor went away
    #[error("Card event monitor stopped unexpectedly")]
    MonitorStopped,
}

/// Connects a UID source, the active-UID guard and an emitter
#[derive(Debug)]
pub struct Wedge<S, K> {
    source: S,
    emitter: Emitter<K>,
    slot: CardSlot,
    /// Empty polls seen in a row while a card was active
    misses: u32,
}

impl<S: UidSource, K: Keyboard> Wedge<S, K> {
    /// Create a wedge with an empty slot
    pub const fn new(source: S, emitter: Emitter<K>) -> Self {
        Self {
            source,
            emitter,
            slot: CardSlot::new(),
            misses: 0,
        }
    }

    /// A card was detected: read it and type its UID unless already typed
    ///
    /// Returns the UID read, if any.
    pub fn card_inserted(&mut self) -> UidRead {
        let read = self.source.read_uid();
        if let UidRead::Present(uid) = &read {
            if self.slot.arrive(uid) {
                if let Err(e) = self.emitter.emit(uid) {
                    error!(error = %e, "Failed to type UID");
                }
            } else {
                trace!(%uid, "Card already typed");
            }
        }
        read
    }

    /// The card left the reader
    pub fn card_removed(&mut self) {
        self.misses = 0;
        if self.slot.clear() {
            debug!("Card removed");
        }
        self.source.card_removed();
    }

    /// One iteration of the polling path
    pub fn poll(&mut self) -> UidRead {
        let read = self.card_inserted();
        match read {
            UidRead::NoCard if self.slot.active().is_some() => {
                self.misses += 1;
                trace!(misses = self.misses, "No card answered");
                if self.misses >= REMOVAL_MISSES {
                    self.card_removed();
                }
            }
            UidRead::NoCard => {}
            UidRead::Present(_) | UidRead::Failed => self.misses = 0,
        }
        read
    }

    /// Handle PC/SC card events for `reader` until `shutdown` is set
    pub fn run_events(
        &mut self,
        events: &Receiver<CardEvent>,
        reader: &str,
        shutdown: &AtomicBool,
    ) -> Result<(), RunError> {
        info!("Starting card monitoring. Press Ctrl+C to exit.");

        while !shutdown.load(Ordering::Acquire) {
            let event = match events.recv_timeout(SHUTDOWN_CHECK) {
                Ok(event) => event,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    // A stop request also tears the monitor down
                    if shutdown.load(Ordering::Acquire) {
                        break;
                    }
                    return Err(RunError::MonitorStopped);
                }
            };

            if event.reader() != reader {
                trace!(reader = event.reader(), "Ignoring event from other reader");
                continue;
            }

            match event {
                CardEvent::Inserted { .. } => {
                    debug!("Card inserted");
                    self.card_inserted();
                }
                CardEvent::Removed { .. } => self.card_removed(),
            }
        }

        Ok(())
    }

    /// Poll the source every `interval` until `shutdown` is set
    pub fn run_polling(&mut self, interval: Duration, shutdown: &AtomicBool) {
        info!(
            interval_ms = interval.as_millis() as u64,
            "Starting card polling. Press Ctrl+C to exit."
        );

        while !shutdown.load(Ordering::Acquire) {
            let started = Instant::now();
            self.poll();
            sleep_until(started + interval, shutdown);
        }
    }

    /// Access the emitter
    pub const fn emitter(&self) -> &Emitter<K> {
        &self.emitter
    }

    /// Access the active-UID guard
    pub const fn slot(&self) -> &CardSlot {
        &self.slot
    }
}

/// Sleep until `deadline`, waking early once `shutdown` is set
fn sleep_until(deadline: Instant, shutdown: &AtomicBool) {
    loop {
        let now = Instant::now();
        if now >= deadline || shutdown.load(Ordering::Acquire) {
            return;
        }
        thread::sleep((deadline - now).min(SLEEP_STEP));
    }
}
