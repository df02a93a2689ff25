//! Monitor implementation for PC/SC card events

use parking_lot::Mutex;
use pcsc::{Context, ReaderState, Scope, State};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, trace, warn};

use crate::error::PcscError;
use crate::event::{CardEvent, CardEventHandler, CardEventSender, ChannelHandler};
use crate::reader::card_present;

/// Upper bound on a single status wait, so a stop request is noticed promptly
const STATUS_WAIT: Duration = Duration::from_secs(1);

/// Back-off after an unexpected PC/SC failure inside the monitor thread
const ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Tracks per-reader card presence and turns raw state into edge events
///
/// A reader first seen empty produces no event; a reader first seen with a
/// card produces an insertion. A different ATR on an occupied reader counts
/// as a new insertion.
#[derive(Debug, Default)]
pub struct PresenceTracker {
    /// ATR of the card currently present, or `None` for an empty reader
    readers: HashMap<String, Option<Vec<u8>>>,
}

impl PresenceTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the latest observation for `reader`
    pub fn observe(&mut self, reader: &str, present: bool, atr: &[u8]) -> Option<CardEvent> {
        let previous = self.readers.get(reader);

        if present {
            let is_new_event = match previous {
                Some(Some(prev_atr)) => prev_atr.as_slice() != atr,
                Some(None) | None => true,
            };
            if is_new_event {
                self.readers.insert(reader.to_string(), Some(atr.to_vec()));
                return Some(CardEvent::Inserted {
                    reader: reader.to_string(),
                    atr: atr.to_vec(),
                });
            }
        } else {
            let was_present = matches!(previous, Some(Some(_)));
            self.readers.insert(reader.to_string(), None);
            if was_present {
                return Some(CardEvent::Removed {
                    reader: reader.to_string(),
                });
            }
        }

        None
    }

    /// Drop a reader that disappeared, reporting its card as removed
    pub fn forget(&mut self, reader: &str) -> Option<CardEvent> {
        match self.readers.remove(reader) {
            Some(Some(_)) => Some(CardEvent::Removed {
                reader: reader.to_string(),
            }),
            _ => None,
        }
    }

    /// Check whether a card is currently recorded on `reader`
    pub fn is_present(&self, reader: &str) -> bool {
        matches!(self.readers.get(reader), Some(Some(_)))
    }
}

/// Monitor for PC/SC card events
///
/// Runs a background thread that waits on reader state changes and forwards
/// insertion/removal edges to a handler. The thread is stopped and joined by
/// [`PcscMonitor::stop`], which also runs on drop.
pub struct PcscMonitor {
    /// PC/SC context
    context: Context,
    /// Whether the monitor is running
    running: Arc<AtomicBool>,
    /// Handle of the monitoring thread
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for PcscMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PcscMonitor")
            .field("running", &self.is_running())
            .finish()
    }
}

impl PcscMonitor {
    /// Create a new monitor with a dedicated context
    ///
    /// The context must not be shared with any transport, since the status
    /// wait holds it for up to a second at a time.
    pub fn create() -> Result<Self, PcscError> {
        let context = Context::establish(Scope::User)?;
        Ok(Self {
            context,
            running: Arc::new(AtomicBool::new(false)),
            worker: Mutex::new(None),
        })
    }

    /// Check whether the monitoring thread is active
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Monitor for card events with a callback
    ///
    /// The handler runs on the monitoring thread.
    pub fn monitor_cards<H>(&self, handler: H) -> Result<(), PcscError>
    where
        H: CardEventHandler + Send + 'static,
    {
        let mut worker = self.worker.lock();
        if worker.is_some() {
            return Err(PcscError::MonitorRunning);
        }

        let context = self.context.clone();
        let running = Arc::clone(&self.running);
        running.store(true, Ordering::Release);

        let handle = thread::Builder::new()
            .name("pcsc-monitor".into())
            .spawn(move || watch_readers(&context, &running, handler))
            .map_err(|e| {
                self.running.store(false, Ordering::Release);
                PcscError::Spawn(e)
            })?;
        *worker = Some(handle);

        Ok(())
    }

    /// Monitor for card events using a channel
    pub fn monitor_cards_channel(&self, sender: CardEventSender) -> Result<(), PcscError> {
        self.monitor_cards(ChannelHandler::new(sender))
    }

    /// Stop monitoring and wait for the thread to exit
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
        // Wake a pending status wait instead of letting it time out
        if let Err(e) = self.context.cancel() {
            trace!(error = %e, "SCardCancel failed");
        }

        if let Some(handle) = self.worker.lock().take() {
            if handle.join().is_err() {
                warn!("PC/SC monitor thread panicked");
            }
            debug!("PC/SC monitor stopped");
        }
    }
}

impl Drop for PcscMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

fn is_dead(rs: &ReaderState) -> bool {
    rs.event_state().intersects(State::UNKNOWN | State::IGNORE)
}

/// Body of the monitoring thread
fn watch_readers<H: CardEventHandler>(context: &Context, running: &AtomicBool, mut handler: H) {
    let mut tracker = PresenceTracker::new();
    let mut reader_states = vec![
        // Listen for reader insertions/removals
        ReaderState::new(pcsc::PNP_NOTIFICATION(), State::UNAWARE),
    ];

    while running.load(Ordering::Acquire) {
        // Remove dead readers, reporting any card they held as removed
        for rs in reader_states.iter().filter(|rs| is_dead(rs)) {
            let name = rs.name().to_string_lossy();
            debug!(reader = %name, "Reader disappeared");
            if let Some(event) = tracker.forget(&name) {
                handler.handle_event(event);
            }
        }
        reader_states.retain(|rs| !is_dead(rs));

        // Add new readers
        match context.list_readers_owned() {
            Ok(names) => {
                for name in names {
                    if !reader_states.iter().any(|rs| rs.name() == name.as_c_str()) {
                        debug!(reader = ?name, "Watching reader");
                        reader_states.push(ReaderState::new(name, State::UNAWARE));
                    }
                }
            }
            Err(pcsc::Error::NoReadersAvailable) => {}
            Err(e) => {
                warn!(error = %e, "Failed to list readers");
                thread::sleep(ERROR_BACKOFF);
                continue;
            }
        }

        // Update the view of the state to wait on
        for rs in &mut reader_states {
            rs.sync_current_state();
        }

        match context.get_status_change(Some(STATUS_WAIT), &mut reader_states) {
            Ok(()) => {}
            Err(pcsc::Error::Timeout) => continue,
            Err(pcsc::Error::Cancelled) => break,
            Err(e) => {
                warn!(error = %e, "Waiting for reader state change failed");
                thread::sleep(ERROR_BACKOFF);
                continue;
            }
        }

        for rs in &reader_states {
            if rs.name() == pcsc::PNP_NOTIFICATION() || is_dead(rs) {
                continue;
            }

            let name = rs.name().to_string_lossy();
            let present = card_present(rs.event_state());
            if let Some(event) = tracker.observe(&name, present, rs.atr()) {
                trace!(?event, "Card event");
                handler.handle_event(event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const READER: &str = "ACS ACR122U PICC Interface";
    const ATR: &[u8] = &[0x3B, 0x8F, 0x80, 0x01];

    #[test]
    fn test_initial_empty_reader_is_silent() {
        let mut tracker = PresenceTracker::new();
        assert_eq!(tracker.observe(READER, false, &[]), None);
        assert!(!tracker.is_present(READER));
    }

    #[test]
    fn test_insert_remove_insert_cycle() {
        let mut tracker = PresenceTracker::new();
        assert_eq!(tracker.observe(READER, false, &[]), None);

        assert_eq!(
            tracker.observe(READER, true, ATR),
            Some(CardEvent::Inserted {
                reader: READER.into(),
                atr: ATR.to_vec()
            })
        );
        // Repeated notifications for the same card are suppressed
        assert_eq!(tracker.observe(READER, true, ATR), None);

        assert_eq!(
            tracker.observe(READER, false, &[]),
            Some(CardEvent::Removed {
                reader: READER.into()
            })
        );
        assert_eq!(tracker.observe(READER, false, &[]), None);

        // The same card comes back
        assert!(matches!(
            tracker.observe(READER, true, ATR),
            Some(CardEvent::Inserted { .. })
        ));
    }

    #[test]
    fn test_card_present_at_startup_is_reported() {
        let mut tracker = PresenceTracker::new();
        assert!(matches!(
            tracker.observe(READER, true, ATR),
            Some(CardEvent::Inserted { .. })
        ));
    }

    #[test]
    fn test_atr_change_counts_as_new_card() {
        let mut tracker = PresenceTracker::new();
        tracker.observe(READER, true, ATR);
        assert!(matches!(
            tracker.observe(READER, true, &[0x3B, 0x00]),
            Some(CardEvent::Inserted { .. })
        ));
    }

    #[test]
    fn test_forget_reports_removal_only_when_occupied() {
        let mut tracker = PresenceTracker::new();
        tracker.observe(READER, true, ATR);
        assert_eq!(
            tracker.forget(READER),
            Some(CardEvent::Removed {
                reader: READER.into()
            })
        );
        assert_eq!(tracker.forget(READER), None);
    }
}
