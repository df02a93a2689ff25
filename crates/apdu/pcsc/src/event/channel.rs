//! Channel-based event handling for PC/SC operations

use crate::event::CardEvent;
use crossbeam_channel::{Receiver, Sender, unbounded};

/// Sender for card events
pub type CardEventSender = Sender<CardEvent>;
/// Receiver for card events
pub type CardEventReceiver = Receiver<CardEvent>;

/// Create an unbounded channel for card events
pub fn card_event_channel() -> (CardEventSender, CardEventReceiver) {
    unbounded()
}
