//! Callback-based event handling for PC/SC operations

use crate::event::{CardEvent, CardEventSender};

/// Trait for handling card events
pub trait CardEventHandler {
    /// Handle a card event
    fn handle_event(&mut self, event: CardEvent);
}

// Implement handlers for closures
impl<F> CardEventHandler for F
where
    F: FnMut(CardEvent),
{
    fn handle_event(&mut self, event: CardEvent) {
        self(event)
    }
}

/// Forwarding handler that pushes every event into a channel
#[derive(Debug, Clone)]
pub struct ChannelHandler {
    sender: CardEventSender,
}

impl ChannelHandler {
    /// Create a handler forwarding to `sender`
    pub const fn new(sender: CardEventSender) -> Self {
        Self { sender }
    }
}

impl CardEventHandler for ChannelHandler {
    fn handle_event(&mut self, event: CardEvent) {
        // The consumer hanging up means it is shutting down
        let _ = self.sender.send(event);
    }
}
