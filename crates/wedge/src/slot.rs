//! Active-UID guard for one reader slot

use tapwedge_apdu_core::Uid;

/// Remembers the UID of the card sitting on the reader
///
/// A UID is typed once per insertion. The guard is cleared when the card
/// leaves, so putting the same card back types it again.
#[derive(Debug, Default)]
pub struct CardSlot {
    active: Option<Uid>,
}

impl CardSlot {
    /// Create an empty slot
    pub const fn new() -> Self {
        Self { active: None }
    }

    /// Record `uid` as present, returning `true` if it should be emitted
    pub fn arrive(&mut self, uid: &Uid) -> bool {
        if self.active.as_ref() == Some(uid) {
            return false;
        }
        self.active = Some(uid.clone());
        true
    }

    /// Forget the active card, returning whether one was recorded
    pub fn clear(&mut self) -> bool {
        self.active.take().is_some()
    }

    /// UID of the card currently considered present
    pub const fn active(&self) -> Option<&Uid> {
        self.active.as_ref()
    }
}
