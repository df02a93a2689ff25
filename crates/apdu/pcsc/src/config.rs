//! Connection settings for PC/SC card sessions

use pcsc::{Disposition, Protocols, ShareMode as PcscShareMode};

/// How the card session is shared with other applications
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShareMode {
    /// Other applications may talk to the card concurrently
    #[default]
    Shared,
    /// The session locks the card for this process
    Exclusive,
}

impl From<ShareMode> for PcscShareMode {
    fn from(mode: ShareMode) -> Self {
        match mode {
            ShareMode::Shared => Self::Shared,
            ShareMode::Exclusive => Self::Exclusive,
        }
    }
}

/// Settings applied when a [`PcscTransport`](crate::PcscTransport) opens and
/// closes a card session
#[derive(Debug, Clone, Copy)]
pub struct PcscConfig {
    /// Sharing mode passed to `SCardConnect`
    pub share_mode: ShareMode,

    /// Acceptable card protocols
    pub protocols: Protocols,

    /// What the reader does with the card when the session ends
    pub disposition: Disposition,
}

impl Default for PcscConfig {
    fn default() -> Self {
        Self {
            share_mode: ShareMode::Shared,
            protocols: Protocols::ANY,
            // Other readers of the same card should not see it reset
            disposition: Disposition::LeaveCard,
        }
    }
}

impl PcscConfig {
    /// Set the sharing mode
    pub const fn with_share_mode(mut self, mode: ShareMode) -> Self {
        self.share_mode = mode;
        self
    }

    /// Set the acceptable protocols
    pub const fn with_protocols(mut self, protocols: Protocols) -> Self {
        self.protocols = protocols;
        self
    }

    /// Set the disposition applied on disconnect
    pub const fn with_disposition(mut self, disposition: Disposition) -> Self {
        self.disposition = disposition;
        self
    }
}
