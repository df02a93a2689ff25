//! PN533 frames exchanged through the reader's direct transmit wrapper
//!
//! The reader forwards `FF 00 00 00 Lc || payload` to its PN533 controller.
//! For an InListPassiveTarget request the reader answers `D5 4B len uid...`
//! when a card is in the field: the byte after the response code is taken as
//! the UID length and the UID follows it directly.

use bytes::Bytes;
use tapwedge_apdu_core::{Command, Result};

/// InListPassiveTarget for one ISO 14443-A target at 106 kbps
pub const IN_LIST_PASSIVE_TARGET: [u8; 4] = [0xD4, 0x4A, 0x01, 0x00];

/// Response code of InListPassiveTarget, `D5 4B`
pub const IN_LIST_PASSIVE_TARGET_RESPONSE: [u8; 2] = [0xD5, 0x4B];

/// Build the bytes written to bulk-OUT to poll for a card
pub fn uid_request() -> Result<Bytes> {
    Command::direct_transmit(Bytes::from_static(&IN_LIST_PASSIVE_TARGET)).map(|c| c.to_bytes())
}

/// Extract the UID from an InListPassiveTarget response
///
/// Returns `None` when the response is too short, carries another response
/// code, announces more UID bytes than it holds, or announces none at all.
pub fn parse_uid_response(response: &[u8]) -> Option<&[u8]> {
    let [d5, code, len, rest @ ..] = response else {
        return None;
    };
    if [*d5, *code] != IN_LIST_PASSIVE_TARGET_RESPONSE {
        return None;
    }

    let len = usize::from(*len);
    if len == 0 || rest.len() < len {
        return None;
    }
    Some(&rest[..len])
}
