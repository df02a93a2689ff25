//! UID acquisition over the direct USB path

use tapwedge_apdu_core::{CardTransport, Error, Result, TransportError, Uid};
use tracing::{instrument, trace};

use crate::frame::{parse_uid_response, uid_request};

/// Poll the reader's PN533 for a card and return its UID
///
/// `Ok(None)` means no card answered: the read timed out or the controller
/// replied with something other than a target list.
#[instrument(level = "trace", skip_all)]
pub fn read_uid_direct<T: CardTransport>(transport: &mut T) -> Result<Option<Uid>> {
    let request = uid_request()?;

    let response = match transport.transmit_raw(&request) {
        Ok(response) => response,
        Err(e) => {
            let error: TransportError = e.into();
            if error.is_no_card() {
                return Ok(None);
            }
            return Err(Error::Transport(error));
        }
    };

    match parse_uid_response(&response) {
        Some(uid) => Uid::new(response.slice_ref(uid)).map(Some),
        None => {
            trace!(len = response.len(), "No target in response");
            Ok(None)
        }
    }
}
