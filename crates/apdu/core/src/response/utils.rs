//! Utility functions for APDU response handling

use crate::response::error::ResponseError;
use crate::response::status::StatusWord;
use tracing::debug;

/// Extract status word and payload from raw APDU response data
///
/// Returns the [`StatusWord`] trailer and the payload that precedes it.
///
/// # Errors
/// Returns an error if the data is too short to contain a valid status word.
pub fn extract_status_and_payload(data: &[u8]) -> Result<(StatusWord, &[u8]), ResponseError> {
    if data.len() < 2 {
        debug!("Response too short: {} bytes", data.len());
        return Err(ResponseError::Incomplete);
    }

    let (payload, trailer) = data.split_at(data.len() - 2);
    Ok((StatusWord::new(trailer[0], trailer[1]), payload))
}
