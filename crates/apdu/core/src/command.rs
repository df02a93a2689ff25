//! APDU command definitions
//!
//! Commands are serialized as short ISO/IEC 7816-4 APDUs: a four byte header,
//! an optional `Lc || data` body and an optional `Le` trailer.

use bytes::{BufMut, Bytes, BytesMut};

use crate::Error;

/// Class byte used by PC/SC part 3 reader pseudo-APDUs
pub const CLA_PSEUDO: u8 = 0xFF;

/// GET DATA instruction, answered by the reader itself with the card UID
pub const INS_GET_DATA: u8 = 0xCA;

/// Instruction byte of the ACR122U "direct transmit" wrapper
pub const INS_DIRECT_TRANSMIT: u8 = 0x00;

/// Generic APDU command structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Command class byte
    pub cla: u8,
    /// Instruction byte
    pub ins: u8,
    /// Parameter 1
    pub p1: u8,
    /// Parameter 2
    pub p2: u8,
    /// Command data (optional)
    pub data: Option<Bytes>,
    /// Expected length (optional)
    pub le: Option<u8>,
}

impl Command {
    /// Create a new command with just the header bytes
    pub const fn new(cla: u8, ins: u8, p1: u8, p2: u8) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: None,
            le: None,
        }
    }

    /// Create a new command with expected response length (Le)
    pub const fn new_with_le(cla: u8, ins: u8, p1: u8, p2: u8, le: u8) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: None,
            le: Some(le),
        }
    }

    /// Create a new command with data payload
    pub fn new_with_data<T: Into<Bytes>>(cla: u8, ins: u8, p1: u8, p2: u8, data: T) -> Self {
        Self {
            cla,
            ins,
            p1,
            p2,
            data: Some(data.into()),
            le: None,
        }
    }

    /// The reader's "Get UID" pseudo-APDU, `FF CA 00 00 00`
    pub const fn get_uid() -> Self {
        Self::new_with_le(CLA_PSEUDO, INS_GET_DATA, 0x00, 0x00, 0x00)
    }

    /// Wrap a raw PN533 command in the reader's direct transmit pseudo-APDU,
    /// `FF 00 00 00 Lc || payload`
    pub fn direct_transmit<T: Into<Bytes>>(payload: T) -> Result<Self, Error> {
        let payload = payload.into();
        if payload.len() > u8::MAX as usize {
            return Err(Error::InvalidCommandLength(payload.len()));
        }
        Ok(Self::new_with_data(
            CLA_PSEUDO,
            INS_DIRECT_TRANSMIT,
            0x00,
            0x00,
            payload,
        ))
    }

    /// Set the expected length field
    pub const fn with_le(mut self, le: u8) -> Self {
        self.le = Some(le);
        self
    }

    /// Calculate length of serialized command
    pub fn command_length(&self) -> usize {
        let data_len = self.data.as_ref().map_or(0, |data| 1 + data.len());
        4 + data_len + usize::from(self.le.is_some())
    }

    /// Convert to raw APDU bytes
    pub fn to_bytes(&self) -> Bytes {
        let mut buffer = BytesMut::with_capacity(self.command_length());

        // Header: CLA, INS, P1, P2
        buffer.put_u8(self.cla);
        buffer.put_u8(self.ins);
        buffer.put_u8(self.p1);
        buffer.put_u8(self.p2);

        if let Some(data) = &self.data {
            buffer.put_u8(data.len() as u8);
            buffer.put_slice(data);
        }

        if let Some(le) = self.le {
            buffer.put_u8(le);
        }

        buffer.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_uid_bytes() {
        let cmd = Command::get_uid();
        assert_eq!(cmd.to_bytes().as_ref(), &[0xFF, 0xCA, 0x00, 0x00, 0x00]);
        assert_eq!(cmd.command_length(), 5);
    }

    #[test]
    fn test_direct_transmit_wraps_payload() {
        let cmd = Command::direct_transmit(Bytes::from_static(&[0xD4, 0x4A, 0x01, 0x00])).unwrap();
        assert_eq!(
            cmd.to_bytes().as_ref(),
            &[0xFF, 0x00, 0x00, 0x00, 0x04, 0xD4, 0x4A, 0x01, 0x00]
        );
    }

    #[test]
    fn test_direct_transmit_rejects_oversized_payload() {
        let payload = vec![0u8; 256];
        assert!(matches!(
            Command::direct_transmit(payload),
            Err(Error::InvalidCommandLength(256))
        ));
    }

    #[test]
    fn test_command_length() {
        let cmd1 = Command::new(0x00, 0xB0, 0x00, 0x00);
        assert_eq!(cmd1.command_length(), 4);

        let cmd2 = Command::new_with_le(0x00, 0xB0, 0x00, 0x00, 0xFF);
        assert_eq!(cmd2.command_length(), 5);

        let data = Bytes::from_static(&[0x01, 0x02, 0x03]);
        let cmd3 = Command::new_with_data(0x00, 0xD6, 0x00, 0x00, data);
        assert_eq!(cmd3.command_length(), 8);
        assert_eq!(cmd3.clone().with_le(0xFF).command_length(), 9);
        assert_eq!(cmd3.to_bytes().len(), 8);
    }
}
