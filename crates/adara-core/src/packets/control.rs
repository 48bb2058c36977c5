//! Stream control packets: client hello, heartbeat, sync and transaction
//! completion.

use crate::protocol::error::DecodeError;
use crate::protocol::layout;
use crate::protocol::packet::Packet;
use crate::protocol::reader::{PayloadReader, word_at};

/// Client hello start-time request meaning "from now on".
pub const HELLO_START_NOW: u32 = 0;
/// Client hello start-time request meaning "from the start of the current run".
pub const HELLO_START_OF_RUN: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientHello<'a> {
    packet: Packet<'a>,
}

impl<'a> ClientHello<'a> {
    pub fn decode(packet: Packet<'a>) -> Result<Self, DecodeError> {
        PayloadReader::new(packet.payload()).require_exact_len(layout::CLIENT_HELLO_PAYLOAD_SIZE)?;
        Ok(Self { packet })
    }

    pub fn packet(&self) -> &Packet<'a> {
        &self.packet
    }

    pub fn into_owned(self) -> ClientHello<'static> {
        ClientHello {
            packet: self.packet.into_owned(),
        }
    }

    /// Requested start, in EPICS seconds, or one of the `HELLO_START_*` values.
    pub fn requested_start(&self) -> u32 {
        word_at(self.packet.payload(), 0)
    }
}

/// Keep-alive with no payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heartbeat<'a> {
    packet: Packet<'a>,
}

impl<'a> Heartbeat<'a> {
    pub fn decode(packet: Packet<'a>) -> Result<Self, DecodeError> {
        PayloadReader::new(packet.payload()).require_exact_len(0)?;
        Ok(Self { packet })
    }

    pub fn packet(&self) -> &Packet<'a> {
        &self.packet
    }

    pub fn into_owned(self) -> Heartbeat<'static> {
        Heartbeat {
            packet: self.packet.into_owned(),
        }
    }
}

/// Resynchronisation marker written into stored stream files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sync<'a> {
    packet: Packet<'a>,
    comment: String,
}

impl<'a> Sync<'a> {
    pub fn decode(packet: Packet<'a>) -> Result<Self, DecodeError> {
        let reader = PayloadReader::new(packet.payload());
        reader.require_len(layout::SYNC_HEADER_SIZE)?;
        let length = reader.read_u32_le(layout::SYNC_COMMENT_LENGTH_RANGE.start)? as usize;
        let comment = reader.read_text("sync comment", layout::SYNC_HEADER_SIZE, length)?;
        Ok(Self { packet, comment })
    }

    pub fn packet(&self) -> &Packet<'a> {
        &self.packet
    }

    pub fn into_owned(self) -> Sync<'static> {
        Sync {
            packet: self.packet.into_owned(),
            comment: self.comment,
        }
    }

    pub fn signature(&self) -> &[u8] {
        self.packet
            .payload()
            .get(layout::SYNC_SIGNATURE_RANGE)
            .unwrap_or(&[])
    }

    /// Byte offset of this packet within the stored file.
    pub fn file_offset(&self) -> u64 {
        PayloadReader::new(self.packet.payload())
            .read_u64_le(layout::SYNC_OFFSET_RANGE.start)
            .unwrap_or(0)
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }
}

/// Completion status of a client-initiated transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransComplete<'a> {
    packet: Packet<'a>,
    reason: String,
}

impl<'a> TransComplete<'a> {
    pub fn decode(packet: Packet<'a>) -> Result<Self, DecodeError> {
        let reader = PayloadReader::new(packet.payload());
        reader.require_len(layout::TRANS_COMPLETE_HEADER_SIZE)?;
        let length = (reader.read_word(0)? >> 16) as usize;
        let reason = reader.read_text(
            "transaction reason",
            layout::TRANS_COMPLETE_HEADER_SIZE,
            length,
        )?;
        Ok(Self { packet, reason })
    }

    pub fn packet(&self) -> &Packet<'a> {
        &self.packet
    }

    pub fn into_owned(self) -> TransComplete<'static> {
        TransComplete {
            packet: self.packet.into_owned(),
            reason: self.reason,
        }
    }

    pub fn status(&self) -> u16 {
        (word_at(self.packet.payload(), 0) & layout::SHORT_LENGTH_MASK) as u16
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

#[cfg(test)]
mod tests {
    use super::{ClientHello, HELLO_START_OF_RUN, Heartbeat, Sync, TransComplete};
    use crate::protocol::error::DecodeError;
    use crate::protocol::header::{PacketType, frame_packet};
    use crate::protocol::packet::Packet;

    fn packet(kind: PacketType, body: &[u8]) -> Packet<'static> {
        Packet::from_vec(frame_packet(kind.code(), 0, body)).unwrap()
    }

    #[test]
    fn client_hello_start() {
        let hello =
            ClientHello::decode(packet(PacketType::ClientHello, &1u32.to_le_bytes())).unwrap();
        assert_eq!(hello.requested_start(), HELLO_START_OF_RUN);
    }

    #[test]
    fn heartbeat_must_be_empty() {
        assert!(Heartbeat::decode(packet(PacketType::Heartbeat, &[])).is_ok());
        let err = Heartbeat::decode(packet(PacketType::Heartbeat, &[0u8; 4])).unwrap_err();
        assert!(matches!(err, DecodeError::LengthMismatch { expected: 0, actual: 4 }));
    }

    #[test]
    fn sync_fields() {
        let mut body = b"SNSADARAORNL\0\0\0\0".to_vec();
        body.extend_from_slice(&4096u64.to_le_bytes());
        body.extend_from_slice(&5u32.to_le_bytes());
        body.extend_from_slice(b"hello");
        let sync = Sync::decode(packet(PacketType::Sync, &body)).unwrap();
        assert_eq!(&sync.signature()[..8], b"SNSADARA");
        assert_eq!(sync.file_offset(), 4096);
        assert_eq!(sync.comment(), "hello");
    }

    #[test]
    fn sync_too_short() {
        let err = Sync::decode(packet(PacketType::Sync, &[0u8; 20])).unwrap_err();
        assert_eq!(err, DecodeError::TooShort { needed: 28, actual: 20 });
    }

    #[test]
    fn trans_complete_status_and_reason() {
        let mut body = ((6u32 << 16) | 2).to_le_bytes().to_vec();
        body.extend_from_slice(b"failed");
        let done = TransComplete::decode(packet(PacketType::TransComplete, &body)).unwrap();
        assert_eq!(done.status(), 2);
        assert_eq!(done.reason(), "failed");
    }

    #[test]
    fn trans_complete_reason_overrun() {
        let mut body = (10u32 << 16).to_le_bytes().to_vec();
        body.extend_from_slice(b"short");
        let err = TransComplete::decode(packet(PacketType::TransComplete, &body)).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Overrun {
                section: "transaction reason",
                needed: 10,
                available: 5,
                ..
            }
        ));
    }
}
