use std::borrow::Cow;

use super::error::ProtocolError;
use super::header::PacketHeader;
use super::layout;

/// One complete packet: decoded header plus the raw wire bytes.
///
/// A packet handed out during dispatch borrows the parser's buffer and is
/// only valid for that callback. Call [`Packet::into_owned`] to keep it
/// past the next `parse()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet<'a> {
    header: PacketHeader,
    bytes: Cow<'a, [u8]>,
}

impl<'a> Packet<'a> {
    /// Borrows the first complete packet from `bytes`.
    ///
    /// Bytes past the declared packet length are ignored.
    ///
    /// # Errors
    /// Returns `ProtocolError::Incomplete` when the header or payload is cut short.
    pub fn parse(bytes: &'a [u8]) -> Result<Self, ProtocolError> {
        let header = PacketHeader::decode(bytes)?;
        let length = packet_len(&header);
        let bytes = bytes.get(..length).ok_or(ProtocolError::Incomplete {
            needed: length,
            actual: bytes.len(),
        })?;
        Ok(Self {
            header,
            bytes: Cow::Borrowed(bytes),
        })
    }

    /// Builds a packet from bytes already known to hold exactly one packet.
    pub(crate) fn from_parts(header: PacketHeader, bytes: &'a [u8]) -> Self {
        Self {
            header,
            bytes: Cow::Borrowed(bytes),
        }
    }

    pub fn header(&self) -> &PacketHeader {
        &self.header
    }

    pub fn type_code(&self) -> u32 {
        self.header.type_code
    }

    pub fn pulse_id(&self) -> u64 {
        self.header.pulse_id
    }

    /// Header and payload bytes as they appeared on the wire.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn payload(&self) -> &[u8] {
        self.bytes.get(layout::HEADER_SIZE..).unwrap_or(&[])
    }

    pub fn is_owned(&self) -> bool {
        matches!(self.bytes, Cow::Owned(_))
    }

    /// Detaches the packet from the buffer it was parsed from.
    pub fn into_owned(self) -> Packet<'static> {
        Packet {
            header: self.header,
            bytes: Cow::Owned(self.bytes.into_owned()),
        }
    }
}

impl Packet<'static> {
    /// Takes ownership of a complete packet.
    ///
    /// # Errors
    /// Returns `ProtocolError::Incomplete` when the bytes are cut short.
    pub fn from_vec(mut bytes: Vec<u8>) -> Result<Self, ProtocolError> {
        let header = PacketHeader::decode(&bytes)?;
        let length = packet_len(&header);
        if bytes.len() < length {
            return Err(ProtocolError::Incomplete {
                needed: length,
                actual: bytes.len(),
            });
        }
        bytes.truncate(length);
        Ok(Self {
            header,
            bytes: Cow::Owned(bytes),
        })
    }
}

fn packet_len(header: &PacketHeader) -> usize {
    usize::try_from(header.packet_length()).unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::Packet;
    use crate::protocol::error::ProtocolError;
    use crate::protocol::header::{PacketType, frame_packet};

    #[test]
    fn parse_borrows_exactly_one_packet() {
        let mut bytes = frame_packet(PacketType::ClientHello.code(), 9, &[1, 0, 0, 0]);
        bytes.extend_from_slice(&[0xee; 5]);
        let packet = Packet::parse(&bytes).unwrap();
        assert!(!packet.is_owned());
        assert_eq!(packet.pulse_id(), 9);
        assert_eq!(packet.payload(), &[1, 0, 0, 0]);
        assert_eq!(packet.as_bytes().len(), 20);
    }

    #[test]
    fn parse_truncated_payload_is_incomplete() {
        let bytes = frame_packet(PacketType::ClientHello.code(), 9, &[1, 0, 0, 0]);
        let err = Packet::parse(&bytes[..18]).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::Incomplete {
                needed: 20,
                actual: 18
            }
        );
    }

    #[test]
    fn into_owned_outlives_source_buffer() {
        let owned = {
            let bytes = frame_packet(PacketType::Heartbeat.code(), 3, &[]);
            Packet::parse(&bytes).unwrap().into_owned()
        };
        assert!(owned.is_owned());
        assert_eq!(owned.pulse_id(), 3);
        assert!(owned.payload().is_empty());
    }

    #[test]
    fn from_vec_truncates_trailing_bytes() {
        let mut bytes = frame_packet(PacketType::Heartbeat.code(), 1, &[]);
        bytes.push(0xaa);
        let packet = Packet::from_vec(bytes).unwrap();
        assert_eq!(packet.as_bytes().len(), 16);
    }
}
