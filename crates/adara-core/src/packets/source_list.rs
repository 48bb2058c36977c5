use crate::protocol::error::DecodeError;
use crate::protocol::layout;
use crate::protocol::packet::Packet;
use crate::protocol::reader::{PayloadReader, word_at};

/// Ids of the data sources contributing to the current pulse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceList<'a> {
    packet: Packet<'a>,
}

impl<'a> SourceList<'a> {
    pub fn decode(packet: Packet<'a>) -> Result<Self, DecodeError> {
        PayloadReader::new(packet.payload()).require_multiple_of(
            "source ids",
            0,
            layout::WORD_SIZE,
        )?;
        Ok(Self { packet })
    }

    pub fn packet(&self) -> &Packet<'a> {
        &self.packet
    }

    pub fn into_owned(self) -> SourceList<'static> {
        SourceList {
            packet: self.packet.into_owned(),
        }
    }

    pub fn len(&self) -> usize {
        self.packet.payload().len() / layout::WORD_SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn source_ids(&self) -> impl Iterator<Item = u32> + '_ {
        let payload = self.packet.payload();
        (0..self.len()).map(move |i| word_at(payload, i))
    }
}
