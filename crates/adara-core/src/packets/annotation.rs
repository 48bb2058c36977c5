use serde::Serialize;

use crate::protocol::error::DecodeError;
use crate::protocol::layout;
use crate::protocol::packet::Packet;
use crate::protocol::reader::{PayloadReader, word_at};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerType {
    Generic,
    ScanStart,
    ScanStop,
    Pause,
    Resume,
    OverallRunComment,
    Other(u16),
}

impl MarkerType {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => MarkerType::Generic,
            1 => MarkerType::ScanStart,
            2 => MarkerType::ScanStop,
            3 => MarkerType::Pause,
            4 => MarkerType::Resume,
            5 => MarkerType::OverallRunComment,
            other => MarkerType::Other(other),
        }
    }
}

/// Operator or control-system marker injected into the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamAnnotation<'a> {
    packet: Packet<'a>,
    comment: String,
}

impl<'a> StreamAnnotation<'a> {
    pub fn decode(packet: Packet<'a>) -> Result<Self, DecodeError> {
        let reader = PayloadReader::new(packet.payload());
        reader.require_len(layout::ANNOTATION_HEADER_SIZE)?;
        let length = (reader.read_word(0)? & layout::SHORT_LENGTH_MASK) as usize;
        let comment =
            reader.read_text("annotation comment", layout::ANNOTATION_HEADER_SIZE, length)?;
        Ok(Self { packet, comment })
    }

    pub fn packet(&self) -> &Packet<'a> {
        &self.packet
    }

    pub fn into_owned(self) -> StreamAnnotation<'static> {
        StreamAnnotation {
            packet: self.packet.into_owned(),
            comment: self.comment,
        }
    }

    fn flags(&self) -> u32 {
        word_at(self.packet.payload(), 0)
    }

    /// Set when consumers should drop state accumulated before this marker.
    pub fn reset_hint(&self) -> bool {
        self.flags() & layout::RESET_HINT_BIT != 0
    }

    pub fn marker_type(&self) -> MarkerType {
        let bits = (self.flags() >> layout::MARKER_TYPE_SHIFT) & layout::MARKER_TYPE_MASK;
        MarkerType::from_u16(bits as u16)
    }

    pub fn scan_index(&self) -> u32 {
        word_at(self.packet.payload(), 1)
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }
}
