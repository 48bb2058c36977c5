//! Run lifecycle and instrument description packets.

use serde::{Deserialize, Serialize};

use crate::protocol::error::DecodeError;
use crate::protocol::layout;
use crate::protocol::packet::Packet;
use crate::protocol::reader::{PayloadReader, word_at};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatusKind {
    NoRun,
    State,
    NewRun,
    RunEof,
    RunBof,
    EndRun,
    Prologue,
    Other(u8),
}

impl RunStatusKind {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => RunStatusKind::NoRun,
            1 => RunStatusKind::State,
            2 => RunStatusKind::NewRun,
            3 => RunStatusKind::RunEof,
            4 => RunStatusKind::RunBof,
            5 => RunStatusKind::EndRun,
            6 => RunStatusKind::Prologue,
            other => RunStatusKind::Other(other),
        }
    }
}

/// Run number, start time and file/status word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStatus<'a> {
    packet: Packet<'a>,
}

impl<'a> RunStatus<'a> {
    pub fn decode(packet: Packet<'a>) -> Result<Self, DecodeError> {
        PayloadReader::new(packet.payload()).require_exact_len(layout::RUN_STATUS_PAYLOAD_SIZE)?;
        Ok(Self { packet })
    }

    pub fn packet(&self) -> &Packet<'a> {
        &self.packet
    }

    pub fn into_owned(self) -> RunStatus<'static> {
        RunStatus {
            packet: self.packet.into_owned(),
        }
    }

    pub fn run_number(&self) -> u32 {
        word_at(self.packet.payload(), 0)
    }

    /// Run start, in seconds since the EPICS epoch.
    pub fn run_start(&self) -> u32 {
        word_at(self.packet.payload(), 1)
    }

    pub fn file_number(&self) -> u32 {
        word_at(self.packet.payload(), 2) & layout::FILE_NUMBER_MASK
    }

    pub fn status(&self) -> RunStatusKind {
        let word = word_at(self.packet.payload(), 2);
        RunStatusKind::from_u8((word >> layout::RUN_STATUS_SHIFT) as u8)
    }
}

/// Length-prefixed XML document (run info and geometry share the layout).
fn decode_xml(packet: &Packet<'_>, section: &'static str) -> Result<String, DecodeError> {
    let reader = PayloadReader::new(packet.payload());
    reader.require_len(layout::TEXT_LENGTH_SIZE)?;
    let length = reader.read_u32_le(0)? as usize;
    reader.read_text(section, layout::TEXT_LENGTH_SIZE, length)
}

/// Run metadata as an XML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunInfo<'a> {
    packet: Packet<'a>,
    xml: String,
}

impl<'a> RunInfo<'a> {
    pub fn decode(packet: Packet<'a>) -> Result<Self, DecodeError> {
        let xml = decode_xml(&packet, "run info xml")?;
        Ok(Self { packet, xml })
    }

    pub fn packet(&self) -> &Packet<'a> {
        &self.packet
    }

    pub fn into_owned(self) -> RunInfo<'static> {
        RunInfo {
            packet: self.packet.into_owned(),
            xml: self.xml,
        }
    }

    pub fn xml(&self) -> &str {
        &self.xml
    }
}

/// Instrument geometry as an XML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Geometry<'a> {
    packet: Packet<'a>,
    xml: String,
}

impl<'a> Geometry<'a> {
    pub fn decode(packet: Packet<'a>) -> Result<Self, DecodeError> {
        let xml = decode_xml(&packet, "geometry xml")?;
        Ok(Self { packet, xml })
    }

    pub fn packet(&self) -> &Packet<'a> {
        &self.packet
    }

    pub fn into_owned(self) -> Geometry<'static> {
        Geometry {
            packet: self.packet.into_owned(),
            xml: self.xml,
        }
    }

    pub fn xml(&self) -> &str {
        &self.xml
    }
}

/// Beamline identifier plus short and long names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeamlineInfo<'a> {
    packet: Packet<'a>,
    id: String,
    short_name: String,
    long_name: String,
}

impl<'a> BeamlineInfo<'a> {
    pub fn decode(packet: Packet<'a>) -> Result<Self, DecodeError> {
        let reader = PayloadReader::new(packet.payload());
        reader.require_len(layout::BEAMLINE_HEADER_SIZE)?;
        let sizes = reader.read_word(0)?;
        let id_len = ((sizes >> layout::BEAMLINE_ID_SHIFT) & layout::BYTE_MASK) as usize;
        let short_len = ((sizes >> layout::BEAMLINE_SHORT_SHIFT) & layout::BYTE_MASK) as usize;
        let long_len = (sizes & layout::BYTE_MASK) as usize;

        let mut offset = layout::BEAMLINE_HEADER_SIZE;
        let id = reader.read_text("beamline id", offset, id_len)?;
        offset += id_len;
        let short_name = reader.read_text("beamline short name", offset, short_len)?;
        offset += short_len;
        let long_name = reader.read_text("beamline long name", offset, long_len)?;

        Ok(Self {
            packet,
            id,
            short_name,
            long_name,
        })
    }

    pub fn packet(&self) -> &Packet<'a> {
        &self.packet
    }

    pub fn into_owned(self) -> BeamlineInfo<'static> {
        BeamlineInfo {
            packet: self.packet.into_owned(),
            id: self.id,
            short_name: self.short_name,
            long_name: self.long_name,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    pub fn long_name(&self) -> &str {
        &self.long_name
    }
}
