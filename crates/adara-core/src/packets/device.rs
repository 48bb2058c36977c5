//! Device descriptors and process-variable updates.
//!
//! Every variable packet starts with `[device_id, variable_id,
//! status:16 | severity:16]`; the value follows. Only the byte layout is
//! interpreted here; what a device or variable means is left to consumers.

use serde::Serialize;

use crate::protocol::error::DecodeError;
use crate::protocol::layout;
use crate::protocol::packet::Packet;
use crate::protocol::reader::{PayloadReader, word_at};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableSeverity {
    Ok,
    Minor,
    Major,
    Invalid,
    Other(u16),
}

impl VariableSeverity {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => VariableSeverity::Ok,
            1 => VariableSeverity::Minor,
            2 => VariableSeverity::Major,
            3 => VariableSeverity::Invalid,
            other => VariableSeverity::Other(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor<'a> {
    packet: Packet<'a>,
    xml: String,
}

impl<'a> DeviceDescriptor<'a> {
    pub fn decode(packet: Packet<'a>) -> Result<Self, DecodeError> {
        let reader = PayloadReader::new(packet.payload());
        reader.require_len(layout::DEVICE_DESCRIPTOR_HEADER_SIZE)?;
        let length = reader.read_word(1)? as usize;
        let xml = reader.read_text(
            "device descriptor",
            layout::DEVICE_DESCRIPTOR_HEADER_SIZE,
            length,
        )?;
        Ok(Self { packet, xml })
    }

    pub fn packet(&self) -> &Packet<'a> {
        &self.packet
    }

    pub fn into_owned(self) -> DeviceDescriptor<'static> {
        DeviceDescriptor {
            packet: self.packet.into_owned(),
            xml: self.xml,
        }
    }

    pub fn device_id(&self) -> u32 {
        word_at(self.packet.payload(), 0)
    }

    pub fn xml(&self) -> &str {
        &self.xml
    }
}

/// Shared accessors over the three-word variable prefix.
fn device_id(payload: &[u8]) -> u32 {
    word_at(payload, 0)
}

fn variable_id(payload: &[u8]) -> u32 {
    word_at(payload, 1)
}

fn status(payload: &[u8]) -> u16 {
    (word_at(payload, 2) >> layout::VARIABLE_STATUS_SHIFT) as u16
}

fn severity(payload: &[u8]) -> VariableSeverity {
    VariableSeverity::from_u16((word_at(payload, 2) & layout::SHORT_LENGTH_MASK) as u16)
}

macro_rules! variable_accessors {
    ($name:ident) => {
        impl<'a> $name<'a> {
            pub fn packet(&self) -> &Packet<'a> {
                &self.packet
            }

            pub fn device_id(&self) -> u32 {
                device_id(self.packet.payload())
            }

            pub fn variable_id(&self) -> u32 {
                variable_id(self.packet.payload())
            }

            /// Alarm status code as reported by the control system.
            pub fn status(&self) -> u16 {
                status(self.packet.payload())
            }

            pub fn severity(&self) -> VariableSeverity {
                severity(self.packet.payload())
            }
        }
    };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableU32<'a> {
    packet: Packet<'a>,
}

variable_accessors!(VariableU32);

impl<'a> VariableU32<'a> {
    pub fn decode(packet: Packet<'a>) -> Result<Self, DecodeError> {
        PayloadReader::new(packet.payload()).require_exact_len(layout::VARIABLE_U32_PAYLOAD_SIZE)?;
        Ok(Self { packet })
    }

    pub fn into_owned(self) -> VariableU32<'static> {
        VariableU32 {
            packet: self.packet.into_owned(),
        }
    }

    pub fn value(&self) -> u32 {
        word_at(self.packet.payload(), 3)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDouble<'a> {
    packet: Packet<'a>,
}

variable_accessors!(VariableDouble);

impl<'a> VariableDouble<'a> {
    pub fn decode(packet: Packet<'a>) -> Result<Self, DecodeError> {
        PayloadReader::new(packet.payload())
            .require_exact_len(layout::VARIABLE_DOUBLE_PAYLOAD_SIZE)?;
        Ok(Self { packet })
    }

    pub fn into_owned(self) -> VariableDouble<'static> {
        VariableDouble {
            packet: self.packet.into_owned(),
        }
    }

    pub fn value(&self) -> f64 {
        PayloadReader::new(self.packet.payload())
            .read_f64_le(layout::VARIABLE_HEADER_SIZE)
            .unwrap_or(f64::NAN)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableString<'a> {
    packet: Packet<'a>,
    value: String,
}

variable_accessors!(VariableString);

impl<'a> VariableString<'a> {
    pub fn decode(packet: Packet<'a>) -> Result<Self, DecodeError> {
        let reader = PayloadReader::new(packet.payload());
        reader.require_len(layout::VARIABLE_STRING_HEADER_SIZE)?;
        let length = reader.read_word(3)? as usize;
        let value = reader.read_text(
            "variable string",
            layout::VARIABLE_STRING_HEADER_SIZE,
            length,
        )?;
        Ok(Self { packet, value })
    }

    pub fn into_owned(self) -> VariableString<'static> {
        VariableString {
            packet: self.packet.into_owned(),
            value: self.value,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}
