//! Typed packet variants.
//!
//! One decoder per message kind. Each decoder:
//! - reads only from the packet payload, through `PayloadReader`
//! - validates every length it will later rely on, so accessors are
//!   infallible bit extractions
//! - keeps the packet (borrowed or owned) and never mutates it
//!
//! Nested sections (banked events, beam monitors, pixel maps) are walked
//! by separate fused iterators that carry their own cursor.

pub mod annotation;
pub mod banked_event;
pub mod beam_monitor;
pub mod common;
pub mod control;
pub mod device;
pub mod pixel_mapping;
pub mod raw_event;
pub mod rtdl;
pub mod run;
pub mod source_list;

pub use annotation::{MarkerType, StreamAnnotation};
pub use banked_event::{BankGroup, BankSections, BankedEvent, BankedEventRecord, BankedEvents};
pub use beam_monitor::{BeamMonitor, MonitorEvent, MonitorEventRecord, MonitorEvents};
pub use common::{ChargeWord, Event, EventSlice, PulseFlavor, PulseInfo, TimingWord, TofField};
pub use control::{ClientHello, Heartbeat, Sync, TransComplete};
pub use device::{DeviceDescriptor, VariableDouble, VariableSeverity, VariableString, VariableU32};
pub use pixel_mapping::{MappingSection, PixelMapping};
pub use raw_event::RawEvent;
pub use rtdl::Rtdl;
pub use run::{BeamlineInfo, Geometry, RunInfo, RunStatus, RunStatusKind};
pub use source_list::SourceList;

use crate::protocol::error::DecodeError;
use crate::protocol::header::PacketType;
use crate::protocol::packet::Packet;

/// A decoded packet of any kind.
///
/// Type codes outside the known set (including known message ids at a
/// version other than 0) decode to `Unknown` and are not errors.
#[derive(Debug, Clone, PartialEq)]
pub enum Variant<'a> {
    RawEvent(RawEvent<'a>),
    Rtdl(Rtdl<'a>),
    SourceList(SourceList<'a>),
    BankedEvent(BankedEvent<'a>),
    BeamMonitor(BeamMonitor<'a>),
    PixelMapping(PixelMapping<'a>),
    RunStatus(RunStatus<'a>),
    RunInfo(RunInfo<'a>),
    TransComplete(TransComplete<'a>),
    ClientHello(ClientHello<'a>),
    StreamAnnotation(StreamAnnotation<'a>),
    Sync(Sync<'a>),
    Heartbeat(Heartbeat<'a>),
    Geometry(Geometry<'a>),
    BeamlineInfo(BeamlineInfo<'a>),
    DeviceDescriptor(DeviceDescriptor<'a>),
    VariableU32(VariableU32<'a>),
    VariableDouble(VariableDouble<'a>),
    VariableString(VariableString<'a>),
    Unknown(Packet<'a>),
}

/// Decodes `packet` into its typed variant.
///
/// # Examples
/// ```
/// use adara_core::packets::{Variant, decode_variant};
/// use adara_core::protocol::{Packet, PacketType, frame_packet};
///
/// let bytes = frame_packet(PacketType::Heartbeat.code(), 7, &[]);
/// let variant = decode_variant(Packet::parse(&bytes)?)?;
/// assert!(matches!(variant, Variant::Heartbeat(_)));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn decode_variant<'a>(packet: Packet<'a>) -> Result<Variant<'a>, DecodeError> {
    let Some(kind) = PacketType::from_code(packet.type_code()) else {
        return Ok(Variant::Unknown(packet));
    };
    Ok(match kind {
        PacketType::RawEvent => Variant::RawEvent(RawEvent::decode(packet)?),
        PacketType::Rtdl => Variant::Rtdl(Rtdl::decode(packet)?),
        PacketType::SourceList => Variant::SourceList(SourceList::decode(packet)?),
        PacketType::BankedEvent => Variant::BankedEvent(BankedEvent::decode(packet)?),
        PacketType::BeamMonitor => Variant::BeamMonitor(BeamMonitor::decode(packet)?),
        PacketType::PixelMapping => Variant::PixelMapping(PixelMapping::decode(packet)?),
        PacketType::RunStatus => Variant::RunStatus(RunStatus::decode(packet)?),
        PacketType::RunInfo => Variant::RunInfo(RunInfo::decode(packet)?),
        PacketType::TransComplete => Variant::TransComplete(TransComplete::decode(packet)?),
        PacketType::ClientHello => Variant::ClientHello(ClientHello::decode(packet)?),
        PacketType::StreamAnnotation => {
            Variant::StreamAnnotation(StreamAnnotation::decode(packet)?)
        }
        PacketType::Sync => Variant::Sync(Sync::decode(packet)?),
        PacketType::Heartbeat => Variant::Heartbeat(Heartbeat::decode(packet)?),
        PacketType::Geometry => Variant::Geometry(Geometry::decode(packet)?),
        PacketType::BeamlineInfo => Variant::BeamlineInfo(BeamlineInfo::decode(packet)?),
        PacketType::DeviceDescriptor => {
            Variant::DeviceDescriptor(DeviceDescriptor::decode(packet)?)
        }
        PacketType::VariableU32 => Variant::VariableU32(VariableU32::decode(packet)?),
        PacketType::VariableDouble => Variant::VariableDouble(VariableDouble::decode(packet)?),
        PacketType::VariableString => Variant::VariableString(VariableString::decode(packet)?),
    })
}

impl<'a> Variant<'a> {
    pub fn packet(&self) -> &Packet<'a> {
        match self {
            Variant::RawEvent(v) => v.packet(),
            Variant::Rtdl(v) => v.packet(),
            Variant::SourceList(v) => v.packet(),
            Variant::BankedEvent(v) => v.packet(),
            Variant::BeamMonitor(v) => v.packet(),
            Variant::PixelMapping(v) => v.packet(),
            Variant::RunStatus(v) => v.packet(),
            Variant::RunInfo(v) => v.packet(),
            Variant::TransComplete(v) => v.packet(),
            Variant::ClientHello(v) => v.packet(),
            Variant::StreamAnnotation(v) => v.packet(),
            Variant::Sync(v) => v.packet(),
            Variant::Heartbeat(v) => v.packet(),
            Variant::Geometry(v) => v.packet(),
            Variant::BeamlineInfo(v) => v.packet(),
            Variant::DeviceDescriptor(v) => v.packet(),
            Variant::VariableU32(v) => v.packet(),
            Variant::VariableDouble(v) => v.packet(),
            Variant::VariableString(v) => v.packet(),
            Variant::Unknown(packet) => packet,
        }
    }

    /// Known kind of this variant; `None` for `Unknown`.
    pub fn packet_type(&self) -> Option<PacketType> {
        match self {
            Variant::Unknown(_) => None,
            other => PacketType::from_code(other.packet().type_code()),
        }
    }

    pub fn pulse_id(&self) -> u64 {
        self.packet().pulse_id()
    }

    /// Detaches the variant from the parser buffer.
    pub fn into_owned(self) -> Variant<'static> {
        match self {
            Variant::RawEvent(v) => Variant::RawEvent(v.into_owned()),
            Variant::Rtdl(v) => Variant::Rtdl(v.into_owned()),
            Variant::SourceList(v) => Variant::SourceList(v.into_owned()),
            Variant::BankedEvent(v) => Variant::BankedEvent(v.into_owned()),
            Variant::BeamMonitor(v) => Variant::BeamMonitor(v.into_owned()),
            Variant::PixelMapping(v) => Variant::PixelMapping(v.into_owned()),
            Variant::RunStatus(v) => Variant::RunStatus(v.into_owned()),
            Variant::RunInfo(v) => Variant::RunInfo(v.into_owned()),
            Variant::TransComplete(v) => Variant::TransComplete(v.into_owned()),
            Variant::ClientHello(v) => Variant::ClientHello(v.into_owned()),
            Variant::StreamAnnotation(v) => Variant::StreamAnnotation(v.into_owned()),
            Variant::Sync(v) => Variant::Sync(v.into_owned()),
            Variant::Heartbeat(v) => Variant::Heartbeat(v.into_owned()),
            Variant::Geometry(v) => Variant::Geometry(v.into_owned()),
            Variant::BeamlineInfo(v) => Variant::BeamlineInfo(v.into_owned()),
            Variant::DeviceDescriptor(v) => Variant::DeviceDescriptor(v.into_owned()),
            Variant::VariableU32(v) => Variant::VariableU32(v.into_owned()),
            Variant::VariableDouble(v) => Variant::VariableDouble(v.into_owned()),
            Variant::VariableString(v) => Variant::VariableString(v.into_owned()),
            Variant::Unknown(packet) => Variant::Unknown(packet.into_owned()),
        }
    }
}
