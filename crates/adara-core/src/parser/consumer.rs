//! Consumer contracts for dispatched packets.
//!
//! `Consumer` is the single generic entry point: every complete packet and
//! every oversize chunk arrives as a `Delivery`. Most callers implement the
//! typed `PacketHandler` instead; it is a `Consumer` through a blanket impl.

use crate::packets::{
    BankedEvent, BeamMonitor, BeamlineInfo, ClientHello, DeviceDescriptor, Geometry, Heartbeat,
    PixelMapping, RawEvent, Rtdl, RunInfo, RunStatus, SourceList, StreamAnnotation, Sync,
    TransComplete, VariableDouble, VariableString, VariableU32, Variant,
};
use crate::protocol::header::PacketHeader;
use crate::protocol::packet::Packet;

use super::error::MalformedPacket;

/// Whether parsing should keep going after a callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Control {
    #[default]
    Continue,
    Stop,
}

/// A slice of an oversize packet's payload.
///
/// Chunks of one packet arrive in order with no gaps or overlaps:
/// the first has `offset == 0` and the last ends at `total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OversizeChunk<'a> {
    pub header: PacketHeader,
    pub bytes: &'a [u8],
    pub offset: u64,
    pub total: u64,
}

impl OversizeChunk<'_> {
    pub fn is_first(&self) -> bool {
        self.offset == 0
    }

    pub fn is_last(&self) -> bool {
        self.offset + self.bytes.len() as u64 == self.total
    }
}

/// What the parser hands to a consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery<'a> {
    Complete(Variant<'a>),
    Chunk(OversizeChunk<'a>),
}

pub trait Consumer {
    fn deliver(&mut self, delivery: Delivery<'_>) -> Control;

    /// Called instead of `deliver` for a packet that failed to decode.
    fn malformed(&mut self, _error: &MalformedPacket) -> Control {
        Control::Continue
    }
}

/// Typed consumer with one callback per packet kind.
///
/// Every method defaults to ignoring its input and continuing. Borrowed
/// packets are valid only for the duration of the call; use
/// `into_owned()` to keep one.
#[allow(unused_variables)]
pub trait PacketHandler {
    fn raw_event(&mut self, packet: RawEvent<'_>) -> Control {
        Control::Continue
    }
    fn rtdl(&mut self, packet: Rtdl<'_>) -> Control {
        Control::Continue
    }
    fn source_list(&mut self, packet: SourceList<'_>) -> Control {
        Control::Continue
    }
    fn banked_event(&mut self, packet: BankedEvent<'_>) -> Control {
        Control::Continue
    }
    fn beam_monitor(&mut self, packet: BeamMonitor<'_>) -> Control {
        Control::Continue
    }
    fn pixel_mapping(&mut self, packet: PixelMapping<'_>) -> Control {
        Control::Continue
    }
    fn run_status(&mut self, packet: RunStatus<'_>) -> Control {
        Control::Continue
    }
    fn run_info(&mut self, packet: RunInfo<'_>) -> Control {
        Control::Continue
    }
    fn trans_complete(&mut self, packet: TransComplete<'_>) -> Control {
        Control::Continue
    }
    fn client_hello(&mut self, packet: ClientHello<'_>) -> Control {
        Control::Continue
    }
    fn stream_annotation(&mut self, packet: StreamAnnotation<'_>) -> Control {
        Control::Continue
    }
    fn sync(&mut self, packet: Sync<'_>) -> Control {
        Control::Continue
    }
    fn heartbeat(&mut self, packet: Heartbeat<'_>) -> Control {
        Control::Continue
    }
    fn geometry(&mut self, packet: Geometry<'_>) -> Control {
        Control::Continue
    }
    fn beamline_info(&mut self, packet: BeamlineInfo<'_>) -> Control {
        Control::Continue
    }
    fn device_descriptor(&mut self, packet: DeviceDescriptor<'_>) -> Control {
        Control::Continue
    }
    fn variable_u32(&mut self, packet: VariableU32<'_>) -> Control {
        Control::Continue
    }
    fn variable_double(&mut self, packet: VariableDouble<'_>) -> Control {
        Control::Continue
    }
    fn variable_string(&mut self, packet: VariableString<'_>) -> Control {
        Control::Continue
    }
    fn unknown(&mut self, packet: Packet<'_>) -> Control {
        Control::Continue
    }
    fn oversize_chunk(&mut self, chunk: OversizeChunk<'_>) -> Control {
        Control::Continue
    }
    fn malformed_packet(&mut self, error: &MalformedPacket) -> Control {
        Control::Continue
    }
}

impl<H: PacketHandler + ?Sized> Consumer for H {
    fn deliver(&mut self, delivery: Delivery<'_>) -> Control {
        let variant = match delivery {
            Delivery::Chunk(chunk) => return self.oversize_chunk(chunk),
            Delivery::Complete(variant) => variant,
        };
        match variant {
            Variant::RawEvent(p) => self.raw_event(p),
            Variant::Rtdl(p) => self.rtdl(p),
            Variant::SourceList(p) => self.source_list(p),
            Variant::BankedEvent(p) => self.banked_event(p),
            Variant::BeamMonitor(p) => self.beam_monitor(p),
            Variant::PixelMapping(p) => self.pixel_mapping(p),
            Variant::RunStatus(p) => self.run_status(p),
            Variant::RunInfo(p) => self.run_info(p),
            Variant::TransComplete(p) => self.trans_complete(p),
            Variant::ClientHello(p) => self.client_hello(p),
            Variant::StreamAnnotation(p) => self.stream_annotation(p),
            Variant::Sync(p) => self.sync(p),
            Variant::Heartbeat(p) => self.heartbeat(p),
            Variant::Geometry(p) => self.geometry(p),
            Variant::BeamlineInfo(p) => self.beamline_info(p),
            Variant::DeviceDescriptor(p) => self.device_descriptor(p),
            Variant::VariableU32(p) => self.variable_u32(p),
            Variant::VariableDouble(p) => self.variable_double(p),
            Variant::VariableString(p) => self.variable_string(p),
            Variant::Unknown(p) => self.unknown(p),
        }
    }

    fn malformed(&mut self, error: &MalformedPacket) -> Control {
        self.malformed_packet(error)
    }
}
