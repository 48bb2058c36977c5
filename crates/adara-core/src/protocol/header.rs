use serde::{Deserialize, Serialize};

use super::error::ProtocolError;
use super::layout;

/// Fixed 16-byte header that precedes every packet.
///
/// # Examples
/// ```
/// use adara_core::protocol::{PacketHeader, PacketType};
///
/// let header = PacketHeader::new(PacketType::Heartbeat.code(), 0x0000_0001_0000_0002, 0);
/// let bytes = header.encode();
/// let decoded = PacketHeader::decode(&bytes)?;
/// assert_eq!(decoded, header);
/// assert_eq!(decoded.packet_type(), Some(PacketType::Heartbeat));
/// # Ok::<(), adara_core::protocol::ProtocolError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PacketHeader {
    pub payload_length: u32,
    pub type_code: u32,
    pub pulse_id: u64,
}

impl PacketHeader {
    pub fn new(type_code: u32, pulse_id: u64, payload_length: u32) -> Self {
        Self {
            payload_length,
            type_code,
            pulse_id,
        }
    }

    /// Decodes the header at the start of `bytes`.
    ///
    /// # Errors
    /// Returns `ProtocolError::Incomplete` when fewer than 16 bytes are given.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        if bytes.len() < layout::HEADER_SIZE {
            return Err(ProtocolError::Incomplete {
                needed: layout::HEADER_SIZE,
                actual: bytes.len(),
            });
        }
        let word = |range: std::ops::Range<usize>| {
            let b = &bytes[range];
            u32::from_le_bytes([b[0], b[1], b[2], b[3]])
        };
        let high = word(layout::PULSE_HIGH_RANGE);
        let low = word(layout::PULSE_LOW_RANGE);
        Ok(Self {
            payload_length: word(layout::PAYLOAD_LENGTH_RANGE),
            type_code: word(layout::TYPE_CODE_RANGE),
            pulse_id: ((high as u64) << 32) | low as u64,
        })
    }

    pub fn encode(&self) -> [u8; layout::HEADER_SIZE] {
        let mut buf = [0u8; layout::HEADER_SIZE];
        buf[layout::PAYLOAD_LENGTH_RANGE].copy_from_slice(&self.payload_length.to_le_bytes());
        buf[layout::TYPE_CODE_RANGE].copy_from_slice(&self.type_code.to_le_bytes());
        buf[layout::PULSE_HIGH_RANGE].copy_from_slice(&self.pulse_high().to_le_bytes());
        buf[layout::PULSE_LOW_RANGE].copy_from_slice(&self.pulse_low().to_le_bytes());
        buf
    }

    /// Total on-wire size, header included. Computed in `u64` so a
    /// `payload_length` near `u32::MAX` cannot overflow.
    pub fn packet_length(&self) -> u64 {
        self.payload_length as u64 + layout::HEADER_SIZE as u64
    }

    pub fn message_id(&self) -> u32 {
        self.type_code >> 8
    }

    pub fn version(&self) -> u8 {
        (self.type_code & 0xff) as u8
    }

    pub fn packet_type(&self) -> Option<PacketType> {
        PacketType::from_code(self.type_code)
    }

    pub fn pulse_high(&self) -> u32 {
        (self.pulse_id >> 32) as u32
    }

    pub fn pulse_low(&self) -> u32 {
        self.pulse_id as u32
    }
}

/// Known message kinds. Any other type code decodes as `Variant::Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacketType {
    RawEvent,
    Rtdl,
    SourceList,
    BankedEvent,
    BeamMonitor,
    PixelMapping,
    RunStatus,
    RunInfo,
    TransComplete,
    ClientHello,
    StreamAnnotation,
    Sync,
    Heartbeat,
    Geometry,
    BeamlineInfo,
    DeviceDescriptor,
    VariableU32,
    VariableDouble,
    VariableString,
}

impl PacketType {
    pub const ALL: [PacketType; 19] = [
        PacketType::RawEvent,
        PacketType::Rtdl,
        PacketType::SourceList,
        PacketType::BankedEvent,
        PacketType::BeamMonitor,
        PacketType::PixelMapping,
        PacketType::RunStatus,
        PacketType::RunInfo,
        PacketType::TransComplete,
        PacketType::ClientHello,
        PacketType::StreamAnnotation,
        PacketType::Sync,
        PacketType::Heartbeat,
        PacketType::Geometry,
        PacketType::BeamlineInfo,
        PacketType::DeviceDescriptor,
        PacketType::VariableU32,
        PacketType::VariableDouble,
        PacketType::VariableString,
    ];

    pub fn message_id(self) -> u32 {
        match self {
            PacketType::RawEvent => layout::RAW_EVENT_ID,
            PacketType::Rtdl => layout::RTDL_ID,
            PacketType::SourceList => layout::SOURCE_LIST_ID,
            PacketType::BankedEvent => layout::BANKED_EVENT_ID,
            PacketType::BeamMonitor => layout::BEAM_MONITOR_ID,
            PacketType::PixelMapping => layout::PIXEL_MAPPING_ID,
            PacketType::RunStatus => layout::RUN_STATUS_ID,
            PacketType::RunInfo => layout::RUN_INFO_ID,
            PacketType::TransComplete => layout::TRANS_COMPLETE_ID,
            PacketType::ClientHello => layout::CLIENT_HELLO_ID,
            PacketType::StreamAnnotation => layout::STREAM_ANNOTATION_ID,
            PacketType::Sync => layout::SYNC_ID,
            PacketType::Heartbeat => layout::HEARTBEAT_ID,
            PacketType::Geometry => layout::GEOMETRY_ID,
            PacketType::BeamlineInfo => layout::BEAMLINE_INFO_ID,
            PacketType::DeviceDescriptor => layout::DEVICE_DESCRIPTOR_ID,
            PacketType::VariableU32 => layout::VARIABLE_U32_ID,
            PacketType::VariableDouble => layout::VARIABLE_DOUBLE_ID,
            PacketType::VariableString => layout::VARIABLE_STRING_ID,
        }
    }

    /// Wire version this crate decodes for the kind.
    pub fn version(self) -> u8 {
        0
    }

    pub fn code(self) -> u32 {
        layout::type_code(self.message_id(), self.version())
    }

    pub fn from_code(code: u32) -> Option<Self> {
        PacketType::ALL.into_iter().find(|kind| kind.code() == code)
    }

    pub fn name(self) -> &'static str {
        match self {
            PacketType::RawEvent => "raw_event",
            PacketType::Rtdl => "rtdl",
            PacketType::SourceList => "source_list",
            PacketType::BankedEvent => "banked_event",
            PacketType::BeamMonitor => "beam_monitor",
            PacketType::PixelMapping => "pixel_mapping",
            PacketType::RunStatus => "run_status",
            PacketType::RunInfo => "run_info",
            PacketType::TransComplete => "trans_complete",
            PacketType::ClientHello => "client_hello",
            PacketType::StreamAnnotation => "stream_annotation",
            PacketType::Sync => "sync",
            PacketType::Heartbeat => "heartbeat",
            PacketType::Geometry => "geometry",
            PacketType::BeamlineInfo => "beamline_info",
            PacketType::DeviceDescriptor => "device_descriptor",
            PacketType::VariableU32 => "variable_u32",
            PacketType::VariableDouble => "variable_double",
            PacketType::VariableString => "variable_string",
        }
    }
}

/// Frames `payload` behind a header of the given type and pulse id.
///
/// Used by fixture generators and tests to build wire streams.
///
/// # Panics
/// Panics if `payload` is longer than `u32::MAX` bytes.
pub fn frame_packet(type_code: u32, pulse_id: u64, payload: &[u8]) -> Vec<u8> {
    let length = u32::try_from(payload.len()).expect("payload length fits in u32");
    let header = PacketHeader::new(type_code, pulse_id, length);
    let mut bytes = Vec::with_capacity(layout::HEADER_SIZE + payload.len());
    bytes.extend_from_slice(&header.encode());
    bytes.extend_from_slice(payload);
    bytes
}

#[cfg(test)]
mod tests {
    use super::{PacketHeader, PacketType, frame_packet};
    use crate::protocol::error::ProtocolError;
    use crate::protocol::layout;

    #[test]
    fn decode_reads_four_little_endian_words() {
        let bytes = [
            0x08, 0x00, 0x00, 0x00, // payload length
            0x00, 0x03, 0x40, 0x00, // type 0x4003 v0
            0x78, 0x56, 0x34, 0x12, // pulse high
            0xf0, 0xde, 0xbc, 0x9a, // pulse low
        ];
        let header = PacketHeader::decode(&bytes).unwrap();
        assert_eq!(header.payload_length, 8);
        assert_eq!(header.type_code, 0x0040_0300);
        assert_eq!(header.message_id(), 0x4003);
        assert_eq!(header.version(), 0);
        assert_eq!(header.pulse_id, 0x1234_5678_9abc_def0);
        assert_eq!(header.packet_type(), Some(PacketType::RunStatus));
        assert_eq!(header.packet_length(), 24);
    }

    #[test]
    fn header_round_trip_reproduces_bytes() {
        let bytes: [u8; 16] = [
            0x10, 0x20, 0x30, 0x40, 0x01, 0x02, 0x03, 0x04, 0xaa, 0xbb, 0xcc, 0xdd, 0x11, 0x22,
            0x33, 0x44,
        ];
        let header = PacketHeader::decode(&bytes).unwrap();
        assert_eq!(header.encode(), bytes);
    }

    #[test]
    fn short_input_is_incomplete() {
        let err = PacketHeader::decode(&[0u8; 15]).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::Incomplete {
                needed: layout::HEADER_SIZE,
                actual: 15
            }
        );
    }

    #[test]
    fn unknown_type_code_still_decodes() {
        let header = PacketHeader::new(layout::type_code(0x7777, 3), 1, 0);
        let decoded = PacketHeader::decode(&header.encode()).unwrap();
        assert_eq!(decoded.packet_type(), None);
        assert_eq!(decoded.message_id(), 0x7777);
        assert_eq!(decoded.version(), 3);
    }

    #[test]
    fn newer_version_of_known_kind_is_not_matched() {
        let code = layout::type_code(layout::RUN_STATUS_ID, 1);
        assert_eq!(PacketType::from_code(code), None);
    }

    #[test]
    fn every_kind_round_trips_through_its_code() {
        for kind in PacketType::ALL {
            assert_eq!(PacketType::from_code(kind.code()), Some(kind));
        }
    }

    #[test]
    fn packet_length_does_not_overflow() {
        let header = PacketHeader::new(0, 0, u32::MAX);
        assert_eq!(header.packet_length(), u32::MAX as u64 + 16);
    }

    #[test]
    fn frame_packet_prefixes_header() {
        let bytes = frame_packet(PacketType::Heartbeat.code(), 7, &[1, 2, 3, 4]);
        assert_eq!(bytes.len(), 20);
        let header = PacketHeader::decode(&bytes).unwrap();
        assert_eq!(header.payload_length, 4);
        assert_eq!(header.pulse_id, 7);
        assert_eq!(&bytes[16..], &[1, 2, 3, 4]);
    }
}
