//! Wire offsets, sizes and type codes for the ADARA stream.
//!
//! All multi-byte integers are little-endian. Offsets below are relative to
//! the start of the payload unless stated otherwise.

use std::ops::Range;

pub const WORD_SIZE: usize = 4;
pub const HEADER_SIZE: usize = 16;

pub const PAYLOAD_LENGTH_RANGE: Range<usize> = 0..4;
pub const TYPE_CODE_RANGE: Range<usize> = 4..8;
pub const PULSE_HIGH_RANGE: Range<usize> = 8..12;
pub const PULSE_LOW_RANGE: Range<usize> = 12..16;

/// Builds a type code from a message id and version.
pub const fn type_code(message_id: u32, version: u8) -> u32 {
    (message_id << 8) | version as u32
}

pub const RAW_EVENT_ID: u32 = 0x0000;
pub const RTDL_ID: u32 = 0x0001;
pub const SOURCE_LIST_ID: u32 = 0x0002;
pub const BANKED_EVENT_ID: u32 = 0x4000;
pub const BEAM_MONITOR_ID: u32 = 0x4001;
pub const PIXEL_MAPPING_ID: u32 = 0x4002;
pub const RUN_STATUS_ID: u32 = 0x4003;
pub const RUN_INFO_ID: u32 = 0x4004;
pub const TRANS_COMPLETE_ID: u32 = 0x4005;
pub const CLIENT_HELLO_ID: u32 = 0x4006;
pub const STREAM_ANNOTATION_ID: u32 = 0x4007;
pub const SYNC_ID: u32 = 0x4008;
pub const HEARTBEAT_ID: u32 = 0x4009;
pub const GEOMETRY_ID: u32 = 0x400A;
pub const BEAMLINE_INFO_ID: u32 = 0x400B;
pub const DEVICE_DESCRIPTOR_ID: u32 = 0x8000;
pub const VARIABLE_U32_ID: u32 = 0x8001;
pub const VARIABLE_DOUBLE_ID: u32 = 0x8002;
pub const VARIABLE_STRING_ID: u32 = 0x8003;

// Pulse/timing words shared by raw event and RTDL packets.
pub const PULSE_CHARGE_MASK: u32 = 0x00ff_ffff;
pub const FLAVOR_SHIFT: u32 = 24;
pub const FLAVOR_MASK: u32 = 0x7;
pub const BAD_VETO_BIT: u32 = 0x8000_0000;
pub const BAD_CYCLE_BIT: u32 = 0x4000_0000;
pub const TIMING_STATUS_SHIFT: u32 = 22;
pub const VETO_FLAGS_SHIFT: u32 = 10;
pub const VETO_FLAGS_MASK: u32 = 0xfff;
pub const CYCLE_MASK: u32 = 0x3ff;
pub const TOF_CORRECTED_BIT: u32 = 0x8000_0000;
pub const TOF_OFFSET_MASK: u32 = 0x7fff_ffff;

// Raw event packet.
pub const RAW_EVENT_HEADER_WORDS: usize = 6;
pub const RAW_EVENT_HEADER_SIZE: usize = RAW_EVENT_HEADER_WORDS * WORD_SIZE;
pub const EVENT_SIZE: usize = 2 * WORD_SIZE;
pub const END_OF_PULSE_BIT: u32 = 0x8000_0000;
pub const PKT_SEQ_SHIFT: u32 = 16;
pub const SEQ_MASK: u32 = 0x7fff;

// RTDL packet.
pub const RTDL_PAYLOAD_SIZE: usize = 120;
pub const RTDL_FRAME_DATA_START: usize = 5;
pub const RTDL_FRAME_DATA_WORDS: usize = 25;
pub const RING_PERIOD_MASK: u32 = 0x00ff_ffff;

// Banked event and beam monitor packets.
pub const PULSE_INFO_WORDS: usize = 4;
pub const PULSE_INFO_SIZE: usize = PULSE_INFO_WORDS * WORD_SIZE;
pub const SOURCE_SECTION_SIZE: usize = 4 * WORD_SIZE;
pub const BANK_SECTION_SIZE: usize = 2 * WORD_SIZE;
pub const MONITOR_SECTION_SIZE: usize = 3 * WORD_SIZE;
pub const MONITOR_EVENT_SIZE: usize = WORD_SIZE;
pub const MONITOR_ID_SHIFT: u32 = 22;
pub const MONITOR_EVENT_COUNT_MASK: u32 = (1 << 22) - 1;
pub const MONITOR_RISING_EDGE_BIT: u32 = 0x8000_0000;
pub const MONITOR_CYCLE_SHIFT: u32 = 21;
pub const MONITOR_TOF_MASK: u32 = (1 << 21) - 1;

// Pixel mapping packet.
pub const PIXEL_MAP_SECTION_SIZE: usize = 2 * WORD_SIZE;

// Run status packet.
pub const RUN_STATUS_PAYLOAD_SIZE: usize = 12;
pub const FILE_NUMBER_MASK: u32 = 0x00ff_ffff;
pub const RUN_STATUS_SHIFT: u32 = 24;

// Length-prefixed text blobs (run info, geometry).
pub const TEXT_LENGTH_SIZE: usize = WORD_SIZE;

// Transaction complete packet.
pub const TRANS_COMPLETE_HEADER_SIZE: usize = WORD_SIZE;

// Client hello packet.
pub const CLIENT_HELLO_PAYLOAD_SIZE: usize = 4;

// Stream annotation packet.
pub const ANNOTATION_HEADER_SIZE: usize = 2 * WORD_SIZE;
pub const RESET_HINT_BIT: u32 = 0x8000_0000;
pub const MARKER_TYPE_SHIFT: u32 = 16;
pub const MARKER_TYPE_MASK: u32 = 0x7fff;
pub const SHORT_LENGTH_MASK: u32 = 0xffff;

// Sync packet.
pub const SYNC_SIGNATURE_RANGE: Range<usize> = 0..16;
pub const SYNC_OFFSET_RANGE: Range<usize> = 16..24;
pub const SYNC_COMMENT_LENGTH_RANGE: Range<usize> = 24..28;
pub const SYNC_HEADER_SIZE: usize = 28;

// Beamline info packet.
pub const BEAMLINE_HEADER_SIZE: usize = WORD_SIZE;
pub const BEAMLINE_ID_SHIFT: u32 = 16;
pub const BEAMLINE_SHORT_SHIFT: u32 = 8;
pub const BYTE_MASK: u32 = 0xff;

// Device descriptor packet.
pub const DEVICE_DESCRIPTOR_HEADER_SIZE: usize = 2 * WORD_SIZE;

// Variable value packets.
pub const VARIABLE_HEADER_SIZE: usize = 3 * WORD_SIZE;
pub const VARIABLE_U32_PAYLOAD_SIZE: usize = VARIABLE_HEADER_SIZE + WORD_SIZE;
pub const VARIABLE_DOUBLE_PAYLOAD_SIZE: usize = VARIABLE_HEADER_SIZE + 8;
pub const VARIABLE_STRING_HEADER_SIZE: usize = VARIABLE_HEADER_SIZE + WORD_SIZE;
pub const VARIABLE_STATUS_SHIFT: u32 = 16;

/// Seconds between the Unix epoch and the EPICS epoch (1990-01-01T00:00:00Z).
pub const EPICS_EPOCH_OFFSET: i64 = 631_152_000;
