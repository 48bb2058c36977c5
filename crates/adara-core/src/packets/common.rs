use serde::Serialize;

use crate::protocol::layout;
use crate::protocol::reader::word_at;

/// Accelerator pulse flavor carried in timing words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PulseFlavor {
    NoBeam,
    NormalTarget1,
    NormalTarget2,
    Diagnostic10us,
    Diagnostic50us,
    Diagnostic100us,
    SpecialPhysics1,
    SpecialPhysics2,
}

impl PulseFlavor {
    /// Decodes the 3-bit flavor field; every value is defined.
    pub fn from_bits(bits: u32) -> Self {
        match bits & layout::FLAVOR_MASK {
            0 => PulseFlavor::NoBeam,
            1 => PulseFlavor::NormalTarget1,
            2 => PulseFlavor::NormalTarget2,
            3 => PulseFlavor::Diagnostic10us,
            4 => PulseFlavor::Diagnostic50us,
            5 => PulseFlavor::Diagnostic100us,
            6 => PulseFlavor::SpecialPhysics1,
            _ => PulseFlavor::SpecialPhysics2,
        }
    }
}

/// Leading four words of banked event and beam monitor payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PulseInfo {
    pub pulse_charge: u32,
    pub pulse_energy: u32,
    pub cycle: u32,
    pub flags: u32,
}

impl PulseInfo {
    pub(crate) fn from_payload(payload: &[u8]) -> Self {
        Self {
            pulse_charge: word_at(payload, 0),
            pulse_energy: word_at(payload, 1),
            cycle: word_at(payload, 2),
            flags: word_at(payload, 3),
        }
    }

    pub fn has_flag(&self, flag: u32) -> bool {
        self.flags & flag != 0
    }
}

/// Flag bits of the banked event and beam monitor `flags` word.
pub mod pulse_flags {
    pub const ERROR_PIXELS: u32 = 0x0001;
    pub const PARTIAL_DATA: u32 = 0x0002;
    pub const PULSE_VETO: u32 = 0x0004;
    pub const MISSING_RTDL: u32 = 0x0008;
    pub const MAPPING_ERROR: u32 = 0x0010;
    pub const DUPLICATE_PULSE: u32 = 0x0020;
}

/// One detector event: time of flight and pixel id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Event {
    pub tof: u32,
    pub pixel: u32,
}

/// Borrowed run of `(tof, pixel)` word pairs.
///
/// The region length is validated to be a multiple of 8 before one of these
/// is built, so iteration never yields a partial event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventSlice<'a> {
    bytes: &'a [u8],
}

impl<'a> EventSlice<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    pub fn len(&self) -> usize {
        self.bytes.len() / layout::EVENT_SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<Event> {
        if index >= self.len() {
            return None;
        }
        Some(Event {
            tof: word_at(self.bytes, index * 2),
            pixel: word_at(self.bytes, index * 2 + 1),
        })
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = Event> + 'a {
        let bytes = self.bytes;
        bytes.chunks_exact(layout::EVENT_SIZE).map(|chunk| Event {
            tof: word_at(chunk, 0),
            pixel: word_at(chunk, 1),
        })
    }
}

/// Pulse timing word shared by raw event and RTDL packets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingWord(pub u32);

impl TimingWord {
    pub fn bad_veto(self) -> bool {
        self.0 & layout::BAD_VETO_BIT != 0
    }

    pub fn bad_cycle(self) -> bool {
        self.0 & layout::BAD_CYCLE_BIT != 0
    }

    pub fn timing_status(self) -> u8 {
        (self.0 >> layout::TIMING_STATUS_SHIFT) as u8
    }

    pub fn veto_flags(self) -> u16 {
        ((self.0 >> layout::VETO_FLAGS_SHIFT) & layout::VETO_FLAGS_MASK) as u16
    }

    pub fn cycle(self) -> u16 {
        (self.0 & layout::CYCLE_MASK) as u16
    }
}

/// Flavor and 24-bit charge packed into one word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChargeWord(pub u32);

impl ChargeWord {
    pub fn flavor(self) -> PulseFlavor {
        PulseFlavor::from_bits(self.0 >> layout::FLAVOR_SHIFT)
    }

    pub fn pulse_charge(self) -> u32 {
        self.0 & layout::PULSE_CHARGE_MASK
    }
}

/// Time-of-flight offset with its "corrected" marker bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TofField(pub u32);

impl TofField {
    pub fn corrected(self) -> bool {
        self.0 & layout::TOF_CORRECTED_BIT != 0
    }

    pub fn offset(self) -> u32 {
        self.0 & layout::TOF_OFFSET_MASK
    }
}
