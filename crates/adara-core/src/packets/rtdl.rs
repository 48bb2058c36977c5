use crate::protocol::error::DecodeError;
use crate::protocol::layout;
use crate::protocol::packet::Packet;
use crate::protocol::reader::{PayloadReader, word_at};

use super::common::{ChargeWord, PulseFlavor, TimingWord, TofField};

/// Real-time data link packet: per-pulse timing metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rtdl<'a> {
    packet: Packet<'a>,
}

impl<'a> Rtdl<'a> {
    pub fn decode(packet: Packet<'a>) -> Result<Self, DecodeError> {
        PayloadReader::new(packet.payload()).require_exact_len(layout::RTDL_PAYLOAD_SIZE)?;
        Ok(Self { packet })
    }

    pub fn packet(&self) -> &Packet<'a> {
        &self.packet
    }

    pub fn into_owned(self) -> Rtdl<'static> {
        Rtdl {
            packet: self.packet.into_owned(),
        }
    }

    fn word(&self, index: usize) -> u32 {
        word_at(self.packet.payload(), index)
    }

    pub fn flavor(&self) -> PulseFlavor {
        ChargeWord(self.word(0)).flavor()
    }

    pub fn pulse_charge(&self) -> u32 {
        ChargeWord(self.word(0)).pulse_charge()
    }

    pub fn timing(&self) -> TimingWord {
        TimingWord(self.word(1))
    }

    pub fn intra_pulse_time(&self) -> u32 {
        self.word(2)
    }

    pub fn tof(&self) -> TofField {
        TofField(self.word(3))
    }

    pub fn ring_period(&self) -> u32 {
        self.word(4) & layout::RING_PERIOD_MASK
    }

    /// Raw frame-data word `index` (0..25); `None` past the end.
    pub fn frame_data(&self, index: usize) -> Option<u32> {
        if index >= layout::RTDL_FRAME_DATA_WORDS {
            return None;
        }
        Some(self.word(layout::RTDL_FRAME_DATA_START + index))
    }
}

#[cfg(test)]
mod tests {
    use super::Rtdl;
    use crate::packets::common::PulseFlavor;
    use crate::protocol::error::DecodeError;
    use crate::protocol::header::{PacketType, frame_packet};
    use crate::protocol::packet::Packet;

    #[test]
    fn decode_fixed_fields() {
        let mut words = vec![0u32; 30];
        words[0] = (4 << 24) | 77;
        words[1] = (0x3 << 22) | 9;
        words[2] = 1234;
        words[3] = 55;
        words[4] = 0xff00_0100;
        words[29] = 0xdead;
        let body: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        let bytes = frame_packet(PacketType::Rtdl.code(), 2, &body);
        let rtdl = Rtdl::decode(Packet::parse(&bytes).unwrap()).unwrap();
        assert_eq!(rtdl.flavor(), PulseFlavor::Diagnostic50us);
        assert_eq!(rtdl.pulse_charge(), 77);
        assert_eq!(rtdl.timing().timing_status(), 3);
        assert_eq!(rtdl.timing().cycle(), 9);
        assert_eq!(rtdl.intra_pulse_time(), 1234);
        assert!(!rtdl.tof().corrected());
        assert_eq!(rtdl.ring_period(), 0x100);
        assert_eq!(rtdl.frame_data(24), Some(0xdead));
        assert_eq!(rtdl.frame_data(25), None);
    }

    #[test]
    fn decode_requires_exact_size() {
        let bytes = frame_packet(PacketType::Rtdl.code(), 2, &[0u8; 124]);
        let err = Rtdl::decode(Packet::parse(&bytes).unwrap()).unwrap_err();
        assert_eq!(
            err,
            DecodeError::LengthMismatch {
                expected: 120,
                actual: 124
            }
        );
    }
}
