use crate::protocol::error::DecodeError;
use crate::protocol::layout;
use crate::protocol::packet::Packet;
use crate::protocol::reader::{PayloadReader, word_at};

use super::common::{ChargeWord, EventSlice, PulseFlavor, TimingWord, TofField};

/// Unmapped events straight from one data source (preprocessor).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent<'a> {
    packet: Packet<'a>,
}

impl<'a> RawEvent<'a> {
    pub fn decode(packet: Packet<'a>) -> Result<Self, DecodeError> {
        let reader = PayloadReader::new(packet.payload());
        reader.require_len(layout::RAW_EVENT_HEADER_SIZE)?;
        reader.require_multiple_of(
            "raw events",
            layout::RAW_EVENT_HEADER_SIZE,
            layout::EVENT_SIZE,
        )?;
        Ok(Self { packet })
    }

    pub fn packet(&self) -> &Packet<'a> {
        &self.packet
    }

    pub fn into_owned(self) -> RawEvent<'static> {
        RawEvent {
            packet: self.packet.into_owned(),
        }
    }

    fn word(&self, index: usize) -> u32 {
        word_at(self.packet.payload(), index)
    }

    pub fn source_id(&self) -> u32 {
        self.word(0)
    }

    pub fn end_of_pulse(&self) -> bool {
        self.word(1) & layout::END_OF_PULSE_BIT != 0
    }

    pub fn packet_sequence(&self) -> u16 {
        ((self.word(1) >> layout::PKT_SEQ_SHIFT) & layout::SEQ_MASK) as u16
    }

    pub fn dsp_sequence(&self) -> u16 {
        (self.word(1) & layout::SEQ_MASK) as u16
    }

    pub fn flavor(&self) -> PulseFlavor {
        ChargeWord(self.word(2)).flavor()
    }

    pub fn pulse_charge(&self) -> u32 {
        ChargeWord(self.word(2)).pulse_charge()
    }

    pub fn timing(&self) -> TimingWord {
        TimingWord(self.word(3))
    }

    pub fn intra_pulse_time(&self) -> u32 {
        self.word(4)
    }

    pub fn tof(&self) -> TofField {
        TofField(self.word(5))
    }

    pub fn events(&self) -> EventSlice<'_> {
        let payload = self.packet.payload();
        EventSlice::new(payload.get(layout::RAW_EVENT_HEADER_SIZE..).unwrap_or(&[]))
    }
}

#[cfg(test)]
mod tests {
    use super::RawEvent;
    use crate::packets::common::PulseFlavor;
    use crate::protocol::error::DecodeError;
    use crate::protocol::header::{PacketType, frame_packet};
    use crate::protocol::packet::Packet;

    fn payload(words: &[u32]) -> Vec<u8> {
        words.iter().flat_map(|w| w.to_le_bytes()).collect()
    }

    #[test]
    fn decode_header_fields_and_events() {
        let body = payload(&[
            7,
            0x8000_0000 | (3 << 16) | 5,
            (1 << 24) | 1000,
            0x4000_0000 | 12,
            250,
            0x8000_0000 | 40,
            100,
            0x10,
            200,
            0x20,
        ]);
        let bytes = frame_packet(PacketType::RawEvent.code(), 1, &body);
        let pkt = RawEvent::decode(Packet::parse(&bytes).unwrap()).unwrap();
        assert_eq!(pkt.source_id(), 7);
        assert!(pkt.end_of_pulse());
        assert_eq!(pkt.packet_sequence(), 3);
        assert_eq!(pkt.dsp_sequence(), 5);
        assert_eq!(pkt.flavor(), PulseFlavor::NormalTarget1);
        assert_eq!(pkt.pulse_charge(), 1000);
        assert!(pkt.timing().bad_cycle());
        assert_eq!(pkt.timing().cycle(), 12);
        assert_eq!(pkt.intra_pulse_time(), 250);
        assert!(pkt.tof().corrected());
        assert_eq!(pkt.tof().offset(), 40);
        let events: Vec<_> = pkt.events().iter().map(|e| (e.tof, e.pixel)).collect();
        assert_eq!(events, vec![(100, 0x10), (200, 0x20)]);
    }

    #[test]
    fn decode_rejects_short_header() {
        let bytes = frame_packet(PacketType::RawEvent.code(), 1, &[0u8; 20]);
        let err = RawEvent::decode(Packet::parse(&bytes).unwrap()).unwrap_err();
        assert_eq!(err, DecodeError::TooShort { needed: 24, actual: 20 });
    }

    #[test]
    fn decode_rejects_partial_event() {
        let bytes = frame_packet(PacketType::RawEvent.code(), 1, &[0u8; 28]);
        let err = RawEvent::decode(Packet::parse(&bytes).unwrap()).unwrap_err();
        assert!(matches!(err, DecodeError::Misaligned { length: 4, .. }));
    }
}
