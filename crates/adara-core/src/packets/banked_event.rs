//! Banked event packets: mapped events grouped by source and detector bank.
//!
//! Payload: four pulse-info words, then sources until the payload is
//! exhausted. Each source is `[source_id, intra_pulse_time, tof, bank_count]`
//! followed by `bank_count` banks of `[bank_id, event_count]` and
//! `event_count` `(tof, pixel)` pairs. There is no terminator; section
//! boundaries come only from the embedded counts.

use crate::protocol::error::DecodeError;
use crate::protocol::layout;
use crate::protocol::packet::Packet;
use crate::protocol::reader::{PayloadReader, word_at};

use super::common::{Event, EventSlice, PulseInfo, TofField};

/// Bank id used for events whose pixel id failed validation.
pub const ERROR_BANK_ID: u32 = 0xffff_ffff;
/// Bank id used for events that could not be mapped to a bank.
pub const UNMAPPED_BANK_ID: u32 = 0xffff_fffe;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankedEvent<'a> {
    packet: Packet<'a>,
    source_count: usize,
    bank_count: usize,
    event_count: usize,
}

impl<'a> BankedEvent<'a> {
    /// Validates the pulse info and walks every section once.
    ///
    /// # Errors
    /// Returns the first `DecodeError` hit while walking the sections, e.g.
    /// when a bank's `event_count` overstates the bytes left.
    pub fn decode(packet: Packet<'a>) -> Result<Self, DecodeError> {
        let payload = packet.payload();
        PayloadReader::new(payload).require_len(layout::PULSE_INFO_SIZE)?;

        let mut sections = BankSections::new(payload);
        let mut bank_count = 0;
        let mut event_count = 0;
        for group in sections.by_ref() {
            let group = group?;
            bank_count += 1;
            event_count += group.events.len();
        }
        let source_count = sections.sources_read();

        Ok(Self {
            packet,
            source_count,
            bank_count,
            event_count,
        })
    }

    pub fn packet(&self) -> &Packet<'a> {
        &self.packet
    }

    pub fn into_owned(self) -> BankedEvent<'static> {
        BankedEvent {
            packet: self.packet.into_owned(),
            source_count: self.source_count,
            bank_count: self.bank_count,
            event_count: self.event_count,
        }
    }

    pub fn pulse(&self) -> PulseInfo {
        PulseInfo::from_payload(self.packet.payload())
    }

    pub fn source_count(&self) -> usize {
        self.source_count
    }

    pub fn bank_count(&self) -> usize {
        self.bank_count
    }

    pub fn event_count(&self) -> usize {
        self.event_count
    }

    /// Lazily walks `(source, bank, events)` groups.
    pub fn banks(&self) -> BankSections<'_> {
        BankSections::new(self.packet.payload())
    }

    /// Lazily walks every event, tagged with its source and bank.
    pub fn events(&self) -> BankedEvents<'_> {
        BankedEvents {
            sections: self.banks(),
            current: None,
            index: 0,
        }
    }
}

/// Source section header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceInfo {
    pub source_id: u32,
    pub intra_pulse_time: u32,
    pub tof: TofField,
    pub bank_count: u32,
}

/// One bank of events within a source section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BankGroup<'a> {
    pub source: SourceInfo,
    pub bank_id: u32,
    pub events: EventSlice<'a>,
}

/// An event with the source and bank it was reported under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BankedEventRecord {
    pub source_id: u32,
    pub bank_id: u32,
    pub event: Event,
}

/// Cursor over the bank groups of a banked event payload.
///
/// Each step checks the bytes left before advancing. A failed step yields
/// one `Err` and the iterator is then exhausted.
#[derive(Debug, Clone)]
pub struct BankSections<'a> {
    reader: PayloadReader<'a>,
    cursor: usize,
    source: Option<SourceInfo>,
    banks_remaining: u32,
    sources_read: usize,
    done: bool,
}

impl<'a> BankSections<'a> {
    fn new(payload: &'a [u8]) -> Self {
        Self {
            reader: PayloadReader::new(payload),
            cursor: layout::PULSE_INFO_SIZE,
            source: None,
            banks_remaining: 0,
            sources_read: 0,
            done: false,
        }
    }

    /// Source sections entered so far.
    pub fn sources_read(&self) -> usize {
        self.sources_read
    }

    fn read_source(&mut self) -> Result<SourceInfo, DecodeError> {
        let header = self
            .reader
            .read_section("source section", self.cursor, layout::SOURCE_SECTION_SIZE)?;
        let source = SourceInfo {
            source_id: word_at(header, 0),
            intra_pulse_time: word_at(header, 1),
            tof: TofField(word_at(header, 2)),
            bank_count: word_at(header, 3),
        };
        self.cursor += layout::SOURCE_SECTION_SIZE;
        Ok(source)
    }

    fn read_bank(&mut self, source: SourceInfo) -> Result<BankGroup<'a>, DecodeError> {
        let header = self
            .reader
            .read_section("bank section", self.cursor, layout::BANK_SECTION_SIZE)?;
        let bank_id = word_at(header, 0);
        let count = word_at(header, 1) as usize;
        let events_at = self.cursor + layout::BANK_SECTION_SIZE;
        let length = count
            .checked_mul(layout::EVENT_SIZE)
            .ok_or(DecodeError::Overrun {
                section: "bank events",
                offset: events_at,
                needed: usize::MAX,
                available: self.reader.len().saturating_sub(events_at),
            })?;
        let events = self.reader.read_section("bank events", events_at, length)?;
        self.cursor = events_at + length;
        Ok(BankGroup {
            source,
            bank_id,
            events: EventSlice::new(events),
        })
    }

    fn step(&mut self) -> Option<Result<BankGroup<'a>, DecodeError>> {
        loop {
            if self.banks_remaining == 0 {
                if self.cursor >= self.reader.len() {
                    return None;
                }
                let source = match self.read_source() {
                    Ok(source) => source,
                    Err(err) => return Some(Err(err)),
                };
                self.sources_read += 1;
                self.banks_remaining = source.bank_count;
                self.source = Some(source);
                continue;
            }
            let source = self.source?;
            self.banks_remaining -= 1;
            return Some(self.read_bank(source));
        }
    }
}

impl<'a> Iterator for BankSections<'a> {
    type Item = Result<BankGroup<'a>, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.step();
        if !matches!(item, Some(Ok(_))) {
            self.done = true;
        }
        item
    }
}

impl std::iter::FusedIterator for BankSections<'_> {}

/// Flattened events of a banked event payload.
///
/// Stops at the first malformed section; packets that reach a consumer
/// were already validated, so this only happens on hand-built payloads.
#[derive(Debug, Clone)]
pub struct BankedEvents<'a> {
    sections: BankSections<'a>,
    current: Option<BankGroup<'a>>,
    index: usize,
}

impl Iterator for BankedEvents<'_> {
    type Item = BankedEventRecord;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(group) = &self.current {
                if let Some(event) = group.events.get(self.index) {
                    self.index += 1;
                    return Some(BankedEventRecord {
                        source_id: group.source.source_id,
                        bank_id: group.bank_id,
                        event,
                    });
                }
            }
            self.current = Some(self.sections.next()?.ok()?);
            self.index = 0;
        }
    }
}
