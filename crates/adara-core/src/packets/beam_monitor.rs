//! Beam monitor event packets.
//!
//! Payload: four pulse-info words, then monitor sections until the payload
//! is exhausted. Each section is `[monitor_id:10 | event_count:22,
//! source_id, tof]` followed by `event_count` single-word events.

use serde::Serialize;

use crate::protocol::error::DecodeError;
use crate::protocol::layout;
use crate::protocol::packet::Packet;
use crate::protocol::reader::{PayloadReader, word_at};

use super::common::{PulseInfo, TofField};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeamMonitor<'a> {
    packet: Packet<'a>,
    section_count: usize,
    event_count: usize,
}

impl<'a> BeamMonitor<'a> {
    pub fn decode(packet: Packet<'a>) -> Result<Self, DecodeError> {
        let payload = packet.payload();
        PayloadReader::new(payload).require_len(layout::PULSE_INFO_SIZE)?;

        let mut section_count = 0;
        let mut event_count = 0;
        for section in MonitorSections::new(payload) {
            let section = section?;
            section_count += 1;
            event_count += section.event_count();
        }

        Ok(Self {
            packet,
            section_count,
            event_count,
        })
    }

    pub fn packet(&self) -> &Packet<'a> {
        &self.packet
    }

    pub fn into_owned(self) -> BeamMonitor<'static> {
        BeamMonitor {
            packet: self.packet.into_owned(),
            section_count: self.section_count,
            event_count: self.event_count,
        }
    }

    pub fn pulse(&self) -> PulseInfo {
        PulseInfo::from_payload(self.packet.payload())
    }

    pub fn section_count(&self) -> usize {
        self.section_count
    }

    pub fn event_count(&self) -> usize {
        self.event_count
    }

    pub fn sections(&self) -> MonitorSections<'_> {
        MonitorSections::new(self.packet.payload())
    }

    /// Lazily walks every monitor event, tagged with its monitor id.
    pub fn events(&self) -> MonitorEvents<'_> {
        MonitorEvents {
            sections: self.sections(),
            current: None,
            index: 0,
        }
    }
}

/// One rising/falling edge reported by a beam monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MonitorEvent {
    pub rising_edge: bool,
    pub cycle: u16,
    pub tof: u32,
}

impl MonitorEvent {
    pub fn from_word(word: u32) -> Self {
        Self {
            rising_edge: word & layout::MONITOR_RISING_EDGE_BIT != 0,
            cycle: ((word >> layout::MONITOR_CYCLE_SHIFT) & layout::CYCLE_MASK) as u16,
            tof: word & layout::MONITOR_TOF_MASK,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSection<'a> {
    pub monitor_id: u32,
    pub source_id: u32,
    pub tof: TofField,
    events: &'a [u8],
}

impl<'a> MonitorSection<'a> {
    pub fn event_count(&self) -> usize {
        self.events.len() / layout::MONITOR_EVENT_SIZE
    }

    pub fn events(&self) -> impl ExactSizeIterator<Item = MonitorEvent> + 'a {
        let events = self.events;
        events
            .chunks_exact(layout::MONITOR_EVENT_SIZE)
            .map(|chunk| MonitorEvent::from_word(word_at(chunk, 0)))
    }
}

/// Cursor over monitor sections; fused after the first error.
#[derive(Debug, Clone)]
pub struct MonitorSections<'a> {
    reader: PayloadReader<'a>,
    cursor: usize,
    done: bool,
}

impl<'a> MonitorSections<'a> {
    fn new(payload: &'a [u8]) -> Self {
        Self {
            reader: PayloadReader::new(payload),
            cursor: layout::PULSE_INFO_SIZE,
            done: false,
        }
    }

    fn read_section(&mut self) -> Result<MonitorSection<'a>, DecodeError> {
        let header = self.reader.read_section(
            "monitor section",
            self.cursor,
            layout::MONITOR_SECTION_SIZE,
        )?;
        let first = word_at(header, 0);
        let count = (first & layout::MONITOR_EVENT_COUNT_MASK) as usize;
        let events_at = self.cursor + layout::MONITOR_SECTION_SIZE;
        // count is at most 22 bits, so this cannot overflow
        let length = count * layout::MONITOR_EVENT_SIZE;
        let events = self.reader.read_section("monitor events", events_at, length)?;
        self.cursor = events_at + length;
        Ok(MonitorSection {
            monitor_id: first >> layout::MONITOR_ID_SHIFT,
            source_id: word_at(header, 1),
            tof: TofField(word_at(header, 2)),
            events,
        })
    }
}

impl<'a> Iterator for MonitorSections<'a> {
    type Item = Result<MonitorSection<'a>, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.cursor >= self.reader.len() {
            return None;
        }
        let item = self.read_section();
        if item.is_err() {
            self.done = true;
        }
        Some(item)
    }
}

impl std::iter::FusedIterator for MonitorSections<'_> {}

/// A monitor event with the monitor that recorded it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorEventRecord {
    pub monitor_id: u32,
    pub source_id: u32,
    pub event: MonitorEvent,
}

#[derive(Debug, Clone)]
pub struct MonitorEvents<'a> {
    sections: MonitorSections<'a>,
    current: Option<MonitorSection<'a>>,
    index: usize,
}

impl Iterator for MonitorEvents<'_> {
    type Item = MonitorEventRecord;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(section) = &self.current {
                if self.index < section.event_count() {
                    let offset = self.index * layout::MONITOR_EVENT_SIZE;
                    let word = word_at(&section.events[offset..], 0);
                    self.index += 1;
                    return Some(MonitorEventRecord {
                        monitor_id: section.monitor_id,
                        source_id: section.source_id,
                        event: MonitorEvent::from_word(word),
                    });
                }
            }
            self.current = Some(self.sections.next()?.ok()?);
            self.index = 0;
        }
    }
}
