//! Whole-stream summary built on top of the parser.
//!
//! `summarize_reader` plays the transport role: it reads from any
//! `std::io::Read` straight into the parser's fill slice and feeds every
//! delivery into a [`StreamSummary`]. Output ordering is deterministic
//! (maps are `BTreeMap`, runs are kept in stream order).

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::config::{ConfigError, ParserConfig};
use crate::packets::{RunStatusKind, Variant};
use crate::parser::{Consumer, Control, Delivery, MalformedPacket, Parser, ParserError, ParserState};
use crate::protocol::header::PacketType;
use crate::protocol::layout;
use crate::{DEFAULT_GENERATED_AT, InputInfo, REPORT_VERSION, StreamReport, ToolInfo};

/// Most malformed-packet contexts kept in a summary.
pub const MAX_MALFORMED_EXAMPLES: usize = 3;
/// Default size of a single read from the input.
pub const DEFAULT_READ_SIZE: usize = 64 * 1024;

#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Parser error: {0}")]
    Parser(#[from] ParserError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryOptions {
    pub parser: ParserConfig,
    /// Upper bound on bytes requested from the reader per call.
    pub read_size: usize,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            parser: ParserConfig::default(),
            read_size: DEFAULT_READ_SIZE,
        }
    }
}

/// Aggregate counters for one stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamSummary {
    /// Bytes read from the input.
    pub bytes_total: u64,
    /// Packets dispatched, including unknown kinds and oversize packets.
    pub packets_total: u64,
    /// Dispatched packets per kind name.
    pub packet_counts: BTreeMap<String, u64>,
    /// Unknown type codes (`0x%08x`) and how often each was seen.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub unknown_type_codes: BTreeMap<String, u64>,
    pub raw_events: u64,
    pub banked_events: u64,
    pub monitor_events: u64,
    pub oversize_packets: u64,
    pub oversize_bytes: u64,
    pub malformed: MalformedSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_pulse_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_pulse_id: Option<u64>,
    /// RFC3339 time of the first pulse (if any non-zero pulse id was seen).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_end: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beamline: Option<String>,
    /// Run-status changes in stream order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub runs: Vec<RunTransition>,
    /// Bytes left unparsed at end of input (a truncated final packet).
    pub trailing_bytes: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MalformedSummary {
    pub count: u64,
    /// At most three example contexts.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunTransition {
    pub run_number: u32,
    pub file_number: u32,
    pub status: RunStatusKind,
    pub pulse_id: u64,
}

impl StreamSummary {
    fn count_packet(&mut self, kind: Option<PacketType>, type_code: u32, pulse_id: u64) {
        self.packets_total += 1;
        match kind {
            Some(kind) => *self.packet_counts.entry(kind.name().to_string()).or_default() += 1,
            None => {
                *self
                    .unknown_type_codes
                    .entry(format!("0x{type_code:08x}"))
                    .or_default() += 1
            }
        }
        update_pulse_bounds(&mut self.first_pulse_id, &mut self.last_pulse_id, pulse_id);
    }

    fn record(&mut self, variant: &Variant<'_>) {
        match variant {
            Variant::RawEvent(packet) => self.raw_events += packet.events().len() as u64,
            Variant::BankedEvent(packet) => self.banked_events += packet.event_count() as u64,
            Variant::BeamMonitor(packet) => self.monitor_events += packet.event_count() as u64,
            Variant::BeamlineInfo(packet) => {
                self.beamline = Some(packet.short_name().to_string());
            }
            Variant::RunStatus(packet) => {
                let transition = RunTransition {
                    run_number: packet.run_number(),
                    file_number: packet.file_number(),
                    status: packet.status(),
                    pulse_id: packet.packet().pulse_id(),
                };
                let repeated = self.runs.last().is_some_and(|last| {
                    last.run_number == transition.run_number
                        && last.file_number == transition.file_number
                        && last.status == transition.status
                });
                if !repeated {
                    self.runs.push(transition);
                }
            }
            _ => {}
        }
    }

    /// Fills the fields that depend on the final parser state.
    fn finish(&mut self, parser: &Parser) {
        self.trailing_bytes = parser.buffered() as u64;
        if parser.state() != ParserState::Idle {
            tracing::warn!(
                trailing_bytes = self.trailing_bytes,
                state = ?parser.state(),
                "input ended inside a packet"
            );
        }
        self.time_start = self.first_pulse_id.and_then(pulse_to_rfc3339);
        self.time_end = self.last_pulse_id.and_then(pulse_to_rfc3339);
    }
}

impl Consumer for StreamSummary {
    fn deliver(&mut self, delivery: Delivery<'_>) -> Control {
        match delivery {
            Delivery::Complete(variant) => {
                let packet = variant.packet();
                self.count_packet(variant.packet_type(), packet.type_code(), packet.pulse_id());
                self.record(&variant);
            }
            Delivery::Chunk(chunk) => {
                self.oversize_bytes += chunk.bytes.len() as u64;
                if chunk.is_last() {
                    self.oversize_packets += 1;
                    let header = chunk.header;
                    self.count_packet(header.packet_type(), header.type_code, header.pulse_id);
                }
            }
        }
        Control::Continue
    }

    fn malformed(&mut self, error: &MalformedPacket) -> Control {
        self.malformed.count += 1;
        if self.malformed.examples.len() < MAX_MALFORMED_EXAMPLES {
            self.malformed.examples.push(error.to_string());
        }
        Control::Continue
    }
}

/// Summarizes every packet readable from `reader`.
///
/// # Examples
/// ```
/// use adara_core::protocol::{PacketType, frame_packet};
/// use adara_core::summary::{SummaryOptions, summarize_reader};
///
/// let mut stream = frame_packet(PacketType::Heartbeat.code(), 0, &[]);
/// stream.extend(frame_packet(PacketType::Heartbeat.code(), 0, &[]));
///
/// let summary = summarize_reader(stream.as_slice(), &SummaryOptions::default())?;
/// assert_eq!(summary.packets_total, 2);
/// assert_eq!(summary.packet_counts["heartbeat"], 2);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn summarize_reader<R: Read>(
    mut reader: R,
    options: &SummaryOptions,
) -> Result<StreamSummary, SummaryError> {
    let mut parser = Parser::new(options.parser)?;
    let mut summary = StreamSummary::default();
    let read_size = options.read_size.max(1);

    loop {
        let Some(tail) = parser.fill_slice() else {
            parser.parse(&mut summary, None)?;
            continue;
        };
        let limit = tail.len().min(read_size);
        let n = match reader.read(&mut tail[..limit]) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };
        parser.bytes_appended(n)?;
        summary.bytes_total += n as u64;
        parser.parse(&mut summary, None)?;
    }

    summary.finish(&parser);
    Ok(summary)
}

/// Summarizes a captured stream file into a report.
pub fn summarize_file(path: &Path, options: &SummaryOptions) -> Result<StreamReport, SummaryError> {
    let file = File::open(path)?;
    let bytes = file.metadata()?.len();
    let summary = summarize_reader(io::BufReader::new(file), options)?;
    let generated_at = summary
        .time_end
        .clone()
        .or_else(|| summary.time_start.clone())
        .unwrap_or_else(|| DEFAULT_GENERATED_AT.to_string());
    Ok(StreamReport {
        report_version: REPORT_VERSION,
        tool: ToolInfo {
            name: "adara".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        generated_at,
        input: InputInfo {
            path: path.display().to_string(),
            bytes,
        },
        summary,
    })
}

/// Formats a pulse id (EPICS seconds high, nanoseconds low) as RFC3339.
pub fn pulse_to_rfc3339(pulse_id: u64) -> Option<String> {
    let seconds = i128::from(pulse_id >> 32) + i128::from(layout::EPICS_EPOCH_OFFSET);
    let nanos = i128::from(pulse_id & 0xffff_ffff);
    OffsetDateTime::from_unix_timestamp_nanos(seconds * 1_000_000_000 + nanos)
        .ok()
        .and_then(|dt| dt.format(&Rfc3339).ok())
}

fn update_pulse_bounds(first: &mut Option<u64>, last: &mut Option<u64>, pulse_id: u64) {
    // zero marks packets that are not tied to a pulse
    if pulse_id == 0 {
        return;
    }
    if first.is_none_or(|existing| pulse_id < existing) {
        *first = Some(pulse_id);
    }
    if last.is_none_or(|existing| pulse_id > existing) {
        *last = Some(pulse_id);
    }
}
