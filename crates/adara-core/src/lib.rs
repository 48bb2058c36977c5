//! ADARA core library: streaming decode of neutron-instrument live data.
//!
//! This crate turns an append-only byte stream into typed, immutable packet
//! views. The transport fills the [`Parser`] buffer, `parse` frames packets
//! (`protocol`), decodes their payload layout (`packets`) and hands each one
//! to a [`Consumer`]. Decoding is byte-oriented and side-effect free; the
//! only I/O lives in `summary`, which drives a parser from a reader.
//!
//! Invariants:
//! - Framing trusts the header; a malformed payload drops one packet only.
//! - Borrowed packets never outlive their dispatch callback.
//! - Packets larger than the buffer ceiling are streamed in ordered chunks.
//!
//! Version française (résumé):
//! Cette crate décode un flux ADARA : tampon -> en-tête -> variante typée ->
//! consommateur. Les paquets mal formés sont signalés puis ignorés ; les
//! paquets trop grands sont livrés par morceaux. Seul `summary` fait des E/S.
//!
//! # Examples
//! ```no_run
//! use std::path::Path;
//!
//! use adara_core::summary::{SummaryOptions, summarize_file};
//!
//! let report = summarize_file(Path::new("run-1234.adara"), &SummaryOptions::default())?;
//! println!("packets: {}", report.summary.packets_total);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde::{Deserialize, Serialize};

pub mod config;
pub mod packets;
pub mod parser;
pub mod protocol;
pub mod summary;

pub use config::{ConfigError, ParserConfig};
pub use packets::{Variant, decode_variant};
pub use parser::{
    Consumer, Control, Delivery, MalformedPacket, OversizeChunk, PacketHandler, ParseOutcome,
    Parser, ParserError, ParserState, StopReason,
};
pub use protocol::{DecodeError, Packet, PacketHeader, PacketType, ProtocolError};
pub use summary::{
    StreamSummary, SummaryError, SummaryOptions, summarize_file, summarize_reader,
};

/// Current report schema version.
pub const REPORT_VERSION: u32 = 1;
/// Default timestamp used when the stream carries no pulse time.
pub const DEFAULT_GENERATED_AT: &str = "1970-01-01T00:00:00Z";

/// Stream summary report with deterministic ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamReport {
    /// Report schema version (not the binary version).
    pub report_version: u32,
    /// Tool identification metadata.
    pub tool: ToolInfo,
    /// RFC3339 time of the last pulse seen, so reruns produce identical output.
    pub generated_at: String,
    /// Input stream metadata.
    pub input: InputInfo,
    pub summary: StreamSummary,
}

/// Tool metadata embedded in reports.
///
/// # Examples
/// ```
/// use adara_core::ToolInfo;
///
/// let tool = ToolInfo {
///     name: "adara".to_string(),
///     version: "0.1.0".to_string(),
/// };
/// assert_eq!(tool.name, "adara");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    /// Tool version (semver).
    pub version: String,
}

/// Input stream metadata embedded in reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputInfo {
    /// Input path as provided to the summarizer.
    pub path: String,
    /// Input size in bytes.
    pub bytes: u64,
}
