use thiserror::Error;

use crate::protocol::error::DecodeError;

/// Fatal parser errors.
///
/// These indicate a transport-layer bug rather than bad stream contents;
/// the stream should be abandoned (or the parser reset) when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParserError {
    #[error("appended {requested} bytes but only {available} bytes were writable")]
    Overflow { requested: usize, available: usize },
    #[error("buffer invariant violated: {0}")]
    InvariantViolated(&'static str),
}

/// A packet whose payload did not match its layout.
///
/// The packet has been dropped; parsing continues at the next header.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "malformed packet type 0x{type_code:08x} pulse 0x{pulse_id:016x} \
     at stream offset {offset}: {reason}"
)]
pub struct MalformedPacket {
    pub type_code: u32,
    pub pulse_id: u64,
    /// Byte offset of the packet header from the start of the stream.
    pub offset: u64,
    #[source]
    pub reason: DecodeError,
}
