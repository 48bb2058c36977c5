use thiserror::Error;

/// Errors returned when decoding a packet header.
///
/// # Examples
/// ```
/// use adara_core::protocol::{PacketHeader, ProtocolError};
///
/// let err = PacketHeader::decode(&[0u8; 3]).unwrap_err();
/// assert!(matches!(err, ProtocolError::Incomplete { needed: 16, actual: 3 }));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Not enough bytes buffered yet; wait for more input.
    #[error("incomplete: need {needed} bytes, got {actual}")]
    Incomplete { needed: usize, actual: usize },
    #[error("malformed packet: {0}")]
    Malformed(#[from] DecodeError),
}

/// Reasons a packet payload cannot be decoded.
///
/// The header is still trusted for framing when one of these is returned,
/// so the parser drops the packet and continues at the next boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("payload too short: need {needed} bytes, got {actual}")]
    TooShort { needed: usize, actual: usize },
    #[error("payload length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("{section} region of {length} bytes is not a multiple of {unit}")]
    Misaligned {
        section: &'static str,
        length: usize,
        unit: usize,
    },
    #[error("{section} at offset {offset} needs {needed} bytes, only {available} remain")]
    Overrun {
        section: &'static str,
        offset: usize,
        needed: usize,
        available: usize,
    },
}
