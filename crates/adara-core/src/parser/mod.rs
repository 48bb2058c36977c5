//! Buffer and dispatch engine.
//!
//! The transport writes into the parser's arena (`fill_slice` +
//! `bytes_appended`, or `append`), then calls `parse`, which frames
//! packets, decodes their variants and hands them to a [`Consumer`].
//!
//! Packets dispatched as `Delivery::Complete` borrow the arena and live
//! only for the callback. Packets longer than `max_capacity` are never
//! buffered whole; their payload is streamed as `Delivery::Chunk`s.

pub(crate) mod buffer;
pub mod consumer;
pub mod error;

pub use consumer::{Consumer, Control, Delivery, OversizeChunk, PacketHandler};
pub use error::{MalformedPacket, ParserError};

use buffer::RawBuffer;

use crate::config::{ConfigError, ParserConfig};
use crate::packets::decode_variant;
use crate::protocol::header::PacketHeader;
use crate::protocol::layout;
use crate::protocol::packet::Packet;

/// Observable parser state, derived from the buffer on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    /// No partial packet: the buffer is empty or holds a complete packet.
    Idle,
    /// Fewer than 16 unconsumed bytes.
    AwaitingHeader,
    /// Header decoded, payload not fully buffered.
    AwaitingPayload,
    /// Streaming the payload of an oversize packet.
    Oversize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Not enough buffered bytes for the next step.
    NeedMoreData,
    /// The consumer returned `Control::Stop`.
    Interrupted,
    /// `max_packets` dispatches were reached.
    PacketLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOutcome {
    pub dispatched: usize,
    pub stopped: StopReason,
}

impl ParseOutcome {
    pub fn interrupted(&self) -> bool {
        self.stopped == StopReason::Interrupted
    }
}

#[derive(Debug, Clone, Copy)]
struct OversizeState {
    header: PacketHeader,
    delivered: u64,
}

impl OversizeState {
    fn remaining(&self) -> u64 {
        u64::from(self.header.payload_length) - self.delivered
    }
}

/// Streaming ADARA packet parser.
///
/// # Examples
/// ```
/// use adara_core::packets::RunStatus;
/// use adara_core::protocol::{PacketType, frame_packet};
/// use adara_core::{Control, PacketHandler, Parser, StopReason};
///
/// #[derive(Default)]
/// struct Runs(Vec<u32>);
///
/// impl PacketHandler for Runs {
///     fn run_status(&mut self, packet: RunStatus<'_>) -> Control {
///         self.0.push(packet.run_number());
///         Control::Continue
///     }
/// }
///
/// let mut body = 42u32.to_le_bytes().to_vec();
/// body.extend_from_slice(&[0u8; 8]);
/// let bytes = frame_packet(PacketType::RunStatus.code(), 0, &body);
///
/// let mut parser = Parser::default();
/// assert_eq!(parser.append(&bytes), bytes.len());
/// let mut runs = Runs::default();
/// let outcome = parser.parse(&mut runs, None)?;
/// assert_eq!(outcome.dispatched, 1);
/// assert_eq!(outcome.stopped, StopReason::NeedMoreData);
/// assert_eq!(runs.0, vec![42]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct Parser {
    buffer: RawBuffer,
    oversize: Option<OversizeState>,
    stream_offset: u64,
}

impl Default for Parser {
    fn default() -> Self {
        let config = ParserConfig::default();
        Self::from_valid(config)
    }
}

impl Parser {
    pub fn new(config: ParserConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::from_valid(config))
    }

    fn from_valid(config: ParserConfig) -> Self {
        Self {
            buffer: RawBuffer::new(config.initial_capacity, config.max_capacity),
            oversize: None,
            stream_offset: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    pub fn max_capacity(&self) -> usize {
        self.buffer.max_capacity()
    }

    /// Bytes appended but not yet dispatched.
    pub fn buffered(&self) -> usize {
        self.buffer.available()
    }

    /// Stream offset of the next unconsumed byte.
    pub fn stream_offset(&self) -> u64 {
        self.stream_offset
    }

    pub fn state(&self) -> ParserState {
        if self.oversize.is_some() {
            return ParserState::Oversize;
        }
        let pending = self.buffer.unconsumed();
        if pending.is_empty() {
            return ParserState::Idle;
        }
        match PacketHeader::decode(pending) {
            Err(_) => ParserState::AwaitingHeader,
            Ok(header)
                if header.packet_length() <= self.max_capacity() as u64
                    && (pending.len() as u64) < header.packet_length() =>
            {
                ParserState::AwaitingPayload
            }
            Ok(_) => ParserState::Idle,
        }
    }

    /// Writable tail of the buffer for the transport to read into.
    ///
    /// Returns `None` when the buffer is at `max_capacity` and nothing has
    /// been consumed; call `parse` before filling again.
    pub fn fill_slice(&mut self) -> Option<&mut [u8]> {
        let tail = self.buffer.tail_mut();
        if tail.is_empty() { None } else { Some(tail) }
    }

    /// Length of the writable tail as of the last `fill_slice`.
    pub fn fill_length(&self) -> usize {
        self.buffer.writable()
    }

    /// Marks `n` bytes written into the fill slice as buffered.
    ///
    /// # Errors
    /// `ParserError::Overflow` if `n` exceeds `fill_length()`.
    pub fn bytes_appended(&mut self, n: usize) -> Result<(), ParserError> {
        self.buffer.commit(n)
    }

    /// Copies as much of `bytes` as fits; returns the number copied.
    pub fn append(&mut self, bytes: &[u8]) -> usize {
        let mut copied = 0;
        while copied < bytes.len() {
            let Some(tail) = self.fill_slice() else {
                break;
            };
            let n = tail.len().min(bytes.len() - copied);
            tail[..n].copy_from_slice(&bytes[copied..copied + n]);
            // n never exceeds the tail just handed out
            if self.bytes_appended(n).is_err() {
                break;
            }
            copied += n;
        }
        copied
    }

    /// Frames and dispatches buffered packets.
    ///
    /// Stops when fewer bytes than the next step needs are buffered, when
    /// the consumer returns `Control::Stop`, or after `max_packets`
    /// dispatches. Malformed packets are reported through
    /// `Consumer::malformed` and do not count as dispatched; an oversize
    /// packet counts once, on its final chunk.
    pub fn parse<C>(
        &mut self,
        consumer: &mut C,
        max_packets: Option<usize>,
    ) -> Result<ParseOutcome, ParserError>
    where
        C: Consumer + ?Sized,
    {
        self.buffer.check()?;
        let mut dispatched = 0;
        let stopped = loop {
            if max_packets.is_some_and(|limit| dispatched >= limit) {
                break StopReason::PacketLimit;
            }

            if let Some(state) = self.oversize {
                let available = self.buffer.available();
                if available == 0 {
                    break StopReason::NeedMoreData;
                }
                let take = usize::try_from(state.remaining())
                    .map_or(available, |remaining| remaining.min(available));
                let chunk = OversizeChunk {
                    header: state.header,
                    bytes: &self.buffer.unconsumed()[..take],
                    offset: state.delivered,
                    total: u64::from(state.header.payload_length),
                };
                let last = chunk.is_last();
                let control = consumer.deliver(Delivery::Chunk(chunk));
                self.advance(take);
                if last {
                    tracing::debug!(
                        type_code = state.header.type_code,
                        length = state.header.payload_length,
                        "oversize packet complete"
                    );
                    self.oversize = None;
                    dispatched += 1;
                } else {
                    self.oversize = Some(OversizeState {
                        delivered: state.delivered + take as u64,
                        ..state
                    });
                }
                if control == Control::Stop {
                    break StopReason::Interrupted;
                }
                continue;
            }

            let Ok(header) = PacketHeader::decode(self.buffer.unconsumed()) else {
                break StopReason::NeedMoreData;
            };
            let packet_length = header.packet_length();

            if packet_length > self.max_capacity() as u64 {
                tracing::debug!(
                    type_code = header.type_code,
                    length = header.payload_length,
                    max_capacity = self.max_capacity(),
                    "oversize packet, streaming payload in chunks"
                );
                self.advance(layout::HEADER_SIZE);
                self.oversize = Some(OversizeState {
                    header,
                    delivered: 0,
                });
                continue;
            }

            // bounded by max_capacity, which is a usize
            let packet_length = packet_length as usize;
            if self.buffer.available() < packet_length {
                if packet_length > self.capacity() {
                    self.buffer.grow(packet_length)?;
                }
                break StopReason::NeedMoreData;
            }

            let offset = self.stream_offset;
            let bytes = &self.buffer.unconsumed()[..packet_length];
            let control = match decode_variant(Packet::from_parts(header, bytes)) {
                Ok(variant) => {
                    tracing::trace!(
                        type_code = header.type_code,
                        pulse_id = header.pulse_id,
                        offset,
                        "dispatching packet"
                    );
                    dispatched += 1;
                    consumer.deliver(Delivery::Complete(variant))
                }
                Err(reason) => {
                    let error = MalformedPacket {
                        type_code: header.type_code,
                        pulse_id: header.pulse_id,
                        offset,
                        reason,
                    };
                    tracing::warn!(%error, "dropping malformed packet");
                    consumer.malformed(&error)
                }
            };
            self.advance(packet_length);
            if control == Control::Stop {
                break StopReason::Interrupted;
            }
        };
        self.buffer.compact();
        Ok(ParseOutcome {
            dispatched,
            stopped,
        })
    }

    /// Drops all buffered bytes and any oversize packet in progress.
    ///
    /// Use after a stream discontinuity; stream offsets restart at 0.
    pub fn reset(&mut self) {
        tracing::debug!(
            discarded = self.buffer.available(),
            oversize = self.oversize.is_some(),
            "parser reset"
        );
        self.buffer.clear();
        self.oversize = None;
        self.stream_offset = 0;
    }

    fn advance(&mut self, n: usize) {
        self.buffer.consume(n);
        self.stream_offset += n as u64;
    }
}
