//! ADARA wire framing.
//!
//! Follows the same layering as the packet decoders:
//! - `layout`: byte offsets, masks and type codes (source of truth)
//! - `reader`: bounds-checked payload access
//! - `header` / `packet`: framing of a single packet
//! - `error`: explicit, actionable errors
//!
//! Nothing here performs I/O or owns a buffer; see `parser` for that.

pub mod error;
pub mod header;
pub mod layout;
pub mod packet;
pub mod reader;

pub use error::{DecodeError, ProtocolError};
pub use header::{PacketHeader, PacketType, frame_packet};
pub use packet::Packet;
pub use reader::PayloadReader;
