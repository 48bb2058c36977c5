use std::ops::Range;

use super::error::DecodeError;
use super::layout;

/// Bounds-checked little-endian access to a packet payload.
///
/// Every read either returns data from inside the payload or a
/// `DecodeError`; nothing here indexes past the declared length.
#[derive(Debug, Clone, Copy)]
pub struct PayloadReader<'a> {
    payload: &'a [u8],
}

impl<'a> PayloadReader<'a> {
    pub fn new(payload: &'a [u8]) -> Self {
        Self { payload }
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    pub fn require_len(&self, needed: usize) -> Result<(), DecodeError> {
        if self.payload.len() < needed {
            return Err(DecodeError::TooShort {
                needed,
                actual: self.payload.len(),
            });
        }
        Ok(())
    }

    pub fn require_exact_len(&self, expected: usize) -> Result<(), DecodeError> {
        if self.payload.len() != expected {
            return Err(DecodeError::LengthMismatch {
                expected,
                actual: self.payload.len(),
            });
        }
        Ok(())
    }

    pub fn require_multiple_of(
        &self,
        section: &'static str,
        start: usize,
        unit: usize,
    ) -> Result<(), DecodeError> {
        let length = self.payload.len().saturating_sub(start);
        if length % unit != 0 {
            return Err(DecodeError::Misaligned {
                section,
                length,
                unit,
            });
        }
        Ok(())
    }

    pub fn read_slice(&self, range: Range<usize>) -> Result<&'a [u8], DecodeError> {
        self.payload.get(range.clone()).ok_or(DecodeError::TooShort {
            needed: range.end,
            actual: self.payload.len(),
        })
    }

    pub fn read_u32_le(&self, offset: usize) -> Result<u32, DecodeError> {
        let bytes = self.read_slice(offset..offset + 4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_u64_le(&self, offset: usize) -> Result<u64, DecodeError> {
        let bytes = self.read_slice(offset..offset + 8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(raw))
    }

    pub fn read_f64_le(&self, offset: usize) -> Result<f64, DecodeError> {
        self.read_u64_le(offset).map(f64::from_bits)
    }

    /// Reads the `index`-th 32-bit word of the payload.
    pub fn read_word(&self, index: usize) -> Result<u32, DecodeError> {
        self.read_u32_le(index * layout::WORD_SIZE)
    }

    /// Reads `length` bytes of text starting at `offset`.
    ///
    /// Invalid UTF-8 is replaced with U+FFFD and trailing NUL padding is
    /// dropped. A length that runs past the payload is an overrun.
    pub fn read_text(
        &self,
        section: &'static str,
        offset: usize,
        length: usize,
    ) -> Result<String, DecodeError> {
        let bytes = self.read_section(section, offset, length)?;
        let raw = String::from_utf8_lossy(bytes);
        Ok(raw.trim_end_matches('\0').to_string())
    }

    /// Reads a `length`-byte region, reporting an overrun by section name.
    pub fn read_section(
        &self,
        section: &'static str,
        offset: usize,
        length: usize,
    ) -> Result<&'a [u8], DecodeError> {
        let available = self.payload.len().saturating_sub(offset);
        if length > available {
            return Err(DecodeError::Overrun {
                section,
                offset,
                needed: length,
                available,
            });
        }
        Ok(&self.payload[offset..offset + length])
    }
}

/// Reads a word from a payload that was validated at construction.
///
/// Typed packets validate their fixed words once; accessors then use this
/// helper, which yields 0 instead of panicking if that contract is broken.
pub(crate) fn word_at(payload: &[u8], index: usize) -> u32 {
    let offset = index * layout::WORD_SIZE;
    payload
        .get(offset..offset + layout::WORD_SIZE)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::{PayloadReader, word_at};
    use crate::protocol::error::DecodeError;

    #[test]
    fn read_word_is_little_endian() {
        let payload = [0x01, 0x02, 0x03, 0x04, 0xff, 0x00, 0x00, 0x00];
        let reader = PayloadReader::new(&payload);
        assert_eq!(reader.read_word(0).unwrap(), 0x0403_0201);
        assert_eq!(reader.read_word(1).unwrap(), 0xff);
    }

    #[test]
    fn read_word_past_end_is_too_short() {
        let payload = [0u8; 6];
        let reader = PayloadReader::new(&payload);
        let err = reader.read_word(1).unwrap_err();
        assert_eq!(err, DecodeError::TooShort { needed: 8, actual: 6 });
    }

    #[test]
    fn read_text_replaces_invalid_utf8_and_trims_padding() {
        let payload = [b'o', b'k', 0xff, b'!', 0, 0];
        let reader = PayloadReader::new(&payload);
        let text = reader.read_text("comment", 0, payload.len()).unwrap();
        assert_eq!(text, "ok\u{fffd}!");
    }

    #[test]
    fn read_text_overrun() {
        let payload = [b'a'; 4];
        let reader = PayloadReader::new(&payload);
        let err = reader.read_text("comment", 2, 8).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Overrun {
                section: "comment",
                offset: 2,
                needed: 8,
                available: 2
            }
        ));
    }

    #[test]
    fn misaligned_region_is_reported() {
        let payload = [0u8; 10];
        let reader = PayloadReader::new(&payload);
        assert!(reader.require_multiple_of("events", 2, 8).is_ok());
        let err = reader.require_multiple_of("events", 0, 8).unwrap_err();
        assert!(err.to_string().contains("not a multiple of 8"));
    }

    #[test]
    fn word_at_out_of_range_is_zero() {
        let payload = [1u8, 0, 0, 0];
        assert_eq!(word_at(&payload, 0), 1);
        assert_eq!(word_at(&payload, 1), 0);
    }
}
