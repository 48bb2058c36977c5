use crate::protocol::error::DecodeError;
use crate::protocol::layout;
use crate::protocol::packet::Packet;
use crate::protocol::reader::{PayloadReader, word_at};

/// Physical-to-logical pixel mapping table.
///
/// Sections of `[base_logical_id, bank_id:16 | pixel_count:16]` followed by
/// `pixel_count` physical pixel ids. Logical ids run consecutively from the
/// base id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelMapping<'a> {
    packet: Packet<'a>,
    section_count: usize,
}

impl<'a> PixelMapping<'a> {
    pub fn decode(packet: Packet<'a>) -> Result<Self, DecodeError> {
        let mut section_count = 0;
        for section in MappingSections::new(packet.payload()) {
            section?;
            section_count += 1;
        }
        Ok(Self {
            packet,
            section_count,
        })
    }

    pub fn packet(&self) -> &Packet<'a> {
        &self.packet
    }

    pub fn into_owned(self) -> PixelMapping<'static> {
        PixelMapping {
            packet: self.packet.into_owned(),
            section_count: self.section_count,
        }
    }

    pub fn section_count(&self) -> usize {
        self.section_count
    }

    pub fn sections(&self) -> MappingSections<'_> {
        MappingSections::new(self.packet.payload())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingSection<'a> {
    pub base_logical_id: u32,
    pub bank_id: u16,
    physical_ids: &'a [u8],
}

impl<'a> MappingSection<'a> {
    pub fn pixel_count(&self) -> usize {
        self.physical_ids.len() / layout::WORD_SIZE
    }

    /// `(logical_id, physical_id)` pairs of this section.
    pub fn pairs(&self) -> impl Iterator<Item = (u32, u32)> + 'a {
        let base = self.base_logical_id;
        let ids = self.physical_ids;
        (0..ids.len() / layout::WORD_SIZE)
            .map(move |i| (base.wrapping_add(i as u32), word_at(ids, i)))
    }
}

/// Cursor over mapping sections; fused after the first error.
#[derive(Debug, Clone)]
pub struct MappingSections<'a> {
    reader: PayloadReader<'a>,
    cursor: usize,
    done: bool,
}

impl<'a> MappingSections<'a> {
    fn new(payload: &'a [u8]) -> Self {
        Self {
            reader: PayloadReader::new(payload),
            cursor: 0,
            done: false,
        }
    }

    fn read_section(&mut self) -> Result<MappingSection<'a>, DecodeError> {
        let header = self.reader.read_section(
            "mapping section",
            self.cursor,
            layout::PIXEL_MAP_SECTION_SIZE,
        )?;
        let packed = word_at(header, 1);
        let count = (packed & layout::SHORT_LENGTH_MASK) as usize;
        let ids_at = self.cursor + layout::PIXEL_MAP_SECTION_SIZE;
        let length = count * layout::WORD_SIZE;
        let physical_ids = self.reader.read_section("physical ids", ids_at, length)?;
        self.cursor = ids_at + length;
        Ok(MappingSection {
            base_logical_id: word_at(header, 0),
            bank_id: (packed >> 16) as u16,
            physical_ids,
        })
    }
}

impl<'a> Iterator for MappingSections<'a> {
    type Item = Result<MappingSection<'a>, DecodeError>;

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

impl std::iter::FusedIterator for MappingSections<'_> {}

#[cfg(test)]
mod tests {
    use super::PixelMapping;
    use crate::protocol::error::DecodeError;
    use crate::protocol::header::{PacketType, frame_packet};
    use crate::protocol::packet::Packet;

    fn decode(words: &[u32]) -> Result<PixelMapping<'static>, DecodeError> {
        let body: Vec<u8> = words.iter().flat_map(|w| w.to_le_bytes()).collect();
        let bytes = frame_packet(PacketType::PixelMapping.code(), 0, &body);
        PixelMapping::decode(Packet::from_vec(bytes).unwrap())
    }

    #[test]
    fn maps_logical_to_physical() {
        let map = decode(&[1000, (3 << 16) | 2, 77, 78, 2000, (4 << 16) | 1, 90]).unwrap();
        assert_eq!(map.section_count(), 2);
        let sections: Vec<_> = map.sections().map(Result::unwrap).collect();
        assert_eq!(sections[0].bank_id, 3);
        assert_eq!(sections[0].pixel_count(), 2);
        assert_eq!(
            sections[0].pairs().collect::<Vec<_>>(),
            vec![(1000, 77), (1001, 78)]
        );
        assert_eq!(sections[1].pairs().collect::<Vec<_>>(), vec![(2000, 90)]);
    }

    #[test]
    fn empty_table_is_valid() {
        let map = decode(&[]).unwrap();
        assert_eq!(map.section_count(), 0);
    }

    #[test]
    fn overstated_pixel_count_is_overrun() {
        let err = decode(&[1000, 3, 77]).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Overrun {
                section: "physical ids",
                ..
            }
        ));
    }
}
