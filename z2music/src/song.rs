//! Songs: a deduplicated pattern list and the sequence that plays it

use crate::pattern::Pattern;
use crate::rom::{Tables, image::Image};
use std::collections::HashMap;

/// One music track: unique patterns plus an ordered sequence of indices into them
///
/// The same pattern may appear at any number of sequence positions; two sequence
/// steps pointing at the same source bytes decode to the same in-memory pattern.
#[derive(Debug, Clone, Default)]
pub struct Song {
    patterns: Vec<Pattern>,
    sequence: Vec<usize>,
}

impl Song {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a song from a section's song table
    ///
    /// `address` is the section base, `entry` the physical slot in the 8-byte song
    /// table. Walking the sequence bytes, each distinct pattern-metadata offset is
    /// decoded once and reused for every later step that names it.
    pub fn from_image(image: &Image, address: usize, entry: usize, tables: &Tables) -> Self {
        let mut song = Self::new();

        if entry > 7 {
            return song;
        }

        let table = image.read(address, 8);
        let sequence_address = address + table[entry] as usize;

        let mut seen: HashMap<u8, usize> = HashMap::new();
        for i in 0.. {
            let offset = image.get(sequence_address + i);
            if offset == 0x00 {
                break;
            }

            let index = *seen.entry(offset).or_insert_with(|| {
                song.patterns
                    .push(Pattern::from_image(image, address + offset as usize, tables));
                song.patterns.len() - 1
            });
            song.sequence.push(index);
        }

        song
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub fn patterns_mut(&mut self) -> &mut [Pattern] {
        &mut self.patterns
    }

    pub fn add_pattern(&mut self, pattern: Pattern) {
        self.patterns.push(pattern);
    }

    pub fn sequence(&self) -> &[usize] {
        &self.sequence
    }

    pub fn set_sequence(&mut self, sequence: Vec<usize>) {
        self.sequence = sequence;
    }

    pub fn append_sequence(&mut self, index: usize) {
        self.sequence.push(index);
    }

    /// The pattern playing at a sequence position
    pub fn at(&self, position: usize) -> Option<&Pattern> {
        self.patterns.get(*self.sequence.get(position)?)
    }

    /// Does the song play anything at all?
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    pub fn clear(&mut self) {
        self.patterns.clear();
        self.sequence.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake;
    use crate::note::Note;
    use crate::pattern::Channel;
    use crate::rom::BANK_OFFSET;

    #[test]
    fn duplicate_sequence_steps_share_one_pattern() {
        let mut rom = fake::rom();

        // A section at 0x9000: song table, a two-step sequence naming the same
        // pattern offset twice, the pattern metadata, its note data
        let base = BANK_OFFSET + 0x9000;
        let image = rom.image_mut();
        image.write(base, &[8, 11, 11, 11, 11, 11, 11, 11]); // song table
        image.write(base + 8, &[0x0c, 0x0c, 0x00]); // sequence
        image.put(base + 11, 0x00); // the empty song
        image.write(base + 12, &[0x18, 0x12, 0x90, 0x00, 0x00, 0x00]); // metadata
        image.write(base + 18, &[0xa2, 0xe8, 0x00]); // note data at 0x9012

        let song = Song::from_image(rom.image(), base, 0, rom.tables());

        assert_eq!(song.sequence(), &[0, 0]);
        assert_eq!(song.patterns().len(), 1);
        assert_eq!(song.patterns()[0].notes(Channel::Pulse1).len(), 2);
        assert_eq!(song.at(0).unwrap(), song.at(1).unwrap());
    }

    #[test]
    fn empty_entry_decodes_to_an_empty_song() {
        let rom = fake::rom();

        let song = Song::from_image(rom.image(), BANK_OFFSET + 0x9000, 8, rom.tables());
        assert!(song.is_empty());
        assert_eq!(song.patterns().len(), 0);
    }

    #[test]
    fn sequence_positions_resolve_patterns() {
        let mut song = Song::new();
        song.add_pattern(Pattern::with_notes(
            0x18,
            vec![Note::rest(Note::QUARTER)],
            vec![],
            vec![],
            vec![],
        ));
        song.add_pattern(Pattern::new(0x10));
        song.set_sequence(vec![1, 0, 1]);

        assert_eq!(song.at(0).unwrap().tempo(), 0x10);
        assert_eq!(song.at(1).unwrap().tempo(), 0x18);
        assert!(song.at(3).is_none());
    }
}
