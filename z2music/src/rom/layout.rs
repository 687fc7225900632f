//! The contiguous section layout: song table, sequences, pattern metadata, note data
//!
//! Addresses of later tables depend on the accumulated sizes of earlier ones, but
//! every size is computable before any address is assigned (they depend only on
//! note counts and tempo), so a single forward accumulation pass suffices. The
//! whole section is assembled into one buffer and only blitted into the image once
//! every section has encoded successfully.

use crate::rom::{CommitError, Tables};
use crate::song::Song;
use crate::track::Section;

/// The 8-slot song table at the head of every section
const SONG_TABLE_LEN: usize = 8;

/// Serialize a section's songs into the byte block that lives at `base`
///
/// `songs` must follow the section's fixed track order; the alias table maps the
/// eight physical slots onto them.
pub(crate) fn serialize_section(
    section: Section,
    songs: &[&Song],
    base: usize,
    tables: &mut Tables,
) -> Result<Vec<u8>, CommitError> {
    let too_large = || CommitError::SectionTooLarge { section };
    let offset_of = |value: usize| u8::try_from(value).map_err(|_| too_large());

    // Song table: each slot holds the start offset of its song's sequence data,
    // accumulated across the section's songs. One extra trailing offset is the
    // shared empty "no song" sequence.
    let mut offset = SONG_TABLE_LEN;
    let mut sequence_offsets = Vec::with_capacity(songs.len() + 1);
    for song in songs {
        sequence_offsets.push(offset_of(offset)?);
        offset += song.sequence().len() + 1;
    }
    sequence_offsets.push(offset_of(offset)?);

    let mut block = Vec::new();
    for slot in section.alias_table() {
        block.push(sequence_offsets[slot]);
    }

    // Every pattern's metadata offset, assigned per song in pattern-list order.
    // These land in sequence bytes, so each one must fit the byte it is stored in.
    let first_pattern = offset + 1;
    let mut pattern_offsets = Vec::with_capacity(songs.len());
    let mut pattern_offset = first_pattern;
    for song in songs {
        let mut offsets = Vec::with_capacity(song.patterns().len());
        for pattern in song.patterns() {
            offsets.push(offset_of(pattern_offset)?);
            pattern_offset += pattern.metadata_length();
        }
        pattern_offsets.push(offsets);
    }

    // Sequence tables: per-step pattern-metadata offsets, null-terminated, plus
    // the lone terminator of the empty song
    for (song, offsets) in songs.iter().zip(&pattern_offsets) {
        for step in song.sequence() {
            block.push(offsets[*step]);
        }
        block.push(0x00);
    }
    block.push(0x00);

    debug_assert_eq!(block.len(), first_pattern);

    // Pattern metadata and note data: metadata blocks in order, then every
    // pattern's note bytes contiguously after them, each metadata block filled
    // with the address its note data lands at
    let mut metadata = Vec::with_capacity(pattern_offset - first_pattern);
    let mut note_data = Vec::new();
    let mut note_address = base + pattern_offset;

    for song in songs {
        for pattern in song.patterns() {
            let notes = pattern.note_data(tables)?;
            metadata.extend(pattern.meta_data((note_address & 0xffff) as u16)?);
            note_address += notes.len();
            note_data.extend(notes);
        }
    }

    block.extend(metadata);
    block.extend(note_data);

    Ok(block)
}
