//! The deduplicating pitch table mapping tones to compact byte indices

use crate::pitch::Pitch;
use crate::rom::image::Image;
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::warn;

/// An ordered, deduplicated table of the pitches used by one music section
///
/// Note bytes refer to pitches by table index. Each entry occupies two bytes in the
/// image (big-endian timer period), so position *n* in the table is index *2n*.
/// Index 2 permanently holds the rest sentinel; it is seeded when the table grows
/// past its second position and is never reassigned.
#[derive(Debug, Clone, Default)]
pub struct PitchLut {
    entries: Vec<Pitch>,
    capacity: usize,
}

impl PitchLut {
    /// The number of entries in the in-game pitch table
    pub const GAME_CAPACITY: usize = 32;

    /// The number of entries in the title-music pitch table
    pub const TITLE_CAPACITY: usize = 64;

    /// The reserved index of the rest sentinel
    pub const REST_INDEX: u8 = 2;

    /// Construct an empty table holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
        }
    }

    /// Read a table from its on-disk layout: `capacity` big-endian timer periods
    ///
    /// Trailing zero entries are unpopulated slots and are trimmed; interior zeroes
    /// (the reserved rest slot) are kept.
    pub fn from_image(image: &Image, address: usize, capacity: usize) -> Self {
        let mut entries: Vec<Pitch> = (0..capacity)
            .map(|i| Pitch::new(image.get_word_be(address + i * 2)))
            .collect();

        while entries.last().is_some_and(Pitch::is_rest) {
            entries.pop();
        }

        Self { entries, capacity }
    }

    /// The number of occupied entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Does the table hold any pitches at all?
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The maximum number of entries the on-disk table can hold
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The pitch stored at a byte index
    ///
    /// Out-of-range indices decode as a rest, so that best-effort reads of imperfect
    /// images keep going.
    pub fn at(&self, index: u8) -> Pitch {
        match self.entries.get(index as usize / 2) {
            Some(pitch) => *pitch,
            None => {
                warn!("no pitch at index {index:#04x}, substituting a rest");
                Pitch::REST
            }
        }
    }

    /// The byte index of a pitch, if present
    pub fn index_for(&self, pitch: Pitch) -> Option<u8> {
        if pitch.is_rest() {
            return Some(Self::REST_INDEX);
        }

        self.entries
            .iter()
            .position(|entry| *entry == pitch)
            .map(|position| (position * 2) as u8)
    }

    /// Is a pitch present in the table?
    pub fn has_pitch(&self, pitch: Pitch) -> bool {
        self.index_for(pitch).is_some()
    }

    /// Add a pitch, returning its byte index
    ///
    /// Rests always map to the reserved index. A pitch already in the table returns
    /// its existing index rather than occupying a second slot.
    pub fn add_pitch(&mut self, pitch: Pitch) -> Result<u8, LutCapacityExceeded> {
        if let Some(index) = self.index_for(pitch) {
            return Ok(index);
        }

        // The reserved rest slot is seeded the first time the table grows past it
        let seed_rest = self.entries.len() == 1;
        let occupied = self.entries.len() + usize::from(seed_rest);

        if occupied >= self.capacity {
            return Err(LutCapacityExceeded {
                required: occupied + 1,
                capacity: self.capacity,
            });
        }

        if seed_rest {
            self.entries.push(Pitch::REST);
        }

        self.entries.push(pitch);
        Ok(((self.entries.len() - 1) * 2) as u8)
    }

    /// Regenerate the table from the set of pitches actually in use
    ///
    /// `used` is the deduplicated set collected from every note of every song this
    /// table serves (ascending by frequency); `sfx` lists sound-effect pitches in
    /// encounter order, appended after the song pitches. Slot 0 receives the lowest
    /// used song pitch, index 2 the rest sentinel, and the remainder follow at
    /// subsequent even indices. On a capacity failure the table is left unchanged.
    ///
    /// Any note encoding computed before a rebuild is invalid afterwards.
    pub fn rebuild(
        &mut self,
        used: &BTreeSet<Pitch>,
        sfx: &[Pitch],
    ) -> Result<(), LutCapacityExceeded> {
        let mut unique: BTreeSet<Pitch> = used.iter().copied().filter(|p| !p.is_rest()).collect();
        unique.extend(sfx.iter().copied().filter(|p| !p.is_rest()));

        // One slot is always spent on the reserved rest index
        if unique.len() > self.capacity - 1 {
            return Err(LutCapacityExceeded {
                required: unique.len() + 1,
                capacity: self.capacity,
            });
        }

        self.entries.clear();
        for pitch in used.iter().filter(|p| !p.is_rest()) {
            self.add_pitch(*pitch)?;
        }
        for pitch in sfx {
            self.add_pitch(*pitch)?;
        }

        Ok(())
    }

    /// Write the table back to its on-disk layout, zero-padding unused slots
    pub fn commit(&self, image: &mut Image, address: usize) {
        for i in 0..self.capacity {
            let timer = self.entries.get(i).map_or(0, Pitch::timer);
            image.put_word_be(address + i * 2, timer);
        }
    }
}

/// Error for when more unique pitches are in use than the table has slots
#[derive(Debug, Error, PartialEq, Eq)]
#[error("the pitch table needs {required} slots but only has {capacity}")]
pub struct LutCapacityExceeded {
    /// The number of slots the pitches in use would occupy, including the rest slot
    pub required: usize,

    /// The table's fixed on-disk capacity
    pub capacity: usize,
}

/// Error for when an encode references a pitch absent from the active table
#[derive(Debug, Error, PartialEq)]
#[error("pitch {0} is not in the active pitch table")]
pub struct PitchNotFound(pub Pitch);
