//! Sound-effect note lists: raw pitch-index arrays outside the pattern data
//!
//! A handful of sound effects play short arpeggios straight out of pitch-index
//! byte arrays. They matter to the codec because they share the in-game pitch
//! table: their pitches count toward the rebuild, and their bytes must be
//! rewritten whenever the table is.

use crate::pitch::Pitch;
use crate::pitch_lut::{PitchLut, PitchNotFound};
use crate::rom::image::Image;

/// One sound effect's notes and where its bytes live
#[derive(Debug, Clone)]
pub struct SfxNotes {
    address: usize,
    notes: Vec<Pitch>,
}

impl SfxNotes {
    /// Decode `count` pitch-index bytes through the active pitch table
    pub fn from_image(image: &Image, address: usize, count: usize, pitches: &PitchLut) -> Self {
        let notes = (0..count)
            .map(|i| pitches.at(image.get(address + i)))
            .collect();

        Self { address, notes }
    }

    /// The address the bytes were read from and will be written back to
    pub fn address(&self) -> usize {
        self.address
    }

    pub fn pitches(&self) -> &[Pitch] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Re-encode the notes as index bytes against a (freshly rebuilt) pitch table
    pub(crate) fn encode(&self, pitches: &PitchLut) -> Result<Vec<u8>, PitchNotFound> {
        self.notes
            .iter()
            .map(|pitch| pitches.index_for(*pitch).ok_or(PitchNotFound(*pitch)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake;

    #[test]
    fn decodes_and_encodes_index_bytes() {
        let tables = fake::tables();

        let mut image = Image::new();
        image.write(0x12345, &[0x00, 0x08, 0x02]);

        let sfx = SfxNotes::from_image(&image, 0x12345, 3, &tables.pitch);
        assert_eq!(sfx.len(), 3);
        assert_eq!(sfx.pitches()[0], tables.pitch.at(0x00));
        assert!(sfx.pitches()[2].is_rest());

        assert_eq!(sfx.encode(&tables.pitch), Ok(vec![0x00, 0x08, 0x02]));
    }
}
