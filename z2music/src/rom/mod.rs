//! The editable ROM aggregate: image, lookup tables, songs, credits and SFX
//!
//! Everything is decoded once when the image is loaded and regenerated in full on
//! every commit: the pitch table is rebuilt from the pitches actually in use, every
//! song is re-encoded through the tables, every section's layout is recomputed, and
//! only then is the image mutated. There is no partial commit; a failure anywhere
//! aborts before the image (and therefore any saved file) changes.

pub mod image;
pub(crate) mod layout;
pub(crate) mod relocate;

use crate::credits::{Credits, CreditsEncodeError};
use crate::duration::DurationLut;
use crate::pattern::{Channel, EncodeError};
use crate::pitch::Pitch;
use crate::pitch_lut::{LutCapacityExceeded, PitchLut};
use crate::sfx::SfxNotes;
use crate::song::Song;
use crate::track::{Section, Track};
use image::Image;
use std::collections::{BTreeSet, HashMap};
use std::{io, path::Path};
use thiserror::Error;
use tracing::warn;

/// The music bank's offset into the flat image address space
///
/// Pattern metadata and loader operands hold 16-bit CPU addresses; folding them
/// into the flat space is a matter of adding this offset.
pub(crate) const BANK_OFFSET: usize = 0x010000;

/// The lookup tables note encoding and decoding run through
///
/// One pitch/duration pair per encoding mode: the in-game tables and the title
/// tables. These are explicit owned values handed into encode and decode calls;
/// the rebuild-before-encode ordering is enforced by [`Rom::commit`] rather than
/// by shared global state.
#[derive(Debug, Clone)]
pub struct Tables {
    pub pitch: PitchLut,
    pub duration: DurationLut,
    pub title_pitch: PitchLut,
    pub title_duration: DurationLut,
}

impl Tables {
    pub fn new() -> Self {
        Self {
            pitch: PitchLut::new(PitchLut::GAME_CAPACITY),
            duration: DurationLut::new(),
            title_pitch: PitchLut::new(PitchLut::TITLE_CAPACITY),
            title_duration: DurationLut::new(),
        }
    }

    fn from_image(image: &Image) -> Self {
        Self {
            pitch: PitchLut::from_image(image, Rom::PITCH_LUT_ADDRESS, PitchLut::GAME_CAPACITY),
            duration: DurationLut::from_image(
                image,
                Rom::DURATION_LUT_ADDRESS,
                &Rom::DURATION_ROW_SIZES,
            ),
            title_pitch: PitchLut::from_image(
                image,
                Rom::TITLE_PITCH_LUT_ADDRESS,
                PitchLut::TITLE_CAPACITY,
            ),
            title_duration: DurationLut::from_image(
                image,
                Rom::TITLE_DURATION_LUT_ADDRESS,
                &Rom::TITLE_DURATION_ROW_SIZES,
            ),
        }
    }
}

impl Default for Tables {
    fn default() -> Self {
        Self::new()
    }
}

/// A fully decoded, editable music set
pub struct Rom {
    image: Image,
    tables: Tables,
    song_tables: [usize; 5],
    songs: HashMap<Track, Song>,
    credits: Credits,
    sfx: Vec<SfxNotes>,
}

impl Rom {
    /// The in-game pitch table: 32 big-endian timer periods
    pub const PITCH_LUT_ADDRESS: usize = 0x01918f;

    /// The in-game duration rows, concatenated
    pub const DURATION_LUT_ADDRESS: usize = 0x01915f;

    /// The title-music pitch table: 64 big-endian timer periods
    pub const TITLE_PITCH_LUT_ADDRESS: usize = 0x018204;

    /// The title-music duration row
    pub const TITLE_DURATION_LUT_ADDRESS: usize = 0x0181f9;

    const DURATION_ROW_SIZES: [usize; 6] = [8, 8, 8, 8, 8, 8];
    const TITLE_DURATION_ROW_SIZES: [usize; 1] = [11];

    /// Construct an empty ROM with default table addresses and empty songs
    pub fn new() -> Self {
        Self {
            image: Image::new(),
            tables: Tables::new(),
            song_tables: [0x0184da, 0x01a000, 0x01a3ca, 0x01a62f, 0x01a936],
            songs: Track::ALL.into_iter().map(|t| (t, Song::new())).collect(),
            credits: Credits::default(),
            sfx: Vec::new(),
        }
    }

    /// Decode every table, song and credits page out of an image
    pub fn from_image(image: Image) -> Self {
        let tables = Tables::from_image(&image);

        let mut song_tables = [0; 5];
        for section in Section::ALL {
            song_tables[section.index()] = song_table_address(&image, section);
        }

        let mut songs = HashMap::new();
        for section in Section::ALL {
            let base = song_tables[section.index()];
            for (index, track) in section.tracks().iter().enumerate() {
                let entry = section.entry_for(index);
                songs.insert(*track, Song::from_image(&image, base, entry, &tables));
            }
        }

        let credits = Credits::from_image(&image);

        Self {
            image,
            tables,
            song_tables,
            songs,
            credits,
            sfx: Vec::new(),
        }
    }

    /// Decode a ROM from an arbitrary I/O reader
    pub fn from_reader<R>(reader: R) -> Result<Self, io::Error>
    where
        R: io::Read,
    {
        Ok(Self::from_image(Image::from_reader(reader)?))
    }

    /// Decode a ROM from a path on disk
    pub fn from_path<P>(path: P) -> Result<Self, io::Error>
    where
        P: AsRef<Path>,
    {
        Ok(Self::from_image(Image::from_path(path)?))
    }

    pub fn image(&self) -> &Image {
        &self.image
    }

    pub fn image_mut(&mut self) -> &mut Image {
        &mut self.image
    }

    pub fn tables(&self) -> &Tables {
        &self.tables
    }

    pub fn tables_mut(&mut self) -> &mut Tables {
        &mut self.tables
    }

    pub fn song(&self, track: Track) -> &Song {
        &self.songs[&track]
    }

    pub fn song_mut(&mut self, track: Track) -> &mut Song {
        self.songs.get_mut(&track).unwrap()
    }

    pub fn credits(&self) -> &Credits {
        &self.credits
    }

    pub fn credits_mut(&mut self) -> &mut Credits {
        &mut self.credits
    }

    /// The base address a section's tables currently live at
    pub fn song_table_address(&self, section: Section) -> usize {
        self.song_tables[section.index()]
    }

    /// Decode a sound effect's pitch-index bytes through the in-game pitch table
    ///
    /// The notes participate in the next rebuild and are rewritten on commit.
    pub fn read_sfx_notes(&mut self, address: usize, count: usize) {
        self.sfx
            .push(SfxNotes::from_image(&self.image, address, count, &self.tables.pitch));
    }

    pub fn sfx_notes(&self) -> &[SfxNotes] {
        &self.sfx
    }

    /// Move a section's tables to a new base address
    ///
    /// Patches every loader instruction that addresses the old base; the next
    /// commit serializes the section at the new address.
    pub fn move_song_table(&mut self, section: Section, base: u16) {
        relocate::relocate_loader(&mut self.image, section.loader_address(), base);
        self.song_tables[section.index()] = base as usize + BANK_OFFSET;
    }

    /// Re-encode everything into the in-memory image
    ///
    /// Runs the pipeline in its required order: rebuild the pitch table from the
    /// pitches in use, serialize every section, and only then write. Any failure
    /// leaves the image untouched.
    pub fn commit(&mut self) -> Result<(), CommitError> {
        // The pitch table serves every non-title song plus the sound effects
        let mut used = BTreeSet::new();
        for section in Section::ALL.into_iter().filter(|s| !s.is_title()) {
            for track in section.tracks() {
                for pattern in self.songs[track].patterns() {
                    for channel in Channel::ALL {
                        used.extend(
                            pattern
                                .notes(channel)
                                .iter()
                                .map(|note| note.pitch())
                                .filter(|pitch| !pitch.is_rest()),
                        );
                    }
                }
            }
        }

        let sfx_pitches: Vec<Pitch> = self
            .sfx
            .iter()
            .flat_map(SfxNotes::pitches)
            .copied()
            .filter(|pitch| !pitch.is_rest())
            .collect();

        self.tables.pitch.rebuild(&used, &sfx_pitches)?;

        // Serialize every section before any byte lands in the image
        let mut blocks = Vec::with_capacity(Section::ALL.len());
        for section in Section::ALL {
            let songs: Vec<&Song> = section.tracks().iter().map(|t| &self.songs[t]).collect();
            let base = self.song_tables[section.index()];
            blocks.push((
                base,
                layout::serialize_section(section, &songs, base, &mut self.tables)?,
            ));
        }

        let mut sfx_blocks = Vec::with_capacity(self.sfx.len());
        for sfx in &self.sfx {
            sfx_blocks.push((sfx.address(), sfx.encode(&self.tables.pitch).map_err(EncodeError::from)?));
        }

        let credits_block = self.credits.serialize()?;

        // Every encode succeeded; mutate the image
        self.tables.pitch.commit(&mut self.image, Self::PITCH_LUT_ADDRESS);
        for (address, block) in blocks {
            self.image.write(address, &block);
        }
        for (address, block) in sfx_blocks {
            self.image.write(address, &block);
        }
        self.image.write(crate::credits::TABLE_ADDRESS, &credits_block);

        Ok(())
    }

    /// Commit and write the image to a path on disk
    ///
    /// A failed commit aborts before the file is opened, leaving any previously
    /// saved image untouched.
    pub fn save<P>(&mut self, path: P) -> Result<(), SaveError>
    where
        P: AsRef<Path>,
    {
        self.commit()?;
        self.image.to_path(path)?;
        Ok(())
    }
}

impl Default for Rom {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve a section's table base from its loader's operand
fn song_table_address(image: &Image, section: Section) -> usize {
    let loader = section.loader_address();

    if image.get(loader) != relocate::LDA_ABSOLUTE_Y {
        warn!(
            "no table load at {loader:#x} for the {section} section; the image looks unfamiliar"
        );
    }

    image.get_word(loader + 1) as usize + BANK_OFFSET
}

/// Errors that can abort a commit
///
/// All of these fire before the image is mutated; a commit either lands in full or
/// not at all.
#[derive(Debug, Error)]
pub enum CommitError {
    /// More unique pitches in use than the pitch table can hold
    #[error("rebuilding the pitch table failed")]
    Capacity(#[from] LutCapacityExceeded),

    /// A pattern could not be encoded through the tables
    #[error("encoding a pattern failed")]
    Encode(#[from] EncodeError),

    /// A section outgrew its byte-sized offset tables
    #[error("the {section} section does not fit its offset tables")]
    SectionTooLarge { section: Section },

    /// A credits page could not be encoded
    #[error("encoding the credits failed")]
    Credits(#[from] CreditsEncodeError),
}

/// Errors that can occur saving a ROM to disk
#[derive(Debug, Error)]
pub enum SaveError {
    /// The commit failed; the file was not touched
    #[error("committing the music data failed")]
    Commit(#[from] CommitError),

    /// Writing the image itself failed
    #[error("writing the image failed")]
    Io(#[from] io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake;
    use crate::note::Note;
    use crate::notation::parse_notes;
    use crate::pattern::Pattern;
    use crate::pitch::midi;

    #[test]
    fn songs_round_trip_through_a_commit() {
        let mut rom = fake::rom();

        let song = rom.song_mut(Track::TriforceFanfare);
        song.add_pattern(Pattern::with_notes(
            0x18,
            vec![
                Note::new(Pitch::from_midi(midi::A4), Note::EIGHTH),
                Note::new(Pitch::from_midi(midi::C5), Note::QUARTER),
                Note::new(Pitch::from_midi(midi::E5), Note::HALF),
            ],
            vec![],
            vec![],
            vec![],
        ));
        song.set_sequence(vec![0, 0]);

        rom.commit().unwrap();

        let decoded = Rom::from_image(rom.image().clone());
        let song = decoded.song(Track::TriforceFanfare);

        assert_eq!(song.sequence(), &[0, 0]);
        assert_eq!(song.patterns().len(), 1);
        assert_eq!(
            song.patterns()[0].notes(Channel::Pulse1),
            rom.song(Track::TriforceFanfare).patterns()[0].notes(Channel::Pulse1),
        );
    }

    #[test]
    fn rebuild_collects_songs_and_sfx() {
        let mut rom = fake::rom();

        let song = rom.song_mut(Track::TriforceFanfare);
        song.add_pattern(Pattern::with_notes(
            0x18,
            parse_notes("A5.2 C6 E6 A5 C6 E6 A5 C6 E6 A5 C6 E6", 0),
            vec![],
            vec![],
            vec![],
        ));
        song.set_sequence(vec![0]);

        // A5 G#4 G#3 G3, twice over
        rom.image_mut()
            .write(0x12345, &[0x38, 0x20, 0x08, 0x06, 0x08, 0x06]);
        rom.read_sfx_notes(0x12345, 6);

        rom.commit().unwrap();

        let pitch = &rom.tables().pitch;
        assert_eq!(pitch.len(), 7);

        // Song pitches ascend from slot 0
        assert_eq!(pitch.at(0x00), Pitch::from_midi(midi::A5));
        assert_eq!(pitch.at(0x02), Pitch::REST);
        assert_eq!(pitch.at(0x04), Pitch::from_midi(midi::C6));
        assert_eq!(pitch.at(0x06), Pitch::from_midi(midi::E6));

        // SFX pitches follow in encounter order, and their bytes are rewritten
        assert_eq!(pitch.at(0x08), Pitch::from_midi(midi::GS4));
        assert_eq!(pitch.at(0x0a), Pitch::from_midi(midi::GS3));
        assert_eq!(pitch.at(0x0c), Pitch::from_midi(midi::G3));
        assert_eq!(
            rom.image().read(0x12345, 6),
            vec![0x00, 0x08, 0x0a, 0x0c, 0x0a, 0x0c]
        );
    }

    #[test]
    fn title_songs_do_not_feed_the_game_pitch_table() {
        let mut rom = fake::rom();

        let song = rom.song_mut(Track::TitleIntro);
        song.add_pattern(Pattern::voiced(
            0x00,
            0x00,
            vec![Note::new(Pitch::from_midi(midi::C4), Note::QUARTER)],
            vec![],
            vec![],
            vec![],
        ));
        song.set_sequence(vec![0]);

        let song = rom.song_mut(Track::OverworldTheme);
        song.add_pattern(Pattern::with_notes(
            0x18,
            vec![Note::new(Pitch::from_midi(midi::A4), Note::QUARTER)],
            vec![],
            vec![],
            vec![],
        ));
        song.set_sequence(vec![0]);

        rom.commit().unwrap();

        let pitch = &rom.tables().pitch;
        assert_eq!(pitch.len(), 1);
        assert_eq!(pitch.at(0x00), Pitch::from_midi(midi::A4));
    }

    #[test]
    fn an_over_capacity_rebuild_aborts_the_commit() {
        let mut rom = fake::rom();

        // 40 distinct pitches cannot fit the 32-entry table
        let notes: Vec<Note> = (40..80)
            .map(|m| Note::new(Pitch::from_midi(m), Note::QUARTER))
            .collect();

        let song = rom.song_mut(Track::BattleTheme);
        song.add_pattern(Pattern::with_notes(0x18, notes, vec![], vec![], vec![]));
        song.set_sequence(vec![0]);

        let before = rom.image().read(0x01a000, 0x40);
        assert!(matches!(rom.commit(), Err(CommitError::Capacity(_))));
        assert_eq!(rom.image().read(0x01a000, 0x40), before);
    }

    #[test]
    fn relocation_moves_a_section_and_its_next_commit() {
        let mut rom = fake::rom();

        let song = rom.song_mut(Track::OverworldTheme);
        song.add_pattern(Pattern::with_notes(
            0x18,
            vec![Note::new(Pitch::from_midi(midi::A4), Note::QUARTER)],
            vec![],
            vec![],
            vec![],
        ));
        song.set_sequence(vec![0]);

        rom.move_song_table(Section::Overworld, 0xa800);
        assert_eq!(rom.song_table_address(Section::Overworld), 0x01a800);

        rom.commit().unwrap();

        let decoded = Rom::from_image(rom.image().clone());
        assert_eq!(decoded.song_table_address(Section::Overworld), 0x01a800);
        assert_eq!(
            decoded.song(Track::OverworldTheme).patterns()[0]
                .notes(Channel::Pulse1)
                .len(),
            1
        );
    }
}
