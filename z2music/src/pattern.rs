//! Patterns: fixed-length loops of up to four channel note streams

use crate::duration::{DurationNotRepresentable, DurationOffsetUnknown, Row};
use crate::note::{Note, PackedNote};
use crate::pitch::Pitch;
use crate::pitch_lut::{PitchLut, PitchNotFound};
use crate::rom::{BANK_OFFSET, Tables, image::Image};
use thiserror::Error;
use tracing::warn;

/// One of the four sound channels a pattern drives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Pulse1,
    Pulse2,
    Triangle,
    Noise,
}

impl Channel {
    /// Every channel, in note-data encoding order
    pub const ALL: [Channel; 4] = [
        Channel::Pulse1,
        Channel::Pulse2,
        Channel::Triangle,
        Channel::Noise,
    ];
}

/// A fixed-length loop of notes across the four channels, plus its tempo
///
/// Pulse1's total tick length defines the pattern's canonical length; the other
/// channels may be shorter (the engine stops them early) but never longer. A tempo
/// byte of zero marks the voiced/title encoding mode, in which the two voice
/// configuration bytes replace the tempo semantics entirely and the note data uses
/// a marker-based byte stream instead of one byte per note.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pattern {
    tempo: u8,
    voice1: u8,
    voice2: u8,
    channels: [Vec<Note>; 4],
}

impl Pattern {
    /// The longest note stream Pulse1 may hold: 64 quarter notes
    pub const MAX_TICKS: u32 = 64 * Note::QUARTER;

    /// The bias between a voiced pitch byte and its title pitch-table index
    const TITLE_PITCH_BIAS: u8 = 4;

    /// The voiced rest byte, which doubles as the reserved rest index
    const TITLE_REST: u8 = 0x02;

    /// The top bit marking a voiced duration byte; its low nibble indexes the row
    const TITLE_DURATION_MARKER: u8 = 0x80;

    /// Construct an empty pattern at a tempo
    pub fn new(tempo: u8) -> Self {
        Self {
            tempo,
            ..Self::default()
        }
    }

    /// Construct a pattern from per-channel note streams
    pub fn with_notes(
        tempo: u8,
        pulse1: Vec<Note>,
        pulse2: Vec<Note>,
        triangle: Vec<Note>,
        noise: Vec<Note>,
    ) -> Self {
        Self {
            tempo,
            voice1: 0,
            voice2: 0,
            channels: [pulse1, pulse2, triangle, noise],
        }
    }

    /// Construct a voiced/title pattern from voice configuration and note streams
    pub fn voiced(
        voice1: u8,
        voice2: u8,
        pulse1: Vec<Note>,
        pulse2: Vec<Note>,
        triangle: Vec<Note>,
        noise: Vec<Note>,
    ) -> Self {
        Self {
            tempo: 0x00,
            voice1,
            voice2,
            channels: [pulse1, pulse2, triangle, noise],
        }
    }

    /// Decode a pattern from its metadata block in the image
    pub fn from_image(image: &Image, address: usize, tables: &Tables) -> Self {
        let header = image.read(address, 6);

        let mut pattern = Self::new(header[0]);
        if pattern.is_voiced() {
            pattern.voice1 = image.get(address + 6);
            pattern.voice2 = image.get(address + 7);
        }

        let note_base = image.get_word(address + 1) as usize + BANK_OFFSET;

        pattern.read_notes(Channel::Pulse1, image, note_base, tables);
        if header[3] > 0 {
            pattern.read_notes(Channel::Triangle, image, note_base + header[3] as usize, tables);
        }
        if header[4] > 0 {
            pattern.read_notes(Channel::Pulse2, image, note_base + header[4] as usize, tables);
        }
        if header[5] > 0 {
            pattern.read_notes(Channel::Noise, image, note_base + header[5] as usize, tables);
        }

        pattern
    }

    /// Does this pattern use the voiced/title encoding mode?
    pub fn is_voiced(&self) -> bool {
        self.tempo == 0x00
    }

    pub fn tempo(&self) -> u8 {
        self.tempo
    }

    pub fn set_tempo(&mut self, tempo: u8) {
        self.tempo = tempo;
    }

    pub fn voice1(&self) -> u8 {
        self.voice1
    }

    pub fn voice2(&self) -> u8 {
        self.voice2
    }

    /// Switch the pattern into voiced mode with the given voice configuration
    pub fn set_voicing(&mut self, voice1: u8, voice2: u8) {
        self.tempo = 0x00;
        self.voice1 = voice1;
        self.voice2 = voice2;
    }

    pub fn notes(&self, channel: Channel) -> &[Note] {
        &self.channels[channel as usize]
    }

    pub fn add_notes(&mut self, channel: Channel, notes: Vec<Note>) {
        self.channels[channel as usize].extend(notes);
    }

    pub fn clear(&mut self) {
        for channel in &mut self.channels {
            channel.clear();
        }
    }

    /// The pattern's canonical tick length: Pulse1's total
    pub fn length(&self) -> u32 {
        self.channel_length(Channel::Pulse1)
    }

    /// One channel's total tick length
    pub fn channel_length(&self, channel: Channel) -> u32 {
        self.notes(channel).iter().map(Note::ticks).sum()
    }

    /// The size of the pattern's metadata block in the image
    pub fn metadata_length(&self) -> usize {
        if self.is_voiced() { 8 } else { 6 }
    }

    /// Encode all four channels' note data, in engine order
    pub fn note_data(&self, tables: &mut Tables) -> Result<Vec<u8>, EncodeError> {
        let mut bytes = Vec::new();
        for channel in Channel::ALL {
            bytes.extend(self.channel_data(channel, tables)?);
        }
        Ok(bytes)
    }

    /// The pattern's metadata block, given the address its note data will land at
    ///
    /// Six bytes: tempo, the 16-bit note-data address, then the Triangle, Pulse2 and
    /// Noise start offsets relative to that address (0 marks an absent channel).
    /// Voiced patterns append their two voice bytes.
    pub fn meta_data(&self, note_address: u16) -> Result<Vec<u8>, EncodeError> {
        let pulse1 = self.note_data_length(Channel::Pulse1);
        let pulse2 = self.note_data_length(Channel::Pulse2);
        let triangle = self.note_data_length(Channel::Triangle);
        let noise = self.note_data_length(Channel::Noise);

        let offset = |length: usize, skip: usize| -> Result<u8, EncodeError> {
            if length == 0 {
                Ok(0)
            } else {
                u8::try_from(skip).map_err(|_| EncodeError::PatternTooLarge)
            }
        };

        let mut bytes = Vec::with_capacity(self.metadata_length());
        bytes.push(self.tempo);

        let [low, high] = note_address.to_le_bytes();
        bytes.push(low);
        bytes.push(high);

        bytes.push(offset(triangle, pulse1 + pulse2)?);
        bytes.push(offset(pulse2, pulse1)?);
        bytes.push(offset(noise, pulse1 + pulse2 + triangle)?);

        if self.is_voiced() {
            bytes.push(self.voice1);
            bytes.push(self.voice2);
        }

        Ok(bytes)
    }

    /// The encoded byte length of one channel's note data, terminator included
    ///
    /// Computable without encoding (it depends only on note counts and, for voiced
    /// patterns, duration changes), which is what lets the layout pass assign every
    /// address in a single forward sweep.
    pub(crate) fn note_data_length(&self, channel: Channel) -> usize {
        let notes = self.notes(channel);
        let markers = if self.is_voiced() {
            duration_runs(notes)
        } else {
            0
        };

        notes.len() + markers + usize::from(self.pad_note_data(channel))
    }

    /// Does a channel's note data carry an explicit 0x00 terminator?
    ///
    /// Pulse1 always does. The other channels only when they finish early: the
    /// engine relies on the metadata offsets otherwise.
    fn pad_note_data(&self, channel: Channel) -> bool {
        if channel == Channel::Pulse1 {
            return true;
        }

        let length = self.channel_length(channel);
        length > 0 && length < self.length()
    }

    fn channel_data(&self, channel: Channel, tables: &mut Tables) -> Result<Vec<u8>, EncodeError> {
        let notes = self.notes(channel);

        let mut bytes = if self.is_voiced() {
            let row = tables.title_duration.row_mut(self.tempo)?;
            row.reset();
            encode_voiced(notes, &tables.title_pitch, row)?
        } else {
            let row = tables.duration.row_mut(self.tempo)?;
            row.reset();
            encode_normal(notes, &tables.pitch, row)?
        };

        if self.pad_note_data(channel) {
            bytes.push(0x00);
        }

        Ok(bytes)
    }

    fn read_notes(&mut self, channel: Channel, image: &Image, address: usize, tables: &Tables) {
        let limit = if channel == Channel::Pulse1 {
            Self::MAX_TICKS
        } else {
            self.length()
        };

        let (pitches, durations) = if self.is_voiced() {
            (&tables.title_pitch, &tables.title_duration)
        } else {
            (&tables.pitch, &tables.duration)
        };

        let row = match durations.row(self.tempo) {
            Ok(row) => row,
            Err(err) => {
                warn!("skipping channel at {address:#x}: {err}");
                return;
            }
        };

        if self.is_voiced() {
            self.read_voiced_notes(channel, image, address, limit, pitches, row);
        } else {
            self.read_normal_notes(channel, image, address, limit, pitches, row);
        }
    }

    fn read_normal_notes(
        &mut self,
        channel: Channel,
        image: &Image,
        mut address: usize,
        limit: u32,
        pitches: &PitchLut,
        row: &Row,
    ) {
        let mut length = 0;

        while length < limit && image.contains(address) {
            let byte = image.get(address);
            address += 1;

            // Note data can terminate early on a 00 byte
            if byte == 0x00 {
                break;
            }

            let packed = PackedNote::from_byte(byte);
            let ticks = row.decode(packed.duration_index()).unwrap_or_else(|| {
                warn!("no duration code {} in the active row", packed.duration_index());
                0
            });

            length += ticks;
            self.channels[channel as usize].push(Note::new(pitches.at(packed.pitch_index()), ticks));
        }
    }

    fn read_voiced_notes(
        &mut self,
        channel: Channel,
        image: &Image,
        mut address: usize,
        limit: u32,
        pitches: &PitchLut,
        row: &Row,
    ) {
        let mut length = 0;
        let mut ticks = 0;

        while length < limit && image.contains(address) {
            let byte = image.get(address);
            address += 1;

            if byte == 0x00 {
                break;
            }

            // A set top bit switches the current duration for all following notes
            if byte & Self::TITLE_DURATION_MARKER != 0 {
                ticks = row.decode(byte & 0x0f).unwrap_or_else(|| {
                    warn!("no duration code {} in the title row", byte & 0x0f);
                    0
                });
                continue;
            }

            let pitch = if byte == Self::TITLE_REST {
                Pitch::REST
            } else {
                match byte.checked_sub(Self::TITLE_PITCH_BIAS) {
                    Some(index) => pitches.at(index),
                    None => {
                        warn!("voiced pitch byte {byte:#04x} below the index bias");
                        Pitch::REST
                    }
                }
            };

            length += ticks;
            self.channels[channel as usize].push(Note::new(pitch, ticks));
        }
    }
}

fn encode_normal(notes: &[Note], pitches: &PitchLut, row: &mut Row) -> Result<Vec<u8>, EncodeError> {
    let mut bytes = Vec::with_capacity(notes.len() + 1);

    for note in notes {
        let pitch_index = pitches
            .index_for(note.pitch())
            .ok_or(PitchNotFound(note.pitch()))?;
        let duration_index = row.encode(note.ticks())?;
        bytes.push(PackedNote::new(pitch_index, duration_index).to_byte());
    }

    Ok(bytes)
}

fn encode_voiced(notes: &[Note], pitches: &PitchLut, row: &mut Row) -> Result<Vec<u8>, EncodeError> {
    let mut bytes = Vec::with_capacity(notes.len() + duration_runs(notes) + 1);
    let mut current = None;

    for note in notes {
        if current != Some(note.ticks()) {
            let index = row.encode(note.ticks())?;
            bytes.push(Pattern::TITLE_DURATION_MARKER | index);
            current = Some(note.ticks());
        }

        if note.is_rest() {
            bytes.push(Pattern::TITLE_REST);
        } else {
            let index = pitches
                .index_for(note.pitch())
                .ok_or(PitchNotFound(note.pitch()))?;
            bytes.push(index + Pattern::TITLE_PITCH_BIAS);
        }
    }

    Ok(bytes)
}

/// The number of duration markers a voiced note stream needs: one per run of notes
/// sharing a tick length
fn duration_runs(notes: &[Note]) -> usize {
    if notes.is_empty() {
        return 0;
    }

    1 + notes
        .windows(2)
        .filter(|pair| pair[0].ticks() != pair[1].ticks())
        .count()
}

/// Errors that can occur encoding a pattern back into image bytes
///
/// Unlike decoding, which warns and substitutes defaults so imperfect images stay
/// readable, encoding refuses to produce bytes it cannot represent exactly; a
/// silently wrong byte corrupts playback.
#[derive(Debug, Error, PartialEq)]
pub enum EncodeError {
    /// A note's pitch is absent from the active pitch table
    #[error(transparent)]
    Pitch(#[from] PitchNotFound),

    /// A note's tick length has no code in the active tempo row
    #[error(transparent)]
    Duration(#[from] DurationNotRepresentable),

    /// The pattern's tempo byte does not address a duration row
    #[error(transparent)]
    Tempo(#[from] DurationOffsetUnknown),

    /// A channel's note data outgrew the byte-sized offsets of the metadata block
    #[error("the pattern's note data is too long for its channel offsets")]
    PatternTooLarge,
}
