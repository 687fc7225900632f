//! In-memory ROM fixtures with the known table contents, for tests

use crate::duration::DurationLut;
use crate::pitch::{Pitch, midi};
use crate::pitch_lut::PitchLut;
use crate::rom::{BANK_OFFSET, Rom, Tables, image::Image};
use crate::track::Section;

/// The in-game pitch table, in its on-disk slot order
fn game_pitches() -> Vec<Pitch> {
    [
        midi::C3,
        midi::E3,
        midi::G3,
        midi::GS3,
        midi::A3,
        midi::AS3,
        midi::B3,
        midi::C4,
        midi::CS4,
        midi::D4,
        midi::DS4,
        midi::E4,
        midi::F4,
        midi::FS4,
        midi::G4,
        midi::GS4,
        midi::A4,
        midi::AS4,
        midi::B4,
        midi::C5,
        midi::CS5,
        midi::D5,
        midi::DS5,
        midi::E5,
        midi::F5,
        midi::FS5,
        midi::G5,
        midi::A5,
        midi::AS5,
        midi::B5,
    ]
    .into_iter()
    .map(Pitch::from_midi)
    .collect()
}

/// Lookup tables matching the shipped game's contents
pub(crate) fn tables() -> Tables {
    let mut tables = Tables::new();

    for pitch in game_pitches() {
        tables.pitch.add_pitch(pitch).unwrap();
    }

    let mut duration = DurationLut::new();
    duration.add_row(vec![0x04, 0x0c, 0x08, 0x10, 0x18, 0x20, 0x05, 0x06]);
    duration.add_row(vec![0x04, 0x0f, 0x09, 0x12, 0x1b, 0x24, 0x06, 0x06]);
    duration.add_row(vec![0x05, 0x0f, 0x0a, 0x14, 0x1e, 0x28, 0x07, 0x06]);
    duration.add_row(vec![0x06, 0x12, 0x0c, 0x18, 0x24, 0x30, 0x08, 0x10]);
    duration.add_row(vec![0x07, 0x15, 0x0e, 0x1c, 0x2a, 0x38, 0x13, 0x12]);
    duration.add_row(vec![0x07, 0x15, 0x0e, 0x1c, 0x2a, 0x38, 0x09, 0x0a]);
    tables.duration = duration;

    for note in midi::C2..=midi::CS7 {
        tables.title_pitch.add_pitch(Pitch::from_midi(note)).unwrap();
    }

    let mut title_duration = DurationLut::new();
    title_duration.add_row(vec![8, 24, 16, 32, 48, 64, 96, 128, 11, 10, 80]);
    tables.title_duration = title_duration;

    tables
}

/// A decodable image holding the fixture tables, loader code and empty sections
fn image() -> Image {
    let mut image = Image::new();
    let tables = tables();

    tables.pitch.commit(&mut image, Rom::PITCH_LUT_ADDRESS);
    tables
        .title_pitch
        .commit(&mut image, Rom::TITLE_PITCH_LUT_ADDRESS);

    let duration_rows: [&[u8]; 6] = [
        &[0x04, 0x0c, 0x08, 0x10, 0x18, 0x20, 0x05, 0x06],
        &[0x04, 0x0f, 0x09, 0x12, 0x1b, 0x24, 0x06, 0x06],
        &[0x05, 0x0f, 0x0a, 0x14, 0x1e, 0x28, 0x07, 0x06],
        &[0x06, 0x12, 0x0c, 0x18, 0x24, 0x30, 0x08, 0x10],
        &[0x07, 0x15, 0x0e, 0x1c, 0x2a, 0x38, 0x13, 0x12],
        &[0x07, 0x15, 0x0e, 0x1c, 0x2a, 0x38, 0x09, 0x0a],
    ];
    let mut cursor = Rom::DURATION_LUT_ADDRESS;
    for row in duration_rows {
        image.write(cursor, row);
        cursor += row.len();
    }

    image.write(
        Rom::TITLE_DURATION_LUT_ADDRESS,
        &[8, 24, 16, 32, 48, 64, 96, 128, 11, 10, 80],
    );

    // Each loader: the table load the sections are resolved from, then the jump
    // that ends the relocation scan
    let bases: [u16; 5] = [0x84da, 0xa000, 0xa3ca, 0xa62f, 0xa936];
    for (section, base) in Section::ALL.into_iter().zip(bases) {
        let loader = section.loader_address();
        image.put(loader, 0xb9);
        image.put_word(loader + 1, base);
        image.put(loader + 3, 0x4c);
        image.put_word(loader + 4, 0x8000);
    }

    image
}

/// A fully decoded fixture ROM with empty songs
pub(crate) fn rom() -> Rom {
    Rom::from_image(image())
}

/// Write a pattern's metadata and note data at a CPU address in the music bank
pub(crate) fn add_pattern(rom: &mut Rom, address: u16, tempo: u8, data: &[u8]) {
    let base = BANK_OFFSET + address as usize;
    let offset = address + if tempo == 0 { 8 } else { 6 };

    let image = rom.image_mut();
    image.put(base, tempo);
    image.put_word(base + 1, offset);
    image.put(base + 3, 0x00);
    image.put(base + 4, 0x00);
    image.put(base + 5, 0x00);

    if tempo == 0 {
        image.put(base + 6, 0x00);
        image.put(base + 7, 0x00);
    }

    image.write(BANK_OFFSET + offset as usize, data);
}
