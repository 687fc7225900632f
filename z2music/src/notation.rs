//! The textual note notation used by the dump and mod-file formats
//!
//! A channel is written as space-separated notes: a letter with optional
//! accidental (`#`, `s` or a trailing `b`), an octave digit, and an optional
//! `.`-prefixed duration code (`1` sixteenth, `2` eighth, `4` quarter, `8` half,
//! `3`/`6` dotted, `t2`/`t4` triplets). The duration is sticky: it applies to
//! every following note until changed. `r` or `-` is a rest, `x` the snare
//! shorthand (G#3).

use crate::note::Note;
use crate::pitch::Pitch;
use tracing::warn;

/// Parse a channel's notes, transposing each pitch by `transpose` semitones
pub fn parse_notes(text: &str, transpose: i32) -> Vec<Note> {
    let mut notes = Vec::new();

    let mut pitch: i32 = 0;
    let mut octave: i32 = 0;
    let mut ticks: u32 = 0;
    let mut triplet = false;

    // A trailing space flushes the final note like any other
    for c in text.chars().chain(std::iter::once(' ')) {
        match c {
            'C' | 'c' => pitch = 1,
            'D' | 'd' => pitch = 3,
            'E' | 'e' => pitch = 5,
            'F' | 'f' => pitch = 6,
            'G' | 'g' => pitch = 8,
            'A' | 'a' => pitch = 10,
            'B' => pitch = 12,

            // A flat if a pitch is already set, otherwise the note B
            'b' => pitch = if pitch == 0 { 12 } else { pitch - 1 },

            '#' | 's' => pitch += 1,

            't' => triplet = true,

            '1'..='8' => {
                let digit = c.to_digit(10).unwrap();
                if octave == 0 {
                    octave = digit as i32;
                } else {
                    ticks = if triplet { 16 * digit } else { 24 * digit };
                    triplet = false;
                }
            }

            '.' => {}

            // Snare drum shorthand
            'x' => {
                pitch = 9;
                octave = 3;
            }

            'r' | '-' => {
                pitch = -1;
                octave = -1;
            }

            ' ' => {
                if pitch != 0 && octave != 0 && ticks != 0 {
                    let note = if pitch > 0 {
                        let midi = pitch + 12 * octave + 11 + transpose;
                        Note::new(Pitch::from_midi(midi), ticks)
                    } else {
                        Note::rest(ticks)
                    };
                    notes.push(note);

                    // The duration carries over to later notes
                    pitch = 0;
                    octave = 0;
                }
            }

            _ => warn!("unknown character {c:?} when parsing notes"),
        }
    }

    notes
}

/// Write a channel's notes back out, naming the duration only when it changes
pub fn dump_notes(notes: &[Note]) -> String {
    let mut out = String::new();
    let mut previous = None;

    for note in notes {
        if !out.is_empty() {
            out.push(' ');
        }

        out.push_str(&note.pitch().to_string());

        if previous != Some(note.ticks()) {
            out.push('.');
            out.push_str(&duration_code(note.ticks()));
            previous = Some(note.ticks());
        }
    }

    out
}

fn duration_code(ticks: u32) -> String {
    let code = match ticks {
        Note::SIXTEENTH => "1",
        Note::EIGHTH => "2",
        Note::EIGHTH_TRIPLET => "t2",
        Note::DOTTED_EIGHTH => "3",
        Note::QUARTER => "4",
        Note::QUARTER_TRIPLET => "t4",
        Note::DOTTED_QUARTER => "6",
        Note::HALF => "8",
        _ => return format!("?{ticks}"),
    };

    code.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pitch::midi;

    fn note(m: i32, ticks: u32) -> Note {
        Note::new(Pitch::from_midi(m), ticks)
    }

    #[test]
    fn parses_pitches_and_durations() {
        assert_eq!(
            parse_notes("A4.2 C5.4 E5.8", 0),
            vec![
                note(midi::A4, Note::EIGHTH),
                note(midi::C5, Note::QUARTER),
                note(midi::E5, Note::HALF),
            ]
        );
    }

    #[test]
    fn durations_are_sticky() {
        assert_eq!(
            parse_notes("A4.2 B4 C5 D5.4", 0),
            vec![
                note(midi::A4, Note::EIGHTH),
                note(midi::B4, Note::EIGHTH),
                note(midi::C5, Note::EIGHTH),
                note(midi::D5, Note::QUARTER),
            ]
        );
    }

    #[test]
    fn parses_accidentals_rests_and_the_snare() {
        assert_eq!(
            parse_notes("C#4.4 Bb3 --.2 x.1", 0),
            vec![
                note(midi::CS4, Note::QUARTER),
                note(midi::AS3, Note::QUARTER),
                Note::rest(Note::EIGHTH),
                note(midi::GS3, Note::SIXTEENTH),
            ]
        );
    }

    #[test]
    fn parses_triplets() {
        assert_eq!(
            parse_notes("A4.t2 A4 A4", 0),
            vec![
                note(midi::A4, Note::EIGHTH_TRIPLET),
                note(midi::A4, Note::EIGHTH_TRIPLET),
                note(midi::A4, Note::EIGHTH_TRIPLET),
            ]
        );
    }

    #[test]
    fn transposes() {
        assert_eq!(parse_notes("C4.4", 2), vec![note(midi::D4, Note::QUARTER)]);
        assert_eq!(parse_notes("C4.4", -12), vec![note(midi::C3, Note::QUARTER)]);
    }

    #[test]
    fn dump_groups_identical_durations() {
        let notes = vec![
            note(midi::A4, Note::EIGHTH),
            note(midi::A4, Note::EIGHTH),
            note(midi::C5, Note::QUARTER),
        ];

        assert_eq!(dump_notes(&notes), "A4.2 A4 C5.4");
    }

    #[test]
    fn dump_then_parse_round_trips() {
        let notes = vec![
            note(midi::A4, Note::EIGHTH),
            note(midi::AS4, Note::EIGHTH),
            Note::rest(Note::QUARTER),
            note(midi::GS3, Note::EIGHTH_TRIPLET),
            note(midi::C5, Note::HALF),
        ];

        assert_eq!(parse_notes(&dump_notes(&notes), 0), notes);
    }
}
