//! Decode, edit and re-encode the music embedded in a Zelda II ROM image.
//!
//! The game stores its soundtrack as bit-packed note bytes behind a pair of
//! lookup tables (pitches and tempo-specific durations), laid out contiguously in
//! five per-area sections. This crate reads that data into an editable model of
//! [`Song`]s, [`Pattern`]s and [`Note`]s, and writes edits back in the exact
//! layout the game's sound engine expects: decoding an image and committing it
//! unchanged reproduces the original bytes.
//!
//! ```no_run
//! # use z2music::{Channel, Rom, Track, notation};
//! let mut rom = Rom::from_path("zelda2.nes")?;
//!
//! let battle = rom.song(Track::BattleTheme);
//! for pattern in battle.patterns() {
//!     println!("{}", notation::dump_notes(pattern.notes(Channel::Pulse1)));
//! }
//!
//! rom.save("modded.nes")?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod credits;
pub mod duration;
pub mod notation;
pub mod note;
pub mod pattern;
pub mod pitch;
pub mod pitch_lut;
pub mod rom;
pub mod sfx;
pub mod song;
pub mod track;

#[cfg(test)]
pub(crate) mod fake;

pub use note::Note;
pub use pattern::{Channel, Pattern};
pub use pitch::Pitch;
pub use rom::Rom;
pub use song::Song;
pub use track::{Section, Track};
