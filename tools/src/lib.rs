//! # z2music tools
//!
//! Command-line tools for working with the music in a Zelda II ROM image, built
//! on the [`z2music`] crate.
//!
//! ## Dump
//!
//! Print a track (or every track) as the textual note notation:
//!
//! ```console
//! z2music-tools dump zelda2.nes --track BattleTheme
//! ```
//!
//! ## Apply
//!
//! Replace songs from a mod file and save the modified image:
//!
//! ```console
//! z2music-tools apply battle.mod --rom zelda2.nes --output modded.nes
//! ```
//!
//! A mod file is a sequence of commands:
//!
//! ```text
//! song BattleTheme
//! transpose 2
//! pattern 18
//! A4.2 C5 E5 A4 C5 E5 A4 C5 E5 A4 C5 E5
//! E3.4 E3 E3 E3
//!
//!
//! sequence 1
//! ```
//!
//! Each `pattern` line is followed by four note lines (Pulse1, Pulse2, Triangle,
//! Noise); `sequence` lists 1-based pattern numbers.
//!
//! ## Relocate
//!
//! Move a section's tables to a new base address, patching the loader code:
//!
//! ```console
//! z2music-tools relocate Overworld a800 --rom zelda2.nes --output moved.nes
//! ```
//!
//! ## Pitches
//!
//! Print the pitch table of an image:
//!
//! ```console
//! z2music-tools pitches zelda2.nes
//! ```

pub mod dump;
pub mod modfile;
pub mod pitches;
pub mod relocate;
