//! Tones, represented by the timer period that drives the tone generator

use std::cmp::Ordering;
use std::fmt;

/// A single playable tone (or rest), stored as its 16-bit timer period
///
/// The sound hardware derives a tone's frequency by dividing the CPU clock by the
/// timer period: `freq = clock / (16 * (timer + 1))`. A lower timer period therefore
/// means a higher frequency; nothing in this crate infers pitch height from timer
/// magnitude directly. Timer period 0 is the sound engine's rest/silence sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pitch {
    timer: u16,
}

impl Pitch {
    /// The NTSC CPU clock rate in Hz
    const CPU_RATE: f32 = 1_789_773.0;

    /// Reference tuning: A4 = 440 Hz = MIDI note 69
    const FREQ_A4: f32 = 440.0;
    const MIDI_A4: i32 = 69;

    const STEP_NAMES: [&'static str; 12] = [
        "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
    ];

    /// The rest/silence sentinel
    pub const REST: Pitch = Pitch { timer: 0 };

    /// Construct a pitch from a raw timer period
    pub fn new(timer: u16) -> Self {
        Self { timer }
    }

    /// Construct the pitch whose frequency lies closest to `freq` Hz
    pub fn from_frequency(freq: f32) -> Self {
        let timer = (Self::CPU_RATE / (16.0 * freq) - 1.0).round() as u16;
        Self { timer }
    }

    /// Construct the pitch closest to an equal-tempered MIDI note number
    pub fn from_midi(midi: i32) -> Self {
        let freq = 2f32.powf((midi - Self::MIDI_A4) as f32 / 12.0) * Self::FREQ_A4;
        Self::from_frequency(freq)
    }

    /// The raw timer period
    pub fn timer(&self) -> u16 {
        self.timer
    }

    /// Is this the rest/silence sentinel?
    pub fn is_rest(&self) -> bool {
        self.timer == 0
    }

    /// The frequency in Hz the tone generator produces for this timer period
    pub fn frequency(&self) -> f32 {
        Self::CPU_RATE / (16.0 * (self.timer as f32 + 1.0))
    }

    /// The nearest equal-tempered MIDI note number
    pub fn midi(&self) -> i32 {
        let semitones = 12.0 * (self.frequency() / Self::FREQ_A4).log2();
        Self::MIDI_A4 + semitones.round() as i32
    }
}

impl PartialOrd for Pitch {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pitch {
    /// Pitches order by ascending frequency, so the timer comparison is reversed
    fn cmp(&self, other: &Self) -> Ordering {
        other.timer.cmp(&self.timer)
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_rest() {
            return write!(f, "--");
        }

        let note = self.midi();
        let step = Self::STEP_NAMES[note.rem_euclid(12) as usize];
        let octave = note.div_euclid(12) - 1;
        write!(f, "{step}{octave}")
    }
}

/// MIDI note numbers for the equal-tempered names the game's tables use
///
/// Sharps only; the flat spellings alias the same numbers.
pub mod midi {
    pub const C2: i32 = 36;
    pub const CS2: i32 = 37;
    pub const D2: i32 = 38;
    pub const DS2: i32 = 39;
    pub const E2: i32 = 40;
    pub const F2: i32 = 41;
    pub const FS2: i32 = 42;
    pub const G2: i32 = 43;
    pub const GS2: i32 = 44;
    pub const A2: i32 = 45;
    pub const AS2: i32 = 46;
    pub const B2: i32 = 47;
    pub const C3: i32 = 48;
    pub const CS3: i32 = 49;
    pub const D3: i32 = 50;
    pub const DS3: i32 = 51;
    pub const E3: i32 = 52;
    pub const F3: i32 = 53;
    pub const FS3: i32 = 54;
    pub const G3: i32 = 55;
    pub const GS3: i32 = 56;
    pub const A3: i32 = 57;
    pub const AS3: i32 = 58;
    pub const B3: i32 = 59;
    pub const C4: i32 = 60;
    pub const CS4: i32 = 61;
    pub const D4: i32 = 62;
    pub const DS4: i32 = 63;
    pub const E4: i32 = 64;
    pub const F4: i32 = 65;
    pub const FS4: i32 = 66;
    pub const G4: i32 = 67;
    pub const GS4: i32 = 68;
    pub const A4: i32 = 69;
    pub const AS4: i32 = 70;
    pub const B4: i32 = 71;
    pub const C5: i32 = 72;
    pub const CS5: i32 = 73;
    pub const D5: i32 = 74;
    pub const DS5: i32 = 75;
    pub const E5: i32 = 76;
    pub const F5: i32 = 77;
    pub const FS5: i32 = 78;
    pub const G5: i32 = 79;
    pub const GS5: i32 = 80;
    pub const A5: i32 = 81;
    pub const AS5: i32 = 82;
    pub const B5: i32 = 83;
    pub const C6: i32 = 84;
    pub const CS6: i32 = 85;
    pub const D6: i32 = 86;
    pub const DS6: i32 = 87;
    pub const E6: i32 = 88;
    pub const F6: i32 = 89;
    pub const FS6: i32 = 90;
    pub const G6: i32 = 91;
    pub const GS6: i32 = 92;
    pub const A6: i32 = 93;
    pub const AS6: i32 = 94;
    pub const B6: i32 = 95;
    pub const C7: i32 = 96;
    pub const CS7: i32 = 97;
    pub const D7: i32 = 98;
    pub const DS7: i32 = 99;
    pub const E7: i32 = 100;
    pub const F7: i32 = 101;
    pub const FS7: i32 = 102;
    pub const G7: i32 = 103;
    pub const GS7: i32 = 104;
    pub const A7: i32 = 105;
    pub const AS7: i32 = 106;
    pub const B7: i32 = 107;
}
