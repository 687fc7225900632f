//! The fixed set of music tracks and the game sections that own them

use std::{fmt, str::FromStr};
use thiserror::Error;

/// One named music track in the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Track {
    TitleIntro,
    TitleThemeStart,
    TitleThemeBuildup,
    TitleThemeMain,
    TitleThemeBreakdown,

    OverworldIntro,
    OverworldTheme,
    BattleTheme,
    CaveItemFanfare,

    TownIntro,
    TownTheme,
    HouseTheme,
    TownItemFanfare,

    PalaceIntro,
    PalaceTheme,
    BossTheme,
    PalaceItemFanfare,
    CrystalFanfare,

    GreatPalaceIntro,
    GreatPalaceTheme,
    ZeldaTheme,
    CreditsTheme,
    GreatPalaceItemFanfare,
    TriforceFanfare,
    FinalBossTheme,
}

impl Track {
    /// Every track, in section order
    pub const ALL: [Track; 25] = [
        Track::TitleIntro,
        Track::TitleThemeStart,
        Track::TitleThemeBuildup,
        Track::TitleThemeMain,
        Track::TitleThemeBreakdown,
        Track::OverworldIntro,
        Track::OverworldTheme,
        Track::BattleTheme,
        Track::CaveItemFanfare,
        Track::TownIntro,
        Track::TownTheme,
        Track::HouseTheme,
        Track::TownItemFanfare,
        Track::PalaceIntro,
        Track::PalaceTheme,
        Track::BossTheme,
        Track::PalaceItemFanfare,
        Track::CrystalFanfare,
        Track::GreatPalaceIntro,
        Track::GreatPalaceTheme,
        Track::ZeldaTheme,
        Track::CreditsTheme,
        Track::GreatPalaceItemFanfare,
        Track::TriforceFanfare,
        Track::FinalBossTheme,
    ];

    /// The track's canonical name
    pub fn name(&self) -> &'static str {
        match self {
            Track::TitleIntro => "TitleIntro",
            Track::TitleThemeStart => "TitleThemeStart",
            Track::TitleThemeBuildup => "TitleThemeBuildup",
            Track::TitleThemeMain => "TitleThemeMain",
            Track::TitleThemeBreakdown => "TitleThemeBreakdown",
            Track::OverworldIntro => "OverworldIntro",
            Track::OverworldTheme => "OverworldTheme",
            Track::BattleTheme => "BattleTheme",
            Track::CaveItemFanfare => "CaveItemFanfare",
            Track::TownIntro => "TownIntro",
            Track::TownTheme => "TownTheme",
            Track::HouseTheme => "HouseTheme",
            Track::TownItemFanfare => "TownItemFanfare",
            Track::PalaceIntro => "PalaceIntro",
            Track::PalaceTheme => "PalaceTheme",
            Track::BossTheme => "BossTheme",
            Track::PalaceItemFanfare => "PalaceItemFanfare",
            Track::CrystalFanfare => "CrystalFanfare",
            Track::GreatPalaceIntro => "GreatPalaceIntro",
            Track::GreatPalaceTheme => "GreatPalaceTheme",
            Track::ZeldaTheme => "ZeldaTheme",
            Track::CreditsTheme => "CreditsTheme",
            Track::GreatPalaceItemFanfare => "GreatPalaceItemFanfare",
            Track::TriforceFanfare => "TriforceFanfare",
            Track::FinalBossTheme => "FinalBossTheme",
        }
    }

    /// The section whose tables hold this track
    pub fn section(&self) -> Section {
        Section::ALL
            .into_iter()
            .find(|section| section.tracks().contains(self))
            .unwrap()
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Track {
    type Err = UnknownTrackName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Track::ALL
            .into_iter()
            .find(|track| track.name() == s)
            .ok_or_else(|| UnknownTrackName(s.to_string()))
    }
}

/// Error for when a track name does not match any known track
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown track name {0:?}")]
pub struct UnknownTrackName(pub String);

/// One of the five game areas with its own song tables
///
/// Each section owns an independent 8-slot song table, sequence tables, pattern
/// tables and note data, all laid out contiguously from a base address that the
/// section's loader code addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Title,
    Overworld,
    Town,
    Palace,
    GreatPalace,
}

impl Section {
    pub const ALL: [Section; 5] = [
        Section::Title,
        Section::Overworld,
        Section::Town,
        Section::Palace,
        Section::GreatPalace,
    ];

    /// The section's canonical name
    pub fn name(&self) -> &'static str {
        match self {
            Section::Title => "Title",
            Section::Overworld => "Overworld",
            Section::Town => "Town",
            Section::Palace => "Palace",
            Section::GreatPalace => "GreatPalace",
        }
    }

    /// The section's position in per-section storage
    pub(crate) fn index(&self) -> usize {
        *self as usize
    }

    /// The address of the loader code that addresses this section's tables
    pub fn loader_address(&self) -> usize {
        match self {
            Section::Title => 0x0182fd,
            Section::Overworld => 0x019b90,
            Section::Town => 0x019bcf,
            Section::Palace => 0x019c0e,
            Section::GreatPalace => 0x019c4b,
        }
    }

    /// Does this section use the voiced/title encoding mode?
    pub fn is_title(&self) -> bool {
        matches!(self, Section::Title)
    }

    /// The tracks stored in this section, in table order
    pub fn tracks(&self) -> &'static [Track] {
        match self {
            Section::Title => &[
                Track::TitleIntro,
                Track::TitleThemeStart,
                Track::TitleThemeBuildup,
                Track::TitleThemeMain,
                Track::TitleThemeBreakdown,
            ],
            Section::Overworld => &[
                Track::OverworldIntro,
                Track::OverworldTheme,
                Track::BattleTheme,
                Track::CaveItemFanfare,
            ],
            Section::Town => &[
                Track::TownIntro,
                Track::TownTheme,
                Track::HouseTheme,
                Track::TownItemFanfare,
            ],
            Section::Palace => &[
                Track::PalaceIntro,
                Track::PalaceTheme,
                Track::BossTheme,
                Track::PalaceItemFanfare,
                Track::CrystalFanfare,
            ],
            Section::GreatPalace => &[
                Track::GreatPalaceIntro,
                Track::GreatPalaceTheme,
                Track::ZeldaTheme,
                Track::CreditsTheme,
                Track::GreatPalaceItemFanfare,
                Track::TriforceFanfare,
                Track::FinalBossTheme,
            ],
        }
    }

    /// The section's fixed 8-slot song table: physical slot to track-list index
    ///
    /// Several slots alias the same song; the out-of-range index one past the last
    /// track is the empty "no song" sequence.
    pub(crate) fn alias_table(&self) -> [usize; 8] {
        match self {
            Section::Title => [0, 1, 2, 3, 4, 5, 5, 5],
            Section::Overworld | Section::Town => [0, 1, 2, 2, 3, 4, 4, 4],
            Section::Palace => [0, 1, 1, 2, 3, 5, 4, 5],
            Section::GreatPalace => [0, 1, 2, 3, 4, 5, 6, 7],
        }
    }

    /// The song-table slot a track is decoded from: the first slot aliasing it
    pub(crate) fn entry_for(&self, index: usize) -> usize {
        self.alias_table()
            .into_iter()
            .position(|alias| alias == index)
            .unwrap()
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Section {
    type Err = UnknownLoaderName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Section::ALL
            .into_iter()
            .find(|section| section.name() == s)
            .ok_or_else(|| UnknownLoaderName(s.to_string()))
    }
}

/// Error for when a section name does not match any known loader
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown section name {0:?}")]
pub struct UnknownLoaderName(pub String);
