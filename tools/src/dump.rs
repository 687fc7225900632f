use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use z2music::{Channel, Rom, Track, notation};

/// Dump tracks as the textual note notation
#[derive(Args)]
pub struct DumpArgs {
    /// The path to the ROM image to dump
    rom: PathBuf,

    /// Dump only the listed track
    #[arg(short, long)]
    track: Option<String>,
}

pub fn dump(args: &DumpArgs) -> Result<()> {
    let rom = Rom::from_path(&args.rom).context("Reading the ROM image failed")?;

    match &args.track {
        Some(name) => {
            let track: Track = name.parse()?;
            dump_track(&rom, track);
        }
        None => {
            for track in Track::ALL {
                dump_track(&rom, track);
            }
        }
    }

    Ok(())
}

fn dump_track(rom: &Rom, track: Track) {
    let song = rom.song(track);

    println!("song {track}");

    for pattern in song.patterns() {
        if pattern.is_voiced() {
            println!("pattern {:02x} {:02x}", pattern.voice1(), pattern.voice2());
        } else {
            println!("pattern {:02x}", pattern.tempo());
        }

        for channel in Channel::ALL {
            println!("{}", notation::dump_notes(pattern.notes(channel)));
        }
    }

    if !song.is_empty() {
        print!("sequence");
        for step in song.sequence() {
            print!(" {}", step + 1);
        }
        println!();
    }

    println!();
}
