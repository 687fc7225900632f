use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use z2music::Rom;

/// Print an image's pitch table
#[derive(Args)]
pub struct PitchesArgs {
    /// The path to the ROM image to inspect
    rom: PathBuf,

    /// Print the title-music pitch table instead of the in-game one
    #[arg(short, long)]
    title: bool,
}

pub fn pitches(args: &PitchesArgs) -> Result<()> {
    let rom = Rom::from_path(&args.rom).context("Reading the ROM image failed")?;

    let lut = if args.title {
        &rom.tables().title_pitch
    } else {
        &rom.tables().pitch
    };

    for position in 0..lut.capacity() {
        let index = (position * 2) as u8;

        if position % 8 == 0 {
            print!("{index:02x}");
        }

        print!("{:>6}", lut.at(index).to_string());

        if position % 8 == 7 {
            println!();
        }
    }

    Ok(())
}
