use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use z2music::{Rom, Section};

/// Move a section's music tables to a new base address
#[derive(Args)]
pub struct RelocateArgs {
    /// The section whose tables should move
    section: String,

    /// The new base address as a hexadecimal 16-bit CPU address
    address: String,

    /// The path to the ROM image to modify
    #[arg(long)]
    rom: PathBuf,

    /// The path the modified image should be saved to
    #[arg(short, long)]
    output: PathBuf,
}

pub fn relocate(args: &RelocateArgs) -> Result<()> {
    let section: Section = args.section.parse()?;

    let digits = args.address.strip_prefix("0x").unwrap_or(&args.address);
    let base = u16::from_str_radix(digits, 16)
        .with_context(|| format!("bad base address {:?}", args.address))?;

    let mut rom = Rom::from_path(&args.rom).context("Reading the ROM image failed")?;

    rom.move_song_table(section, base);
    rom.save(&args.output)
        .context("Saving the modified image failed")?;

    println!(
        "Moved the {section} tables to {:#07x} and wrote {}",
        rom.song_table_address(section),
        args.output.display()
    );

    Ok(())
}
