use anyhow::{Context, Result, bail};
use clap::Args;
use std::{fs, path::PathBuf};
use z2music::{Pattern, Rom, Track, notation};

/// Apply a mod file's replacement songs to a ROM image
#[derive(Args)]
pub struct ApplyArgs {
    /// The path to the mod file describing replacement songs
    file: PathBuf,

    /// The path to the ROM image to modify
    #[arg(long)]
    rom: PathBuf,

    /// The path the modified image should be saved to
    #[arg(short, long)]
    output: PathBuf,
}

pub fn apply(args: &ApplyArgs) -> Result<()> {
    let mut rom = Rom::from_path(&args.rom).context("Reading the ROM image failed")?;
    let text = fs::read_to_string(&args.file).context("Reading the mod file failed")?;

    process_modfile(&mut rom, &text)?;

    rom.save(&args.output)
        .context("Saving the modified image failed")?;
    println!("Wrote {}", args.output.display());

    Ok(())
}

/// Run a mod file's commands against a decoded ROM
pub fn process_modfile(rom: &mut Rom, text: &str) -> Result<()> {
    let mut track: Option<Track> = None;
    let mut transpose = 0;
    let mut patterns = 0;
    let mut sequenced = false;

    let mut lines = text.lines();
    while let Some(line) = lines.next() {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            continue;
        };

        match command {
            "song" => {
                let name = words.next().context("song requires a track name")?;

                if track.is_some() && !sequenced {
                    eprintln!("warning: song changed without setting a sequence");
                }

                let next: Track = name.parse()?;
                rom.song_mut(next).clear();
                track = Some(next);
                transpose = 0;
                patterns = 0;
                sequenced = false;
            }

            "transpose" => {
                let offset = words.next().context("transpose requires an offset")?;
                transpose = offset
                    .parse()
                    .with_context(|| format!("bad transpose offset {offset:?}"))?;
            }

            "pattern" => {
                let track = track.context("pattern outside a song")?;
                if sequenced {
                    eprintln!("warning: song already sequenced");
                }

                let first = words.next().context("pattern requires a tempo")?;
                let first = parse_hex_byte(first)?;
                let second = words.next().map(parse_hex_byte).transpose()?;

                // Four note lines follow: Pulse1, Pulse2, Triangle, Noise
                let mut line = || notation::parse_notes(lines.next().unwrap_or_default(), transpose);
                let (pulse1, pulse2, triangle, noise) = (line(), line(), line(), line());

                let pattern = match second {
                    // Two values make this a voiced pattern: voice1 voice2
                    Some(voice2) => Pattern::voiced(first, voice2, pulse1, pulse2, triangle, noise),
                    None => Pattern::with_notes(first, pulse1, pulse2, triangle, noise),
                };

                rom.song_mut(track).add_pattern(pattern);
                patterns += 1;
            }

            "sequence" => {
                let track = track.context("sequence outside a song")?;

                let mut sequence = Vec::new();
                for word in words {
                    let n: usize = word
                        .parse()
                        .with_context(|| format!("bad sequence entry {word:?}"))?;
                    if n == 0 || n > patterns {
                        bail!("no such pattern: {n}");
                    }
                    sequence.push(n - 1);
                }

                rom.song_mut(track).set_sequence(sequence);
                sequenced = true;
            }

            _ => eprintln!("warning: unknown keyword {command:?}"),
        }
    }

    if track.is_some() && !sequenced {
        eprintln!("warning: reached end of file with an unsequenced song");
    }

    Ok(())
}

fn parse_hex_byte(word: &str) -> Result<u8> {
    let digits = word.strip_prefix("0x").unwrap_or(word);
    u8::from_str_radix(digits, 16).with_context(|| format!("bad hex byte {word:?}"))
}
