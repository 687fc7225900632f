use anyhow::Result;
use clap::Parser;

use z2music_tools::dump::{DumpArgs, dump};
use z2music_tools::modfile::{ApplyArgs, apply};
use z2music_tools::pitches::{PitchesArgs, pitches};
use z2music_tools::relocate::{RelocateArgs, relocate};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
enum Cli {
    Dump(DumpArgs),
    Apply(ApplyArgs),
    Relocate(RelocateArgs),
    Pitches(PitchesArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    match Cli::parse() {
        Cli::Dump(args) => dump(&args),
        Cli::Apply(args) => apply(&args),
        Cli::Relocate(args) => relocate(&args),
        Cli::Pitches(args) => pitches(&args),
    }
}
