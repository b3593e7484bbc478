//! coursedocs CLI — static documentation builder for course repositories.
//!
//! Zips every course, writes a markdown page per course with download and
//! file links, and copies the repository readme into the docs index.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli)
}
