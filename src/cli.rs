//! Command-line interface for Thornvale
//!
//! Supports both graphical (default) and headless modes.

use clap::Parser;
use std::path::PathBuf;

/// Turn-based encounter prototype
#[derive(Parser, Debug)]
#[command(name = "thornvale")]
#[command(about = "Turn-based encounter prototype")]
#[command(version)]
pub struct Args {
    /// Run in headless mode with the specified JSON scenario file
    #[arg(long, value_name = "SCENARIO_FILE")]
    pub headless: Option<PathBuf>,

    /// Random seed for deterministic loot rolls (headless mode only)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Maximum number of turns before aborting (headless mode only)
    #[arg(long)]
    pub max_turns: Option<u32>,
}

pub fn parse_args() -> Args {
    Args::parse()
}
