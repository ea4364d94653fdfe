//! Command-line interface definitions.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "keylift",
    version,
    about = "Recover per-question reporting categories from scanned ACT scoring-key pages"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan captured key pages and write the category file
    Scan(ScanArgs),

    /// Print the calibrated page layout
    Info,
}

#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Directory with the reference page images (e.png, m.png, rs.png)
    #[arg(short, long)]
    pub reference_dir: PathBuf,

    /// Directory with the captured page images (same file names)
    #[arg(short, long)]
    pub capture_dir: PathBuf,

    /// Directory to write the category file into
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,

    /// ACT test code, yyyymm
    #[arg(short, long)]
    pub test_code: String,

    /// Capture profile TOML (default: keylift.toml, then the user config dir)
    #[arg(short, long)]
    pub profile: Option<PathBuf>,
}
