use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
pub struct Cli {
    /// Script to run, one command per line (default: stdin)
    #[arg(long, short)]
    pub script: Option<PathBuf>,

    /// Print free inodes and blocks after each command
    #[arg(long, short)]
    pub verbose: bool,
}
