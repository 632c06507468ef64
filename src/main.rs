//! ivscore: credit-risk feature engineering and Information Value CLI
//!
//! `ivscore iv` ranks features by IV against a binary target;
//! `ivscore engineer` derives credit-risk features from raw loan records.

use anyhow::Result;
use clap::Parser;

use ivscore::cli::{self, Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Iv(args) => cli::score::run_iv(args),
        Commands::Engineer(args) => cli::engineer::run_engineer(args),
    }
}
