//! CLI module - argument parsing and subcommand runners

mod args;
pub mod engineer;
pub mod score;

pub use args::*;
