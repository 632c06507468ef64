//! Command-line argument definitions using clap

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::pipeline::{IvConfig, MissingPolicy, DEFAULT_EPSILON, DEFAULT_MAX_BINS};

/// ivscore - Credit-risk feature engineering and Information Value scoring
#[derive(Parser, Debug)]
#[command(name = "ivscore")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score features by Information Value (WoE binning) against a binary target
    Iv(IvArgs),

    /// Derive credit-risk features (FICO, credit history, flags, vintages, ratios) from raw loan data
    Engineer(EngineerArgs),
}

#[derive(Args, Debug)]
pub struct IvArgs {
    /// Input file path (CSV or Parquet)
    #[arg(short, long)]
    pub input: PathBuf,

    /// Binary target column (1 = Bad / event, 0 = Good)
    #[arg(short, long)]
    pub target: String,

    /// Feature to score; repeat for several. Scores every other column when omitted.
    #[arg(short = 'f', long = "feature")]
    pub features: Vec<String>,

    /// Number of quantile bins for numeric features (fewer when quantiles tie)
    #[arg(long, default_value_t = DEFAULT_MAX_BINS, value_parser = validate_bins)]
    pub bins: usize,

    /// Value substituted for a zero Good/Bad distribution before taking the log
    #[arg(long, default_value_t = DEFAULT_EPSILON, value_parser = validate_epsilon)]
    pub epsilon: f64,

    /// Give missing values of numeric features their own bin instead of excluding them
    #[arg(long, default_value = "false")]
    pub missing_bin: bool,

    /// Columns to treat as categorical regardless of type (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub categorical: Vec<String>,

    /// Columns to leave out of the scoring (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub drop_columns: Vec<String>,

    /// Features below this IV are reported as weak
    #[arg(long, default_value = "0.02")]
    pub min_iv: f64,

    /// Print the per-bin WoE table of every scored feature
    #[arg(long, default_value = "false")]
    pub show_bins: bool,

    /// Write the full analysis to this JSON file
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Number of rows to use for schema inference (CSV only).
    /// Use 0 for full table scan (very slow for large files).
    #[arg(long, default_value = "10000")]
    pub infer_schema_length: usize,
}

impl IvArgs {
    /// Algorithm settings selected by the flags
    pub fn iv_config(&self) -> IvConfig {
        IvConfig {
            max_bins: self.bins,
            epsilon: self.epsilon,
            missing_policy: if self.missing_bin {
                MissingPolicy::SeparateBin
            } else {
                MissingPolicy::ByFeatureType
            },
        }
    }
}

#[derive(Args, Debug)]
pub struct EngineerArgs {
    /// Input file path (CSV or Parquet) with raw loan records
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output file path (CSV or Parquet, determined by extension).
    /// Defaults to input directory with '_features' suffix (e.g., loans.csv → loans_features.csv).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// JSON file overriding raw column names (e.g. {"fico_low": "FICO_LOW"})
    #[arg(long)]
    pub columns: Option<PathBuf>,

    /// Number of rows to use for schema inference (CSV only).
    /// Use 0 for full table scan (very slow for large files).
    #[arg(long, default_value = "10000")]
    pub infer_schema_length: usize,
}

impl EngineerArgs {
    /// Get the output path, deriving from input if not explicitly provided.
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| derived_path(&self.input, "features"))
    }
}

/// `<dir>/<stem>_<suffix>.<ext>` next to `input`
fn derived_path(input: &Path, suffix: &str) -> PathBuf {
    let parent = input.parent().unwrap_or_else(|| Path::new("."));
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let extension = input
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("parquet");
    parent.join(format!("{}_{}.{}", stem, suffix, extension))
}

/// Validator for the bins parameter
fn validate_bins(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid bin count", s))?;

    if value == 0 {
        Err("bins must be at least 1".to_string())
    } else {
        Ok(value)
    }
}

/// Validator for the epsilon parameter
fn validate_epsilon(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if value > 0.0 && value < 1.0 {
        Ok(value)
    } else {
        Err(format!("epsilon must be between 0.0 and 1.0 (exclusive), got {}", value))
    }
}
