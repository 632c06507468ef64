//! `ivscore engineer` - derive credit-risk features from raw loan records

use std::time::Instant;

use anyhow::{Context, Result};
use console::style;

use crate::cli::EngineerArgs;
use crate::pipeline::{engineer_features, load_dataset, load_feature_columns, save_dataset, FeatureColumns};
use crate::utils::{
    create_spinner, finish_with_success, print_banner, print_completion, print_config,
    print_info, print_step_header, print_step_time, truncate_path, FOLDER, SAVE,
};

/// Load raw loans, append every derivable feature and save the result
pub fn run_engineer(args: &EngineerArgs) -> Result<()> {
    let output_path = args.output_path();
    let columns = match &args.columns {
        Some(path) => load_feature_columns(path)?,
        None => FeatureColumns::default(),
    };

    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(&[
        (&FOLDER, "Input", truncate_path(&args.input, 36)),
        (&SAVE, "Output", truncate_path(&output_path, 36)),
    ]);

    // Step 1: Load dataset
    print_step_header(1, "Load Dataset");
    let step_start = Instant::now();
    let spinner = create_spinner("Loading dataset...");
    let df = load_dataset(&args.input, args.infer_schema_length)?;
    finish_with_success(&spinner, "Dataset loaded");
    let (rows, cols) = df.shape();
    println!("      {} rows × {} columns", style(rows).yellow(), style(cols).yellow());
    print_step_time(step_start.elapsed());

    // Step 2: Derive features
    print_step_header(2, "Feature Engineering");
    let step_start = Instant::now();
    let (mut features, added) =
        engineer_features(&df, &columns).context("Feature engineering failed")?;

    if added.is_empty() {
        print_info("No source columns found - nothing to derive");
    } else {
        println!(
            "      Added {} feature(s):",
            style(added.len()).yellow().bold()
        );
        for name in &added {
            println!("        {} {}", style("•").dim(), name);
        }
    }
    print_step_time(step_start.elapsed());

    // Step 3: Save output
    print_step_header(3, "Save Results");
    let step_start = Instant::now();
    let spinner = create_spinner("Writing output file...");
    save_dataset(&mut features, &output_path)?;
    finish_with_success(&spinner, &format!("Saved to {}", output_path.display()));
    print_step_time(step_start.elapsed());

    print_completion("Feature engineering complete!");

    Ok(())
}
