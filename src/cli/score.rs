//! `ivscore iv` - rank features by Information Value

use std::time::Instant;

use anyhow::{Context, Result};
use console::style;

use crate::cli::IvArgs;
use crate::pipeline::{
    analyze_feature_iv, analyze_feature_iv_as, analyze_features_iv, load_dataset, FeatureType,
    IvAnalysis,
};
use crate::report::{display_bins, export_iv_analysis, ExportParams, IvSummary};
use crate::utils::{
    create_spinner, finish_with_success, print_banner, print_completion, print_config,
    print_count, print_info, print_step_header, print_step_time, print_success, print_warning,
    truncate_path, CHART, FOLDER, SAVE, TARGET,
};

/// Run the IV scoring pipeline: load, score, display, export
pub fn run_iv(args: &IvArgs) -> Result<()> {
    let config = args.iv_config();

    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(&[
        (&FOLDER, "Input", truncate_path(&args.input, 36)),
        (&TARGET, "Target", args.target.clone()),
        (&CHART, "Bins", config.max_bins.to_string()),
        (&CHART, "Epsilon", config.epsilon.to_string()),
        (
            &SAVE,
            "Export",
            args.export
                .as_ref()
                .map(|p| truncate_path(p, 36))
                .unwrap_or_else(|| "-".to_string()),
        ),
    ]);

    // Step 1: Load dataset
    print_step_header(1, "Load Dataset");
    let step_start = Instant::now();
    let spinner = create_spinner("Loading dataset...");
    let df = load_dataset(&args.input, args.infer_schema_length)?;
    finish_with_success(&spinner, "Dataset loaded");

    let (rows, cols) = df.shape();
    println!("\n    {} Dataset Statistics:", style("✧").cyan());
    println!("      Rows: {}", rows);
    println!("      Columns: {}", cols);
    println!(
        "      Estimated memory: {:.2} MB",
        df.estimated_size() as f64 / (1024.0 * 1024.0)
    );
    print_step_time(step_start.elapsed());

    // Step 2: IV analysis
    print_step_header(2, "Information Value Analysis");
    let step_start = Instant::now();

    let analyses: Vec<IvAnalysis> = if args.features.is_empty() {
        analyze_features_iv(&df, &args.target, &config, &args.categorical, &args.drop_columns)
            .context("IV analysis failed")?
    } else {
        let mut analyses = Vec::with_capacity(args.features.len());
        for feature in &args.features {
            let analysis = if args.categorical.contains(feature) {
                analyze_feature_iv_as(&df, feature, &args.target, FeatureType::Categorical, &config)
            } else {
                analyze_feature_iv(&df, feature, &args.target, &config)
            }
            .with_context(|| format!("IV analysis failed for feature '{}'", feature))?;
            analyses.push(analysis);
        }
        analyses.sort_by(|a, b| {
            b.iv.partial_cmp(&a.iv)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.feature_name.cmp(&b.feature_name))
        });
        analyses
    };

    print_success(&format!("Scored {} feature(s)", analyses.len()));
    print_step_time(step_start.elapsed());

    let summary = IvSummary::new(analyses, args.min_iv);
    summary.display();

    if summary.weak_features.is_empty() {
        print_info("No features below the minimum IV");
    } else {
        print_count(
            "weak feature(s)",
            summary.weak_features.len(),
            Some(&format!("(IV < {:.2})", args.min_iv)),
        );
    }

    let suspicious = summary.suspicious_features();
    if !suspicious.is_empty() {
        print_warning(&format!(
            "IV > 0.5 for {} - check for target leakage",
            suspicious.join(", ")
        ));
    }

    if args.show_bins {
        for analysis in &summary.analyses {
            display_bins(analysis);
        }
    }

    // Step 3: Export
    if let Some(export_path) = &args.export {
        print_step_header(3, "Export Results");
        let input_file = args.input.display().to_string();
        export_iv_analysis(
            &summary.analyses,
            export_path,
            &ExportParams {
                input_file: &input_file,
                target_column: &args.target,
                config: &config,
                min_iv: args.min_iv,
            },
        )?;
        print_success(&format!("Saved to {}", export_path.display()));
    }

    print_completion("IV scoring complete!");

    Ok(())
}
