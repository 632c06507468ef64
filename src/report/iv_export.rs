//! IV analysis export to JSON

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use crate::pipeline::{FeatureType, IvAnalysis, IvConfig};

/// Metadata about the scoring run
#[derive(Serialize)]
pub struct AnalysisMetadata {
    /// Timestamp of the analysis (ISO 8601 format)
    pub timestamp: String,
    pub ivscore_version: String,
    pub input_file: String,
    pub target_column: String,
    pub config: IvConfig,
    /// Features scored below this IV are flagged as weak
    pub min_iv: f64,
}

/// Summary statistics of the run
#[derive(Serialize)]
pub struct AnalysisSummary {
    pub total_features_analyzed: usize,
    pub numeric_features: usize,
    pub categorical_features: usize,
    pub weak_features: usize,
    pub suspicious_features: usize,
    pub avg_iv: f64,
}

/// A single feature's analysis with its weak flag
#[derive(Serialize)]
pub struct IvExportEntry {
    #[serde(flatten)]
    pub analysis: IvAnalysis,
    pub below_min_iv: bool,
}

/// Complete IV export with metadata
#[derive(Serialize)]
pub struct IvAnalysisExport {
    pub metadata: AnalysisMetadata,
    pub summary: AnalysisSummary,
    pub features: Vec<IvExportEntry>,
}

/// Parameters recorded in the export metadata
pub struct ExportParams<'a> {
    pub input_file: &'a str,
    pub target_column: &'a str,
    pub config: &'a IvConfig,
    pub min_iv: f64,
}

/// Build the export document for a set of analyses
pub fn build_iv_export(analyses: &[IvAnalysis], params: &ExportParams) -> IvAnalysisExport {
    let features: Vec<IvExportEntry> = analyses
        .iter()
        .map(|analysis| IvExportEntry {
            analysis: analysis.clone(),
            below_min_iv: analysis.iv < params.min_iv,
        })
        .collect();

    let numeric_features = analyses
        .iter()
        .filter(|a| a.feature_type == FeatureType::Numeric)
        .count();

    let avg_iv = if analyses.is_empty() {
        0.0
    } else {
        analyses.iter().map(|a| a.iv).sum::<f64>() / analyses.len() as f64
    };

    IvAnalysisExport {
        metadata: AnalysisMetadata {
            timestamp: Utc::now().to_rfc3339(),
            ivscore_version: env!("CARGO_PKG_VERSION").to_string(),
            input_file: params.input_file.to_string(),
            target_column: params.target_column.to_string(),
            config: params.config.clone(),
            min_iv: params.min_iv,
        },
        summary: AnalysisSummary {
            total_features_analyzed: analyses.len(),
            numeric_features,
            categorical_features: analyses.len() - numeric_features,
            weak_features: features.iter().filter(|f| f.below_min_iv).count(),
            suspicious_features: analyses
                .iter()
                .filter(|a| a.strength == crate::pipeline::IvStrength::Suspicious)
                .count(),
            avg_iv,
        },
        features,
    }
}

/// Export IV analysis results to a pretty-printed JSON file
pub fn export_iv_analysis(
    analyses: &[IvAnalysis],
    output_path: &Path,
    params: &ExportParams,
) -> Result<()> {
    let export = build_iv_export(analyses, params);

    let json = serde_json::to_string_pretty(&export)
        .context("Failed to serialize IV analysis to JSON")?;

    std::fs::write(output_path, json)
        .with_context(|| format!("Failed to write IV analysis to {}", output_path.display()))?;

    Ok(())
}
