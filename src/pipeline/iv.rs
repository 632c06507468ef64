//! Information Value (IV) and Weight of Evidence (WoE) feature scoring
//!
//! Continuous features are discretized into equal-population quantile bins,
//! discrete features use one bin per distinct value. Each bin's share of the
//! Good and Bad populations gives its WoE and IV contribution, and the
//! contributions sum to the feature's IV.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};

use indicatif::{ProgressBar, ProgressStyle};
use polars::prelude::*;
use rayon::prelude::*;
use serde::Serialize;

use super::error::{AnalysisError, AnalysisResult};

/// Default number of quantile bins for continuous features
pub const DEFAULT_MAX_BINS: usize = 10;

/// Value substituted for an exactly-zero Good/Bad distribution before the log.
///
/// Bins with no Good or no Bad rows get an approximated (understated) IV
/// contribution instead of an infinite one. Changing it changes reference IVs.
pub const DEFAULT_EPSILON: f64 = 0.0001;

/// Label of the bin holding rows with a missing feature value
pub const MISSING_LABEL: &str = "MISSING";

/// Tolerance for floating point comparison when checking binary 0/1 values
const TOLERANCE: f64 = 1e-9;

/// Number of offending values reported in an `InvalidTarget` error
const MAX_REPORTED_VALUES: usize = 10;

/// How a feature is discretized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FeatureType {
    /// Integer or floating-point storage, binned by quantiles
    Numeric,
    /// Anything else, one bin per distinct value
    Categorical,
}

impl std::fmt::Display for FeatureType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeatureType::Numeric => write!(f, "numeric"),
            FeatureType::Categorical => write!(f, "categorical"),
        }
    }
}

/// Treatment of rows whose feature value is null (or NaN)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum MissingPolicy {
    /// Categorical features keep missing values as their own bin; numeric
    /// features leave them out of every bin and out of the class totals.
    #[default]
    ByFeatureType,
    /// Missing values get their own bin for every feature type.
    SeparateBin,
}

/// Settings for the IV calculation
#[derive(Debug, Clone, Serialize)]
pub struct IvConfig {
    /// Target number of quantile bins; duplicate edges can reduce it
    pub max_bins: usize,
    /// Replacement for exactly-zero distributions
    pub epsilon: f64,
    pub missing_policy: MissingPolicy,
}

impl Default for IvConfig {
    fn default() -> Self {
        Self {
            max_bins: DEFAULT_MAX_BINS,
            epsilon: DEFAULT_EPSILON,
            missing_policy: MissingPolicy::default(),
        }
    }
}

/// Conventional interpretation bands for an IV value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum IvStrength {
    /// IV < 0.02
    NotPredictive,
    /// 0.02 <= IV < 0.1
    Weak,
    /// 0.1 <= IV < 0.3
    Medium,
    /// 0.3 <= IV <= 0.5
    Strong,
    /// IV > 0.5, usually a sign of target leakage
    Suspicious,
}

impl IvStrength {
    pub fn classify(iv: f64) -> Self {
        if iv < 0.02 {
            IvStrength::NotPredictive
        } else if iv < 0.1 {
            IvStrength::Weak
        } else if iv < 0.3 {
            IvStrength::Medium
        } else if iv <= 0.5 {
            IvStrength::Strong
        } else {
            IvStrength::Suspicious
        }
    }
}

impl std::fmt::Display for IvStrength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IvStrength::NotPredictive => write!(f, "Not predictive"),
            IvStrength::Weak => write!(f, "Weak"),
            IvStrength::Medium => write!(f, "Medium"),
            IvStrength::Strong => write!(f, "Strong"),
            IvStrength::Suspicious => write!(f, "Suspicious"),
        }
    }
}

/// Good/Bad statistics of a single bin
#[derive(Debug, Clone, Serialize)]
pub struct BinStats {
    /// Interval such as `(1.5, 3]` for quantile bins, the value itself for categories
    pub label: String,
    /// Lower edge (exclusive, except for the first bin); None for categories
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lower_bound: Option<f64>,
    /// Upper edge (inclusive); None for categories
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upper_bound: Option<f64>,
    /// Rows in the bin
    pub total: u64,
    /// Rows with target = 1
    pub bad: u64,
    /// Rows with target = 0
    pub good: u64,
    /// Share of all Good rows, after zero substitution
    pub dist_good: f64,
    /// Share of all Bad rows, after zero substitution
    pub dist_bad: f64,
    /// ln(dist_good / dist_bad)
    pub woe: f64,
    /// (dist_good - dist_bad) * woe
    pub iv_contribution: f64,
}

/// IV analysis of a single feature
#[derive(Debug, Clone, Serialize)]
pub struct IvAnalysis {
    pub feature_name: String,
    pub feature_type: FeatureType,
    /// Bins in ascending edge order, or sorted by label for categories;
    /// a missing-value bin always comes last
    pub bins: Vec<BinStats>,
    /// Total Information Value
    pub iv: f64,
    pub strength: IvStrength,
}

/// Row counts gathered for one bin before the distributions are known
#[derive(Debug, Clone)]
struct BinCounts {
    label: String,
    lower_bound: Option<f64>,
    upper_bound: Option<f64>,
    total: u64,
    bad: u64,
}

impl BinCounts {
    fn new(label: String, lower_bound: Option<f64>, upper_bound: Option<f64>) -> Self {
        Self {
            label,
            lower_bound,
            upper_bound,
            total: 0,
            bad: 0,
        }
    }

    fn add(&mut self, target: u8) {
        self.total += 1;
        self.bad += u64::from(target);
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Information Value of `feature` against the binary `target`, using the
/// default settings (10 quantile bins, epsilon 0.0001).
///
/// Errors with `ColumnNotFound` when either column is absent and with
/// `DegenerateTarget` when only one class is present.
pub fn compute_iv(df: &DataFrame, feature: &str, target: &str) -> AnalysisResult<f64> {
    analyze_feature_iv(df, feature, target, &IvConfig::default()).map(|analysis| analysis.iv)
}

/// Full per-bin IV analysis of one feature, detecting its type from the column dtype.
pub fn analyze_feature_iv(
    df: &DataFrame,
    feature: &str,
    target: &str,
    config: &IvConfig,
) -> AnalysisResult<IvAnalysis> {
    let column = lookup_column(df, feature)?;
    analyze_feature_iv_as(df, feature, target, detect_feature_type(column), config)
}

/// Full per-bin IV analysis of one feature with an explicit feature type.
///
/// Forcing `Categorical` on an integer column scores each code separately
/// instead of binning by quantiles.
pub fn analyze_feature_iv_as(
    df: &DataFrame,
    feature: &str,
    target: &str,
    feature_type: FeatureType,
    config: &IvConfig,
) -> AnalysisResult<IvAnalysis> {
    let column = lookup_column(df, feature)?;
    let targets = binary_target_values(df, target)?;
    analyze_column(column, &targets, target, feature_type, config)
}

/// Integer and floating-point columns are binned by quantiles; everything
/// else is treated as categorical.
pub fn detect_feature_type(column: &Column) -> FeatureType {
    if column.dtype().is_primitive_numeric() {
        FeatureType::Numeric
    } else {
        FeatureType::Categorical
    }
}

/// Score every column except the target (and `exclude`) in parallel.
///
/// # Arguments
/// * `df` - Dataset to score
/// * `target` - Name of the binary target column
/// * `config` - Binning and zero-substitution settings
/// * `categorical` - Columns to treat as categorical regardless of dtype
/// * `exclude` - Columns to skip (identifiers, weights, other outcomes)
///
/// # Returns
/// Analyses sorted by IV descending. Features that cannot be scored on their
/// own, e.g. when their non-missing rows cover a single class, are skipped.
pub fn analyze_features_iv(
    df: &DataFrame,
    target: &str,
    config: &IvConfig,
    categorical: &[String],
    exclude: &[String],
) -> AnalysisResult<Vec<IvAnalysis>> {
    let targets = binary_target_values(df, target)?;
    ensure_both_classes(&targets, target)?;

    let columns: Vec<&Column> = df
        .get_columns()
        .iter()
        .filter(|col| col.name().as_str() != target && !exclude.iter().any(|e| e == col.name().as_str()))
        .collect();

    if columns.is_empty() {
        return Ok(Vec::new());
    }

    let total = columns.len() as u64;
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("   Calculating IV [{bar:40.cyan/blue}] {pos}/{len} features ({percent}%) [{eta}]")
            .unwrap()
            .progress_chars("=>-"),
    );
    let progress_counter = AtomicU64::new(0);

    let mut analyses: Vec<IvAnalysis> = columns
        .par_iter()
        .filter_map(|column| {
            let feature_type = if categorical.iter().any(|c| c == column.name().as_str()) {
                FeatureType::Categorical
            } else {
                detect_feature_type(column)
            };
            let result = analyze_column(column, &targets, target, feature_type, config);

            let count = progress_counter.fetch_add(1, Ordering::Relaxed);
            if count % 10 == 0 || count == total - 1 {
                pb.set_position(count + 1);
            }

            result.ok()
        })
        .collect();

    pb.finish_and_clear();

    analyses.sort_by(|a, b| {
        b.iv.partial_cmp(&a.iv)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.feature_name.cmp(&b.feature_name))
    });

    Ok(analyses)
}

/// Names of features whose IV falls below `threshold`
pub fn features_below_iv(analyses: &[IvAnalysis], threshold: f64) -> Vec<String> {
    analyses
        .iter()
        .filter(|a| a.iv < threshold)
        .map(|a| a.feature_name.clone())
        .collect()
}

// ============================================================================
// Target handling
// ============================================================================

fn lookup_column<'a>(df: &'a DataFrame, name: &str) -> AnalysisResult<&'a Column> {
    df.column(name)
        .map_err(|_| AnalysisError::column_not_found(df, name))
}

/// Read the target as 0/1 per row.
///
/// Null (and NaN) targets become `None` and those rows are skipped by the
/// analysis. Any other value than 0 or 1 is rejected.
fn binary_target_values(df: &DataFrame, target: &str) -> AnalysisResult<Vec<Option<u8>>> {
    let column = lookup_column(df, target)?;

    if !(column.dtype().is_primitive_numeric() || column.dtype() == &DataType::Boolean) {
        let as_string = column.cast(&DataType::String)?;
        let values: BTreeSet<String> = as_string
            .str()?
            .into_iter()
            .flatten()
            .map(|s| s.to_string())
            .take(MAX_REPORTED_VALUES)
            .collect();
        return Err(AnalysisError::InvalidTarget {
            target: target.to_string(),
            values: values.into_iter().collect(),
        });
    }

    let as_float = column.cast(&DataType::Float64)?;
    let mut invalid: BTreeSet<String> = BTreeSet::new();
    let mut values = Vec::with_capacity(as_float.len());

    for value in as_float.f64()?.into_iter() {
        values.push(match value {
            Some(v) if v.is_nan() => None,
            Some(v) if v.abs() < TOLERANCE => Some(0),
            Some(v) if (v - 1.0).abs() < TOLERANCE => Some(1),
            Some(v) => {
                if invalid.len() < MAX_REPORTED_VALUES {
                    invalid.insert(v.to_string());
                }
                None
            }
            None => None,
        });
    }

    if !invalid.is_empty() {
        return Err(AnalysisError::InvalidTarget {
            target: target.to_string(),
            values: invalid.into_iter().collect(),
        });
    }

    Ok(values)
}

fn ensure_both_classes(targets: &[Option<u8>], target: &str) -> AnalysisResult<()> {
    let bad = targets.iter().flatten().filter(|&&t| t == 1).count();
    let good = targets.iter().flatten().filter(|&&t| t == 0).count();
    check_class_totals(good as u64, bad as u64, target)
}

fn check_class_totals(total_good: u64, total_bad: u64, target: &str) -> AnalysisResult<()> {
    if total_bad == 0 {
        return Err(AnalysisError::DegenerateTarget {
            target: target.to_string(),
            class: "Good",
        });
    }
    if total_good == 0 {
        return Err(AnalysisError::DegenerateTarget {
            target: target.to_string(),
            class: "Bad",
        });
    }
    Ok(())
}

// ============================================================================
// Binning
// ============================================================================

fn analyze_column(
    column: &Column,
    targets: &[Option<u8>],
    target: &str,
    feature_type: FeatureType,
    config: &IvConfig,
) -> AnalysisResult<IvAnalysis> {
    let counts = match feature_type {
        FeatureType::Numeric => quantile_bin_counts(column, targets, config)?,
        FeatureType::Categorical => categorical_bin_counts(column, targets)?,
    };

    finalize_analysis(column.name().to_string(), feature_type, counts, target, config.epsilon)
}

/// Group a numeric feature into quantile bins
fn quantile_bin_counts(
    column: &Column,
    targets: &[Option<u8>],
    config: &IvConfig,
) -> AnalysisResult<Vec<BinCounts>> {
    let as_float = column.cast(&DataType::Float64)?;

    let mut pairs: Vec<(f64, u8)> = Vec::with_capacity(as_float.len());
    let mut missing = BinCounts::new(MISSING_LABEL.to_string(), None, None);

    for (value, target) in as_float.f64()?.into_iter().zip(targets.iter()) {
        let Some(target) = *target else { continue };
        match value {
            Some(v) if !v.is_nan() => pairs.push((v, target)),
            _ => missing.add(target),
        }
    }

    let mut sorted: Vec<f64> = pairs.iter().map(|(v, _)| *v).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let edges = quantile_edges(&sorted, config.max_bins);

    let mut bins: Vec<BinCounts> = match edges.len() {
        0 => Vec::new(),
        1 => vec![BinCounts::new(
            format!("[{}, {}]", format_edge(edges[0]), format_edge(edges[0])),
            Some(edges[0]),
            Some(edges[0]),
        )],
        _ => edges
            .windows(2)
            .enumerate()
            .map(|(i, w)| {
                let open = if i == 0 { '[' } else { '(' };
                BinCounts::new(
                    format!("{}{}, {}]", open, format_edge(w[0]), format_edge(w[1])),
                    Some(w[0]),
                    Some(w[1]),
                )
            })
            .collect(),
    };

    for (value, target) in &pairs {
        bins[assign_bin(&edges, *value)].add(*target);
    }

    // Interpolated edges can leave a bin without rows
    bins.retain(|b| b.total > 0);

    if config.missing_policy == MissingPolicy::SeparateBin && missing.total > 0 {
        bins.push(missing);
    }

    Ok(bins)
}

/// Group a discrete feature by value; nulls form the trailing MISSING bin
fn categorical_bin_counts(column: &Column, targets: &[Option<u8>]) -> AnalysisResult<Vec<BinCounts>> {
    let as_string = column.cast(&DataType::String)?;

    let mut groups: BTreeMap<String, BinCounts> = BTreeMap::new();
    let mut missing = BinCounts::new(MISSING_LABEL.to_string(), None, None);

    for (value, target) in as_string.str()?.into_iter().zip(targets.iter()) {
        let Some(target) = *target else { continue };
        match value {
            Some(category) => groups
                .entry(category.to_string())
                .or_insert_with(|| BinCounts::new(category.to_string(), None, None))
                .add(target),
            None => missing.add(target),
        }
    }

    let mut bins: Vec<BinCounts> = groups.into_values().collect();
    if missing.total > 0 {
        bins.push(missing);
    }
    Ok(bins)
}

/// Quantile edges at 0, 1/q, ..., 1 of `sorted`, with duplicates dropped.
///
/// Each quantile interpolates linearly between the two closest ranks.
/// Heavy ties collapse edges, so fewer than `bins + 1` edges may come back.
fn quantile_edges(sorted: &[f64], bins: usize) -> Vec<f64> {
    if sorted.is_empty() || bins == 0 {
        return Vec::new();
    }

    let last_rank = (sorted.len() - 1) as f64;
    let step = 1.0 / bins as f64;

    let mut edges: Vec<f64> = (0..=bins)
        .map(|i| {
            let q = if i == bins { 1.0 } else { i as f64 * step };
            let position = last_rank * q;
            let lower = position.floor() as usize;
            let upper = (lower + 1).min(sorted.len() - 1);
            let fraction = position - lower as f64;
            lerp(sorted[lower], sorted[upper], fraction)
        })
        .collect();

    edges.dedup();
    edges
}

/// Linear interpolation, evaluated from the nearer endpoint
fn lerp(a: f64, b: f64, t: f64) -> f64 {
    let diff = b - a;
    if t >= 0.5 {
        b - diff * (1.0 - t)
    } else {
        a + diff * t
    }
}

/// Index of the right-closed interval `(edges[k], edges[k + 1]]` holding
/// `value`; the lowest edge belongs to the first bin.
fn assign_bin(edges: &[f64], value: f64) -> usize {
    if edges.len() < 2 {
        return 0;
    }
    let below = edges.partition_point(|e| *e < value);
    below.saturating_sub(1).min(edges.len() - 2)
}

fn format_edge(value: f64) -> String {
    let formatted = format!("{:.4}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

// ============================================================================
// WoE / IV
// ============================================================================

fn finalize_analysis(
    feature_name: String,
    feature_type: FeatureType,
    counts: Vec<BinCounts>,
    target: &str,
    epsilon: f64,
) -> AnalysisResult<IvAnalysis> {
    let rows: u64 = counts.iter().map(|c| c.total).sum();

    // Too few rows to discriminate anything
    if rows < 2 {
        return Ok(IvAnalysis {
            feature_name,
            feature_type,
            bins: Vec::new(),
            iv: 0.0,
            strength: IvStrength::classify(0.0),
        });
    }

    let total_bad: u64 = counts.iter().map(|c| c.bad).sum();
    let total_good = rows - total_bad;
    check_class_totals(total_good, total_bad, target)?;

    let bins: Vec<BinStats> = counts
        .into_iter()
        .map(|c| {
            let good = c.total - c.bad;
            let dist_good = substitute_zero(good as f64 / total_good as f64, epsilon);
            let dist_bad = substitute_zero(c.bad as f64 / total_bad as f64, epsilon);
            let (woe, iv_contribution) = calculate_woe_iv(dist_good, dist_bad);

            BinStats {
                label: c.label,
                lower_bound: c.lower_bound,
                upper_bound: c.upper_bound,
                total: c.total,
                bad: c.bad,
                good,
                dist_good,
                dist_bad,
                woe,
                iv_contribution,
            }
        })
        .collect();

    let iv: f64 = bins.iter().map(|b| b.iv_contribution).sum();

    Ok(IvAnalysis {
        feature_name,
        feature_type,
        bins,
        iv,
        strength: IvStrength::classify(iv),
    })
}

fn substitute_zero(dist: f64, epsilon: f64) -> f64 {
    if dist == 0.0 {
        epsilon
    } else {
        dist
    }
}

/// WoE = ln(%good / %bad); positive WoE marks a lower-risk bin.
fn calculate_woe_iv(dist_good: f64, dist_bad: f64) -> (f64, f64) {
    let woe = (dist_good / dist_bad).ln();
    let iv_contrib = (dist_good - dist_bad) * woe;
    (woe, iv_contrib)
}
