//! Derived credit-risk features computed from raw loan records
//!
//! Every transform is a stateless, column-wise function of the input frame.
//! The input is never modified; transforms return a new `Series` or a copy of
//! the frame with the derived columns appended.

use chrono::{Datelike, NaiveDate};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

use super::error::{AnalysisError, AnalysisResult};

/// Format of loan dates in the raw data, e.g. "Jan-2015"
pub const LOAN_DATE_FORMAT: &str = "%b-%Y";

/// Average year length used for credit-history age
pub const DAYS_PER_YEAR: f64 = 365.25;

pub const FICO_SCORE: &str = "fico_score";
pub const FICO_BAND: &str = "fico_band";
pub const CREDIT_HISTORY_YEARS: &str = "credit_history_years";
pub const HAS_DELINQUENCY: &str = "has_delinquency";
pub const HAS_PUBLIC_RECORDS: &str = "has_public_records";
pub const HAS_BANKRUPTCY: &str = "has_bankruptcy";
pub const VINTAGE_YEAR: &str = "vintage_year";
pub const VINTAGE_QUARTER: &str = "vintage_quarter";
pub const VINTAGE_MONTH: &str = "vintage_month";
pub const UTILIZATION_RATIO: &str = "utilization_ratio";
pub const DTI_ADJUSTED: &str = "dti_adjusted";
pub const LOG_ANNUAL_INCOME: &str = "log_annual_inc";

/// Upper (inclusive) edge and label of each FICO band; the first band starts at 0
const FICO_BANDS: [(f64, &str); 5] = [
    (579.0, "Very Poor"),
    (669.0, "Fair"),
    (739.0, "Good"),
    (799.0, "Very Good"),
    (850.0, "Exceptional"),
];

/// Names of the raw loan columns the transforms read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureColumns {
    pub fico_low: String,
    pub fico_high: String,
    pub earliest_credit_line: String,
    pub issue_date: String,
    pub delinquencies: String,
    pub public_records: String,
    pub bankruptcies: String,
    pub revolving_utilization: String,
    pub dti: String,
    pub installment: String,
    pub annual_income: String,
}

impl Default for FeatureColumns {
    fn default() -> Self {
        Self {
            fico_low: "fico_range_low".to_string(),
            fico_high: "fico_range_high".to_string(),
            earliest_credit_line: "earliest_cr_line".to_string(),
            issue_date: "issue_d".to_string(),
            delinquencies: "delinq_2yrs".to_string(),
            public_records: "pub_rec".to_string(),
            bankruptcies: "pub_rec_bankruptcies".to_string(),
            revolving_utilization: "revol_util".to_string(),
            dti: "dti".to_string(),
            installment: "installment".to_string(),
            annual_income: "annual_inc".to_string(),
        }
    }
}

/// Average of the low and high ends of the FICO range
pub fn fico_score(df: &DataFrame, low_col: &str, high_col: &str) -> AnalysisResult<Series> {
    require_columns(df, &[low_col, high_col])?;

    let expr = (col(low_col).cast(DataType::Float64) + col(high_col).cast(DataType::Float64))
        / lit(2.0);
    select_expr(df, expr.alias(FICO_SCORE))
}

/// Regulatory FICO band of each score.
///
/// Bands are right-closed: `[0, 579]`, `(579, 669]`, `(669, 739]`,
/// `(739, 799]`, `(799, 850]`. Scores outside `[0, 850]` get null.
pub fn fico_band(fico_score: &Series) -> AnalysisResult<Series> {
    let scores = fico_score.cast(&DataType::Float64)?;
    let bands: Vec<Option<&str>> = scores
        .f64()?
        .into_iter()
        .map(|score| score.and_then(fico_band_label))
        .collect();

    Ok(Series::new(FICO_BAND.into(), bands))
}

fn fico_band_label(score: f64) -> Option<&'static str> {
    if score.is_nan() || score < 0.0 {
        return None;
    }
    FICO_BANDS
        .iter()
        .find(|(upper, _)| score <= *upper)
        .map(|(_, label)| *label)
}

/// `ln(1 + x)` when `shift` is 1, otherwise `ln(x + shift)`.
///
/// The result keeps the input's name. Arguments below zero give NaN.
pub fn log_transform(series: &Series, shift: f64) -> AnalysisResult<Series> {
    let values = series.cast(&DataType::Float64)?;
    let transformed: Vec<Option<f64>> = values
        .f64()?
        .into_iter()
        .map(|v| {
            v.map(|x| {
                if shift == 1.0 {
                    x.ln_1p()
                } else {
                    (x + shift).ln()
                }
            })
        })
        .collect();

    Ok(Series::new(series.name().clone(), transformed))
}

/// Years between the first credit line and the reference (issue) date.
///
/// Dates that do not parse as "%b-%Y" give null.
pub fn credit_history_years(
    df: &DataFrame,
    date_col: &str,
    reference_col: &str,
) -> AnalysisResult<Series> {
    require_columns(df, &[date_col, reference_col])?;

    let earliest = loan_dates(df, date_col)?;
    let reference = loan_dates(df, reference_col)?;

    let years: Vec<Option<f64>> = earliest
        .into_iter()
        .zip(reference)
        .map(|pair| match pair {
            (Some(start), Some(end)) => Some((end - start).num_days() as f64 / DAYS_PER_YEAR),
            _ => None,
        })
        .collect();

    Ok(Series::new(CREDIT_HISTORY_YEARS.into(), years))
}

/// 1 where `source > 0`, otherwise 0 (missing values count as 0)
pub fn binary_flag(df: &DataFrame, source: &str, name: &str) -> AnalysisResult<Series> {
    let values = numeric_values(lookup(df, source)?)?;
    let flags: Vec<i32> = values
        .into_iter()
        .map(|v| i32::from(matches!(v, Some(x) if x > 0.0)))
        .collect();

    Ok(Series::new(name.into(), flags))
}

/// Append `has_delinquency`, `has_public_records` and `has_bankruptcy`
pub fn binary_flags(df: &DataFrame, columns: &FeatureColumns) -> AnalysisResult<DataFrame> {
    let sources = [
        (columns.delinquencies.as_str(), HAS_DELINQUENCY),
        (columns.public_records.as_str(), HAS_PUBLIC_RECORDS),
        (columns.bankruptcies.as_str(), HAS_BANKRUPTCY),
    ];
    require_columns(df, &sources.map(|(source, _)| source))?;

    let mut out = df.clone();
    for (source, name) in sources {
        out.with_column(binary_flag(df, source, name)?)?;
    }
    Ok(out)
}

/// Append cohort labels derived from the issue date: `vintage_year` (e.g.
/// 2015), `vintage_quarter` ("2015Q1") and `vintage_month` ("2015-01").
pub fn vintage_features(df: &DataFrame, date_col: &str) -> AnalysisResult<DataFrame> {
    let dates = loan_dates(df, date_col)?;

    let years: Vec<Option<i32>> = dates.iter().map(|d| d.map(|d| d.year())).collect();
    let quarters: Vec<Option<String>> = dates.iter().map(|d| d.map(quarter_label)).collect();
    let months: Vec<Option<String>> = dates.iter().map(|d| d.map(month_label)).collect();

    let mut out = df.clone();
    out.with_column(Series::new(VINTAGE_YEAR.into(), years))?;
    out.with_column(Series::new(VINTAGE_QUARTER.into(), quarters))?;
    out.with_column(Series::new(VINTAGE_MONTH.into(), months))?;
    Ok(out)
}

fn quarter_label(date: NaiveDate) -> String {
    format!("{}Q{}", date.year(), (date.month() - 1) / 3 + 1)
}

fn month_label(date: NaiveDate) -> String {
    format!("{}-{:02}", date.year(), date.month())
}

/// Revolving utilization as a fraction; the raw column is a percentage
/// (either numeric or text such as "45.3%").
pub fn utilization_ratio(df: &DataFrame, util_col: &str) -> AnalysisResult<Series> {
    let ratios: Vec<Option<f64>> = numeric_values(lookup(df, util_col)?)?
        .into_iter()
        .map(|v| v.map(|pct| pct / 100.0))
        .collect();

    Ok(Series::new(UTILIZATION_RATIO.into(), ratios))
}

/// Debt-to-income ratio (percent) after adding the new loan's installment
/// to the borrower's existing monthly debt.
pub fn dti_adjusted(
    df: &DataFrame,
    dti_col: &str,
    installment_col: &str,
    income_col: &str,
) -> AnalysisResult<Series> {
    require_columns(df, &[dti_col, installment_col, income_col])?;

    let monthly_income = col(income_col).cast(DataType::Float64) / lit(12.0);
    let current_debt = col(dti_col).cast(DataType::Float64) / lit(100.0) * monthly_income.clone();
    let new_debt = current_debt + col(installment_col).cast(DataType::Float64);

    select_expr(df, (new_debt / monthly_income * lit(100.0)).alias(DTI_ADJUSTED))
}

/// Apply every transform whose source columns are present.
///
/// # Returns
/// A copy of `df` with the derived columns appended, and their names in the
/// order they were added.
pub fn engineer_features(
    df: &DataFrame,
    columns: &FeatureColumns,
) -> AnalysisResult<(DataFrame, Vec<String>)> {
    let mut out = df.clone();
    let mut added: Vec<String> = Vec::new();

    let mut push = |out: &mut DataFrame, series: Series| -> AnalysisResult<()> {
        added.push(series.name().to_string());
        out.with_column(series)?;
        Ok(())
    };

    if has_columns(df, &[&columns.fico_low, &columns.fico_high]) {
        let score = fico_score(df, &columns.fico_low, &columns.fico_high)?;
        let band = fico_band(&score)?;
        push(&mut out, score)?;
        push(&mut out, band)?;
    }

    if has_columns(df, &[&columns.earliest_credit_line, &columns.issue_date]) {
        push(
            &mut out,
            credit_history_years(df, &columns.earliest_credit_line, &columns.issue_date)?,
        )?;
    }

    for (source, name) in [
        (&columns.delinquencies, HAS_DELINQUENCY),
        (&columns.public_records, HAS_PUBLIC_RECORDS),
        (&columns.bankruptcies, HAS_BANKRUPTCY),
    ] {
        if has_columns(df, &[source]) {
            push(&mut out, binary_flag(df, source, name)?)?;
        }
    }

    if has_columns(df, &[&columns.issue_date]) {
        let vintage = vintage_features(df, &columns.issue_date)?;
        for name in [VINTAGE_YEAR, VINTAGE_QUARTER, VINTAGE_MONTH] {
            push(&mut out, vintage.column(name)?.as_materialized_series().clone())?;
        }
    }

    if has_columns(df, &[&columns.revolving_utilization]) {
        push(&mut out, utilization_ratio(df, &columns.revolving_utilization)?)?;
    }

    if has_columns(df, &[&columns.dti, &columns.installment, &columns.annual_income]) {
        push(
            &mut out,
            dti_adjusted(df, &columns.dti, &columns.installment, &columns.annual_income)?,
        )?;
    }

    if has_columns(df, &[&columns.annual_income]) {
        let income = lookup(df, &columns.annual_income)?.as_materialized_series();
        push(
            &mut out,
            log_transform(income, 1.0)?.with_name(LOG_ANNUAL_INCOME.into()),
        )?;
    }

    Ok((out, added))
}

/// Parse a loan date such as "Jan-2015" as the first day of that month
pub fn parse_loan_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("01-{}", value.trim()), &format!("%d-{}", LOAN_DATE_FORMAT))
        .ok()
}

// Helpers

fn lookup<'a>(df: &'a DataFrame, name: &str) -> AnalysisResult<&'a Column> {
    df.column(name)
        .map_err(|_| AnalysisError::column_not_found(df, name))
}

fn require_columns(df: &DataFrame, names: &[&str]) -> AnalysisResult<()> {
    for name in names {
        lookup(df, name)?;
    }
    Ok(())
}

fn has_columns(df: &DataFrame, names: &[&String]) -> bool {
    names.iter().all(|name| df.column(name.as_str()).is_ok())
}

fn select_expr(df: &DataFrame, expr: Expr) -> AnalysisResult<Series> {
    let selected = df.clone().lazy().select([expr]).collect()?;
    let column = selected
        .get_columns()
        .first()
        .ok_or_else(|| PolarsError::NoData("expression produced no column".into()))?;
    Ok(column.as_materialized_series().clone())
}

fn loan_dates(df: &DataFrame, name: &str) -> AnalysisResult<Vec<Option<NaiveDate>>> {
    let as_string = lookup(df, name)?.cast(&DataType::String)?;
    let dates = as_string
        .str()?
        .into_iter()
        .map(|v| v.and_then(parse_loan_date))
        .collect();
    Ok(dates)
}

/// Column values as f64; text is parsed after stripping a trailing '%'
fn numeric_values(column: &Column) -> AnalysisResult<Vec<Option<f64>>> {
    if column.dtype() == &DataType::String {
        let values = column
            .str()?
            .into_iter()
            .map(|v| v.and_then(|s| s.trim().trim_end_matches('%').trim().parse::<f64>().ok()))
            .collect();
        return Ok(values);
    }

    let as_float = column.cast(&DataType::Float64)?;
    Ok(as_float.f64()?.into_iter().collect())
}
