//! Tests for the credit-risk feature transforms

use ivscore::pipeline::{
    binary_flags, compute_iv, credit_history_years, dti_adjusted, engineer_features, fico_band,
    fico_score, log_transform, utilization_ratio, vintage_features, AnalysisError,
    FeatureColumns, CREDIT_HISTORY_YEARS, DTI_ADJUSTED, FICO_BAND, FICO_SCORE, HAS_BANKRUPTCY,
    HAS_DELINQUENCY, HAS_PUBLIC_RECORDS, LOG_ANNUAL_INCOME, UTILIZATION_RATIO, VINTAGE_MONTH,
    VINTAGE_QUARTER, VINTAGE_YEAR,
};
use polars::prelude::*;

#[path = "common/mod.rs"]
mod common;

use common::{assert_close, assert_has_columns, assert_shape};

#[test]
fn test_fico_score_average() {
    let df = common::create_raw_loans_dataframe();

    let score = fico_score(&df, "fico_range_low", "fico_range_high").unwrap();

    assert_eq!(score.name().as_str(), FICO_SCORE);
    let values: Vec<Option<f64>> = score.f64().unwrap().into_iter().collect();
    assert_eq!(values, vec![Some(662.0), Some(702.0), Some(802.0), Some(572.0)]);
}

#[test]
fn test_fico_band_labels() {
    let df = common::create_raw_loans_dataframe();
    let score = fico_score(&df, "fico_range_low", "fico_range_high").unwrap();

    let bands = fico_band(&score).unwrap();

    assert_eq!(bands.name().as_str(), FICO_BAND);
    let labels: Vec<Option<&str>> = bands.str().unwrap().into_iter().collect();
    assert_eq!(
        labels,
        vec![Some("Fair"), Some("Good"), Some("Exceptional"), Some("Very Poor")]
    );
}

#[test]
fn test_fico_band_out_of_range_is_null() {
    let scores = Series::new("fico".into(), [Some(900.0f64), None, Some(0.0)]);

    let bands = fico_band(&scores).unwrap();

    let labels: Vec<Option<&str>> = bands.str().unwrap().into_iter().collect();
    assert_eq!(labels, vec![None, None, Some("Very Poor")]);
}

#[test]
fn test_log_transform() {
    let series = Series::new("annual_inc".into(), [0.0f64, 60000.0]);

    let log1p = log_transform(&series, 1.0).unwrap();
    assert_eq!(log1p.name().as_str(), "annual_inc");
    let values = log1p.f64().unwrap();
    assert_eq!(values.get(0), Some(0.0));
    assert_close(values.get(1).unwrap(), 11.002116507732017, 1e-12);

    let shifted = log_transform(&series, 10.0).unwrap();
    assert_close(shifted.f64().unwrap().get(0).unwrap(), 10.0f64.ln(), 1e-12);
}

#[test]
fn test_credit_history_years() {
    let df = common::create_raw_loans_dataframe();

    let years = credit_history_years(&df, "earliest_cr_line", "issue_d").unwrap();

    assert_eq!(years.name().as_str(), CREDIT_HISTORY_YEARS);
    let values = years.f64().unwrap();
    assert_close(values.get(0).unwrap(), 9.998631074606434, 1e-12);
    assert_close(values.get(1).unwrap(), 17.503080082135522, 1e-12);
    assert_eq!(values.get(2), None, "Unparseable dates should give null");
    assert_eq!(values.get(3), None, "Missing dates should give null");
}

#[test]
fn test_binary_flags() {
    let df = common::create_raw_loans_dataframe();

    let flagged = binary_flags(&df, &FeatureColumns::default()).unwrap();

    assert_shape(&flagged, 4, df.width() + 3);
    let flags = |name: &str| -> Vec<Option<i32>> {
        flagged.column(name).unwrap().i32().unwrap().into_iter().collect()
    };
    assert_eq!(flags(HAS_DELINQUENCY), vec![Some(0), Some(1), Some(0), Some(1)]);
    assert_eq!(flags(HAS_PUBLIC_RECORDS), vec![Some(0), Some(0), Some(1), Some(1)]);
    assert_eq!(flags(HAS_BANKRUPTCY), vec![Some(0), Some(0), Some(1), Some(0)]);

    // Input frame untouched
    assert_shape(&df, 4, 11);
}

#[test]
fn test_binary_flags_require_all_sources() {
    let df = df! {
        "delinq_2yrs" => [0i64, 1],
    }
    .unwrap();

    let result = binary_flags(&df, &FeatureColumns::default());
    assert!(matches!(result, Err(AnalysisError::ColumnNotFound { .. })));
}

#[test]
fn test_vintage_features() {
    let df = common::create_raw_loans_dataframe();

    let vintage = vintage_features(&df, "issue_d").unwrap();

    let years: Vec<Option<i32>> = vintage.column(VINTAGE_YEAR).unwrap().i32().unwrap().into_iter().collect();
    assert_eq!(years, vec![Some(2015), Some(2016), Some(2012), Some(2018)]);

    let quarters: Vec<Option<&str>> =
        vintage.column(VINTAGE_QUARTER).unwrap().str().unwrap().into_iter().collect();
    assert_eq!(
        quarters,
        vec![Some("2015Q1"), Some("2016Q4"), Some("2012Q1"), Some("2018Q3")]
    );

    let months: Vec<Option<&str>> =
        vintage.column(VINTAGE_MONTH).unwrap().str().unwrap().into_iter().collect();
    assert_eq!(
        months,
        vec![Some("2015-01"), Some("2016-12"), Some("2012-03"), Some("2018-07")]
    );
}

#[test]
fn test_vintage_unparseable_dates() {
    let df = df! {
        "issue_d" => [Some("Feb-2020"), Some("2020-02-01"), None],
    }
    .unwrap();

    let vintage = vintage_features(&df, "issue_d").unwrap();

    let years: Vec<Option<i32>> = vintage.column(VINTAGE_YEAR).unwrap().i32().unwrap().into_iter().collect();
    assert_eq!(years, vec![Some(2020), None, None]);
}

#[test]
fn test_utilization_ratio() {
    let df = common::create_raw_loans_dataframe();

    let ratio = utilization_ratio(&df, "revol_util").unwrap();

    assert_eq!(ratio.name().as_str(), UTILIZATION_RATIO);
    let values = ratio.f64().unwrap();
    assert_close(values.get(0).unwrap(), 0.453, 1e-12);
    assert_eq!(values.get(1), Some(0.0));
    assert_eq!(values.get(2), Some(1.0));
    assert_eq!(values.get(3), None);
}

#[test]
fn test_utilization_ratio_from_percent_strings() {
    let df = df! {
        "revol_util" => ["50%", "12.5%"],
    }
    .unwrap();

    let ratio = utilization_ratio(&df, "revol_util").unwrap();

    let values: Vec<Option<f64>> = ratio.f64().unwrap().into_iter().collect();
    assert_eq!(values, vec![Some(0.5), Some(0.125)]);
}

#[test]
fn test_dti_adjusted() {
    let df = common::create_raw_loans_dataframe();

    let dti = dti_adjusted(&df, "dti", "installment", "annual_inc").unwrap();

    assert_eq!(dti.name().as_str(), DTI_ADJUSTED);
    let values = dti.f64().unwrap();
    assert_close(values.get(0).unwrap(), 26.0, 1e-9);
    assert_close(values.get(1).unwrap(), 11.5, 1e-9);
    assert_close(values.get(2).unwrap(), 500.0 / 3000.0 * 100.0, 1e-9);
    assert!(values.get(3).unwrap().is_nan(), "Zero income should give NaN");
}

#[test]
fn test_missing_source_column() {
    let df = common::create_raw_loans_dataframe();

    let result = fico_score(&df, "fico_low", "fico_range_high");
    match result {
        Err(AnalysisError::ColumnNotFound { column, .. }) => assert_eq!(column, "fico_low"),
        other => panic!("Expected ColumnNotFound, got {:?}", other),
    }
}

#[test]
fn test_engineer_features_adds_all() {
    let df = common::create_raw_loans_dataframe();

    let (engineered, added) = engineer_features(&df, &FeatureColumns::default()).unwrap();

    let expected = [
        FICO_SCORE,
        FICO_BAND,
        CREDIT_HISTORY_YEARS,
        HAS_DELINQUENCY,
        HAS_PUBLIC_RECORDS,
        HAS_BANKRUPTCY,
        VINTAGE_YEAR,
        VINTAGE_QUARTER,
        VINTAGE_MONTH,
        UTILIZATION_RATIO,
        DTI_ADJUSTED,
        LOG_ANNUAL_INCOME,
    ];
    assert_eq!(added, expected.iter().map(|s| s.to_string()).collect::<Vec<_>>());
    assert_shape(&engineered, 4, 11 + expected.len());
    assert_has_columns(&engineered, &expected);
    assert_shape(&df, 4, 11);
}

#[test]
fn test_engineer_features_partial_columns() {
    let df = df! {
        "issue_d" => ["Jan-2015", "Apr-2015"],
        "annual_inc" => [50000.0f64, 80000.0],
    }
    .unwrap();

    let (engineered, added) = engineer_features(&df, &FeatureColumns::default()).unwrap();

    assert_eq!(
        added,
        vec![VINTAGE_YEAR, VINTAGE_QUARTER, VINTAGE_MONTH, LOG_ANNUAL_INCOME]
    );
    assert_shape(&engineered, 2, 6);
}

#[test]
fn test_engineer_features_custom_column_names() {
    let df = df! {
        "FICO_LOW" => [700i64, 640],
        "FICO_HIGH" => [704i64, 644],
    }
    .unwrap();
    let columns = FeatureColumns {
        fico_low: "FICO_LOW".to_string(),
        fico_high: "FICO_HIGH".to_string(),
        ..Default::default()
    };

    let (engineered, added) = engineer_features(&df, &columns).unwrap();

    assert_eq!(added, vec![FICO_SCORE, FICO_BAND]);
    let bands: Vec<Option<&str>> =
        engineered.column(FICO_BAND).unwrap().str().unwrap().into_iter().collect();
    assert_eq!(bands, vec![Some("Good"), Some("Fair")]);
}

#[test]
fn test_engineered_band_scored_as_categorical() {
    let df = df! {
        "fico_range_low" => [560i64, 570, 600, 620, 700, 710, 760, 780],
        "fico_range_high" => [564i64, 574, 604, 624, 704, 714, 764, 784],
        "default" => [1i32, 1, 1, 0, 0, 1, 0, 0],
    }
    .unwrap();

    let (engineered, _) = engineer_features(&df, &FeatureColumns::default()).unwrap();
    let iv = compute_iv(&engineered, FICO_BAND, "default").unwrap();

    assert!(iv.is_finite());
    assert!(iv > 0.0);
}
