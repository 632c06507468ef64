//! Shared test utilities and fixture generators

#![allow(dead_code)]

use polars::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

/// Golden scenario: four categories with two rows each
///
/// - `1`: two Good rows (Dist_Bad substituted)
/// - `2`: two Bad rows (Dist_Good substituted)
/// - `3`, `4`: one Good and one Bad row each (WoE = 0)
pub fn create_golden_dataframe() -> DataFrame {
    df! {
        "grade" => ["1", "1", "2", "2", "3", "3", "4", "4"],
        "target" => [0i32, 0, 1, 1, 0, 1, 0, 1],
    }
    .unwrap()
}

/// Create a loan-level DataFrame with a binary default target
///
/// This DataFrame includes:
/// - `default`: Binary target (1 = default)
/// - `fico`: Lower scores default more often (predictive)
/// - `noise`: Repeats the same pattern for Good and Bad rows (no signal)
/// - `term`: Categorical loan term
/// - `constant`: Zero variance
pub fn create_loan_dataframe() -> DataFrame {
    df! {
        "default" => [1i32, 1, 1, 0, 1, 0, 0, 0, 0, 0,
                      1, 1, 0, 1, 0, 0, 0, 0, 1, 0],
        "fico" => [610.0f64, 625.0, 640.0, 655.0, 660.0, 670.0, 690.0, 700.0, 720.0, 740.0,
                   615.0, 630.0, 645.0, 650.0, 680.0, 695.0, 710.0, 730.0, 750.0, 780.0],
        "noise" => [1.0f64, 2.0, 3.0, 4.0, 5.0, 1.0, 2.0, 3.0, 4.0, 5.0,
                    1.0, 2.0, 3.0, 4.0, 5.0, 1.0, 2.0, 3.0, 4.0, 5.0],
        "term" => [" 60 months", " 60 months", " 36 months", " 36 months", " 60 months",
                   " 36 months", " 36 months", " 36 months", " 36 months", " 36 months",
                   " 60 months", " 60 months", " 36 months", " 60 months", " 36 months",
                   " 36 months", " 36 months", " 36 months", " 36 months", " 36 months"],
        "constant" => [5.0f64; 20],
    }
    .unwrap()
}

/// Create a raw loan DataFrame with the conventional LendingClub column names
pub fn create_raw_loans_dataframe() -> DataFrame {
    df! {
        "fico_range_low" => [660i64, 700, 800, 570],
        "fico_range_high" => [664i64, 704, 804, 574],
        "earliest_cr_line" => [Some("Jan-2005"), Some("Jun-1999"), Some("bad date"), None],
        "issue_d" => ["Jan-2015", "Dec-2016", "Mar-2012", "Jul-2018"],
        "delinq_2yrs" => [Some(0.0f64), Some(2.0), None, Some(1.0)],
        "pub_rec" => [0i64, 0, 1, 3],
        "pub_rec_bankruptcies" => [Some(0.0f64), None, Some(1.0), Some(0.0)],
        "revol_util" => [Some(45.3f64), Some(0.0), Some(100.0), None],
        "dti" => [20.0f64, 10.0, 0.0, 35.5],
        "installment" => [300.0f64, 150.0, 500.0, 0.0],
        "annual_inc" => [60000.0f64, 120000.0, 36000.0, 0.0],
    }
    .unwrap()
}

/// Create a larger DataFrame with random features
pub fn create_large_test_dataframe(rows: usize, cols: usize) -> DataFrame {
    use rand::Rng;
    let mut rng = rand::thread_rng();

    let mut columns: Vec<Column> = Vec::with_capacity(cols + 1);

    let target: Vec<i32> = (0..rows).map(|_| rng.gen_range(0..2)).collect();
    columns.push(Column::new("target".into(), target));

    for i in 0..cols {
        let values: Vec<f64> = (0..rows).map(|_| rng.gen::<f64>()).collect();
        columns.push(Column::new(format!("feature_{}", i).into(), values));
    }

    DataFrame::new(columns).unwrap()
}

/// Create a temporary directory with a test CSV file
pub fn create_temp_csv(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("test_data.csv");

    let mut file = std::fs::File::create(&csv_path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();

    (temp_dir, csv_path)
}

/// Create a temporary directory with a test Parquet file
pub fn create_temp_parquet(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let parquet_path = temp_dir.path().join("test_data.parquet");

    let file = std::fs::File::create(&parquet_path).unwrap();
    ParquetWriter::new(file).finish(df).unwrap();

    (temp_dir, parquet_path)
}

/// Assert that a DataFrame has expected shape
pub fn assert_shape(df: &DataFrame, expected_rows: usize, expected_cols: usize) {
    let (rows, cols) = df.shape();
    assert_eq!(rows, expected_rows, "Row count mismatch: expected {}, got {}", expected_rows, rows);
    assert_eq!(cols, expected_cols, "Column count mismatch: expected {}, got {}", expected_cols, cols);
}

/// Assert that a DataFrame contains specific columns
pub fn assert_has_columns(df: &DataFrame, expected_cols: &[&str]) {
    let actual_cols: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    for col in expected_cols {
        assert!(
            actual_cols.contains(&col.to_string()),
            "Missing expected column: '{}'. Actual columns: {:?}",
            col,
            actual_cols
        );
    }
}

/// Assert two floats are within `tol`
pub fn assert_close(actual: f64, expected: f64, tol: f64) {
    assert!(
        (actual - expected).abs() < tol,
        "Expected {} ± {}, got {}",
        expected,
        tol,
        actual
    );
}
