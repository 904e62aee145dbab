use std::fs::File;
use std::io::Write;

use rstest::rstest;
use tempfile::tempdir;
use wallbot_config::{Calibration, CalibrationRow, load_calibration_csv};

#[rstest]
fn calibration_from_rows_two_points() {
    // Exact two-point fit: inches = 0.00676 * micros
    let rows = vec![
        CalibrationRow {
            micros: 1000,
            inches: 6.76,
        },
        CalibrationRow {
            micros: 2000,
            inches: 13.52,
        },
    ];
    let c = Calibration::from_rows(rows).unwrap();
    assert!((c.inch_per_us - 0.00676).abs() < 1e-6);
    assert!(c.offset_in.abs() < 1e-4);
}

#[rstest]
fn calibration_from_rows_three_points_ols() {
    // Exact line inches = 0.007 * micros + 0.5 for determinism
    let rows = vec![
        CalibrationRow {
            micros: 1000,
            inches: 7.5,
        },
        CalibrationRow {
            micros: 2000,
            inches: 14.5,
        },
        CalibrationRow {
            micros: 3000,
            inches: 21.5,
        },
    ];
    let c = Calibration::from_rows(rows).unwrap();
    assert!((c.inch_per_us - 0.007).abs() < 1e-6);
    assert!((c.offset_in - 0.5).abs() < 1e-4);
}

#[rstest]
fn calibration_rejects_duplicate_micros() {
    let rows = vec![
        CalibrationRow {
            micros: 1000,
            inches: 6.8,
        },
        CalibrationRow {
            micros: 1000,
            inches: 7.0,
        },
    ];
    let err = Calibration::from_rows(rows).expect_err("should fail on duplicate micros");
    assert!(format!("{err}").to_lowercase().contains("duplicate micros"));
}

#[rstest]
fn calibration_rejects_decreasing_micros() {
    let rows = vec![
        CalibrationRow {
            micros: 2000,
            inches: 13.5,
        },
        CalibrationRow {
            micros: 1000,
            inches: 6.8,
        },
    ];
    let err = Calibration::from_rows(rows).expect_err("should fail on decreasing micros");
    assert!(format!("{err}").contains("strictly increasing"));
}

#[rstest]
fn calibration_rejects_horizontal_line() {
    // Distance constant despite widening echoes: slope 0, should error
    let rows = vec![
        CalibrationRow {
            micros: 1000,
            inches: 10.0,
        },
        CalibrationRow {
            micros: 2000,
            inches: 10.0,
        },
        CalibrationRow {
            micros: 3000,
            inches: 10.0,
        },
    ];
    let err = Calibration::from_rows(rows).expect_err("should fail on zero slope");
    assert!(format!("{err}").contains("non-positive slope"));
}

#[rstest]
fn csv_with_missing_header_errors() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad_headers.csv");

    let mut f = File::create(&path).unwrap();
    writeln!(f, "micros,value").unwrap();
    writeln!(f, "1000,6.8").unwrap();
    writeln!(f, "2000,13.5").unwrap();

    let err = load_calibration_csv(&path).expect_err("should error on bad headers");
    assert!(format!("{err}").contains("headers 'micros,inches'"));
}

#[rstest]
fn csv_with_non_numeric_errors() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad_numeric.csv");

    let mut f = File::create(&path).unwrap();
    writeln!(f, "micros,inches").unwrap();
    writeln!(f, "abc,xyz").unwrap();

    let err = load_calibration_csv(&path).expect_err("should error on non-numeric");
    assert!(format!("{err}").contains("invalid CSV row"));
}

#[rstest]
fn csv_round_trip_fits_line() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("echo.csv");

    let mut f = File::create(&path).unwrap();
    writeln!(f, "micros,inches").unwrap();
    for i in 1..=10i64 {
        let micros = i * 500;
        let inches = 0.00676 * micros as f32;
        writeln!(f, "{micros},{inches}").unwrap();
    }

    let c = load_calibration_csv(&path).unwrap();
    assert!((c.inch_per_us - 0.00676).abs() < 1e-5);
}
