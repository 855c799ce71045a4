//! Shared test utilities.
//!
//! This module is only compiled when running tests (`#[cfg(test)]`).

use crate::load::Dataset;
use crate::model::{Amount, Record};
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tempfile::TempDir;

/// The header row of a spend sheet, in canonical column order.
pub(crate) const CANONICAL_HEADER: &str =
    "Expense Type (Category),Expense Area (User/BU),Supplier,Invoice Value (GBP)";

/// [`sample_dataset`] as a CSV file.
pub(crate) const SAMPLE_CSV: &str = "\
Expense Type (Category),Expense Area (User/BU),Supplier,Invoice Value (GBP)
CatA,AreaX,S1,100
CatA,AreaY,S2,300
CatB,AreaX,S1,50
";

/// Three records: (CatA, AreaX, S1, 100), (CatA, AreaY, S2, 300), (CatB, AreaX, S1, 50).
pub(crate) fn sample_dataset() -> Dataset {
    let record = |c: &str, a: &str, s: &str, v: i64| {
        Record::new(c, a, s, Some(Amount::from(Decimal::from(v))))
    };
    Dataset::new(vec![
        record("CatA", "AreaX", "S1", 100),
        record("CatA", "AreaY", "S2", 300),
        record("CatB", "AreaX", "S1", 50),
    ])
}

pub(crate) fn set(labels: &[&str]) -> BTreeSet<String> {
    labels.iter().map(|s| s.to_string()).collect()
}

/// Asserts that two floats agree to a relative tolerance of 1e-9.
#[track_caller]
pub(crate) fn assert_close(actual: f64, expected: f64) {
    let tolerance = 1e-9 * expected.abs().max(1.0);
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected}, got {actual}"
    );
}

/// Writes `contents` to `name` inside `dir` and returns the path.
pub(crate) fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).unwrap();
    path
}
