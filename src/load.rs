//! Loading a spend sheet into an immutable [`Dataset`].
//!
//! The source is either a CSV file or a spreadsheet workbook (`.xlsx`, `.xlsm`, `.xls`, `.ods`),
//! of which the first worksheet is read. Either way the first row is a header row and exactly
//! four columns must follow it in category, area, supplier, value order.

use crate::model::{validate_headers, Amount, Column, Dimension, Record};
use crate::{utils, Result};
use anyhow::{anyhow, bail, ensure, Context};
use calamine::{open_workbook_auto, Data, Reader};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;
use tracing::{debug, info, warn};

const SPREADSHEET_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

/// Controls how strictly the source header row is checked.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct LoadOptions {
    strict_headers: bool,
    header_aliases: BTreeMap<String, Vec<String>>,
}

impl LoadOptions {
    pub fn new(strict_headers: bool, header_aliases: BTreeMap<String, Vec<String>>) -> Self {
        Self {
            strict_headers,
            header_aliases,
        }
    }

    pub fn strict_headers(&self) -> bool {
        self.strict_headers
    }
}

/// The full, immutable set of records loaded from a spend sheet.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Loads and validates the spend sheet at `path`.
    ///
    /// # Errors
    /// - The file does not exist or cannot be parsed.
    /// - The header row is missing, does not have four columns, or names the columns out of order.
    /// - A value cell is not a number or is negative.
    pub fn load(path: &Path, options: &LoadOptions) -> Result<Self> {
        ensure!(path.is_file(), "File not found: '{}'", path.display());
        info!("Loading spend data from {}", path.display());

        let rows = if SPREADSHEET_EXTENSIONS.contains(&utils::extension(path).as_str()) {
            read_workbook_rows(path)?
        } else {
            read_csv_rows(path)?
        };
        let dataset = Self::from_rows(rows, options)
            .with_context(|| format!("Unable to load spend data from {}", path.display()))?;
        debug!("Loaded {} records", dataset.len());
        Ok(dataset)
    }

    /// Builds a dataset from raw rows, the first of which is the header row.
    pub fn from_rows<S, R>(rows: impl IntoIterator<Item = R>, options: &LoadOptions) -> Result<Self>
    where
        S: Into<String>,
        R: IntoIterator<Item = S>,
    {
        let mut rows = rows.into_iter();
        let headers: Vec<String> = match rows.next() {
            Some(header_row) => header_row.into_iter().map(|s| s.into()).collect(),
            None => bail!("The file is empty, a header row is required"),
        };
        validate_headers(&headers, options.strict_headers, &options.header_aliases)?;

        let mut records = Vec::new();
        // Every aggregate is a sum over a subset of the records, so bounding the grand total
        // here keeps all later Decimal additions in range.
        let mut total = Decimal::ZERO;
        for (row_ix, row) in rows.enumerate() {
            let mut values: Vec<String> = row.into_iter().map(|s| s.into()).collect();
            // Row numbers are 1-based and the header is row 1.
            let row_number = row_ix + 2;
            if values.iter().all(|v| v.trim().is_empty()) {
                continue;
            }
            ensure!(
                values.len() <= Column::ALL.len(),
                "A row longer than the headers list was encountered at row {row_number}"
            );
            values.resize(Column::ALL.len(), String::new());
            let record = parse_record(values, row_number)?;
            total = total
                .checked_add(record.value())
                .ok_or_else(|| anyhow!("Total invoice value overflows at row {row_number}"))?;
            records.push(record);
        }
        Ok(Self { records })
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The distinct labels of `dimension`, in order of first appearance.
    pub fn distinct(&self, dimension: Dimension) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .map(|r| r.key(dimension))
            .filter(|k| seen.insert(*k))
            .collect()
    }
}

/// A load-once guard around [`Dataset::load`]. The first call to [`DatasetCache::get`] reads
/// the file and every later call returns the same dataset, which is never reloaded.
#[derive(Debug)]
pub struct DatasetCache {
    path: PathBuf,
    options: LoadOptions,
    dataset: OnceLock<Dataset>,
}

impl DatasetCache {
    pub fn new(path: impl Into<PathBuf>, options: LoadOptions) -> Self {
        Self {
            path: path.into(),
            options,
            dataset: OnceLock::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self) -> Result<&Dataset> {
        if let Some(dataset) = self.dataset.get() {
            return Ok(dataset);
        }
        let dataset = Dataset::load(&self.path, &self.options)?;
        // If another thread got there first its copy wins, both came from the same file.
        let _ = self.dataset.set(dataset);
        self.dataset
            .get()
            .ok_or_else(|| anyhow!("Dataset for {} was not cached", self.path.display()))
    }
}

fn parse_record(mut values: Vec<String>, row_number: usize) -> Result<Record> {
    let raw_value = values.pop().unwrap_or_default();
    let value = if raw_value.trim().is_empty() {
        warn!("Row {row_number} has no {}", Column::Value.header());
        None
    } else {
        let amount = Amount::from_str(&raw_value).map_err(|e| {
            anyhow!(
                "Unable to parse '{raw_value}' in column '{}' at row {row_number}: {e}",
                Column::Value.header()
            )
        })?;
        ensure!(
            !amount.is_negative(),
            "Negative value '{raw_value}' in column '{}' at row {row_number}",
            Column::Value.header()
        );
        Some(amount)
    };

    let mut text = values.into_iter().map(|s| s.trim().to_string());
    let category = text.next().unwrap_or_default();
    let area = text.next().unwrap_or_default();
    let supplier = text.next().unwrap_or_default();
    Ok(Record::new(category, area, supplier, value))
}

fn read_csv_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Unable to open CSV file {}", path.display()))?;
    let mut rows = Vec::new();
    for (ix, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("Unable to read CSV row {}", ix + 1))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

fn read_workbook_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed to open workbook: {}", path.display()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow!("The workbook {} has no worksheets", path.display()))?
        .context("Failed to read the first worksheet")?;
    Ok(range
        .rows()
        .map(|r| r.iter().map(cell_to_string).collect())
        .collect())
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(v) => v.to_string(),
        Data::Float(v) => v.to_string(),
        Data::Int(v) => v.to_string(),
        Data::Bool(v) => v.to_string(),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{sample_dataset, write_file, CANONICAL_HEADER};
    use rust_decimal::Decimal;
    use tempfile::TempDir;

    #[test]
    fn test_load_csv() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "spend.csv",
            &format!("{CANONICAL_HEADER}\nCatA,AreaX,S1,100\nCatA,AreaY,S2,\"£1,300.50\"\n"),
        );
        let dataset = Dataset::load(&path, &LoadOptions::default()).unwrap();
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.records()[1].value(), Decimal::new(130050, 2));
        assert_eq!(dataset.records()[1].supplier(), "S2");
    }

    #[test]
    fn test_load_renames_headers_positionally() {
        let rows = vec![
            vec!["Expense Type", "Expense Area", "Supplier", "Amount"],
            vec!["CatA", "AreaX", "S1", "10"],
        ];
        let dataset = Dataset::from_rows(rows, &LoadOptions::default()).unwrap();
        assert_eq!(dataset.records()[0].category(), "CatA");
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = Dataset::load(&dir.path().join("nope.csv"), &LoadOptions::default()).unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }

    #[test]
    fn test_empty_file() {
        let rows: Vec<Vec<String>> = Vec::new();
        let err = Dataset::from_rows(rows, &LoadOptions::default()).unwrap_err();
        assert!(err.to_string().contains("header row is required"));
    }

    #[test]
    fn test_wrong_column_count() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "spend.csv", "Category,Supplier,Value\nA,S,1\n");
        let err = Dataset::load(&path, &LoadOptions::default()).unwrap_err();
        assert!(format!("{err:#}").contains("Expected exactly 4 columns"));
    }

    #[test]
    fn test_bad_value_reports_row() {
        let rows = vec![
            Column::headers().to_vec(),
            vec!["CatA", "AreaX", "S1", "10"],
            vec!["CatA", "AreaX", "S1", "ten"],
        ];
        let err = Dataset::from_rows(rows, &LoadOptions::default()).unwrap_err();
        assert!(err.to_string().contains("at row 3"));
    }

    #[test]
    fn test_negative_value_rejected() {
        let rows = vec![Column::headers().to_vec(), vec!["CatA", "AreaX", "S1", "-5"]];
        let err = Dataset::from_rows(rows, &LoadOptions::default()).unwrap_err();
        assert!(err.to_string().contains("Negative value"));
    }

    #[test]
    fn test_total_overflow_rejected() {
        let rows = vec![
            Column::headers().to_vec(),
            vec!["C", "A", "S", "5e28"],
            vec!["C", "A", "S", "5e28"],
        ];
        let err = Dataset::from_rows(rows, &LoadOptions::default()).unwrap_err();
        assert!(err.to_string().contains("overflows at row 3"));

        let rows = vec![Column::headers().to_vec(), vec!["C", "A", "S", "5e28"]];
        let dataset = Dataset::from_rows(rows, &LoadOptions::default()).unwrap();
        let view = crate::aggregate::View::all(&dataset);
        let totals = crate::aggregate::sum_by(&view, Dimension::Category);
        assert_eq!(totals["C"], Decimal::from_scientific("5e28").unwrap());
    }

    #[test]
    fn test_blank_cells_are_kept() {
        let rows = vec![
            Column::headers().to_vec(),
            vec!["CatA", "AreaX", "", ""],
            vec!["", "", "", ""],
            vec!["CatB", "AreaY"],
        ];
        let dataset = Dataset::from_rows(rows, &LoadOptions::default()).unwrap();
        // The fully blank row is skipped, short rows are padded.
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.records()[0].missing_cells(), 2);
        assert_eq!(dataset.records()[1].missing_cells(), 2);
        assert_eq!(dataset.records()[1].amount(), None);
    }

    #[test]
    fn test_distinct_first_appearance_order() {
        let dataset = sample_dataset();
        assert_eq!(dataset.distinct(Dimension::Category), vec!["CatA", "CatB"]);
        assert_eq!(dataset.distinct(Dimension::Supplier), vec!["S1", "S2"]);
    }

    #[test]
    fn test_cache_loads_once() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "spend.csv", &format!("{CANONICAL_HEADER}\nCatA,AreaX,S1,1\n"));
        let cache = DatasetCache::new(&path, LoadOptions::default());
        let first = cache.get().unwrap() as *const Dataset;

        // Changing the file after the first access has no effect.
        std::fs::remove_file(&path).unwrap();
        let second = cache.get().unwrap() as *const Dataset;
        assert_eq!(first, second);
        assert_eq!(cache.get().unwrap().len(), 1);
    }
}
