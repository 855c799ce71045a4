//! Summary statistics over a dataset or a filtered view.

use crate::aggregate::{self, View};
use crate::load::Dataset;
use crate::model::{Amount, Dimension};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Size of the whole dataset, independent of any selection.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct QuickStats {
    pub total_records: usize,
    pub categories: usize,
    pub areas: usize,
}

impl QuickStats {
    pub fn of(dataset: &Dataset) -> Self {
        Self {
            total_records: dataset.len(),
            categories: dataset.distinct(Dimension::Category).len(),
            areas: dataset.distinct(Dimension::Area).len(),
        }
    }
}

/// Headline figures for a filtered view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Kpis {
    pub total_spend: Amount,
    pub unique_suppliers: usize,
    /// Mean over the records that have a value; `None` when none do.
    pub average_invoice: Option<Amount>,
    /// Percent of spend going to the largest supplier; `None` when there is no spend.
    pub top_supplier_share: Option<f64>,
}

impl Kpis {
    pub fn of(view: &View<'_>) -> Self {
        let suppliers = aggregate::sum_by(view, Dimension::Supplier);
        let values: Vec<Decimal> = view
            .records()
            .iter()
            .filter_map(|r| r.amount())
            .map(|a| a.value())
            .collect();
        let average_invoice = match values.len() {
            0 => None,
            n => Some(Amount::new(
                values.iter().sum::<Decimal>() / Decimal::from(n),
            )),
        };
        let top_supplier_share = aggregate::shares(&suppliers)
            .and_then(|shares| shares.into_iter().map(|(_, s)| s).reduce(f64::max));

        Self {
            total_spend: Amount::new(view.total()),
            unique_suppliers: suppliers.len(),
            average_invoice,
            top_supplier_share,
        }
    }
}

/// Distribution of invoice values: count, mean, sample standard deviation, extremes and
/// quartiles. Blank values are left out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Describe {
    pub count: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation (n - 1), undefined for fewer than two values.
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

impl Describe {
    pub fn of(view: &View<'_>) -> Self {
        let mut values: Vec<f64> = view
            .records()
            .iter()
            .filter_map(|r| r.amount())
            .map(|a| a.value().to_f64().unwrap_or_default())
            .collect();
        values.sort_by(f64::total_cmp);

        let count = values.len();
        if count == 0 {
            return Self::default();
        }
        let n = count as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std = (count > 1).then(|| {
            let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
            (ss / (n - 1.0)).sqrt()
        });

        Self {
            count,
            mean: Some(mean),
            std,
            min: values.first().copied(),
            q25: quantile(&values, 0.25),
            median: quantile(&values, 0.5),
            q75: quantile(&values, 0.75),
            max: values.last().copied(),
        }
    }
}

/// Linear interpolation between closest ranks over sorted `values`.
fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let pos = q * last as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Blank cells and exact duplicate rows. These are reported, never rejected.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DataQuality {
    pub total_records: usize,
    /// Records without any blank cell.
    pub complete_records: usize,
    /// Blank cells across all records.
    pub missing_values: usize,
    /// Records identical to an earlier record in all four columns.
    pub duplicate_records: usize,
}

impl DataQuality {
    pub fn of(view: &View<'_>) -> Self {
        let mut seen = HashSet::new();
        let mut quality = Self {
            total_records: view.len(),
            ..Self::default()
        };
        for record in view.records() {
            let missing = record.missing_cells();
            quality.missing_values += missing;
            if missing == 0 {
                quality.complete_records += 1;
            }
            if !seen.insert(record.identity()) {
                quality.duplicate_records += 1;
            }
        }
        quality
    }

    pub fn is_clean(&self) -> bool {
        self.missing_values == 0 && self.duplicate_records == 0
    }
}
