//! The spend aggregator: filtering, grouped totals, ranking, the category × area pivot and
//! supplier market concentration.
//!
//! Sums are exact `Decimal` additions performed in view order, so the order of summation never
//! changes a total. Shares and the concentration score are ratios and are computed in `f64`.

use crate::load::Dataset;
use crate::model::{Dimension, Record};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Grouped totals keyed by label, iterated in ascending label order.
pub type Totals = BTreeMap<String, Decimal>;

/// HHI below this is a competitive market.
pub const HHI_COMPETITIVE_BELOW: f64 = 1500.0;

/// HHI above this is a highly concentrated market.
pub const HHI_HIGHLY_CONCENTRATED_ABOVE: f64 = 2500.0;

/// The records of a dataset that match a selection, in dataset order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct View<'a> {
    records: Vec<&'a Record>,
}

impl<'a> View<'a> {
    pub fn new(records: Vec<&'a Record>) -> Self {
        Self { records }
    }

    /// A view over every record of the dataset.
    pub fn all(dataset: &'a Dataset) -> Self {
        Self::new(dataset.records().iter().collect())
    }

    pub fn records(&self) -> &[&'a Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total value over the view.
    pub fn total(&self) -> Decimal {
        self.records.iter().map(|r| r.value()).sum()
    }
}

/// Keeps the records whose category is in `categories` and whose area is in `areas`. Either set
/// being empty yields an empty view.
pub fn filter<'a>(
    dataset: &'a Dataset,
    categories: &BTreeSet<String>,
    areas: &BTreeSet<String>,
) -> View<'a> {
    View::new(
        dataset
            .records()
            .iter()
            .filter(|r| categories.contains(r.category()) && areas.contains(r.area()))
            .collect(),
    )
}

/// Sums the value of each record in `view` per label of `dimension`. Labels that do not occur in
/// the view are absent.
pub fn sum_by(view: &View<'_>, dimension: Dimension) -> Totals {
    let mut totals = Totals::new();
    for record in view.records() {
        *totals.entry(record.key(dimension).to_string()).or_default() += record.value();
    }
    totals
}

/// All totals, largest first. Equal totals keep ascending label order.
pub fn ranked(totals: &Totals) -> Vec<(String, Decimal)> {
    let mut entries: Vec<(String, Decimal)> =
        totals.iter().map(|(k, v)| (k.clone(), *v)).collect();
    // `sort_by` is stable, which is what breaks ties by label.
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries
}

/// The `n` largest totals, largest first. Equal totals keep ascending label order.
pub fn top_n(totals: &Totals, n: usize) -> Vec<(String, Decimal)> {
    let mut entries = ranked(totals);
    entries.truncate(n);
    entries
}

/// A dense category × area matrix of summed values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Pivot {
    /// Row labels, ascending.
    categories: Vec<String>,
    /// Column labels, ascending.
    areas: Vec<String>,
    /// `cells[row][col]`, zero where a combination does not occur.
    cells: Vec<Vec<Decimal>>,
}

impl Pivot {
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn areas(&self) -> &[String] {
        &self.areas
    }

    pub fn rows(&self) -> &[Vec<Decimal>] {
        &self.cells
    }

    pub fn get(&self, category: &str, area: &str) -> Option<Decimal> {
        let row = self.categories.iter().position(|c| c == category)?;
        let col = self.areas.iter().position(|a| a == area)?;
        Some(self.cells[row][col])
    }

    /// Sum over all cells.
    pub fn total(&self) -> Decimal {
        self.cells.iter().flatten().sum()
    }
}

/// Cross-tabulates the view's values by category and area.
pub fn pivot(view: &View<'_>) -> Pivot {
    let categories: Vec<String> = distinct_sorted(view, Dimension::Category);
    let areas: Vec<String> = distinct_sorted(view, Dimension::Area);
    let row_of: BTreeMap<&str, usize> = index_of(&categories);
    let col_of: BTreeMap<&str, usize> = index_of(&areas);

    let mut cells = vec![vec![Decimal::ZERO; areas.len()]; categories.len()];
    for record in view.records() {
        let row = row_of[record.category()];
        let col = col_of[record.area()];
        cells[row][col] += record.value();
    }

    Pivot {
        categories,
        areas,
        cells,
    }
}

fn distinct_sorted(view: &View<'_>, dimension: Dimension) -> Vec<String> {
    view.records()
        .iter()
        .map(|r| r.key(dimension))
        .collect::<BTreeSet<&str>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn index_of(labels: &[String]) -> BTreeMap<&str, usize> {
    labels
        .iter()
        .enumerate()
        .map(|(ix, label)| (label.as_str(), ix))
        .collect()
}

/// How concentrated a market is, by Herfindahl–Hirschman Index.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Band {
    /// HHI below 1500.
    Competitive,
    /// HHI from 1500 to 2500 inclusive.
    ModeratelyConcentrated,
    /// HHI above 2500.
    HighlyConcentrated,
}

serde_plain::derive_display_from_serialize!(Band);
serde_plain::derive_fromstr_from_deserialize!(Band);

impl Band {
    pub fn classify(score: f64) -> Band {
        if score < HHI_COMPETITIVE_BELOW {
            Band::Competitive
        } else if score <= HHI_HIGHLY_CONCENTRATED_ABOVE {
            Band::ModeratelyConcentrated
        } else {
            Band::HighlyConcentrated
        }
    }

    /// Human readable name.
    pub fn label(&self) -> &'static str {
        match self {
            Band::Competitive => "Competitive Market",
            Band::ModeratelyConcentrated => "Moderately Concentrated",
            Band::HighlyConcentrated => "Highly Concentrated",
        }
    }

    pub fn explanation(&self) -> &'static str {
        match self {
            Band::Competitive => {
                "Low concentration indicates a competitive supplier market with a good \
                negotiating position."
            }
            Band::ModeratelyConcentrated => {
                "Moderate concentration suggests some supplier dominance but still competitive."
            }
            Band::HighlyConcentrated => {
                "High concentration indicates potential supplier dependency risks."
            }
        }
    }
}

/// A Herfindahl–Hirschman Index score and its band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Hhi {
    score: f64,
    band: Band,
}

impl Hhi {
    pub fn new(score: f64) -> Self {
        Self {
            score,
            band: Band::classify(score),
        }
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn band(&self) -> Band {
        self.band
    }
}

/// Each label's percentage of the grand total, in `totals` order. `None` when the grand total is
/// zero, where shares are undefined.
pub fn shares(totals: &Totals) -> Option<Vec<(String, f64)>> {
    let grand: Decimal = totals.values().sum();
    if grand <= Decimal::ZERO {
        return None;
    }
    let grand = grand.to_f64()?;
    Some(
        totals
            .iter()
            .map(|(label, total)| {
                let total = total.to_f64().unwrap_or_default();
                (label.clone(), total / grand * 100.0)
            })
            .collect(),
    )
}

/// The Herfindahl–Hirschman Index over supplier totals: the sum of squared percentage shares.
/// `None` when there is no spend to share out.
pub fn market_concentration(supplier_totals: &Totals) -> Option<Hhi> {
    let shares = shares(supplier_totals)?;
    Some(Hhi::new(shares.iter().map(|(_, s)| s * s).sum()))
}

/// The combined percentage share of the `k` largest suppliers. `None` when there is no spend.
pub fn top_k_concentration_share(supplier_totals: &Totals, k: usize) -> Option<f64> {
    let mut shares = shares(supplier_totals)?;
    shares.sort_by(|a, b| b.1.total_cmp(&a.1));
    Some(shares.iter().take(k).map(|(_, s)| s).sum())
}
