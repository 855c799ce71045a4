//! The report: everything a presentation layer needs to draw the dashboard for one selection.
//!
//! A report is a pure function of the dataset, the selection and a few sizing options. When the
//! selection matches nothing the result is [`ReportState::NoData`] and none of the aggregation
//! stages run.

use crate::aggregate::{self, Hhi, Pivot, Totals, View};
use crate::load::Dataset;
use crate::model::{Amount, Dimension, Record};
use crate::selection::Selection;
use crate::stats::{DataQuality, Describe, Kpis, QuickStats};
use chrono::{DateTime, Local};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Label of the pie slice that holds every supplier outside the named ones.
pub const OTHERS: &str = "Others";

/// Sizes of the report's chart series.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct ReportOptions {
    supplier_chart_len: usize,
    pie_slices: usize,
    top_k: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            supplier_chart_len: 15,
            pie_slices: 10,
            top_k: 5,
        }
    }
}

impl ReportOptions {
    pub fn new(supplier_chart_len: usize, pie_slices: usize, top_k: usize) -> Self {
        Self {
            supplier_chart_len,
            pie_slices,
            top_k,
        }
    }

    pub fn supplier_chart_len(&self) -> usize {
        self.supplier_chart_len
    }

    pub fn pie_slices(&self) -> usize {
        self.pie_slices
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }
}

/// One labelled bar, slice or tile of a chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Entry {
    pub label: String,
    pub total: Amount,
    /// Percent of the view's total spend; zero when the view has no spend.
    pub percent: f64,
}

impl Entry {
    pub(crate) fn new(label: impl Into<String>, total: Decimal, grand: Decimal) -> Self {
        let percent = if grand > Decimal::ZERO {
            (total / grand * Decimal::ONE_HUNDRED)
                .to_f64()
                .unwrap_or_default()
        } else {
            0.0
        };
        Self {
            label: label.into(),
            total: Amount::new(total),
            percent,
        }
    }
}

/// Supplier market concentration for the view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Concentration {
    pub hhi: Hhi,
    /// How many of the largest suppliers `top_k_share` covers.
    pub top_k: usize,
    /// Combined percent share of the `top_k` largest suppliers.
    pub top_k_share: f64,
}

/// How much of the dataset the selection matched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Coverage {
    pub matched_records: usize,
    pub total_records: usize,
    pub percent: f64,
}

impl Coverage {
    fn new(matched_records: usize, total_records: usize) -> Self {
        let percent = if total_records == 0 {
            0.0
        } else {
            matched_records as f64 / total_records as f64 * 100.0
        };
        Self {
            matched_records,
            total_records,
            percent,
        }
    }
}

/// The full render state for a non-empty selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Report {
    pub generated: DateTime<Local>,
    pub source: String,
    pub quick_stats: QuickStats,
    pub selection: Selection,
    pub coverage: Coverage,
    pub kpis: Kpis,
    /// Category totals, smallest first (bar chart order).
    pub categories: Vec<Entry>,
    /// The largest suppliers, largest first.
    pub top_suppliers: Vec<Entry>,
    /// `None` when the view has records but no spend.
    pub concentration: Option<Concentration>,
    /// The largest suppliers plus an "Others" slice for the rest.
    pub supplier_pie: Vec<Entry>,
    /// Area totals, largest first.
    pub areas: Vec<Entry>,
    pub pivot: Pivot,
    pub describe: Describe,
    pub quality: DataQuality,
    /// The matched records, largest value first.
    pub transactions: Vec<Record>,
}

/// The outcome of building a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum ReportState {
    /// Nothing matched the selection.
    NoData {
        source: String,
        quick_stats: QuickStats,
        selection: Selection,
    },
    Ready(Box<Report>),
}

impl ReportState {
    /// Runs filter → aggregate → pivot → concentration for `selection` over `dataset`.
    pub fn build(
        dataset: &Dataset,
        selection: &Selection,
        options: &ReportOptions,
        source: impl Into<String>,
    ) -> Self {
        let source = source.into();
        let quick_stats = QuickStats::of(dataset);
        let view = selection.apply(dataset);
        debug!("Selection matched {} of {} records", view.len(), dataset.len());

        if view.is_empty() {
            return ReportState::NoData {
                source,
                quick_stats,
                selection: selection.clone(),
            };
        }

        let grand = view.total();
        let suppliers = aggregate::sum_by(&view, Dimension::Supplier);

        let mut categories: Vec<(String, Decimal)> =
            aggregate::sum_by(&view, Dimension::Category).into_iter().collect();
        // Stable, so equal totals stay in ascending label order.
        categories.sort_by(|a, b| a.1.cmp(&b.1));
        let categories = entries(&categories, grand);

        let concentration = aggregate::market_concentration(&suppliers).map(|hhi| Concentration {
            hhi,
            top_k: options.top_k,
            top_k_share: aggregate::top_k_concentration_share(&suppliers, options.top_k)
                .unwrap_or_default(),
        });

        let report = Report {
            generated: Local::now(),
            source,
            quick_stats,
            selection: selection.clone(),
            coverage: Coverage::new(view.len(), dataset.len()),
            kpis: Kpis::of(&view),
            categories,
            top_suppliers: entries(
                &aggregate::top_n(&suppliers, options.supplier_chart_len),
                grand,
            ),
            concentration,
            supplier_pie: supplier_pie(&suppliers, options.pie_slices, grand),
            areas: entries(
                &aggregate::ranked(&aggregate::sum_by(&view, Dimension::Area)),
                grand,
            ),
            pivot: aggregate::pivot(&view),
            describe: Describe::of(&view),
            quality: DataQuality::of(&view),
            transactions: sorted_by_value(&view),
        };
        ReportState::Ready(Box::new(report))
    }

    pub fn report(&self) -> Option<&Report> {
        match self {
            ReportState::NoData { .. } => None,
            ReportState::Ready(report) => Some(report),
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, ReportState::NoData { .. })
    }
}

pub(crate) fn entries(ranked: &[(String, Decimal)], grand: Decimal) -> Vec<Entry> {
    ranked
        .iter()
        .map(|(label, total)| Entry::new(label.as_str(), *total, grand))
        .collect()
}

fn supplier_pie(suppliers: &Totals, slices: usize, grand: Decimal) -> Vec<Entry> {
    let named = aggregate::top_n(suppliers, slices);
    let others = grand - named.iter().map(|(_, total)| *total).sum::<Decimal>();
    let mut pie = entries(&named, grand);
    if others > Decimal::ZERO {
        pie.push(Entry::new(OTHERS, others, grand));
    }
    pie
}

/// The view's records, largest value first; equal values keep dataset order.
pub fn sorted_by_value(view: &View<'_>) -> Vec<Record> {
    let mut records: Vec<Record> = view.records().iter().map(|r| (*r).clone()).collect();
    records.sort_by(|a, b| b.value().cmp(&a.value()));
    records
}
