//! Turning a [`ReportState`] into something a person (or a program) can read.

use crate::report::{Entry, Report, ReportState};
use crate::Result;
use anyhow::Context;
use comfy_table::{Cell, CellAlignment, Table, TableComponent};
use std::fmt::Write;

/// Output format of the `report` command.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    serde::Serialize,
    serde::Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Terminal tables.
    #[default]
    Text,
    /// The full report state as pretty-printed JSON.
    Json,
}

serde_plain::derive_display_from_serialize!(OutputFormat);
serde_plain::derive_fromstr_from_deserialize!(OutputFormat);

/// Message shown instead of the report when the selection matches nothing.
pub const NO_DATA_MESSAGE: &str =
    "No data matches your current filters. Please adjust your selection.";

/// Renders `state` in `format`. `max_rows` limits the transaction table of the text format.
pub fn render(state: &ReportState, format: OutputFormat, max_rows: usize) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(state, max_rows)),
        OutputFormat::Json => {
            serde_json::to_string_pretty(state).context("Unable to serialize the report")
        }
    }
}

pub fn render_text(state: &ReportState, max_rows: usize) -> String {
    // Writing to a String cannot fail, so the fmt::Results below are discarded.
    let mut out = String::new();
    match state {
        ReportState::NoData {
            source,
            quick_stats,
            selection,
        } => {
            let _ = writeln!(out, "Spend report for {source}\n");
            let _ = writeln!(out, "{NO_DATA_MESSAGE}");
            let _ = writeln!(
                out,
                "Selected {} categories and {} areas out of {} categories and {} areas in {} \
                records.",
                selection.categories().len(),
                selection.areas().len(),
                quick_stats.categories,
                quick_stats.areas,
                quick_stats.total_records,
            );
        }
        ReportState::Ready(report) => write_report(&mut out, report, max_rows),
    }
    out
}

fn write_report(out: &mut String, report: &Report, max_rows: usize) {
    let _ = writeln!(
        out,
        "Spend report for {} (generated {})\n",
        report.source,
        report.generated.format("%Y-%m-%d %H:%M")
    );
    let _ = writeln!(
        out,
        "Matched {} records ({:.1}% of {} records, {} categories, {} areas)\n",
        report.coverage.matched_records,
        report.coverage.percent,
        report.quick_stats.total_records,
        report.quick_stats.categories,
        report.quick_stats.areas,
    );

    section(out, "Key Performance Indicators");
    let kpis = &report.kpis;
    let mut table = key_value_table();
    table.add_row(vec![
        Cell::new("Total Spend"),
        right(kpis.total_spend.to_string()),
    ]);
    table.add_row(vec![
        Cell::new("Unique Suppliers"),
        right(kpis.unique_suppliers.to_string()),
    ]);
    table.add_row(vec![
        Cell::new("Average Invoice"),
        right(or_na(kpis.average_invoice.map(|a| a.to_string()))),
    ]);
    table.add_row(vec![
        Cell::new("Top Supplier Share"),
        right(or_na(kpis.top_supplier_share.map(percent))),
    ]);
    let _ = writeln!(out, "{table}\n");

    section(out, "Spending by Category");
    let _ = writeln!(
        out,
        "{}\n",
        entry_table("Category", report.categories.iter().rev())
    );

    section(out, "Top Suppliers");
    let _ = writeln!(
        out,
        "{}\n",
        entry_table("Supplier", report.top_suppliers.iter())
    );

    section(out, "Market Concentration");
    match &report.concentration {
        Some(c) => {
            let band = c.hhi.band();
            let _ = writeln!(out, "HHI Score: {:.0}", c.hhi.score());
            let _ = writeln!(out, "Status: {}", band.label());
            let _ = writeln!(out, "{}", band.explanation());
            let _ = writeln!(
                out,
                "Top {} Suppliers Control: {} of spend\n",
                c.top_k,
                percent(c.top_k_share)
            );
        }
        None => {
            let _ = writeln!(out, "Not applicable: the selection has no spend.\n");
        }
    }

    section(out, "Supplier Market Share");
    let _ = writeln!(
        out,
        "{}\n",
        entry_table("Supplier", report.supplier_pie.iter())
    );

    section(out, "Spending by Business Unit/Area");
    let _ = writeln!(out, "{}\n", entry_table("Area", report.areas.iter()));

    section(out, "Category-Area Spending");
    let _ = writeln!(out, "{}\n", pivot_table(report));

    section(out, "Statistical Summary");
    let d = &report.describe;
    let mut table = key_value_table();
    table.add_row(vec![Cell::new("count"), right(d.count.to_string())]);
    for (name, value) in [
        ("mean", d.mean),
        ("std", d.std),
        ("min", d.min),
        ("25%", d.q25),
        ("50%", d.median),
        ("75%", d.q75),
        ("max", d.max),
    ] {
        table.add_row(vec![
            Cell::new(name),
            right(or_na(value.map(|v| format!("{v:.2}")))),
        ]);
    }
    let _ = writeln!(out, "{table}\n");

    section(out, "Data Quality");
    let q = &report.quality;
    let mut table = key_value_table();
    for (name, value) in [
        ("Total Records", q.total_records),
        ("Complete Records", q.complete_records),
        ("Missing Values", q.missing_values),
        ("Duplicate Records", q.duplicate_records),
    ] {
        table.add_row(vec![Cell::new(name), right(value.to_string())]);
    }
    let _ = writeln!(out, "{table}\n");

    section(out, "Transaction Details");
    let _ = writeln!(out, "{}", transaction_table(report, max_rows));
    if report.transactions.len() > max_rows {
        let _ = writeln!(
            out,
            "... {} more records not shown",
            report.transactions.len() - max_rows
        );
    }
}

pub(crate) fn section(out: &mut String, title: &str) {
    let _ = writeln!(out, "{title}\n{}", "-".repeat(title.chars().count()));
}

fn base_table() -> Table {
    let mut table = Table::new();
    table.remove_style(TableComponent::HorizontalLines);
    table.remove_style(TableComponent::MiddleIntersections);
    table.remove_style(TableComponent::LeftBorderIntersections);
    table.remove_style(TableComponent::RightBorderIntersections);
    table
}

fn key_value_table() -> Table {
    let mut table = base_table();
    table.set_header(vec!["Metric", "Value"]);
    table
}

pub(crate) fn entry_table<'a>(label: &str, entries: impl Iterator<Item = &'a Entry>) -> Table {
    let mut table = base_table();
    table.set_header(vec![label, "Total Spend", "Share"]);
    for entry in entries {
        table.add_row(vec![
            Cell::new(&entry.label),
            right(entry.total.to_string()),
            right(percent(entry.percent)),
        ]);
    }
    table
}

fn pivot_table(report: &Report) -> Table {
    let pivot = &report.pivot;
    let mut table = base_table();
    let mut header = vec!["Category".to_string()];
    header.extend(pivot.areas().iter().cloned());
    table.set_header(header);
    for (category, row) in pivot.categories().iter().zip(pivot.rows()) {
        let mut cells = vec![Cell::new(category)];
        cells.extend(
            row.iter()
                .map(|v| right(crate::model::Amount::new(*v).to_string())),
        );
        table.add_row(cells);
    }
    table
}

fn transaction_table(report: &Report, max_rows: usize) -> Table {
    let mut table = base_table();
    table.set_header(crate::model::Column::headers().to_vec());
    for record in report.transactions.iter().take(max_rows) {
        table.add_row(vec![
            Cell::new(record.category()),
            Cell::new(record.area()),
            Cell::new(record.supplier()),
            right(or_na(record.amount().map(|a| a.to_string()))),
        ]);
    }
    table
}

fn right(s: String) -> Cell {
    Cell::new(s).set_alignment(CellAlignment::Right)
}

fn percent(v: f64) -> String {
    format!("{v:.1}%")
}

fn or_na(v: Option<String>) -> String {
    v.unwrap_or_else(|| "n/a".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ReportOptions;
    use crate::test::sample_dataset;
    use crate::Selection;

    fn sample_state(selection: Selection) -> ReportState {
        ReportState::build(
            &sample_dataset(),
            &selection,
            &ReportOptions::default(),
            "spend.csv",
        )
    }

    #[test]
    fn test_render_text_report() {
        let state = sample_state(Selection::all(&sample_dataset()));
        let text = render(&state, OutputFormat::Text, 2).unwrap();
        assert!(text.contains("Spend report for spend.csv"));
        assert!(text.contains("Matched 3 records (100.0% of 3 records"));
        assert!(text.contains("£450.00"));
        assert!(text.contains("HHI Score: 5556"));
        assert!(text.contains("Highly Concentrated"));
        assert!(text.contains("Top 5 Suppliers Control: 100.0% of spend"));
        assert!(text.contains("... 1 more records not shown"));
    }

    #[test]
    fn test_render_no_data() {
        let state = sample_state(Selection::new(["CatB"], ["AreaY"]));
        let text = render(&state, OutputFormat::Text, 20).unwrap();
        assert!(text.contains(NO_DATA_MESSAGE));
        assert!(!text.contains("HHI"));
    }

    #[test]
    fn test_render_json() {
        let state = sample_state(Selection::new(["CatB"], ["AreaY"]));
        let json = render(&state, OutputFormat::Json, 20).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["state"], "no_data");
    }

    #[test]
    fn test_output_format_display() {
        assert_eq!(OutputFormat::Json.to_string(), "json");
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
    }
}
