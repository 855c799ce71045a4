use crate::aggregate::{self, View};
use crate::args::OverviewArgs;
use crate::commands::Out;
use crate::model::{Amount, Dimension};
use crate::render::{entry_table, section};
use crate::report::{entries, Entry};
use crate::stats::{DataQuality, QuickStats};
use crate::{Config, DatasetCache, Result};
use anyhow::Context;
use serde::Serialize;
use std::fmt::Write as _;
use std::io::Write;

/// The whole dataset at a glance: its size and the labels the default top-N selection offers.
#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub quick_stats: QuickStats,
    pub total_spend: Amount,
    pub quality: DataQuality,
    pub top_categories: Vec<Entry>,
    pub top_areas: Vec<Entry>,
}

/// Loads the spend sheet and writes its overview to `w`.
pub fn overview(config: &Config, args: &OverviewArgs, w: &mut impl Write) -> Result<Out<Overview>> {
    let cache = DatasetCache::new(args.file(), config.load_options());
    let dataset = cache.get()?;
    let view = View::all(dataset);
    let grand = view.total();
    let top = |dimension: Dimension, n: usize| {
        entries(
            &aggregate::top_n(&aggregate::sum_by(&view, dimension), n),
            grand,
        )
    };

    let overview = Overview {
        quick_stats: QuickStats::of(dataset),
        total_spend: Amount::new(grand),
        quality: DataQuality::of(&view),
        top_categories: top(Dimension::Category, config.category_top_n()),
        top_areas: top(Dimension::Area, config.area_top_n()),
    };

    writeln!(w, "{}", overview_text(&overview, cache.path().display()).trim_end())
        .context("Unable to write the overview")?;
    Ok(Out::new(
        format!("Loaded {} records", overview.quick_stats.total_records),
        overview,
    ))
}

fn overview_text(overview: &Overview, source: impl std::fmt::Display) -> String {
    let mut out = String::new();
    let stats = &overview.quick_stats;
    let _ = writeln!(out, "Spend data in {source}\n");
    let _ = writeln!(out, "Total Records: {}", stats.total_records);
    let _ = writeln!(out, "Categories: {}", stats.categories);
    let _ = writeln!(out, "Areas: {}", stats.areas);
    let _ = writeln!(out, "Total Spend: {}", overview.total_spend);
    let quality = &overview.quality;
    if !quality.is_clean() {
        let _ = writeln!(
            out,
            "Data quality: {} missing values, {} duplicate records",
            quality.missing_values, quality.duplicate_records
        );
    }
    let _ = writeln!(out);

    section(&mut out, "Top Categories");
    let _ = writeln!(
        out,
        "{}\n",
        entry_table("Category", overview.top_categories.iter())
    );
    section(&mut out, "Top Areas");
    let _ = writeln!(out, "{}", entry_table("Area", overview.top_areas.iter()));
    out
}
