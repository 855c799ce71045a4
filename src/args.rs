//! These structs provide the CLI interface for the spend CLI.

use crate::render::OutputFormat;
use crate::selection::{DimensionFilter, FilterMode};
use crate::Result;
use anyhow::bail;
use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing_subscriber::filter::LevelFilter;

/// spend: A command-line tool for analysing procurement spend.
///
/// Loads a spreadsheet of procurement line items with the columns "Expense Type (Category)",
/// "Expense Area (User/BU)", "Supplier" and "Invoice Value (GBP)", narrows it to a selection of
/// categories and business areas, and reports grouped totals, a category by area pivot and
/// supplier market concentration (HHI).
///
/// The input may be a CSV file or an Excel/OpenDocument workbook, in which case the first
/// worksheet is read.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the spend report for a selection of categories and areas.
    ///
    /// Without any selection flags the report covers the top 10 categories and top 8 areas by
    /// total spend (configurable).
    Report(ReportArgs),
    /// Write the records matching a selection to a CSV file, largest value first.
    Export(ExportArgs),
    /// Print the size of the dataset and its largest categories and areas.
    Overview(OverviewArgs),
    /// Write a configuration file with default settings.
    InitConfig(InitConfigArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// Path to the JSON configuration file. Defaults to spend-report/config.json in your
    /// platform's configuration directory, and built-in defaults if that does not exist.
    #[arg(long, env = "SPEND_REPORT_CONFIG")]
    config: Option<PathBuf>,
}

impl Common {
    pub fn new(log_level: LevelFilter, config: Option<PathBuf>) -> Self {
        Self { log_level, config }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn config(&self) -> Option<&Path> {
        self.config.as_deref()
    }
}

/// How the labels of a dimension are offered on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModeArg {
    /// The largest labels by total spend.
    Top,
    /// Labels containing the search text.
    Search,
    /// Every label.
    All,
}

serde_plain::derive_display_from_serialize!(ModeArg);
serde_plain::derive_fromstr_from_deserialize!(ModeArg);

/// (Not shown): The selection flags shared by `report` and `export`.
#[derive(Debug, Parser, Clone, Default)]
pub struct SelectionArgs {
    /// How categories are offered. Defaults to `search` when --category-search is given and to
    /// `top` otherwise.
    #[arg(long, value_enum)]
    category_mode: Option<ModeArg>,

    /// How many of the largest categories `top` mode offers, between 5 and 15.
    #[arg(long)]
    category_top_n: Option<usize>,

    /// Case-insensitive text that `search` mode matches category names against.
    #[arg(long)]
    category_search: Option<String>,

    /// Pick a category from those offered. Repeat to pick several. When omitted, `top` and
    /// `all` pick everything offered and `search` picks every match if there are at most five,
    /// or the first three otherwise.
    #[arg(long = "category")]
    categories: Vec<String>,

    /// How areas are offered. Defaults to `search` when --area-search is given and to `top`
    /// otherwise.
    #[arg(long, value_enum)]
    area_mode: Option<ModeArg>,

    /// How many of the largest areas `top` mode offers, between 5 and 15.
    #[arg(long)]
    area_top_n: Option<usize>,

    /// Case-insensitive text that `search` mode matches area names against.
    #[arg(long)]
    area_search: Option<String>,

    /// Pick an area from those offered. Repeat to pick several.
    #[arg(long = "area")]
    areas: Vec<String>,
}

impl SelectionArgs {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        category_mode: Option<ModeArg>,
        category_top_n: Option<usize>,
        category_search: Option<String>,
        categories: Vec<String>,
        area_mode: Option<ModeArg>,
        area_top_n: Option<usize>,
        area_search: Option<String>,
        areas: Vec<String>,
    ) -> Self {
        Self {
            category_mode,
            category_top_n,
            category_search,
            categories,
            area_mode,
            area_top_n,
            area_search,
            areas,
        }
    }

    /// The category control, using `default_top_n` when no top-N was given.
    pub fn category_filter(&self, default_top_n: usize) -> Result<DimensionFilter> {
        dimension_filter(
            "category",
            self.category_mode,
            self.category_top_n.unwrap_or(default_top_n),
            self.category_search.as_deref(),
            &self.categories,
        )
    }

    /// The area control, using `default_top_n` when no top-N was given.
    pub fn area_filter(&self, default_top_n: usize) -> Result<DimensionFilter> {
        dimension_filter(
            "area",
            self.area_mode,
            self.area_top_n.unwrap_or(default_top_n),
            self.area_search.as_deref(),
            &self.areas,
        )
    }
}

fn dimension_filter(
    name: &str,
    mode: Option<ModeArg>,
    top_n: usize,
    search: Option<&str>,
    pick: &[String],
) -> Result<DimensionFilter> {
    let mode = match (mode, search) {
        (Some(ModeArg::Top), _) | (None, None) => FilterMode::Top { n: top_n },
        (Some(ModeArg::Search), Some(text)) | (None, Some(text)) => FilterMode::Search {
            text: text.to_string(),
        },
        (Some(ModeArg::Search), None) => {
            bail!("--{name}-mode search requires --{name}-search")
        }
        (Some(ModeArg::All), _) => FilterMode::All,
    };
    let filter = DimensionFilter::new(mode);
    Ok(if pick.is_empty() {
        filter
    } else {
        filter.with_pick(pick.to_vec())
    })
}

/// (Not shown): Args for the `spend report` command.
#[derive(Debug, Parser, Clone)]
pub struct ReportArgs {
    /// The spend data file (.csv, .xlsx, .xls or .ods).
    file: PathBuf,

    #[clap(flatten)]
    selection: SelectionArgs,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Maximum number of transactions listed in the text report.
    #[arg(long, default_value_t = 20)]
    rows: usize,
}

impl ReportArgs {
    pub fn new(
        file: impl Into<PathBuf>,
        selection: SelectionArgs,
        format: OutputFormat,
        rows: usize,
    ) -> Self {
        Self {
            file: file.into(),
            selection,
            format,
            rows,
        }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn selection(&self) -> &SelectionArgs {
        &self.selection
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn rows(&self) -> usize {
        self.rows
    }
}

/// (Not shown): Args for the `spend export` command.
#[derive(Debug, Parser, Clone)]
pub struct ExportArgs {
    /// The spend data file (.csv, .xlsx, .xls or .ods).
    file: PathBuf,

    #[clap(flatten)]
    selection: SelectionArgs,

    /// Where to write the filtered records.
    #[arg(long)]
    out: PathBuf,
}

impl ExportArgs {
    pub fn new(file: impl Into<PathBuf>, selection: SelectionArgs, out: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            selection,
            out: out.into(),
        }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn selection(&self) -> &SelectionArgs {
        &self.selection
    }

    pub fn out(&self) -> &Path {
        &self.out
    }
}

/// (Not shown): Args for the `spend overview` command.
#[derive(Debug, Parser, Clone)]
pub struct OverviewArgs {
    /// The spend data file (.csv, .xlsx, .xls or .ods).
    file: PathBuf,
}

impl OverviewArgs {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self { file: file.into() }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }
}

/// (Not shown): Args for the `spend init-config` command.
#[derive(Debug, Parser, Clone)]
pub struct InitConfigArgs {
    /// Where to write the file. Defaults to --config, then to the platform default location.
    path: Option<PathBuf>,
}

impl InitConfigArgs {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
