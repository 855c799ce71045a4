use crate::args::ReportArgs;
use crate::commands::Out;
use crate::render::render;
use crate::report::{Coverage, ReportState};
use crate::{Config, DatasetCache, Result, Selection};
use anyhow::Context;
use std::io::Write;

/// Loads the spend sheet named in `args`, resolves the selection and writes the rendered report
/// to `w`.
///
/// # Errors
/// - The spend sheet cannot be loaded.
/// - The selection flags are invalid, e.g. a top-N outside 5 to 15.
/// - Writing to `w` fails.
pub fn report(config: &Config, args: &ReportArgs, w: &mut impl Write) -> Result<Out<Coverage>> {
    let cache = DatasetCache::new(args.file(), config.load_options());
    let dataset = cache.get()?;
    let selection = Selection::resolve(
        dataset,
        &args.selection().category_filter(config.category_top_n())?,
        &args.selection().area_filter(config.area_top_n())?,
    )?;

    let state = ReportState::build(
        dataset,
        &selection,
        &config.report_options(),
        cache.path().display().to_string(),
    );
    let rendered = render(&state, args.format(), args.rows())?;
    writeln!(w, "{}", rendered.trim_end()).context("Unable to write the report")?;

    Ok(match state.report() {
        None => "No records matched the selection".into(),
        Some(report) => Out::new(
            format!(
                "Reported on {} of {} records",
                report.coverage.matched_records, report.coverage.total_records
            ),
            report.coverage,
        ),
    })
}
