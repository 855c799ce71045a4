//! Exporting the filtered records as CSV.

use crate::aggregate::View;
use crate::model::Column;
use crate::report::sorted_by_value;
use crate::{utils, Result};
use anyhow::Context;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Writes the view as CSV: the canonical header row, then the records largest value first.
/// Values are plain numbers and blank values stay blank, so the output loads back unchanged.
pub fn write_csv<W: Write>(view: &View<'_>, w: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(w);
    writer
        .write_record(Column::headers())
        .context("Unable to write the CSV header")?;
    for record in sorted_by_value(view) {
        writer
            .write_record(record.to_row())
            .context("Unable to write a CSV record")?;
    }
    writer.flush().context("Unable to flush CSV output")?;
    Ok(())
}

/// Writes the view as CSV to `path`, creating its directory if needed. Returns the number of
/// records written.
pub fn export_csv(view: &View<'_>, path: &Path) -> Result<usize> {
    let mut buf = Vec::new();
    write_csv(view, &mut buf)?;
    utils::write(path, buf)?;
    info!("Exported {} records to {}", view.len(), path.display());
    Ok(view.len())
}
