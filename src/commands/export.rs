use crate::args::ExportArgs;
use crate::commands::Out;
use crate::export::export_csv;
use crate::{Config, DatasetCache, Result, Selection};
use serde::Serialize;
use std::path::PathBuf;
use tracing::warn;

/// What `export` wrote.
#[derive(Debug, Clone, Serialize)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub records: usize,
}

/// Writes the records matching the selection in `args` to `args.out()` as CSV.
///
/// An empty selection still writes a file holding only the header row.
pub fn export(config: &Config, args: &ExportArgs) -> Result<Out<ExportSummary>> {
    let cache = DatasetCache::new(args.file(), config.load_options());
    let dataset = cache.get()?;
    let selection = Selection::resolve(
        dataset,
        &args.selection().category_filter(config.category_top_n())?,
        &args.selection().area_filter(config.area_top_n())?,
    )?;
    let view = selection.apply(dataset);
    if view.is_empty() {
        warn!("No records matched the selection, only the header row will be written");
    }
    let records = export_csv(&view, args.out())?;
    Ok(Out::new(
        format!("Wrote {records} records to {}", args.out().display()),
        ExportSummary {
            path: args.out().to_path_buf(),
            records,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::{ModeArg, SelectionArgs};
    use crate::test::{write_file, CANONICAL_HEADER, SAMPLE_CSV};
    use tempfile::TempDir;

    #[test]
    fn test_export_selection() {
        let dir = TempDir::new().unwrap();
        let file = write_file(&dir, "spend.csv", SAMPLE_CSV);
        let out_path = dir.path().join("filtered.csv");
        let selection = SelectionArgs::new(
            Some(ModeArg::Search),
            None,
            Some("cata".to_string()),
            vec![],
            Some(ModeArg::All),
            None,
            None,
            vec![],
        );
        let args = ExportArgs::new(&file, selection, &out_path);
        let out = export(&Config::default(), &args).unwrap();

        assert_eq!(out.structure().unwrap().records, 2);
        let written = std::fs::read_to_string(&out_path).unwrap();
        assert_eq!(
            written.lines().collect::<Vec<_>>(),
            vec![CANONICAL_HEADER, "CatA,AreaY,S2,300", "CatA,AreaX,S1,100"]
        );
    }

    #[test]
    fn test_export_empty_selection_writes_header() {
        let dir = TempDir::new().unwrap();
        let file = write_file(&dir, "spend.csv", SAMPLE_CSV);
        let out_path = dir.path().join("empty.csv");
        let selection = SelectionArgs::new(
            Some(ModeArg::All),
            None,
            None,
            vec!["CatB".to_string()],
            Some(ModeArg::All),
            None,
            None,
            vec!["AreaY".to_string()],
        );
        let out = export(&Config::default(), &ExportArgs::new(&file, selection, &out_path)).unwrap();
        assert_eq!(out.structure().unwrap().records, 0);
        assert_eq!(
            std::fs::read_to_string(&out_path).unwrap().trim_end(),
            CANONICAL_HEADER
        );
    }
}
