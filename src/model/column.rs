use crate::Result;
use anyhow::bail;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub(crate) const CATEGORY_STR: &str = "Expense Type (Category)";
pub(crate) const AREA_STR: &str = "Expense Area (User/BU)";
pub(crate) const SUPPLIER_STR: &str = "Supplier";
pub(crate) const VALUE_STR: &str = "Invoice Value (GBP)";

/// The four columns of a spend sheet, in the order they must appear in the source file.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Category,
    Area,
    Supplier,
    Value,
}

serde_plain::derive_display_from_serialize!(Column);
serde_plain::derive_fromstr_from_deserialize!(Column);

impl Column {
    /// All columns in source order.
    pub const ALL: [Column; 4] = [
        Column::Category,
        Column::Area,
        Column::Supplier,
        Column::Value,
    ];

    /// The canonical header the column is renamed to on load, and written to on export.
    pub fn header(&self) -> &'static str {
        match self {
            Column::Category => CATEGORY_STR,
            Column::Area => AREA_STR,
            Column::Supplier => SUPPLIER_STR,
            Column::Value => VALUE_STR,
        }
    }

    /// The canonical header row.
    pub fn headers() -> [&'static str; 4] {
        Self::ALL.map(|c| c.header())
    }
}

/// A categorical attribute of a record that spend can be grouped by.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Category,
    Area,
    Supplier,
}

serde_plain::derive_display_from_serialize!(Dimension);
serde_plain::derive_fromstr_from_deserialize!(Dimension);

impl Dimension {
    pub fn column(&self) -> Column {
        match self {
            Dimension::Category => Column::Category,
            Dimension::Area => Column::Area,
            Dimension::Supplier => Column::Supplier,
        }
    }
}

/// Checks a source header row against the expected four-column shape.
///
/// The columns are positional: whatever the source calls them, column 0 becomes the category,
/// column 1 the area and so on. A header that names a *different* column than the one at its
/// position is reported as misordered. With `strict` set, every header must be recognized as the
/// column at its position, either by its canonical name, its short name (`category`, `area`,
/// `supplier`, `value`) or one of the configured `aliases` (keyed by short name).
pub(crate) fn validate_headers<S>(
    headers: &[S],
    strict: bool,
    aliases: &BTreeMap<String, Vec<String>>,
) -> Result<()>
where
    S: AsRef<str>,
{
    if headers.len() != Column::ALL.len() {
        bail!(
            "Expected exactly {} columns ({}), found {}: [{}]",
            Column::ALL.len(),
            Column::headers().join(", "),
            headers.len(),
            headers
                .iter()
                .map(|h| h.as_ref())
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    for (ix, (header, expected)) in headers.iter().zip(Column::ALL).enumerate() {
        let header = header.as_ref();
        match recognize(header, aliases) {
            Some(found) if found != expected => bail!(
                "Column {} is '{header}', which looks like the {found} column, but the {expected} \
                column ('{}') belongs there; the columns are misordered",
                ix + 1,
                expected.header()
            ),
            None if strict => bail!(
                "Column {} is '{header}', expected '{}'",
                ix + 1,
                expected.header()
            ),
            _ => {}
        }
    }
    Ok(())
}

fn recognize(header: &str, aliases: &BTreeMap<String, Vec<String>>) -> Option<Column> {
    let header = normalize(header);
    Column::ALL.into_iter().find(|column| {
        let short = column.to_string();
        normalize(column.header()) == header
            || short == header
            || aliases
                .get(&short)
                .is_some_and(|names| names.iter().any(|n| normalize(n) == header))
    })
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_aliases() -> BTreeMap<String, Vec<String>> {
        BTreeMap::new()
    }

    #[test]
    fn test_column_display() {
        assert_eq!(Column::Value.to_string(), "value");
        assert_eq!("area".parse::<Column>().unwrap(), Column::Area);
        assert_eq!(Dimension::Supplier.column(), Column::Supplier);
    }

    #[test]
    fn test_canonical_headers_pass() {
        validate_headers(&Column::headers(), true, &no_aliases()).unwrap();
    }

    #[test]
    fn test_arbitrary_headers_pass_when_not_strict() {
        let headers = ["Expense Type", "Expense Area", "Supplier", "Amount"];
        validate_headers(&headers, false, &no_aliases()).unwrap();
    }

    #[test]
    fn test_arbitrary_headers_fail_when_strict() {
        let headers = ["Expense Type", "Expense Area", "Supplier", "Amount"];
        let err = validate_headers(&headers, true, &no_aliases()).unwrap_err();
        assert!(err.to_string().contains("Column 1"));
    }

    #[test]
    fn test_aliases_satisfy_strict() {
        let mut aliases = no_aliases();
        aliases.insert("category".into(), vec!["Expense Type".into()]);
        aliases.insert("area".into(), vec!["Expense Area".into()]);
        aliases.insert("value".into(), vec!["amount".into()]);
        let headers = ["Expense Type", "Expense Area", "Supplier", "Amount"];
        validate_headers(&headers, true, &aliases).unwrap();
    }

    #[test]
    fn test_wrong_column_count() {
        let headers = ["Expense Type (Category)", "Supplier", "Invoice Value (GBP)"];
        let err = validate_headers(&headers, false, &no_aliases()).unwrap_err();
        assert!(err.to_string().contains("found 3"));
    }

    #[test]
    fn test_misordered_columns() {
        let headers = [
            "Expense Type (Category)",
            "Supplier",
            "Expense Area (User/BU)",
            "Invoice Value (GBP)",
        ];
        let err = validate_headers(&headers, false, &no_aliases()).unwrap_err();
        assert!(err.to_string().contains("misordered"));
    }
}
