use crate::model::{Amount, Column, Dimension};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One procurement line item.
///
/// Blank source cells are kept rather than rejected: a blank text cell is the empty string and a
/// blank value cell is `None`, which contributes nothing to any sum. [`Record::missing_cells`]
/// reports how many of the four cells were blank.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Record {
    category: String,
    area: String,
    supplier: String,
    value: Option<Amount>,
}

impl Record {
    pub fn new(
        category: impl Into<String>,
        area: impl Into<String>,
        supplier: impl Into<String>,
        value: Option<Amount>,
    ) -> Self {
        Self {
            category: category.into(),
            area: area.into(),
            supplier: supplier.into(),
            value,
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn area(&self) -> &str {
        &self.area
    }

    pub fn supplier(&self) -> &str {
        &self.supplier
    }

    /// The invoice value, or `None` if the source cell was blank.
    pub fn amount(&self) -> Option<Amount> {
        self.value
    }

    /// The invoice value for summation; a blank value counts as zero.
    pub fn value(&self) -> Decimal {
        self.value.map(|a| a.value()).unwrap_or_default()
    }

    /// The label this record carries for the given dimension.
    pub fn key(&self, dimension: Dimension) -> &str {
        match dimension {
            Dimension::Category => &self.category,
            Dimension::Area => &self.area,
            Dimension::Supplier => &self.supplier,
        }
    }

    /// The cell for `column` as it would be written to a CSV file.
    pub fn cell(&self, column: Column) -> String {
        match column {
            Column::Category => self.category.clone(),
            Column::Area => self.area.clone(),
            Column::Supplier => self.supplier.clone(),
            Column::Value => self
                .value
                .map(|a| a.plain().to_string())
                .unwrap_or_default(),
        }
    }

    /// Converts the record into a row in canonical column order.
    pub fn to_row(&self) -> Vec<String> {
        Column::ALL.iter().map(|c| self.cell(*c)).collect()
    }

    /// Number of blank cells among the four columns.
    pub fn missing_cells(&self) -> usize {
        [&self.category, &self.area, &self.supplier]
            .into_iter()
            .filter(|s| s.trim().is_empty())
            .count()
            + usize::from(self.value.is_none())
    }

    /// Identity used for duplicate detection: all four fields, with the value compared
    /// numerically so that `100` and `100.00` are the same row.
    pub(crate) fn identity(&self) -> (&str, &str, &str, Option<Decimal>) {
        (
            &self.category,
            &self.area,
            &self.supplier,
            self.value.map(|a| a.value().normalize()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_missing_cells() {
        let full = Record::new("Cat", "Area", "Sup", Some(Amount::from_str("1").unwrap()));
        assert_eq!(full.missing_cells(), 0);

        let sparse = Record::new("Cat", " ", "", None);
        assert_eq!(sparse.missing_cells(), 3);
        assert_eq!(sparse.value(), Decimal::ZERO);
    }

    #[test]
    fn test_to_row_uses_plain_value() {
        let r = Record::new("Cat", "Area", "Sup", Some(Amount::from_str("£1,000.50").unwrap()));
        assert_eq!(r.to_row(), vec!["Cat", "Area", "Sup", "1000.50"]);
        let blank = Record::new("Cat", "Area", "Sup", None);
        assert_eq!(blank.cell(Column::Value), "");
    }

    #[test]
    fn test_identity_ignores_scale() {
        let a = Record::new("C", "A", "S", Some(Amount::from_str("100").unwrap()));
        let b = Record::new("C", "A", "S", Some(Amount::from_str("100.00").unwrap()));
        assert_eq!(a.identity(), b.identity());
    }

    #[test]
    fn test_key() {
        let r = Record::new("Cat", "Area", "Sup", None);
        assert_eq!(r.key(Dimension::Category), "Cat");
        assert_eq!(r.key(Dimension::Area), "Area");
        assert_eq!(r.key(Dimension::Supplier), "Sup");
    }
}
