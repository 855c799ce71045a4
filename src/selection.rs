//! Selection controls: which categories and areas the report covers.
//!
//! Each dimension is driven by a [`FilterMode`] that offers a list of labels and a default pick
//! from it. An explicit pick narrows the offered list further, the way a multi-select list would.

use crate::aggregate::{self, top_n, View};
use crate::load::Dataset;
use crate::model::Dimension;
use crate::Result;
use anyhow::ensure;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Smallest allowed top-N.
pub const TOP_N_MIN: usize = 5;
/// Largest allowed top-N.
pub const TOP_N_MAX: usize = 15;
pub const DEFAULT_CATEGORY_TOP_N: usize = 10;
pub const DEFAULT_AREA_TOP_N: usize = 8;

/// Search matches up to this many are all picked by default, otherwise only the first
/// `SEARCH_DEFAULT_PICK` are.
const SEARCH_PICK_ALL_UP_TO: usize = 5;
const SEARCH_DEFAULT_PICK: usize = 3;

/// How the labels of one dimension are offered.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum FilterMode {
    /// The `n` labels with the largest total spend over the whole dataset.
    Top { n: usize },
    /// Labels containing `text`, case-insensitively.
    Search { text: String },
    /// Every label.
    All,
}

impl FilterMode {
    /// The labels this mode offers, largest first for `Top`, in order of first appearance
    /// otherwise.
    pub fn options(&self, dataset: &Dataset, dimension: Dimension) -> Result<Vec<String>> {
        Ok(match self {
            FilterMode::Top { n } => {
                ensure!(
                    (TOP_N_MIN..=TOP_N_MAX).contains(n),
                    "The number of top {dimension} labels must be between {TOP_N_MIN} and \
                    {TOP_N_MAX}, got {n}"
                );
                let totals = aggregate::sum_by(&View::all(dataset), dimension);
                top_n(&totals, *n).into_iter().map(|(label, _)| label).collect()
            }
            FilterMode::Search { text } => {
                let needle = text.to_lowercase();
                dataset
                    .distinct(dimension)
                    .into_iter()
                    .filter(|label| label.to_lowercase().contains(&needle))
                    .map(str::to_string)
                    .collect()
            }
            FilterMode::All => dataset
                .distinct(dimension)
                .into_iter()
                .map(str::to_string)
                .collect(),
        })
    }

    /// What is picked from `options` when the user has not picked anything.
    pub fn default_pick(&self, options: &[String]) -> Vec<String> {
        match self {
            FilterMode::Search { .. } if options.len() > SEARCH_PICK_ALL_UP_TO => {
                options[..SEARCH_DEFAULT_PICK].to_vec()
            }
            _ => options.to_vec(),
        }
    }
}

/// The control state for one dimension: a mode and an optional explicit pick.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct DimensionFilter {
    mode: FilterMode,
    pick: Option<Vec<String>>,
}

impl DimensionFilter {
    pub fn new(mode: FilterMode) -> Self {
        Self { mode, pick: None }
    }

    /// Replaces the mode's default pick. Labels the mode does not offer are ignored.
    pub fn with_pick(mut self, pick: Vec<String>) -> Self {
        self.pick = Some(pick);
        self
    }

    pub fn mode(&self) -> &FilterMode {
        &self.mode
    }

    /// Resolves the control state against the dataset into the selected labels.
    pub fn resolve(&self, dataset: &Dataset, dimension: Dimension) -> Result<BTreeSet<String>> {
        let options = self.mode.options(dataset, dimension)?;
        let picked = match &self.pick {
            None => self.mode.default_pick(&options),
            Some(pick) => {
                let (offered, ignored): (Vec<String>, Vec<String>) =
                    pick.iter().cloned().partition(|label| options.contains(label));
                if !ignored.is_empty() {
                    warn!(
                        "Ignoring {dimension} labels not offered by the current filter: {}",
                        ignored.join(", ")
                    );
                }
                offered
            }
        };
        debug!("Selected {} of {} {dimension} labels", picked.len(), options.len());
        Ok(picked.into_iter().collect())
    }
}

/// The allowed categories and areas.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Selection {
    categories: BTreeSet<String>,
    areas: BTreeSet<String>,
}

impl Selection {
    pub fn new<S1, S2>(
        categories: impl IntoIterator<Item = S1>,
        areas: impl IntoIterator<Item = S2>,
    ) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        Self {
            categories: categories.into_iter().map(Into::into).collect(),
            areas: areas.into_iter().map(Into::into).collect(),
        }
    }

    /// Everything in the dataset.
    pub fn all(dataset: &Dataset) -> Self {
        Self::new(
            dataset.distinct(Dimension::Category),
            dataset.distinct(Dimension::Area),
        )
    }

    /// Builds the selection from the two dimension controls.
    pub fn resolve(
        dataset: &Dataset,
        categories: &DimensionFilter,
        areas: &DimensionFilter,
    ) -> Result<Self> {
        Ok(Self {
            categories: categories.resolve(dataset, Dimension::Category)?,
            areas: areas.resolve(dataset, Dimension::Area)?,
        })
    }

    /// The selection a fresh session starts with: top-N in both dimensions.
    pub fn reset(dataset: &Dataset, category_top_n: usize, area_top_n: usize) -> Result<Self> {
        Self::resolve(
            dataset,
            &DimensionFilter::new(FilterMode::Top { n: category_top_n }),
            &DimensionFilter::new(FilterMode::Top { n: area_top_n }),
        )
    }

    pub fn categories(&self) -> &BTreeSet<String> {
        &self.categories
    }

    pub fn areas(&self) -> &BTreeSet<String> {
        &self.areas
    }

    /// The records of `dataset` this selection allows.
    pub fn apply<'a>(&self, dataset: &'a Dataset) -> View<'a> {
        aggregate::filter(dataset, &self.categories, &self.areas)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Amount, Record};

    /// Twelve categories with spend 1..=12 and two areas.
    fn wide_dataset() -> Dataset {
        let mut records = Vec::new();
        for i in 1..=12 {
            let area = if i % 2 == 0 { "Even Area" } else { "Odd Area" };
            records.push(Record::new(
                format!("Category {i:02}"),
                area,
                "Supplier",
                Some(Amount::from(rust_decimal::Decimal::from(i))),
            ));
        }
        Dataset::new(records)
    }

    fn strings(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_top_mode_picks_largest() {
        let dataset = wide_dataset();
        let options = FilterMode::Top { n: 5 }
            .options(&dataset, Dimension::Category)
            .unwrap();
        assert_eq!(
            options,
            strings(&[
                "Category 12",
                "Category 11",
                "Category 10",
                "Category 09",
                "Category 08"
            ])
        );
    }

    #[test]
    fn test_top_mode_bounds() {
        let dataset = wide_dataset();
        assert!(FilterMode::Top { n: 4 }
            .options(&dataset, Dimension::Category)
            .is_err());
        assert!(FilterMode::Top { n: 16 }
            .options(&dataset, Dimension::Category)
            .is_err());
        // Asking for more than exist returns what exists.
        let areas = FilterMode::Top { n: 15 }
            .options(&dataset, Dimension::Area)
            .unwrap();
        assert_eq!(areas, strings(&["Even Area", "Odd Area"]));
    }

    #[test]
    fn test_search_mode_default_pick() {
        let dataset = wide_dataset();
        let many = FilterMode::Search { text: "category 1".into() };
        let options = many.options(&dataset, Dimension::Category).unwrap();
        assert_eq!(options, strings(&["Category 10", "Category 11", "Category 12"]));
        assert_eq!(many.default_pick(&options).len(), 3);

        let broad = FilterMode::Search { text: "CATEGORY".into() };
        let options = broad.options(&dataset, Dimension::Category).unwrap();
        assert_eq!(options.len(), 12);
        assert_eq!(
            broad.default_pick(&options),
            strings(&["Category 01", "Category 02", "Category 03"])
        );

        let none = FilterMode::Search { text: "zzz".into() };
        assert!(none.options(&dataset, Dimension::Category).unwrap().is_empty());
    }

    #[test]
    fn test_search_mode_picks_all_up_to_five() {
        let dataset = wide_dataset();
        let mode = FilterMode::Search { text: "area".into() };
        let options = mode.options(&dataset, Dimension::Area).unwrap();
        assert_eq!(mode.default_pick(&options), options);
    }

    #[test]
    fn test_explicit_pick_ignores_unknown() {
        let dataset = wide_dataset();
        let filter = DimensionFilter::new(FilterMode::All)
            .with_pick(strings(&["Category 03", "Nope"]));
        let picked = filter.resolve(&dataset, Dimension::Category).unwrap();
        assert_eq!(picked.into_iter().collect::<Vec<_>>(), strings(&["Category 03"]));
    }

    #[test]
    fn test_reset_uses_top_n() {
        let dataset = wide_dataset();
        let selection = Selection::reset(&dataset, 10, 8).unwrap();
        assert_eq!(selection.categories().len(), 10);
        assert!(!selection.categories().contains("Category 01"));
        assert_eq!(selection.areas().len(), 2);
        assert_eq!(selection.apply(&dataset).len(), 10);
    }

    #[test]
    fn test_all_selects_everything() {
        let dataset = wide_dataset();
        let selection = Selection::all(&dataset);
        assert_eq!(selection.apply(&dataset).len(), dataset.len());
    }
}
