//! spend-report: filter, aggregate and report procurement spend data.
//!
//! A spreadsheet of procurement line items (category, business area, supplier, invoice value) is
//! loaded once into an immutable [`Dataset`]. A [`Selection`] of categories and areas narrows it
//! to a view, and the [`aggregate`] functions turn that view into grouped totals, a
//! category × area pivot and a Herfindahl–Hirschman market-concentration score. The [`report`]
//! module assembles everything into a serializable render state which [`render`] turns into
//! terminal tables or JSON.

pub mod aggregate;
pub mod args;
pub mod commands;
mod config;
mod error;
pub mod export;
pub mod load;
pub mod model;
pub mod render;
pub mod report;
pub mod selection;
pub mod stats;
mod utils;

#[cfg(test)]
mod test;

pub use config::Config;
pub use error::Error;
pub use error::Result;
pub use load::{Dataset, DatasetCache};
pub use model::{Amount, Column, Dimension, Record};
pub use report::{Report, ReportState};
pub use selection::Selection;
