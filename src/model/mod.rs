//! Types that represent the core data model, such as `Record` and `Amount`.
mod amount;
mod column;
mod record;

pub use amount::{Amount, AmountError, AmountFormat};
pub(crate) use column::validate_headers;
pub use column::{Column, Dimension};
pub use record::Record;
