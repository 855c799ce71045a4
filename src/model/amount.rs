//! Amount type for handling monetary values with optional pound signs.
//!
//! This module provides the `Amount` type which wraps `Decimal` and handles parsing values that
//! may or may not include a pound sign and thousands separators, e.g. `£1,250.00` or `1250`.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::error::Error;
use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;

/// Represents how pound amounts were (or should be) formatted.
///
/// # Examples
///  - `AmountFormat{ pound: true, commas: true }` -> `£60,000.00`
///  - `AmountFormat{ pound: false, commas: true }` -> `60,000.00`
///  - `AmountFormat{ pound: false, commas: false }` -> `60000`
///  - `AmountFormat{ pound: true, commas: false }` -> `£60000`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AmountFormat {
    /// Whether a pound sign is present in the formatting.
    pound: bool,
    /// Whether commas are present as thousands separators in the formatting.
    commas: bool,
}

impl AmountFormat {
    /// No currency symbol and no separators, the numeric value exactly as stored. This is the
    /// format used when writing CSV exports.
    pub const PLAIN: AmountFormat = AmountFormat {
        pound: false,
        commas: false,
    };
}

impl Default for AmountFormat {
    fn default() -> Self {
        DEFAULT_FORMAT
    }
}

/// The default format has a pound sign and commas: e.g. `£60,000.00`.
const DEFAULT_FORMAT: AmountFormat = AmountFormat {
    pound: true,
    commas: true,
};

/// Represents an amount of money in pounds sterling.
///
/// Formatting is considered significant for the purposes of equality, so for numeric comparisons,
/// you should access the `Decimal` value and use that.
///
/// # Examples
///
/// ```
/// # use spend_report::model::Amount;
/// # use std::str::FromStr;
/// let a = Amount::from_str("5000.00").unwrap();
/// let b = Amount::from_str("£5,000.00").unwrap();
/// assert_ne!(a, b);
/// assert_eq!(a.value(), b.value());
/// assert_eq!(b.to_string(), "£5,000.00");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount {
    /// The parsed numerical value.
    value: Decimal,
    /// The way the numerical value was parsed from, or should be written to, a `String`.
    format: AmountFormat,
}

impl Amount {
    /// Creates a new Amount from a Decimal value with default `String` formatting.
    pub const fn new(value: Decimal) -> Self {
        Self {
            value,
            format: DEFAULT_FORMAT,
        }
    }

    /// Creates a new Amount from a Decimal value with the specified formatting.
    pub const fn new_with_format(value: Decimal, format: AmountFormat) -> Self {
        Self { value, format }
    }

    /// Returns the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.value
    }

    /// Returns the same value rendered without a pound sign or separators.
    pub fn plain(&self) -> Amount {
        Self::new_with_format(self.value, AmountFormat::PLAIN)
    }

    /// The value as a float, for ratio arithmetic.
    pub fn to_f64(&self) -> f64 {
        self.value.to_f64().unwrap_or_default()
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.value().is_zero()
    }

    /// Returns true if the amount is negative.
    pub fn is_negative(&self) -> bool {
        self.value().is_sign_negative() && !self.is_zero()
    }
}

/// An error that can occur when parsing strings into `Decimal` values.
pub struct AmountError(rust_decimal::Error);

impl Debug for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.0, f)
    }
}

impl Display for AmountError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl std::error::Error for AmountError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut pound_sign = false;

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Amount::default());
        }

        // "-£50.00", "£50.00" or "50.00"
        let without_pound = if let Some(after_minus) = trimmed.strip_prefix('-') {
            if let Some(after_pound) = after_minus.strip_prefix('£') {
                pound_sign = true;
                format!("-{after_pound}")
            } else {
                trimmed.to_string()
            }
        } else if let Some(after_pound) = trimmed.strip_prefix('£') {
            pound_sign = true;
            after_pound.to_string()
        } else {
            trimmed.to_string()
        };

        let without_commas = without_pound.replace(',', "");
        let commas = without_commas.len() < without_pound.len();

        // Spreadsheet exports sometimes carry floats in exponent form, e.g. "1.5e3".
        let value = match Decimal::from_str(&without_commas) {
            Ok(value) => value,
            Err(e) => Decimal::from_scientific(&without_commas).map_err(|_| AmountError(e))?,
        };
        Ok(Amount {
            value,
            format: AmountFormat {
                pound: pound_sign,
                commas,
            },
        })
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (sign, num) = if self.is_negative() {
            ("-", self.value().abs())
        } else {
            ("", self.value())
        };

        let pound = if self.format.pound { "£" } else { "" };

        if self.format.commas {
            write!(
                f,
                "{sign}{pound}{}",
                format_num::format_num!(",.2", num.to_f64().unwrap_or_default())
            )
        } else {
            write!(f, "{sign}{pound}{num}")
        }
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Amount::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.value()
    }
}
