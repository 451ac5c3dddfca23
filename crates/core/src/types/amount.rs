//! Loosely typed monetary and measurement values.
//!
//! The backend stores prices, costs and package measurements as whatever
//! the last writer sent: JSON numbers, numeric strings, empty strings or
//! `null`. [`RawAmount`] keeps the wire value untouched and exposes explicit
//! numeric parsing, so arithmetic never sees a non-number.

use core::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A number-or-string value as sent by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    /// A JSON number.
    Number(serde_json::Number),
    /// A JSON string, possibly empty or non-numeric.
    Text(String),
}

impl RawAmount {
    /// Parse the value as a decimal.
    ///
    /// Returns `None` for empty or non-numeric text.
    #[must_use]
    pub fn to_decimal(&self) -> Option<Decimal> {
        match self {
            Self::Number(n) => parse_decimal(&n.to_string()),
            Self::Text(s) => parse_decimal(s.trim()),
        }
    }

    /// Parse the value and drop its fractional part.
    ///
    /// Costs and shipping prices are booked in whole rupees.
    #[must_use]
    pub fn whole_units(&self) -> Option<Decimal> {
        self.to_decimal().map(|d| d.trunc())
    }

    /// Whether the value counts as "set".
    ///
    /// Zero and the empty string are treated as unset, which is how the
    /// console decides that a shipping price still has to be synced or that
    /// a cost has not been entered yet.
    #[must_use]
    pub fn is_set(&self) -> bool {
        match self {
            Self::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
            Self::Text(s) => !s.trim().is_empty(),
        }
    }
}

/// Parse an optional amount, coercing absent or non-numeric values to zero.
#[must_use]
pub fn amount_or_zero(amount: Option<&RawAmount>) -> Decimal {
    amount.and_then(RawAmount::to_decimal).unwrap_or(Decimal::ZERO)
}

/// Parse an optional amount in whole units, coercing absent or non-numeric
/// values to zero.
#[must_use]
pub fn whole_units_or_zero(amount: Option<&RawAmount>) -> Decimal {
    amount.and_then(RawAmount::whole_units).unwrap_or(Decimal::ZERO)
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

impl fmt::Display for RawAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RawAmount {
    fn from(value: i64) -> Self {
        Self::Number(value.into())
    }
}

impl From<&str> for RawAmount {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<Decimal> for RawAmount {
    fn from(value: Decimal) -> Self {
        Self::Text(value.normalize().to_string())
    }
}
