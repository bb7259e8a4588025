//! Monetary amount primitives
//!
//! Amounts travel as strings (or, from older payloads, as JSON numbers) and are
//! parsed into [`Decimal`] at the edge of every computation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Default tolerance used when comparing two monetary amounts (0.01)
pub const AMOUNT_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// An amount of a given asset, as exchanged with the Fee Engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MonetaryAmount {
    /// Asset or currency code (e.g. "BRL", "USD")
    pub asset: String,

    /// Decimal value encoded as a string
    pub value: String,
}

impl MonetaryAmount {
    pub fn new(asset: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            asset: asset.into(),
            value: value.into(),
        }
    }

    /// Build an amount from a decimal, normalizing trailing zeros away
    pub fn from_decimal(asset: impl Into<String>, value: Decimal) -> Self {
        Self::new(asset, value.normalize().to_string())
    }

    /// Parsed value, zero when the string is not a number
    pub fn decimal(&self) -> Decimal {
        parse_amount(&self.value)
    }
}

/// An operation amount in any of the shapes found in the wild
///
/// The Fee Engine sends `{ "asset": "...", "value": "..." }`, console forms send
/// a bare string and some legacy payloads carry a JSON number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum AmountValue {
    Monetary(MonetaryAmount),
    Text(String),
    Number(serde_json::Number),
}

impl AmountValue {
    /// Parsed decimal value, zero for anything unparseable
    pub fn decimal(&self) -> Decimal {
        match self {
            AmountValue::Monetary(m) => m.decimal(),
            AmountValue::Text(s) => parse_amount(s),
            AmountValue::Number(n) => parse_amount(&n.to_string()),
        }
    }

    /// Asset carried by the amount itself, if any
    pub fn asset(&self) -> Option<&str> {
        match self {
            AmountValue::Monetary(m) if !m.asset.is_empty() => Some(&m.asset),
            _ => None,
        }
    }

    /// The raw value as a string, without the asset
    pub fn raw_value(&self) -> String {
        match self {
            AmountValue::Monetary(m) => m.value.clone(),
            AmountValue::Text(s) => s.clone(),
            AmountValue::Number(n) => n.to_string(),
        }
    }
}

impl Default for AmountValue {
    fn default() -> Self {
        AmountValue::Text(String::new())
    }
}

impl From<Decimal> for AmountValue {
    fn from(value: Decimal) -> Self {
        AmountValue::Text(value.normalize().to_string())
    }
}

impl From<MonetaryAmount> for AmountValue {
    fn from(value: MonetaryAmount) -> Self {
        AmountValue::Monetary(value)
    }
}

impl From<&str> for AmountValue {
    fn from(value: &str) -> Self {
        AmountValue::Text(value.to_string())
    }
}

/// Parse a decimal string, degrading to zero on malformed input
///
/// Accepts plain and scientific notation. Surrounding whitespace is ignored.
pub fn parse_amount(raw: &str) -> Decimal {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Decimal::ZERO;
    }

    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .unwrap_or_else(|_| {
            tracing::debug!(value = %raw, "unparseable amount, treating as zero");
            Decimal::ZERO
        })
}

/// Round to two decimal places (banker's rounding is not wanted for display)
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}

/// Whether two amounts are equal within `tolerance`
///
/// Amounts too far apart to be subtracted are never equal.
pub fn within_tolerance(a: Decimal, b: Decimal, tolerance: Decimal) -> bool {
    a.checked_sub(b).is_some_and(|diff| diff.abs() <= tolerance)
}

/// Whether `received` falls short of `expected` by more than `tolerance`
pub fn falls_short(received: Decimal, expected: Decimal, tolerance: Decimal) -> bool {
    received < expected && !within_tolerance(received, expected, tolerance)
}

/// Sum of `values`, `None` when the total does not fit a [`Decimal`]
pub fn checked_sum(values: impl IntoIterator<Item = Decimal>) -> Option<Decimal> {
    values.into_iter().try_fold(Decimal::ZERO, Decimal::checked_add)
}

/// Sum of `values`, degrading to zero on overflow like [`parse_amount`]
pub fn sum_amounts(values: impl IntoIterator<Item = Decimal>) -> Decimal {
    checked_sum(values).unwrap_or_else(|| overflowed("sum"))
}

pub fn add_amounts(a: Decimal, b: Decimal) -> Decimal {
    a.checked_add(b).unwrap_or_else(|| overflowed("addition"))
}

pub fn sub_amounts(a: Decimal, b: Decimal) -> Decimal {
    a.checked_sub(b).unwrap_or_else(|| overflowed("subtraction"))
}

pub fn mul_amounts(a: Decimal, b: Decimal) -> Decimal {
    a.checked_mul(b).unwrap_or_else(|| overflowed("multiplication"))
}

fn overflowed(operation: &'static str) -> Decimal {
    tracing::debug!(operation, "amount overflow, treating as zero");
    Decimal::ZERO
}

/// Format an amount for receipts: two decimals, optionally prefixed by the asset
pub fn format_amount(value: Decimal, asset: &str) -> String {
    if asset.is_empty() {
        format!("{:.2}", round2(value))
    } else {
        format!("{} {:.2}", asset, round2(value))
    }
}
