//! Parsing and validation of user-entered figures.
//!
//! The calculators accept any non-negative number (capping anything above
//! [`MAX_AMOUNT`]); rejecting negative, oversized or non-numeric input is the
//! caller's job, and this module is how callers do it.

use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;

use crate::calculations::common::MAX_AMOUNT;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field}: '{input}' is not a number")]
    InvalidNumber { field: String, input: String },

    #[error("{field} must not be negative, got {value}")]
    Negative { field: String, value: Decimal },

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: String,
        value: Decimal,
        min: Decimal,
        max: Decimal,
    },
}

fn number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^-?(\d+|\d{1,3}(,\d{3})+)(\.\d+)?$").expect("number pattern is valid")
    })
}

/// Strips a leading `£`, surrounding whitespace and a trailing `%`.
fn normalize(raw: &str) -> String {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_suffix('%').unwrap_or(trimmed).trim_end();
    let (sign, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => ("-", rest.trim_start()),
        None => ("", trimmed),
    };
    let rest = rest.strip_prefix('£').unwrap_or(rest).trim_start();
    format!("{sign}{rest}")
}

/// Parses a monetary amount.
///
/// Accepts an optional `£`, comma thousands separators and surrounding
/// whitespace. Empty input is zero; amounts above
/// [`MAX_AMOUNT`] are [`ValidationError::OutOfRange`].
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::input::{ValidationError, parse_amount};
///
/// assert_eq!(parse_amount("income", "£45,000.50"), Ok(dec!(45000.50)));
/// assert_eq!(parse_amount("income", ""), Ok(dec!(0)));
/// assert!(matches!(parse_amount("income", "-5"), Err(ValidationError::Negative { .. })));
/// ```
pub fn parse_amount(
    field: &str,
    raw: &str,
) -> Result<Decimal, ValidationError> {
    let normalized = normalize(raw);
    if normalized.is_empty() {
        return Ok(Decimal::ZERO);
    }

    let invalid = || ValidationError::InvalidNumber {
        field: field.to_string(),
        input: raw.to_string(),
    };

    if !number_pattern().is_match(&normalized) {
        debug!(field, input = raw, "rejected non-numeric input");
        return Err(invalid());
    }

    let value: Decimal = normalized.replace(',', "").parse().map_err(|_| invalid())?;
    if value < Decimal::ZERO {
        return Err(ValidationError::Negative {
            field: field.to_string(),
            value,
        });
    }
    if value > MAX_AMOUNT {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            value,
            min: Decimal::ZERO,
            max: MAX_AMOUNT,
        });
    }

    Ok(value)
}

/// Parses a percentage such as `"20"` or `"17.5%"`.
pub fn parse_percentage(
    field: &str,
    raw: &str,
) -> Result<Decimal, ValidationError> {
    parse_amount(field, raw)
}

/// Parses a whole number within `min..=max`.
pub fn parse_bounded(
    field: &str,
    raw: &str,
    min: u32,
    max: u32,
) -> Result<u32, ValidationError> {
    let value = parse_amount(field, raw)?;
    let out_of_range = || ValidationError::OutOfRange {
        field: field.to_string(),
        value,
        min: Decimal::from(min),
        max: Decimal::from(max),
    };

    if !value.fract().is_zero() {
        return Err(ValidationError::InvalidNumber {
            field: field.to_string(),
            input: raw.to_string(),
        });
    }
    if value < Decimal::from(min) || value > Decimal::from(max) {
        return Err(out_of_range());
    }

    u32::try_from(value).map_err(|_| out_of_range())
}

/// Parses an accounting period length in months (1–12).
pub fn parse_months(raw: &str) -> Result<u32, ValidationError> {
    parse_bounded("accounting period months", raw, 1, 12)
}
