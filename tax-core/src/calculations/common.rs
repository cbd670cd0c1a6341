//! Shared building blocks for the calculators.
//!
//! Every progressive tax in this crate (income tax, National Insurance,
//! dividend tax, capital gains tax) goes through [`apportion`], so the
//! banding behaves identically everywhere.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Largest amount a calculator works with: £1,000,000,000,000,000.
///
/// Inputs above it are capped so that no intermediate sum or product can
/// overflow `Decimal`.
pub const MAX_AMOUNT: Decimal = dec!(1_000_000_000_000_000);

/// Rounds a decimal value to exactly two decimal places using half-up rounding.
///
/// Values at exactly 0.005 are rounded away from zero.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}

/// Returns the maximum of two decimal values.
pub fn max(
    a: Decimal,
    b: Decimal,
) -> Decimal {
    if a > b { a } else { b }
}

/// Floors a value at zero.
pub fn non_negative(value: Decimal) -> Decimal {
    max(value, Decimal::ZERO)
}

/// Floors an input amount at zero and caps it at [`MAX_AMOUNT`].
///
/// ```
/// use rust_decimal::Decimal;
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::{MAX_AMOUNT, input_amount};
///
/// assert_eq!(input_amount(dec!(-10)), dec!(0));
/// assert_eq!(input_amount(dec!(1234.5)), dec!(1234.5));
/// assert_eq!(input_amount(Decimal::MAX), MAX_AMOUNT);
/// ```
pub fn input_amount(value: Decimal) -> Decimal {
    non_negative(value).min(MAX_AMOUNT)
}

/// Tax divided by the gross amount it was charged on, or zero when there is
/// no gross amount.
pub fn effective_rate(
    tax: Decimal,
    gross: Decimal,
) -> Decimal {
    if gross <= Decimal::ZERO {
        Decimal::ZERO
    } else {
        tax / gross
    }
}

/// One tier of a progressive tax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Band {
    /// How much of the amount this band can absorb; `None` absorbs the rest.
    pub width: Option<Decimal>,
    pub rate: Decimal,
}

impl Band {
    pub fn capped(
        width: Decimal,
        rate: Decimal,
    ) -> Self {
        Self {
            width: Some(width),
            rate,
        }
    }

    pub fn open(rate: Decimal) -> Self {
        Self { width: None, rate }
    }
}

/// The part of an amount that fell into one band, and the tax on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandSlice {
    pub amount: Decimal,
    pub tax: Decimal,
}

/// Spreads `taxable` across `bands` in order.
///
/// Each band takes `min(remaining, width)` (negative widths count as zero)
/// and the remainder moves on to the next band. Anything left after a final
/// capped band is untaxed, so callers end their list with [`Band::open`].
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::calculations::common::{Band, apportion};
///
/// let [basic, higher] = apportion(
///     dec!(50000),
///     [Band::capped(dec!(37700), dec!(0.20)), Band::open(dec!(0.40))],
/// );
///
/// assert_eq!(basic.amount, dec!(37700));
/// assert_eq!(basic.tax, dec!(7540));
/// assert_eq!(higher.amount, dec!(12300));
/// assert_eq!(higher.tax, dec!(4920));
/// ```
pub fn apportion<const N: usize>(
    taxable: Decimal,
    bands: [Band; N],
) -> [BandSlice; N] {
    let mut remaining = non_negative(taxable);

    bands.map(|band| {
        let capacity = band.width.map_or(remaining, non_negative);
        let amount = remaining.min(capacity);
        remaining -= amount;
        BandSlice {
            amount,
            tax: amount * band.rate,
        }
    })
}

/// Sum of the tax across a set of band slices.
pub fn total_tax(slices: &[BandSlice]) -> Decimal {
    slices.iter().map(|slice| slice.tax).sum()
}
