//! Display formatting for calculator output.

use rust_decimal::Decimal;

use crate::calculations::common::round_half_up;

/// Formats an amount as pounds with thousands separators and two decimals.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::format::format_gbp;
///
/// assert_eq!(format_gbp(dec!(1234567.891)), "£1,234,567.89");
/// assert_eq!(format_gbp(dec!(7600)), "£7,600.00");
/// assert_eq!(format_gbp(dec!(-1832.225)), "-£1,832.23");
/// ```
pub fn format_gbp(value: Decimal) -> String {
    let rounded = round_half_up(value);
    let sign = if rounded < Decimal::ZERO { "-" } else { "" };
    let (whole, fraction) = two_places(rounded.abs());

    format!("{sign}£{}.{fraction}", group_thousands(&whole))
}

/// Formats a fractional rate as a percentage with two decimals.
///
/// ```
/// use rust_decimal_macros::dec;
/// use tax_core::format::format_rate;
///
/// assert_eq!(format_rate(dec!(0.19)), "19.00%");
/// assert_eq!(format_rate(dec!(0.2962525)), "29.63%");
/// ```
pub fn format_rate(rate: Decimal) -> String {
    let percent = round_half_up(rate * Decimal::ONE_HUNDRED);
    let sign = if percent < Decimal::ZERO { "-" } else { "" };
    let (whole, fraction) = two_places(percent.abs());

    format!("{sign}{whole}.{fraction}%")
}

/// Splits a non-negative, already rounded value into its whole part and a
/// two-digit fraction.
fn two_places(value: Decimal) -> (String, String) {
    let text = value.to_string();
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), ""));
    (whole.to_string(), format!("{fraction:0<2}"))
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn format_gbp_small_amounts() {
        assert_eq!(format_gbp(Decimal::ZERO), "£0.00");
        assert_eq!(format_gbp(dec!(0.5)), "£0.50");
        assert_eq!(format_gbp(dec!(999.999)), "£1,000.00");
    }

    #[test]
    fn format_gbp_groups_thousands() {
        assert_eq!(format_gbp(dec!(100000)), "£100,000.00");
        assert_eq!(format_gbp(dec!(12570)), "£12,570.00");
    }

    #[test]
    fn format_gbp_negative_rounding_to_zero_has_no_sign() {
        assert_eq!(format_gbp(dec!(-0.001)), "£0.00");
    }

    #[test]
    fn format_rate_whole_and_fractional() {
        assert_eq!(format_rate(Decimal::ZERO), "0.00%");
        assert_eq!(format_rate(dec!(0.0875)), "8.75%");
        assert_eq!(format_rate(dec!(1)), "100.00%");
    }

    #[test]
    fn group_thousands_boundaries() {
        assert_eq!(group_thousands("1"), "1");
        assert_eq!(group_thousands("123"), "123");
        assert_eq!(group_thousands("1234"), "1,234");
        assert_eq!(group_thousands("123456"), "123,456");
    }
}
