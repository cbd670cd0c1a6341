//! Dividend tax.
//!
//! Dividends sit on top of other income: whatever personal allowance and
//! rate bands the other income has not used are available to the dividend,
//! after the tax-free dividend allowance.
//!
//! `taxable_dividends` is reported as the dividend less the dividend
//! allowance. The amount actually spread across the bands is
//! `dividends_after_allowances`, which is further reduced by any unused
//! personal allowance. Both are returned so callers can see the difference.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::TaxYearConstants;
use crate::calculations::common::{
    Band, apportion, effective_rate, input_amount, max, non_negative, total_tax,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DividendTaxInput {
    pub dividend_amount: Decimal,
    pub other_income: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DividendTaxResult {
    /// Dividend less the dividend allowance (floored at zero).
    pub taxable_dividends: Decimal,

    /// Dividend less the dividend allowance and any unused personal allowance.
    pub dividends_after_allowances: Decimal,

    pub basic_rate_tax: Decimal,
    pub higher_rate_tax: Decimal,
    pub additional_rate_tax: Decimal,
    pub total_tax: Decimal,
    pub effective_rate: Decimal,
    pub net_dividend: Decimal,
}

#[derive(Debug, Clone)]
pub struct DividendTax<'a> {
    constants: &'a TaxYearConstants,
}

impl<'a> DividendTax<'a> {
    pub fn new(constants: &'a TaxYearConstants) -> Self {
        Self { constants }
    }

    /// # Example
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use tax_core::TaxYearConstants;
    /// use tax_core::calculations::{DividendTax, DividendTaxInput};
    ///
    /// let constants = TaxYearConstants::default();
    /// let result = DividendTax::new(&constants).calculate(&DividendTaxInput {
    ///     dividend_amount: dec!(5000),
    ///     other_income: dec!(0),
    /// });
    ///
    /// assert_eq!(result.total_tax, dec!(0));
    /// assert_eq!(result.net_dividend, dec!(5000));
    /// ```
    pub fn calculate(
        &self,
        input: &DividendTaxInput,
    ) -> DividendTaxResult {
        let c = self.constants;
        let dividend = input_amount(input.dividend_amount);
        let other_income = input_amount(input.other_income);

        let remaining_allowance = non_negative(c.personal_allowance - other_income);
        let remaining_basic =
            non_negative(c.basic_rate_threshold - max(other_income, c.personal_allowance));
        let remaining_higher =
            non_negative(c.higher_rate_threshold - max(other_income, c.basic_rate_threshold));

        let taxable_dividends = non_negative(dividend - c.dividend_allowance);
        let dividends_after_allowances = non_negative(taxable_dividends - remaining_allowance);

        let bands = apportion(
            dividends_after_allowances,
            [
                Band::capped(remaining_basic, c.dividend_basic_rate),
                Band::capped(remaining_higher, c.dividend_higher_rate),
                Band::open(c.dividend_additional_rate),
            ],
        );
        let total = total_tax(&bands);
        let [basic, higher, additional] = bands;

        DividendTaxResult {
            taxable_dividends,
            dividends_after_allowances,
            basic_rate_tax: basic.tax,
            higher_rate_tax: higher.tax,
            additional_rate_tax: additional.tax,
            total_tax: total,
            effective_rate: effective_rate(total, dividend),
            net_dividend: dividend - total,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn calculate(
        dividend_amount: Decimal,
        other_income: Decimal,
    ) -> DividendTaxResult {
        let constants = TaxYearConstants::default();
        DividendTax::new(&constants).calculate(&DividendTaxInput {
            dividend_amount,
            other_income,
        })
    }

    #[test]
    fn personal_allowance_absorbs_small_dividend() {
        let result = calculate(dec!(5000), dec!(0));

        assert_eq!(result.taxable_dividends, dec!(4000));
        assert_eq!(result.dividends_after_allowances, Decimal::ZERO);
        assert_eq!(result.total_tax, Decimal::ZERO);
        assert_eq!(result.net_dividend, dec!(5000));
        assert_eq!(result.effective_rate, Decimal::ZERO);
    }

    #[test]
    fn dividend_below_allowance_reports_zero_taxable() {
        let result = calculate(dec!(600), dec!(0));

        assert_eq!(result.taxable_dividends, Decimal::ZERO);
        assert_eq!(result.total_tax, Decimal::ZERO);
    }

    #[test]
    fn large_dividend_without_other_income_spans_two_bands() {
        let result = calculate(dec!(60000), dec!(0));

        assert_eq!(result.taxable_dividends, dec!(59000));
        assert_eq!(result.dividends_after_allowances, dec!(46430));
        // 37700 × 8.75%
        assert_eq!(result.basic_rate_tax, dec!(3298.75));
        // 8730 × 33.75%
        assert_eq!(result.higher_rate_tax, dec!(2946.375));
        assert_eq!(result.total_tax, dec!(6245.125));
        assert_eq!(result.net_dividend, dec!(53754.875));
    }

    #[test]
    fn other_income_uses_up_allowance_and_basic_band() {
        let result = calculate(dec!(10000), dec!(45000));

        // 9000 taxable; 5270 of basic band left, then higher rate
        assert_eq!(result.dividends_after_allowances, dec!(9000));
        assert_eq!(result.basic_rate_tax, dec!(5270) * dec!(0.0875));
        assert_eq!(result.higher_rate_tax, dec!(3730) * dec!(0.3375));
    }

    #[test]
    fn additional_rate_taxpayer_pays_top_rate() {
        let result = calculate(dec!(11000), dec!(150000));

        assert_eq!(result.basic_rate_tax, Decimal::ZERO);
        assert_eq!(result.higher_rate_tax, Decimal::ZERO);
        assert_eq!(result.additional_rate_tax, dec!(10000) * dec!(0.3935));
    }

    #[test]
    fn zero_dividend_is_untaxed() {
        let result = calculate(Decimal::ZERO, dec!(30000));

        assert_eq!(result.total_tax, Decimal::ZERO);
        assert_eq!(result.net_dividend, Decimal::ZERO);
        assert_eq!(result.effective_rate, Decimal::ZERO);
    }
}
