//! Corporation tax with marginal relief.
//!
//! The small-profits threshold is scaled by the length of the accounting
//! period and shared between associated companies. Profits at or below the
//! scaled threshold pay the small-profits rate, profits at or above the upper
//! limit pay the main rate, and anything between pays a rate interpolated
//! linearly between the two.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::TaxYearConstants;
use crate::calculations::common::input_amount;

const MONTHS_IN_YEAR: u32 = 12;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorporationTaxInput {
    pub profits: Decimal,
    pub associated_companies: u32,

    /// Length of the accounting period, 1–12. Values outside that range are
    /// clamped.
    pub accounting_period_months: u32,
}

impl CorporationTaxInput {
    /// A twelve-month period with no associated companies.
    pub fn new(profits: Decimal) -> Self {
        Self {
            profits,
            associated_companies: 0,
            accounting_period_months: MONTHS_IN_YEAR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorporationTaxResult {
    pub taxable_profit: Decimal,

    /// Small-profits threshold after period and associate adjustments.
    pub adjusted_threshold: Decimal,

    pub rate_used: Decimal,
    pub marginal_relief_applied: bool,
    pub tax: Decimal,
    pub profit_after_tax: Decimal,
    pub effective_rate: Decimal,
}

#[derive(Debug, Clone)]
pub struct CorporationTax<'a> {
    constants: &'a TaxYearConstants,
}

impl<'a> CorporationTax<'a> {
    pub fn new(constants: &'a TaxYearConstants) -> Self {
        Self { constants }
    }

    /// # Example
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use tax_core::TaxYearConstants;
    /// use tax_core::calculations::{CorporationTax, CorporationTaxInput};
    ///
    /// let constants = TaxYearConstants::default();
    /// let result = CorporationTax::new(&constants).calculate(&CorporationTaxInput::new(dec!(150000)));
    ///
    /// assert_eq!(result.rate_used, dec!(0.22));
    /// assert_eq!(result.tax, dec!(33000));
    /// assert!(result.marginal_relief_applied);
    /// ```
    pub fn calculate(
        &self,
        input: &CorporationTaxInput,
    ) -> CorporationTaxResult {
        let taxable_profit = input_amount(input.profits);
        let adjusted_threshold =
            self.adjusted_threshold(input.associated_companies, input.accounting_period_months);

        let (rate_used, marginal_relief_applied) = self.rate(taxable_profit, adjusted_threshold);
        let tax = taxable_profit * rate_used;

        CorporationTaxResult {
            taxable_profit,
            adjusted_threshold,
            rate_used,
            marginal_relief_applied,
            tax,
            profit_after_tax: taxable_profit - tax,
            effective_rate: if taxable_profit > Decimal::ZERO {
                rate_used
            } else {
                Decimal::ZERO
            },
        }
    }

    fn adjusted_threshold(
        &self,
        associated_companies: u32,
        accounting_period_months: u32,
    ) -> Decimal {
        let months = accounting_period_months.clamp(1, MONTHS_IN_YEAR);
        if months != accounting_period_months {
            warn!(
                requested = accounting_period_months,
                used = months,
                "accounting period clamped to 1-12 months"
            );
        }

        let period_share = Decimal::from(months) / Decimal::from(MONTHS_IN_YEAR);
        let companies = Decimal::from(associated_companies) + Decimal::ONE;

        self.constants.corporation_small_profits_threshold * period_share / companies
    }

    /// Returns the rate for `profits` and whether marginal relief produced it.
    fn rate(
        &self,
        profits: Decimal,
        adjusted_threshold: Decimal,
    ) -> (Decimal, bool) {
        let main_rate = self.constants.corporation_main_rate;
        let small_rate = self.constants.corporation_small_profits_rate;
        let upper_limit = self.constants.corporation_upper_limit;

        if profits <= adjusted_threshold {
            return (small_rate, false);
        }
        if profits >= upper_limit {
            return (main_rate, false);
        }

        // profits lies strictly between the two limits, so the span is positive
        let fraction = (upper_limit - profits) / (upper_limit - adjusted_threshold);
        (main_rate - fraction * (main_rate - small_rate), true)
    }
}
