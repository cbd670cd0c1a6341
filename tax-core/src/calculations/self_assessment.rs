//! Self-assessment income tax and Class 4 National Insurance.
//!
//! | Step | Description |
//! |------|-------------|
//! | 1    | Adjusted income = income − expenses − pension contributions (min 0) |
//! | 2    | Personal allowance, tapered by £1 for every £2 of adjusted income above £100,000 |
//! | 3    | Taxable income = adjusted income − allowance (min 0) |
//! | 4    | Basic / higher / additional rate bands |
//! | 5    | National Insurance on adjusted income above the primary threshold |
//! | 6    | Take-home = adjusted income − income tax − NI |
//!
//! The taper is measured on adjusted income, not gross income, so expenses
//! and pension contributions can restore the allowance as they do on a
//! return.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::TaxYearConstants;
//! use tax_core::calculations::{SelfAssessment, SelfAssessmentInput};
//!
//! let constants = TaxYearConstants::default();
//! let result = SelfAssessment::new(&constants).calculate(&SelfAssessmentInput {
//!     income: dec!(50000),
//!     expenses: dec!(5000),
//!     pension_contributions: dec!(0),
//! });
//!
//! assert_eq!(result.taxable_income, dec!(32430));
//! assert_eq!(result.income_tax, dec!(6486));
//! assert_eq!(result.national_insurance, dec!(2594.40));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::TaxYearConstants;
use crate::calculations::common::{apportion, effective_rate, input_amount, non_negative, total_tax};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfAssessmentInput {
    pub income: Decimal,
    pub expenses: Decimal,
    pub pension_contributions: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfAssessmentResult {
    /// Income after expenses and pension contributions.
    pub adjusted_income: Decimal,

    /// Personal allowance after the high-income taper.
    pub allowance_used: Decimal,

    pub taxable_income: Decimal,
    pub basic_rate_tax: Decimal,
    pub higher_rate_tax: Decimal,
    pub additional_rate_tax: Decimal,
    pub income_tax: Decimal,
    pub national_insurance: Decimal,

    /// Income tax plus National Insurance.
    pub total_tax: Decimal,

    /// `total_tax / adjusted_income`, zero when there is no adjusted income.
    pub effective_rate: Decimal,

    pub take_home: Decimal,
}

/// Self-assessment calculator bound to one tax year's constants.
#[derive(Debug, Clone)]
pub struct SelfAssessment<'a> {
    constants: &'a TaxYearConstants,
}

impl<'a> SelfAssessment<'a> {
    pub fn new(constants: &'a TaxYearConstants) -> Self {
        Self { constants }
    }

    pub fn calculate(
        &self,
        input: &SelfAssessmentInput,
    ) -> SelfAssessmentResult {
        let adjusted_income = self.adjusted_income(input);
        let allowance_used = self.tapered_allowance(adjusted_income);
        let taxable_income = non_negative(adjusted_income - allowance_used);

        let bands = apportion(taxable_income, self.constants.income_tax_bands());
        let income_tax = total_tax(&bands);
        let [basic, higher, additional] = bands;

        let national_insurance = self.national_insurance(adjusted_income);
        let total = income_tax + national_insurance;

        SelfAssessmentResult {
            adjusted_income,
            allowance_used,
            taxable_income,
            basic_rate_tax: basic.tax,
            higher_rate_tax: higher.tax,
            additional_rate_tax: additional.tax,
            income_tax,
            national_insurance,
            total_tax: total,
            effective_rate: effective_rate(total, adjusted_income),
            take_home: adjusted_income - total,
        }
    }

    fn adjusted_income(
        &self,
        input: &SelfAssessmentInput,
    ) -> Decimal {
        non_negative(
            input_amount(input.income)
                - input_amount(input.expenses)
                - input_amount(input.pension_contributions),
        )
    }

    /// Reduces the allowance by half of the adjusted income above the taper
    /// threshold, down to zero.
    fn tapered_allowance(
        &self,
        adjusted_income: Decimal,
    ) -> Decimal {
        let allowance = self.constants.personal_allowance;
        let threshold = self.constants.allowance_taper_threshold;

        if adjusted_income <= threshold {
            return allowance;
        }

        let reduction = ((adjusted_income - threshold) / Decimal::TWO).min(allowance);
        allowance - reduction
    }

    fn national_insurance(
        &self,
        adjusted_income: Decimal,
    ) -> Decimal {
        let liable = non_negative(adjusted_income - self.constants.ni_primary_threshold);
        total_tax(&apportion(liable, self.constants.national_insurance_bands()))
    }
}
