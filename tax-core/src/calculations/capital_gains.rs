//! Capital gains tax on a single disposal.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::TaxYearConstants;
//! use tax_core::calculations::{CapitalGainsTax, CapitalGainsTaxInput};
//!
//! let constants = TaxYearConstants::default();
//! let result = CapitalGainsTax::new(&constants).calculate(&CapitalGainsTaxInput {
//!     acquisition_price: dec!(10000),
//!     disposal_price: dec!(12500),
//!     acquisition_costs: dec!(300),
//!     disposal_costs: dec!(200),
//!     annual_income: dec!(40000),
//!     is_residential_property: false,
//! });
//!
//! assert_eq!(result.gain, dec!(2000));
//! assert_eq!(result.total_cgt, dec!(0));
//! assert_eq!(result.net_proceeds, dec!(12300));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::TaxYearConstants;
use crate::calculations::common::{Band, apportion, effective_rate, input_amount, non_negative};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapitalGainsTaxInput {
    pub acquisition_price: Decimal,
    pub disposal_price: Decimal,
    pub acquisition_costs: Decimal,
    pub disposal_costs: Decimal,

    /// Other income for the year, used to find how much basic-rate band is left.
    pub annual_income: Decimal,

    pub is_residential_property: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapitalGainsTaxResult {
    pub gain: Decimal,

    /// Gain less the annual exempt amount.
    pub taxable_gain: Decimal,

    pub basic_rate: Decimal,
    pub higher_rate: Decimal,
    pub basic_rate_gain: Decimal,
    pub higher_rate_gain: Decimal,
    pub basic_rate_tax: Decimal,
    pub higher_rate_tax: Decimal,
    pub total_cgt: Decimal,

    /// `total_cgt / gain`.
    pub effective_rate: Decimal,

    /// Disposal price less disposal costs and CGT.
    pub net_proceeds: Decimal,
}

#[derive(Debug, Clone)]
pub struct CapitalGainsTax<'a> {
    constants: &'a TaxYearConstants,
}

impl<'a> CapitalGainsTax<'a> {
    pub fn new(constants: &'a TaxYearConstants) -> Self {
        Self { constants }
    }

    pub fn calculate(
        &self,
        input: &CapitalGainsTaxInput,
    ) -> CapitalGainsTaxResult {
        let c = self.constants;
        let disposal_price = input_amount(input.disposal_price);
        let disposal_costs = input_amount(input.disposal_costs);

        let gain = non_negative(
            disposal_price
                - input_amount(input.acquisition_price)
                - input_amount(input.acquisition_costs)
                - disposal_costs,
        );
        let taxable_gain = non_negative(gain - c.cgt_annual_allowance);
        let (basic_rate, higher_rate) = self.rates(input.is_residential_property);

        if taxable_gain.is_zero() {
            return CapitalGainsTaxResult {
                gain,
                taxable_gain,
                basic_rate,
                higher_rate,
                basic_rate_gain: Decimal::ZERO,
                higher_rate_gain: Decimal::ZERO,
                basic_rate_tax: Decimal::ZERO,
                higher_rate_tax: Decimal::ZERO,
                total_cgt: Decimal::ZERO,
                effective_rate: Decimal::ZERO,
                net_proceeds: disposal_price - disposal_costs,
            };
        }

        let taxable_income = non_negative(input_amount(input.annual_income) - c.personal_allowance);
        let remaining_basic = non_negative(c.basic_rate_threshold - taxable_income);

        let [basic, higher] = apportion(
            taxable_gain,
            [Band::capped(remaining_basic, basic_rate), Band::open(higher_rate)],
        );
        let total_cgt = basic.tax + higher.tax;

        CapitalGainsTaxResult {
            gain,
            taxable_gain,
            basic_rate,
            higher_rate,
            basic_rate_gain: basic.amount,
            higher_rate_gain: higher.amount,
            basic_rate_tax: basic.tax,
            higher_rate_tax: higher.tax,
            total_cgt,
            effective_rate: effective_rate(total_cgt, gain),
            net_proceeds: disposal_price - disposal_costs - total_cgt,
        }
    }

    fn rates(
        &self,
        is_residential_property: bool,
    ) -> (Decimal, Decimal) {
        let c = self.constants;
        if is_residential_property {
            (c.cgt_residential_basic_rate, c.cgt_residential_higher_rate)
        } else {
            (c.cgt_basic_rate, c.cgt_higher_rate)
        }
    }
}
