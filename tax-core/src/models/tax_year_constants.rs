use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calculations::common::Band;

/// Errors reported by [`TaxYearConstants::validate`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConstantsError {
    #[error("{field} must be non-negative, got {value}")]
    NegativeThreshold { field: &'static str, value: Decimal },

    #[error("{field} must be between 0 and 1, got {value}")]
    RateOutOfRange { field: &'static str, value: Decimal },

    #[error("{lower} must be below {upper}")]
    UnorderedThresholds {
        lower: &'static str,
        upper: &'static str,
    },
}

/// Rates and thresholds for one UK tax year.
///
/// A set is defined once per tax year and never mutated afterwards; moving
/// to another year means swapping in a different value. Rates are stored as
/// fractions (`0.20` for 20%) and thresholds in pounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxYearConstants {
    /// Label such as `"2024/25"`.
    pub tax_year: String,

    // Income tax
    pub personal_allowance: Decimal,
    /// Adjusted income above which the personal allowance tapers away.
    pub allowance_taper_threshold: Decimal,
    pub basic_rate_threshold: Decimal,
    pub higher_rate_threshold: Decimal,
    pub basic_rate: Decimal,
    pub higher_rate: Decimal,
    pub additional_rate: Decimal,

    // National Insurance
    pub ni_primary_threshold: Decimal,
    pub ni_upper_earnings_limit: Decimal,
    pub ni_basic_rate: Decimal,
    pub ni_higher_rate: Decimal,

    // Dividends
    pub dividend_allowance: Decimal,
    pub dividend_basic_rate: Decimal,
    pub dividend_higher_rate: Decimal,
    pub dividend_additional_rate: Decimal,

    // Corporation tax
    pub corporation_main_rate: Decimal,
    pub corporation_small_profits_rate: Decimal,
    pub corporation_small_profits_threshold: Decimal,
    /// Profits at or above this pay the main rate with no marginal relief.
    pub corporation_upper_limit: Decimal,

    // Capital gains
    pub cgt_annual_allowance: Decimal,
    pub cgt_basic_rate: Decimal,
    pub cgt_higher_rate: Decimal,
    pub cgt_residential_basic_rate: Decimal,
    pub cgt_residential_higher_rate: Decimal,

    // VAT
    pub vat_standard_rate: Decimal,
    pub vat_reduced_rate: Decimal,
    pub vat_zero_rate: Decimal,
}

impl Default for TaxYearConstants {
    /// The table published on the site for 2024/25.
    fn default() -> Self {
        Self {
            tax_year: "2024/25".to_string(),
            personal_allowance: dec!(12570),
            allowance_taper_threshold: dec!(100000),
            basic_rate_threshold: dec!(50270),
            higher_rate_threshold: dec!(125140),
            basic_rate: dec!(0.20),
            higher_rate: dec!(0.40),
            additional_rate: dec!(0.45),
            ni_primary_threshold: dec!(12570),
            ni_upper_earnings_limit: dec!(50270),
            ni_basic_rate: dec!(0.08),
            ni_higher_rate: dec!(0.02),
            dividend_allowance: dec!(1000),
            dividend_basic_rate: dec!(0.0875),
            dividend_higher_rate: dec!(0.3375),
            dividend_additional_rate: dec!(0.3935),
            corporation_main_rate: dec!(0.25),
            corporation_small_profits_rate: dec!(0.19),
            corporation_small_profits_threshold: dec!(50000),
            corporation_upper_limit: dec!(250000),
            cgt_annual_allowance: dec!(3000),
            cgt_basic_rate: dec!(0.10),
            cgt_higher_rate: dec!(0.20),
            cgt_residential_basic_rate: dec!(0.18),
            cgt_residential_higher_rate: dec!(0.24),
            vat_standard_rate: dec!(0.20),
            vat_reduced_rate: dec!(0.05),
            vat_zero_rate: dec!(0),
        }
    }
}

impl TaxYearConstants {
    /// Checks that thresholds are non-negative and ordered and that every
    /// rate lies in `[0, 1]`.
    ///
    /// # Example
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use tax_core::{ConstantsError, TaxYearConstants};
    ///
    /// let mut constants = TaxYearConstants::default();
    /// assert_eq!(constants.validate(), Ok(()));
    ///
    /// constants.basic_rate = dec!(1.5);
    /// assert_eq!(
    ///     constants.validate(),
    ///     Err(ConstantsError::RateOutOfRange { field: "basic_rate", value: dec!(1.5) })
    /// );
    /// ```
    pub fn validate(&self) -> Result<(), ConstantsError> {
        for (field, value) in self.thresholds() {
            if value < Decimal::ZERO {
                return Err(ConstantsError::NegativeThreshold { field, value });
            }
        }

        for (field, value) in self.rates() {
            if value < Decimal::ZERO || value > Decimal::ONE {
                return Err(ConstantsError::RateOutOfRange { field, value });
            }
        }

        let ordered = [
            (
                ("personal_allowance", self.personal_allowance),
                ("basic_rate_threshold", self.basic_rate_threshold),
            ),
            (
                ("basic_rate_threshold", self.basic_rate_threshold),
                ("higher_rate_threshold", self.higher_rate_threshold),
            ),
            (
                ("ni_primary_threshold", self.ni_primary_threshold),
                ("ni_upper_earnings_limit", self.ni_upper_earnings_limit),
            ),
            (
                (
                    "corporation_small_profits_threshold",
                    self.corporation_small_profits_threshold,
                ),
                ("corporation_upper_limit", self.corporation_upper_limit),
            ),
        ];
        for ((lower, low), (upper, high)) in ordered {
            if low >= high {
                return Err(ConstantsError::UnorderedThresholds { lower, upper });
            }
        }

        Ok(())
    }

    /// Income tax bands applied to taxable income (after the allowance).
    pub fn income_tax_bands(&self) -> [Band; 3] {
        [
            Band::capped(
                self.basic_rate_threshold - self.personal_allowance,
                self.basic_rate,
            ),
            Band::capped(
                self.higher_rate_threshold - self.basic_rate_threshold,
                self.higher_rate,
            ),
            Band::open(self.additional_rate),
        ]
    }

    /// National Insurance bands applied to earnings above the primary threshold.
    pub fn national_insurance_bands(&self) -> [Band; 2] {
        [
            Band::capped(
                self.ni_upper_earnings_limit - self.ni_primary_threshold,
                self.ni_basic_rate,
            ),
            Band::open(self.ni_higher_rate),
        ]
    }

    fn thresholds(&self) -> [(&'static str, Decimal); 9] {
        [
            ("personal_allowance", self.personal_allowance),
            ("allowance_taper_threshold", self.allowance_taper_threshold),
            ("basic_rate_threshold", self.basic_rate_threshold),
            ("higher_rate_threshold", self.higher_rate_threshold),
            ("ni_primary_threshold", self.ni_primary_threshold),
            ("ni_upper_earnings_limit", self.ni_upper_earnings_limit),
            ("dividend_allowance", self.dividend_allowance),
            (
                "corporation_small_profits_threshold",
                self.corporation_small_profits_threshold,
            ),
            ("cgt_annual_allowance", self.cgt_annual_allowance),
        ]
    }

    fn rates(&self) -> [(&'static str, Decimal); 17] {
        [
            ("basic_rate", self.basic_rate),
            ("higher_rate", self.higher_rate),
            ("additional_rate", self.additional_rate),
            ("ni_basic_rate", self.ni_basic_rate),
            ("ni_higher_rate", self.ni_higher_rate),
            ("dividend_basic_rate", self.dividend_basic_rate),
            ("dividend_higher_rate", self.dividend_higher_rate),
            ("dividend_additional_rate", self.dividend_additional_rate),
            ("corporation_main_rate", self.corporation_main_rate),
            (
                "corporation_small_profits_rate",
                self.corporation_small_profits_rate,
            ),
            ("cgt_basic_rate", self.cgt_basic_rate),
            ("cgt_higher_rate", self.cgt_higher_rate),
            ("cgt_residential_basic_rate", self.cgt_residential_basic_rate),
            ("cgt_residential_higher_rate", self.cgt_residential_higher_rate),
            ("vat_standard_rate", self.vat_standard_rate),
            ("vat_reduced_rate", self.vat_reduced_rate),
            ("vat_zero_rate", self.vat_zero_rate),
        ]
    }
}

/// The three published VAT rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VatRate {
    Standard,
    Reduced,
    Zero,
}

impl VatRate {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Reduced => "reduced",
            Self::Zero => "zero",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "standard" => Some(Self::Standard),
            "reduced" => Some(Self::Reduced),
            "zero" => Some(Self::Zero),
            _ => None,
        }
    }

    /// The rate as a percentage (`20` for the standard rate), which is the
    /// unit the VAT calculator takes.
    pub fn percentage(
        &self,
        constants: &TaxYearConstants,
    ) -> Decimal {
        let fraction = match self {
            Self::Standard => constants.vat_standard_rate,
            Self::Reduced => constants.vat_reduced_rate,
            Self::Zero => constants.vat_zero_rate,
        };
        fraction * Decimal::ONE_HUNDRED
    }
}
