//! VAT: add VAT to a net amount, or extract it from a gross amount.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use tax_core::calculations::{Vat, VatInput, VatMode};
//!
//! let added = Vat::calculate(&VatInput { amount: dec!(100), vat_rate: dec!(20), mode: VatMode::Exclusive });
//! assert_eq!(added.gross_amount, dec!(120));
//!
//! let extracted = Vat::calculate(&VatInput { amount: dec!(120), vat_rate: dec!(20), mode: VatMode::Inclusive });
//! assert_eq!(extracted.net_amount, dec!(100));
//! assert_eq!(extracted.vat_amount, dec!(20));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::{input_amount, non_negative};

/// Whether the input amount already includes VAT.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VatMode {
    #[default]
    Exclusive,
    Inclusive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatInput {
    pub amount: Decimal,

    /// Percentage, e.g. `20` for the standard rate. Capped at 100.
    pub vat_rate: Decimal,

    pub mode: VatMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatResult {
    pub net_amount: Decimal,
    pub vat_amount: Decimal,
    pub gross_amount: Decimal,
    pub vat_rate: Decimal,
}

/// VAT does not vary by tax year, so the calculator holds no constants.
#[derive(Debug, Clone, Copy)]
pub struct Vat;

impl Vat {
    pub fn calculate(input: &VatInput) -> VatResult {
        let amount = input_amount(input.amount);
        let vat_rate = non_negative(input.vat_rate).min(Decimal::ONE_HUNDRED);
        let fraction = vat_rate / Decimal::ONE_HUNDRED;

        match input.mode {
            VatMode::Inclusive => {
                let net_amount = amount / (Decimal::ONE + fraction);
                VatResult {
                    net_amount,
                    vat_amount: amount - net_amount,
                    gross_amount: amount,
                    vat_rate,
                }
            }
            VatMode::Exclusive => {
                let vat_amount = amount * fraction;
                VatResult {
                    net_amount: amount,
                    vat_amount,
                    gross_amount: amount + vat_amount,
                    vat_rate,
                }
            }
        }
    }
}
