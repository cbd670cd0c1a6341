//! UK tax calculators.
//!
//! Each calculator borrows a [`TaxYearConstants`](crate::TaxYearConstants)
//! table and turns a small input record into a flat breakdown. None of them
//! fail: negative inputs are treated as zero and every divisor is guarded.

pub mod capital_gains;
pub mod common;
pub mod corporation;
pub mod dividend;
pub mod salary_dividend;
pub mod self_assessment;
pub mod vat;

pub use capital_gains::{CapitalGainsTax, CapitalGainsTaxInput, CapitalGainsTaxResult};
pub use corporation::{CorporationTax, CorporationTaxInput, CorporationTaxResult};
pub use dividend::{DividendTax, DividendTaxInput, DividendTaxResult};
pub use salary_dividend::{
    DividendRoute, ExtractionMethod, SalaryDividendComparison, SalaryDividendInput,
    SalaryDividendResult, SalaryRoute,
};
pub use self_assessment::{SelfAssessment, SelfAssessmentInput, SelfAssessmentResult};
pub use vat::{Vat, VatInput, VatMode, VatResult};
