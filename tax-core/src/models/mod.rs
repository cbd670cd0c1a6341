mod tax_year_constants;

pub use tax_year_constants::{ConstantsError, TaxYearConstants, VatRate};
