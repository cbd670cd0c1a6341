//! Tax-year constant sets loaded from CSV.

mod loader;

pub use loader::{BUNDLED_TAX_YEARS, TaxYearConstantsLoader, TaxYearLoaderError, TaxYearTable};
