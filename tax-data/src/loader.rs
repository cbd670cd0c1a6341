use std::collections::BTreeMap;
use std::io::Read;

use tax_core::{ConstantsError, TaxYearConstants};
use thiserror::Error;
use tracing::debug;

/// The constant sets shipped with the crate.
pub const BUNDLED_TAX_YEARS: &str = include_str!("../data/uk_tax_years.csv");

/// Errors that can occur when loading tax-year constants.
#[derive(Debug, Error)]
pub enum TaxYearLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Invalid constants for {tax_year}: {source}")]
    InvalidConstants {
        tax_year: String,
        #[source]
        source: ConstantsError,
    },

    #[error("Tax year {0} appears more than once")]
    DuplicateYear(String),

    #[error("No tax years were loaded")]
    Empty,
}

impl From<csv::Error> for TaxYearLoaderError {
    fn from(err: csv::Error) -> Self {
        TaxYearLoaderError::CsvParse(err.to_string())
    }
}

/// Loader for tax-year constant sets stored as CSV.
///
/// One row per tax year; the header row names the [`TaxYearConstants`]
/// fields (`tax_year`, `personal_allowance`, ..., `vat_zero_rate`). Rates
/// are fractions, thresholds are pounds.
pub struct TaxYearConstantsLoader;

impl TaxYearConstantsLoader {
    /// Parse and validate constant sets from a CSV reader.
    ///
    /// The reader can be any type that implements `Read`, such as a file
    /// or a string slice.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<TaxYearConstants>, TaxYearLoaderError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let constants: TaxYearConstants = result?;
            constants
                .validate()
                .map_err(|source| TaxYearLoaderError::InvalidConstants {
                    tax_year: constants.tax_year.clone(),
                    source,
                })?;
            debug!(tax_year = %constants.tax_year, "parsed tax year constants");
            records.push(constants);
        }

        Ok(records)
    }

    /// Parse a CSV reader straight into a [`TaxYearTable`].
    pub fn load<R: Read>(reader: R) -> Result<TaxYearTable, TaxYearLoaderError> {
        TaxYearTable::from_records(Self::parse(reader)?)
    }

    /// The table built from [`BUNDLED_TAX_YEARS`].
    pub fn bundled() -> Result<TaxYearTable, TaxYearLoaderError> {
        Self::load(BUNDLED_TAX_YEARS.as_bytes())
    }
}

/// Constant sets keyed by tax-year label.
///
/// Labels such as `"2023/24"` sort chronologically as strings, so the
/// latest year is the last key.
#[derive(Debug, Clone)]
pub struct TaxYearTable {
    years: BTreeMap<String, TaxYearConstants>,
}

impl TaxYearTable {
    pub fn from_records(records: Vec<TaxYearConstants>) -> Result<Self, TaxYearLoaderError> {
        if records.is_empty() {
            return Err(TaxYearLoaderError::Empty);
        }

        let mut years = BTreeMap::new();
        for constants in records {
            let label = constants.tax_year.clone();
            if years.insert(label.clone(), constants).is_some() {
                return Err(TaxYearLoaderError::DuplicateYear(label));
            }
        }

        Ok(Self { years })
    }

    pub fn get(
        &self,
        tax_year: &str,
    ) -> Option<&TaxYearConstants> {
        self.years.get(tax_year)
    }

    pub fn latest(&self) -> Option<&TaxYearConstants> {
        self.years.values().next_back()
    }

    /// Tax-year labels, oldest first.
    pub fn years(&self) -> Vec<&str> {
        self.years.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    const HEADER: &str = "tax_year,personal_allowance,allowance_taper_threshold,basic_rate_threshold,higher_rate_threshold,basic_rate,higher_rate,additional_rate,ni_primary_threshold,ni_upper_earnings_limit,ni_basic_rate,ni_higher_rate,dividend_allowance,dividend_basic_rate,dividend_higher_rate,dividend_additional_rate,corporation_main_rate,corporation_small_profits_rate,corporation_small_profits_threshold,corporation_upper_limit,cgt_annual_allowance,cgt_basic_rate,cgt_higher_rate,cgt_residential_basic_rate,cgt_residential_higher_rate,vat_standard_rate,vat_reduced_rate,vat_zero_rate";

    const ROW_2024: &str = "2024/25,12570,100000,50270,125140,0.20,0.40,0.45,12570,50270,0.08,0.02,1000,0.0875,0.3375,0.3935,0.25,0.19,50000,250000,3000,0.10,0.20,0.18,0.24,0.20,0.05,0";

    fn csv(rows: &[&str]) -> String {
        let mut out = HEADER.to_string();
        for row in rows {
            out.push('\n');
            out.push_str(row);
        }
        out
    }

    #[test]
    fn test_parse_single_year_matches_default_table() {
        let records = TaxYearConstantsLoader::parse(csv(&[ROW_2024]).as_bytes())
            .expect("Failed to parse CSV");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0], TaxYearConstants::default());
    }

    #[test]
    fn test_parse_rejects_rate_above_one() {
        let row = ROW_2024.replacen(",0.20,0.40,", ",1.20,0.40,", 1);
        let err = TaxYearConstantsLoader::parse(csv(&[&row]).as_bytes()).unwrap_err();

        match err {
            TaxYearLoaderError::InvalidConstants { tax_year, source } => {
                assert_eq!(tax_year, "2024/25");
                assert_eq!(
                    source,
                    ConstantsError::RateOutOfRange {
                        field: "basic_rate",
                        value: dec!(1.20),
                    }
                );
            }
            other => panic!("Expected InvalidConstants, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_missing_column_is_csv_error() {
        let result = TaxYearConstantsLoader::parse("tax_year,personal_allowance\n2024/25,12570".as_bytes());

        assert!(matches!(result, Err(TaxYearLoaderError::CsvParse(_))));
    }

    #[test]
    fn test_parse_non_numeric_value_is_csv_error() {
        let row = ROW_2024.replacen("12570", "lots", 1);
        let result = TaxYearConstantsLoader::parse(csv(&[&row]).as_bytes());

        assert!(matches!(result, Err(TaxYearLoaderError::CsvParse(_))));
    }

    #[test]
    fn test_table_rejects_duplicate_year() {
        let result = TaxYearConstantsLoader::load(csv(&[ROW_2024, ROW_2024]).as_bytes());

        assert!(matches!(
            result,
            Err(TaxYearLoaderError::DuplicateYear(year)) if year == "2024/25"
        ));
    }

    #[test]
    fn test_table_rejects_empty_input() {
        let result = TaxYearConstantsLoader::load(HEADER.as_bytes());

        assert!(matches!(result, Err(TaxYearLoaderError::Empty)));
    }

    #[test]
    fn test_bundled_table_latest_is_default() {
        let table = TaxYearConstantsLoader::bundled().expect("Bundled CSV should load");

        assert_eq!(table.years(), vec!["2023/24", "2024/25"]);
        assert_eq!(table.latest(), Some(&TaxYearConstants::default()));
    }
}
