//! Integration tests that read the on-disk fixture config and constants.
//!
//! Paths inside the fixture config are relative to the crate root, which
//! is the working directory cargo runs integration tests in.

use std::path::{Path, PathBuf};

use chrono::TimeDelta;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use site_cli::cli::CgtArgs;
use site_cli::commands::{capital_gains, load_table, select_year};
use site_cli::config::SiteConfig;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn large_gain(annual_income: &str) -> CgtArgs {
    CgtArgs {
        acquisition_price: "10,000".to_string(),
        disposal_price: "30,000".to_string(),
        acquisition_costs: "0".to_string(),
        disposal_costs: "0".to_string(),
        annual_income: annual_income.to_string(),
        residential: false,
    }
}

#[test]
fn test_fixture_config_loads() {
    let config = SiteConfig::load(Some(&fixture("accounts-site.toml")))
        .expect("fixture config should load");

    assert_eq!(config.cache.backend, "memory");
    assert_eq!(config.cache_ttl().unwrap(), Some(TimeDelta::days(30)));
    assert_eq!(config.generator.api_key_env, "ACCOUNTS_SITE_TEST_KEY");
    assert_eq!(config.retry_policy().max_attempts, 3);
}

#[test]
fn test_config_constants_path_replaces_bundled_table() {
    let config = SiteConfig::load(Some(&fixture("accounts-site.toml"))).unwrap();

    let table = load_table(None, &config).expect("fixture constants should load");

    assert_eq!(table.years(), vec!["2025/26"]);
    let constants = select_year(&table, None).unwrap();
    assert_eq!(constants.dividend_allowance, dec!(500));
}

#[test]
fn test_cli_constants_path_wins_over_config() {
    let config = SiteConfig::from_toml_str("[tax]\nconstants_path = \"/nonexistent.csv\"\n").unwrap();

    let table = load_table(Some(&fixture("rates_2025_26.csv")), &config).unwrap();

    assert_eq!(table.years(), vec!["2025/26"]);
}

#[test]
fn test_selected_year_drives_cgt_rates() {
    let bundled = load_table(None, &SiteConfig::default()).unwrap();
    let fixture_table = load_table(Some(&fixture("rates_2025_26.csv")), &SiteConfig::default()).unwrap();

    let old = select_year(&bundled, Some("2024/25")).unwrap();
    let new = select_year(&fixture_table, Some("2025/26")).unwrap();

    // £17,000 taxable gain, all in the higher band.
    let old_result = capital_gains(&old, &large_gain("100000")).unwrap();
    let new_result = capital_gains(&new, &large_gain("100000")).unwrap();

    assert_eq!(old_result.total_cgt, dec!(3400));
    assert_eq!(new_result.total_cgt, dec!(4080));
}
