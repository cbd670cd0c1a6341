use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// UK tax calculators and cached landing-page content for an accountancy
/// website.
///
/// Amounts accept an optional `£` and comma thousands separators.
#[derive(Debug, Parser)]
#[command(name = "accounts-site", version)]
pub struct Cli {
    /// Configuration file. Defaults to `accounts-site.toml` when present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Content cache database, overriding `cache.path`.
    /// A file path (e.g. `content-cache.db`) or `:memory:`.
    #[arg(long, global = true)]
    pub db: Option<String>,

    /// Tax year such as `2024/25`. Defaults to the latest available.
    #[arg(long, global = true)]
    pub tax_year: Option<String>,

    /// CSV of tax-year constants, replacing the bundled table.
    #[arg(long, global = true)]
    pub constants: Option<PathBuf>,

    /// Print results as JSON with full precision.
    #[arg(long, global = true)]
    pub json: bool,

    /// Also append log output to this file.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Income tax and National Insurance for a sole trader.
    SelfAssessment(SelfAssessmentArgs),

    /// Corporation tax with marginal relief.
    Corporation(CorporationArgs),

    /// Tax on dividends stacked on top of other income.
    Dividend(DividendArgs),

    /// Compare taking money out of a company as salary or as dividend.
    SalaryVsDividend(SalaryDividendArgs),

    /// Capital gains tax on a single disposal.
    Cgt(CgtArgs),

    /// Add VAT to, or extract it from, an amount.
    Vat(VatArgs),

    /// Generate or fetch cached landing-page content.
    Content(ContentArgs),

    /// Delete expired rows from the SQLite content cache.
    PurgeCache,

    /// List the tax years available.
    TaxYears,
}

#[derive(Debug, Args)]
pub struct SelfAssessmentArgs {
    /// Gross trading income.
    #[arg(long)]
    pub income: String,

    /// Allowable business expenses.
    #[arg(long, default_value = "0")]
    pub expenses: String,

    /// Personal pension contributions.
    #[arg(long, default_value = "0")]
    pub pension: String,
}

#[derive(Debug, Args)]
pub struct CorporationArgs {
    /// Taxable profits for the period.
    #[arg(long)]
    pub profits: String,

    #[arg(long, default_value = "0")]
    pub associated_companies: String,

    /// Accounting period length, 1 to 12.
    #[arg(long, default_value = "12")]
    pub months: String,
}

#[derive(Debug, Args)]
pub struct DividendArgs {
    #[arg(long)]
    pub dividends: String,

    /// Non-dividend income, used up first.
    #[arg(long, default_value = "0")]
    pub other_income: String,
}

#[derive(Debug, Args)]
pub struct SalaryDividendArgs {
    #[arg(long)]
    pub salary: String,

    #[arg(long)]
    pub dividend: String,

    /// Profit available before corporation tax on the dividend route.
    #[arg(long)]
    pub company_profit: String,
}

#[derive(Debug, Args)]
pub struct CgtArgs {
    #[arg(long)]
    pub acquisition_price: String,

    #[arg(long)]
    pub disposal_price: String,

    #[arg(long, default_value = "0")]
    pub acquisition_costs: String,

    #[arg(long, default_value = "0")]
    pub disposal_costs: String,

    /// Other taxable income, which decides the rate band.
    #[arg(long, default_value = "0")]
    pub annual_income: String,

    /// Use the residential property rates.
    #[arg(long)]
    pub residential: bool,
}

#[derive(Debug, Args)]
pub struct VatArgs {
    #[arg(long)]
    pub amount: String,

    /// `standard`, `reduced`, `zero`, or a percentage such as `17.5`.
    #[arg(long, default_value = "standard")]
    pub rate: String,

    /// The amount already includes VAT.
    #[arg(long)]
    pub inclusive: bool,
}

#[derive(Debug, Args)]
pub struct ContentArgs {
    pub city: String,

    pub service: String,

    /// `meta_title`, `meta_description`, `main_content` or `all`.
    #[arg(long = "type", default_value = "all")]
    pub content_type: String,

    /// Regenerate even when cached content exists.
    #[arg(long)]
    pub force_refresh: bool,

    /// Print fallback text instead of failing when generation fails.
    #[arg(long)]
    pub fallback: bool,
}
