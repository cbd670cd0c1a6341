use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use chrono::Utc;
use content_core::{
    CacheRegistry, ContentPipeline, GenerationRequest, GenerationResponse, MemoryCacheFactory,
};
use content_db_sqlite::{SqliteCacheFactory, SqliteContentCache, connection_url};
use content_llm::OpenAiGenerator;
use rust_decimal::Decimal;
use tax_core::calculations::{
    CapitalGainsTax, CapitalGainsTaxInput, CapitalGainsTaxResult, CorporationTax,
    CorporationTaxInput, CorporationTaxResult, DividendTax, DividendTaxInput, DividendTaxResult,
    SalaryDividendComparison, SalaryDividendInput, SalaryDividendResult, SelfAssessment,
    SelfAssessmentInput, SelfAssessmentResult, Vat, VatInput, VatMode, VatResult,
};
use tax_core::input::{parse_amount, parse_bounded, parse_months, parse_percentage};
use tax_core::{TaxYearConstants, VatRate};
use tax_data::{TaxYearConstantsLoader, TaxYearTable};
use tracing::{debug, info, warn};

use crate::cli::{
    CgtArgs, Cli, Command, ContentArgs, CorporationArgs, DividendArgs, SalaryDividendArgs,
    SelfAssessmentArgs, VatArgs,
};
use crate::config::SiteConfig;
use crate::report::{Summary, render_json, render_text};

/// Upper bound accepted for `--associated-companies`.
const MAX_ASSOCIATED_COMPANIES: u32 = 10_000;

// ─── dispatch ────────────────────────────────────────────────────────────────

pub async fn run(cli: &Cli) -> Result<()> {
    let config = SiteConfig::load(cli.config.as_deref())?;

    match &cli.command {
        Command::SelfAssessment(args) => {
            let constants = constants_for(cli, &config)?;
            print_result(cli.json, &self_assessment(&constants, args)?)
        }
        Command::Corporation(args) => {
            let constants = constants_for(cli, &config)?;
            print_result(cli.json, &corporation(&constants, args)?)
        }
        Command::Dividend(args) => {
            let constants = constants_for(cli, &config)?;
            print_result(cli.json, &dividend(&constants, args)?)
        }
        Command::SalaryVsDividend(args) => {
            let constants = constants_for(cli, &config)?;
            print_result(cli.json, &salary_vs_dividend(&constants, args)?)
        }
        Command::Cgt(args) => {
            let constants = constants_for(cli, &config)?;
            print_result(cli.json, &capital_gains(&constants, args)?)
        }
        Command::Vat(args) => {
            let constants = constants_for(cli, &config)?;
            print_result(cli.json, &vat(&constants, args)?)
        }
        Command::Content(args) => content(cli, &config, args).await,
        Command::PurgeCache => purge_cache(cli, &config).await,
        Command::TaxYears => tax_years(cli, &config),
    }
}

fn print_result<T: Summary>(
    json: bool,
    result: &T,
) -> Result<()> {
    if json {
        println!("{}", render_json(result)?);
    } else {
        print!("{}", render_text(result));
    }
    Ok(())
}

// ─── tax-year constants ──────────────────────────────────────────────────────

/// `--constants`, then `tax.constants_path`, then the bundled table.
pub fn load_table(
    cli_path: Option<&Path>,
    config: &SiteConfig,
) -> Result<TaxYearTable> {
    match cli_path.or(config.tax.constants_path.as_deref()) {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open tax constants: {}", path.display()))?;
            let table = TaxYearConstantsLoader::load(file)
                .with_context(|| format!("Failed to load tax constants: {}", path.display()))?;
            debug!(path = %path.display(), years = ?table.years(), "Loaded tax constants");
            Ok(table)
        }
        None => TaxYearConstantsLoader::bundled().context("Bundled tax constants are invalid"),
    }
}

/// The requested year, or the latest one in the table.
pub fn select_year(
    table: &TaxYearTable,
    year: Option<&str>,
) -> Result<TaxYearConstants> {
    match year {
        Some(year) => table.get(year).cloned().with_context(|| {
            format!(
                "Unknown tax year '{year}'. Available: {}",
                table.years().join(", ")
            )
        }),
        None => table.latest().cloned().context("No tax years loaded"),
    }
}

fn constants_for(
    cli: &Cli,
    config: &SiteConfig,
) -> Result<TaxYearConstants> {
    let table = load_table(cli.constants.as_deref(), config)?;
    let year = cli.tax_year.as_deref().or(config.tax.year.as_deref());
    let constants = select_year(&table, year)?;
    debug!(tax_year = %constants.tax_year, "Using tax year");
    Ok(constants)
}

fn tax_years(
    cli: &Cli,
    config: &SiteConfig,
) -> Result<()> {
    let table = load_table(cli.constants.as_deref(), config)?;
    let years = table.years();

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&years)?);
    } else {
        for year in years {
            println!("{year}");
        }
    }
    Ok(())
}

// ─── calculators ─────────────────────────────────────────────────────────────

pub fn self_assessment(
    constants: &TaxYearConstants,
    args: &SelfAssessmentArgs,
) -> Result<SelfAssessmentResult> {
    let input = SelfAssessmentInput {
        income: parse_amount("income", &args.income)?,
        expenses: parse_amount("expenses", &args.expenses)?,
        pension_contributions: parse_amount("pension contributions", &args.pension)?,
    };
    Ok(SelfAssessment::new(constants).calculate(&input))
}

pub fn corporation(
    constants: &TaxYearConstants,
    args: &CorporationArgs,
) -> Result<CorporationTaxResult> {
    let input = CorporationTaxInput {
        profits: parse_amount("profits", &args.profits)?,
        associated_companies: parse_bounded(
            "associated companies",
            &args.associated_companies,
            0,
            MAX_ASSOCIATED_COMPANIES,
        )?,
        accounting_period_months: parse_months(&args.months)?,
    };
    Ok(CorporationTax::new(constants).calculate(&input))
}

pub fn dividend(
    constants: &TaxYearConstants,
    args: &DividendArgs,
) -> Result<DividendTaxResult> {
    let input = DividendTaxInput {
        dividend_amount: parse_amount("dividends", &args.dividends)?,
        other_income: parse_amount("other income", &args.other_income)?,
    };
    Ok(DividendTax::new(constants).calculate(&input))
}

pub fn salary_vs_dividend(
    constants: &TaxYearConstants,
    args: &SalaryDividendArgs,
) -> Result<SalaryDividendResult> {
    let input = SalaryDividendInput {
        salary: parse_amount("salary", &args.salary)?,
        dividend: parse_amount("dividend", &args.dividend)?,
        company_profit: parse_amount("company profit", &args.company_profit)?,
    };
    Ok(SalaryDividendComparison::new(constants).calculate(&input))
}

pub fn capital_gains(
    constants: &TaxYearConstants,
    args: &CgtArgs,
) -> Result<CapitalGainsTaxResult> {
    let input = CapitalGainsTaxInput {
        acquisition_price: parse_amount("acquisition price", &args.acquisition_price)?,
        disposal_price: parse_amount("disposal price", &args.disposal_price)?,
        acquisition_costs: parse_amount("acquisition costs", &args.acquisition_costs)?,
        disposal_costs: parse_amount("disposal costs", &args.disposal_costs)?,
        annual_income: parse_amount("annual income", &args.annual_income)?,
        is_residential_property: args.residential,
    };
    Ok(CapitalGainsTax::new(constants).calculate(&input))
}

/// A named rate from the tax year, or an explicit percentage up to 100.
pub fn vat_percentage(
    constants: &TaxYearConstants,
    raw: &str,
) -> Result<Decimal> {
    if let Some(rate) = VatRate::parse(&raw.trim().to_lowercase()) {
        return Ok(rate.percentage(constants));
    }

    let percentage = parse_percentage("VAT rate", raw)?;
    if percentage > Decimal::ONE_HUNDRED {
        bail!("VAT rate must be at most 100%, got {percentage}");
    }
    Ok(percentage)
}

pub fn vat(
    constants: &TaxYearConstants,
    args: &VatArgs,
) -> Result<VatResult> {
    let input = VatInput {
        amount: parse_amount("amount", &args.amount)?,
        vat_rate: vat_percentage(constants, &args.rate)?,
        mode: if args.inclusive {
            VatMode::Inclusive
        } else {
            VatMode::Exclusive
        },
    };
    Ok(Vat::calculate(&input))
}

// ─── content ─────────────────────────────────────────────────────────────────

pub fn build_registry() -> CacheRegistry {
    let mut registry = CacheRegistry::new();
    registry.register(Box::new(SqliteCacheFactory));
    registry.register(Box::new(MemoryCacheFactory));
    registry
}

async fn content(
    cli: &Cli,
    config: &SiteConfig,
    args: &ContentArgs,
) -> Result<()> {
    let cache_config = config.cache_config(cli.db.as_deref());
    debug!(backend = %cache_config.backend, "Opening content cache");
    let cache = build_registry()
        .create(&cache_config)
        .await
        .context("Failed to open content cache")?;

    let api_key = match config.api_key() {
        Ok(key) => key,
        Err(err) if args.fallback => {
            warn!(error = %err, "No API key, generation will fail and fall back");
            String::new()
        }
        Err(err) => return Err(err),
    };
    let generator = OpenAiGenerator::new(config.openai_config(api_key))
        .context("Failed to build generation client")?;

    let pipeline = ContentPipeline::new(Arc::from(cache), Arc::new(generator))
        .with_retry_policy(config.retry_policy())
        .with_ttl(config.cache_ttl()?);

    let request = GenerationRequest {
        city: args.city.clone(),
        service: args.service.clone(),
        content_type: args.content_type.clone(),
        force_refresh: args.force_refresh,
    };
    info!(
        city = %request.city,
        service = %request.service,
        content_type = %request.content_type,
        "Content requested"
    );

    let response = if args.fallback {
        pipeline.content_or_fallback(&request).await
    } else {
        match pipeline.handle(&request).await {
            Ok(response) => response,
            Err(err) => {
                if cli.json {
                    println!("{}", serde_json::to_string_pretty(&err.to_error_response())?);
                }
                return Err(err.into());
            }
        }
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print!("{}", render_content(&response));
    }
    Ok(())
}

pub fn render_content(response: &GenerationResponse) -> String {
    match response {
        GenerationResponse::Single { content } => format!("{content}\n"),
        GenerationResponse::Page(page) => format!(
            "Title: {}\nDescription: {}\n\n{}\n",
            page.title, page.description, page.main_content
        ),
    }
}

async fn purge_cache(
    cli: &Cli,
    config: &SiteConfig,
) -> Result<()> {
    if config.cache.backend != "sqlite" {
        bail!(
            "purge-cache needs the sqlite backend, configured backend is '{}'",
            config.cache.backend
        );
    }

    let cache_config = config.cache_config(cli.db.as_deref());
    let cache = SqliteContentCache::new(&connection_url(&cache_config.connection_string)).await?;
    cache.run_migrations().await?;

    let purged = cache
        .purge_expired(Utc::now())
        .await
        .context("Failed to purge expired content")?;
    info!(purged, "Purged content cache");

    if cli.json {
        println!("{}", serde_json::json!({ "purged": purged }));
    } else {
        println!("Removed {purged} expired entr{}", if purged == 1 { "y" } else { "ies" });
    }
    Ok(())
}
