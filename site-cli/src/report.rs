//! Human-readable rendering of calculator results.
//!
//! Amounts are rounded to pence only here; the results themselves keep
//! full precision, which is what `--json` prints.

use serde::Serialize;
use tax_core::calculations::{
    CapitalGainsTaxResult, CorporationTaxResult, DividendTaxResult, ExtractionMethod,
    SalaryDividendResult, SelfAssessmentResult, VatResult,
};
use tax_core::format::{format_gbp, format_rate};

/// A labelled, formatted breakdown of one result.
pub trait Summary: Serialize {
    fn title(&self) -> &'static str;

    fn rows(&self) -> Vec<(&'static str, String)>;
}

/// Title, underline, then one right-aligned value per row.
pub fn render_text<T: Summary>(result: &T) -> String {
    let rows = result.rows();
    let label_width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    let value_width = rows
        .iter()
        .map(|(_, value)| value.chars().count())
        .max()
        .unwrap_or(0);

    let title = result.title();
    let mut out = format!("{title}\n{}\n", "-".repeat(title.len()));
    for (label, value) in rows {
        out.push_str(&format!("{label:<label_width$}  {value:>value_width$}\n"));
    }
    out
}

pub fn render_json<T: Summary>(result: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(result)
}

fn yes_no(flag: bool) -> String {
    if flag { "yes" } else { "no" }.to_string()
}

impl Summary for SelfAssessmentResult {
    fn title(&self) -> &'static str {
        "Self assessment"
    }

    fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Adjusted income", format_gbp(self.adjusted_income)),
            ("Personal allowance", format_gbp(self.allowance_used)),
            ("Taxable income", format_gbp(self.taxable_income)),
            ("Basic rate tax", format_gbp(self.basic_rate_tax)),
            ("Higher rate tax", format_gbp(self.higher_rate_tax)),
            ("Additional rate tax", format_gbp(self.additional_rate_tax)),
            ("Income tax", format_gbp(self.income_tax)),
            ("National Insurance", format_gbp(self.national_insurance)),
            ("Total tax", format_gbp(self.total_tax)),
            ("Effective rate", format_rate(self.effective_rate)),
            ("Take-home", format_gbp(self.take_home)),
        ]
    }
}

impl Summary for CorporationTaxResult {
    fn title(&self) -> &'static str {
        "Corporation tax"
    }

    fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Taxable profit", format_gbp(self.taxable_profit)),
            ("Small profits threshold", format_gbp(self.adjusted_threshold)),
            ("Rate", format_rate(self.rate_used)),
            ("Marginal relief", yes_no(self.marginal_relief_applied)),
            ("Corporation tax", format_gbp(self.tax)),
            ("Profit after tax", format_gbp(self.profit_after_tax)),
            ("Effective rate", format_rate(self.effective_rate)),
        ]
    }
}

impl Summary for DividendTaxResult {
    fn title(&self) -> &'static str {
        "Dividend tax"
    }

    fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Taxable dividends", format_gbp(self.taxable_dividends)),
            ("After allowances", format_gbp(self.dividends_after_allowances)),
            ("Basic rate tax", format_gbp(self.basic_rate_tax)),
            ("Higher rate tax", format_gbp(self.higher_rate_tax)),
            ("Additional rate tax", format_gbp(self.additional_rate_tax)),
            ("Total tax", format_gbp(self.total_tax)),
            ("Effective rate", format_rate(self.effective_rate)),
            ("Net dividend", format_gbp(self.net_dividend)),
        ]
    }
}

impl Summary for SalaryDividendResult {
    fn title(&self) -> &'static str {
        "Salary vs dividend"
    }

    fn rows(&self) -> Vec<(&'static str, String)> {
        let best = match self.most_efficient {
            ExtractionMethod::Salary => "salary",
            ExtractionMethod::Dividend => "dividend",
        };
        vec![
            ("Salary", format_gbp(self.salary.salary)),
            ("  Employer NI", format_gbp(self.salary.employer_ni)),
            ("  Income tax", format_gbp(self.salary.income_tax)),
            ("  Employee NI", format_gbp(self.salary.employee_ni)),
            ("  Take-home", format_gbp(self.salary.take_home)),
            ("  Effective rate", format_rate(self.salary.effective_rate)),
            ("Company profit", format_gbp(self.dividend.company_profit)),
            ("  Corporation tax", format_gbp(self.dividend.corporation_tax)),
            ("  Available to distribute", format_gbp(self.dividend.available_for_dividend)),
            ("  Dividend tax", format_gbp(self.dividend.dividend_tax)),
            ("  Take-home", format_gbp(self.dividend.take_home)),
            ("  Effective rate", format_rate(self.dividend.effective_rate)),
            ("Difference", format_gbp(self.difference)),
            ("Most efficient", best.to_string()),
        ]
    }
}

impl Summary for CapitalGainsTaxResult {
    fn title(&self) -> &'static str {
        "Capital gains tax"
    }

    fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Gain", format_gbp(self.gain)),
            ("Taxable gain", format_gbp(self.taxable_gain)),
            ("Basic rate portion", format_gbp(self.basic_rate_gain)),
            ("  at", format_rate(self.basic_rate)),
            ("Higher rate portion", format_gbp(self.higher_rate_gain)),
            ("  at", format_rate(self.higher_rate)),
            ("Capital gains tax", format_gbp(self.total_cgt)),
            ("Effective rate", format_rate(self.effective_rate)),
            ("Net proceeds", format_gbp(self.net_proceeds)),
        ]
    }
}

impl Summary for VatResult {
    fn title(&self) -> &'static str {
        "VAT"
    }

    fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Net", format_gbp(self.net_amount)),
            ("VAT", format_gbp(self.vat_amount)),
            ("Gross", format_gbp(self.gross_amount)),
            ("Rate", format_rate(self.vat_rate / rust_decimal::Decimal::ONE_HUNDRED)),
        ]
    }
}
