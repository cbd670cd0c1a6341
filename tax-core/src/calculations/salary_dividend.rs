//! Salary versus dividend comparison for company directors.
//!
//! The salary route pays employer NI, income tax (full personal allowance,
//! no taper) and employee NI. The dividend route pays corporation tax at the
//! flat main rate on the company's profit and dividend tax on the dividend.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::TaxYearConstants;
use crate::calculations::common::{apportion, effective_rate, input_amount, non_negative, total_tax};
use crate::calculations::dividend::{DividendTax, DividendTaxInput};

/// Employer (secondary) Class 1 NI rate. Not part of the per-year table.
pub const EMPLOYER_NI_RATE: Decimal = dec!(0.138);

/// Employer (secondary) Class 1 NI threshold. Not part of the per-year table.
pub const EMPLOYER_NI_THRESHOLD: Decimal = dec!(9100);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryDividendInput {
    pub salary: Decimal,
    pub dividend: Decimal,
    pub company_profit: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMethod {
    Salary,
    Dividend,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryRoute {
    pub salary: Decimal,
    pub employer_ni: Decimal,
    pub income_tax: Decimal,
    pub employee_ni: Decimal,
    pub take_home: Decimal,
    pub total_tax: Decimal,

    /// `total_tax / (salary + employer_ni)`.
    pub effective_rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DividendRoute {
    pub company_profit: Decimal,
    pub corporation_tax: Decimal,
    pub available_for_dividend: Decimal,
    pub dividend: Decimal,
    pub dividend_tax: Decimal,
    pub take_home: Decimal,
    pub total_tax: Decimal,

    /// `total_tax / company_profit`.
    pub effective_rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalaryDividendResult {
    pub salary: SalaryRoute,
    pub dividend: DividendRoute,

    /// Dividend take-home minus salary take-home.
    pub difference: Decimal,

    /// Dividend only when it strictly beats salary; ties go to salary.
    pub most_efficient: ExtractionMethod,
}

#[derive(Debug, Clone)]
pub struct SalaryDividendComparison<'a> {
    constants: &'a TaxYearConstants,
}

impl<'a> SalaryDividendComparison<'a> {
    pub fn new(constants: &'a TaxYearConstants) -> Self {
        Self { constants }
    }

    pub fn calculate(
        &self,
        input: &SalaryDividendInput,
    ) -> SalaryDividendResult {
        let salary = self.salary_route(input_amount(input.salary));
        let dividend = self.dividend_route(
            input_amount(input.dividend),
            input_amount(input.company_profit),
        );

        let difference = dividend.take_home - salary.take_home;
        let most_efficient = if difference > Decimal::ZERO {
            ExtractionMethod::Dividend
        } else {
            ExtractionMethod::Salary
        };

        SalaryDividendResult {
            salary,
            dividend,
            difference,
            most_efficient,
        }
    }

    fn salary_route(
        &self,
        salary: Decimal,
    ) -> SalaryRoute {
        let c = self.constants;

        let employer_ni = non_negative(salary - EMPLOYER_NI_THRESHOLD) * EMPLOYER_NI_RATE;
        let income_tax = total_tax(&apportion(
            non_negative(salary - c.personal_allowance),
            c.income_tax_bands(),
        ));
        let employee_ni = total_tax(&apportion(
            non_negative(salary - c.ni_primary_threshold),
            c.national_insurance_bands(),
        ));
        let total = employer_ni + income_tax + employee_ni;

        SalaryRoute {
            salary,
            employer_ni,
            income_tax,
            employee_ni,
            take_home: salary - income_tax - employee_ni,
            total_tax: total,
            effective_rate: effective_rate(total, salary + employer_ni),
        }
    }

    fn dividend_route(
        &self,
        dividend: Decimal,
        company_profit: Decimal,
    ) -> DividendRoute {
        let corporation_tax = company_profit * self.constants.corporation_main_rate;
        let dividend_tax = DividendTax::new(self.constants)
            .calculate(&DividendTaxInput {
                dividend_amount: dividend,
                other_income: Decimal::ZERO,
            })
            .total_tax;
        let total = corporation_tax + dividend_tax;

        DividendRoute {
            company_profit,
            corporation_tax,
            available_for_dividend: company_profit - corporation_tax,
            dividend,
            dividend_tax,
            take_home: dividend - dividend_tax,
            total_tax: total,
            effective_rate: effective_rate(total, company_profit),
        }
    }
}
