//! Assembles a full [`TaxEstimate`] from ledger totals.
//!
//! | Line | Figure |
//! |------|--------|
//! | 1    | Taxable income: `max(0, income - deductible expenses)` |
//! | 2    | Self-employment tax: `income × SE rate` |
//! | 3    | Federal tax: bracket walk over line 1 |
//! | 4    | Total tax: line 2 + line 3 |
//! | 5    | Effective rate: line 4 / income × 100 (0 without income) |
//! | 6    | Marginal rate of line 1 |
//! | 7    | Quarterly payment: line 4 / 4 |
//!
//! Every money line is rounded half-up to cents before it feeds the next.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use taxpal_core::{LedgerTotals, TaxTable};
//! use taxpal_core::calculations::EstimateCalculator;
//!
//! let table = TaxTable::single_filer_2024();
//! let totals = LedgerTotals {
//!     total_income: dec!(80000),
//!     total_expenses: dec!(10000),
//!     deductible_expenses: dec!(10000),
//!     ..Default::default()
//! };
//!
//! let estimate = EstimateCalculator::new(&table).estimate(&totals, 2024).unwrap();
//!
//! assert_eq!(estimate.total_tax, dec!(18964.50));
//! assert_eq!(estimate.quarterly_payment, dec!(4741.13));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::calculations::common::{max, percent_of, round_half_up};
use crate::calculations::federal::FederalTaxCalculator;
use crate::calculations::recommendations::{EstimateSignals, estimate_recommendations};
use crate::calculations::schedule::year_range;
use crate::{LedgerTotals, MAX_AMOUNT, TaxTable};

/// Errors that can occur while building an estimate.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EstimateError {
    #[error("{field} must not be negative, got {value}")]
    NegativeAmount { field: &'static str, value: Decimal },

    #[error("deductible expenses {deductible} exceed total expenses {total}")]
    DeductibleExceedsTotal { deductible: Decimal, total: Decimal },

    #[error("tax year {0} is out of range")]
    InvalidYear(i32),

    #[error("{field} must not exceed {max}, got {value}")]
    AmountTooLarge {
        field: &'static str,
        value: Decimal,
        max: Decimal,
    },

    #[error("{0} is too large to total")]
    Overflow(&'static str),
}

pub(crate) fn ensure_non_negative(
    field: &'static str,
    value: Decimal,
) -> Result<(), EstimateError> {
    if value < Decimal::ZERO {
        return Err(EstimateError::NegativeAmount { field, value });
    }
    Ok(())
}

/// Non-negative and at most [`MAX_AMOUNT`].
pub(crate) fn ensure_amount(
    field: &'static str,
    value: Decimal,
) -> Result<(), EstimateError> {
    ensure_non_negative(field, value)?;
    if value > MAX_AMOUNT {
        return Err(EstimateError::AmountTooLarge {
            field,
            value,
            max: MAX_AMOUNT,
        });
    }
    Ok(())
}

/// Lines 1-5 for one income/deduction pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxProjection {
    pub total_income: Decimal,
    pub deductible_expenses: Decimal,
    pub taxable_income: Decimal,
    pub federal_tax: Decimal,
    pub self_employment_tax: Decimal,
    pub total_tax: Decimal,
    pub effective_rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxEstimate {
    pub year: i32,
    pub total_income: Decimal,
    pub non_taxable_income: Decimal,
    pub total_expenses: Decimal,
    pub deductible_expenses: Decimal,
    pub taxable_income: Decimal,
    /// Taxable income after the standard deduction.
    pub federal_taxable_income: Decimal,
    pub federal_tax: Decimal,
    pub self_employment_tax: Decimal,
    pub total_tax: Decimal,
    pub effective_rate: Decimal,
    pub marginal_rate: Decimal,
    pub quarterly_payment: Decimal,
    pub standard_deduction: Decimal,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct EstimateCalculator<'a> {
    table: &'a TaxTable,
}

impl<'a> EstimateCalculator<'a> {
    pub fn new(table: &'a TaxTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &'a TaxTable {
        self.table
    }

    /// Full estimate for `year` including recommendations.
    ///
    /// # Errors
    ///
    /// Fails on any negative total, on deductible expenses above total
    /// expenses, or on a year whose calendar cannot be represented.
    pub fn estimate(
        &self,
        totals: &LedgerTotals,
        year: i32,
    ) -> Result<TaxEstimate, EstimateError> {
        year_range(year)?;
        ensure_non_negative("total_expenses", totals.total_expenses)?;
        ensure_non_negative("non_taxable_income", totals.non_taxable_income)?;
        if totals.deductible_expenses > totals.total_expenses {
            return Err(EstimateError::DeductibleExceedsTotal {
                deductible: totals.deductible_expenses,
                total: totals.total_expenses,
            });
        }

        let projection = self.project(totals.total_income, totals.deductible_expenses)?;
        let federal = FederalTaxCalculator::new(self.table);

        let marginal_rate = federal.marginal_rate(projection.taxable_income);
        let quarterly_payment = self.line_7_quarterly_payment(projection.total_tax);
        let recommendations = estimate_recommendations(&EstimateSignals {
            total_income: projection.total_income,
            deductible_expenses: projection.deductible_expenses,
            total_expenses: totals.total_expenses,
            effective_rate: projection.effective_rate,
        });

        debug!(
            year,
            total_tax = %projection.total_tax,
            effective_rate = %projection.effective_rate,
            "built tax estimate"
        );

        Ok(TaxEstimate {
            year,
            total_income: projection.total_income,
            non_taxable_income: round_half_up(totals.non_taxable_income),
            total_expenses: round_half_up(totals.total_expenses),
            deductible_expenses: projection.deductible_expenses,
            taxable_income: projection.taxable_income,
            federal_taxable_income: round_half_up(
                federal.adjusted_income(projection.taxable_income),
            ),
            federal_tax: projection.federal_tax,
            self_employment_tax: projection.self_employment_tax,
            total_tax: projection.total_tax,
            effective_rate: projection.effective_rate,
            marginal_rate,
            quarterly_payment,
            standard_deduction: self.table.standard_deduction(),
            recommendations,
        })
    }

    /// Lines 1-5 without recommendations.
    ///
    /// # Errors
    ///
    /// [`EstimateError::NegativeAmount`] if either input is negative.
    pub fn project(
        &self,
        total_income: Decimal,
        deductible_expenses: Decimal,
    ) -> Result<TaxProjection, EstimateError> {
        ensure_non_negative("total_income", total_income)?;
        ensure_non_negative("deductible_expenses", deductible_expenses)?;

        let total_income = round_half_up(total_income);
        let deductible_expenses = round_half_up(deductible_expenses);

        let taxable_income = self.line_1_taxable_income(total_income, deductible_expenses);
        let self_employment_tax = self.line_2_self_employment_tax(total_income);
        let federal_tax = FederalTaxCalculator::new(self.table).federal_tax(taxable_income);
        let total_tax = federal_tax + self_employment_tax;
        let effective_rate = percent_of(total_tax, total_income);

        Ok(TaxProjection {
            total_income,
            deductible_expenses,
            taxable_income,
            federal_tax,
            self_employment_tax,
            total_tax,
            effective_rate,
        })
    }

    fn line_1_taxable_income(
        &self,
        total_income: Decimal,
        deductible_expenses: Decimal,
    ) -> Decimal {
        max(Decimal::ZERO, total_income - deductible_expenses)
    }

    fn line_2_self_employment_tax(
        &self,
        total_income: Decimal,
    ) -> Decimal {
        round_half_up(total_income * self.table.se_tax_rate())
    }

    fn line_7_quarterly_payment(
        &self,
        total_tax: Decimal,
    ) -> Decimal {
        round_half_up(total_tax / Decimal::from(4))
    }
}
