//! Progressive federal income tax over a [`TaxTable`].
//!
//! The standard deduction is applied exactly once, here. Callers pass income
//! less deductible expenses and never subtract the deduction themselves.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use taxpal_core::TaxTable;
//! use taxpal_core::calculations::FederalTaxCalculator;
//!
//! let table = TaxTable::single_filer_2024();
//! let calculator = FederalTaxCalculator::new(&table);
//!
//! // 70,000 - 13,850 = 56,150 taxed as 1,100 + 4,047 + 2,513.50
//! assert_eq!(calculator.federal_tax(dec!(70000)), dec!(7660.50));
//! assert_eq!(calculator.marginal_rate(dec!(70000)), dec!(22));
//! ```

use rust_decimal::Decimal;

use crate::TaxTable;
use crate::calculations::common::{max, min, round_half_up};

#[derive(Debug, Clone, Copy)]
pub struct FederalTaxCalculator<'a> {
    table: &'a TaxTable,
}

impl<'a> FederalTaxCalculator<'a> {
    pub fn new(table: &'a TaxTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &'a TaxTable {
        self.table
    }

    /// Income left after the standard deduction, floored at zero.
    pub fn adjusted_income(
        &self,
        taxable_income: Decimal,
    ) -> Decimal {
        max(
            Decimal::ZERO,
            taxable_income - self.table.standard_deduction(),
        )
    }

    /// Walks the brackets in ascending order, taxing the slice of income that
    /// falls inside each one. Rounded to cents.
    pub fn federal_tax(
        &self,
        taxable_income: Decimal,
    ) -> Decimal {
        let mut remaining = self.adjusted_income(taxable_income);
        let mut tax = Decimal::ZERO;

        for bracket in self.table.brackets() {
            if remaining <= Decimal::ZERO {
                break;
            }

            let taxed_here = match bracket.width() {
                Some(width) => min(remaining, width),
                None => remaining,
            };
            tax += taxed_here * bracket.tax_rate;
            remaining -= taxed_here;
        }

        round_half_up(tax)
    }

    /// Rate (as a percentage) of the bracket the next dollar falls into.
    pub fn marginal_rate(
        &self,
        taxable_income: Decimal,
    ) -> Decimal {
        let adjusted = self.adjusted_income(taxable_income);

        let bracket = self
            .table
            .brackets()
            .iter()
            .find(|bracket| bracket.covers(adjusted))
            .unwrap_or_else(|| self.table.top_bracket());

        (bracket.tax_rate * Decimal::ONE_HUNDRED).normalize()
    }
}
