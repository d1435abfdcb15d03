//! Immutable tax-rate configuration consumed by the estimate engine.
//!
//! A [`TaxTable`] is built once at startup (either from
//! [`TaxTable::single_filer_2024`] or from a loaded bracket schedule) and is
//! then shared by reference. Construction validates that the brackets cover
//! `[0, ∞)` without gaps or overlaps, so the calculators never have to.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{FilingStatusCode, TaxBracket};

/// 2024 standard deduction for single filers.
pub const STANDARD_DEDUCTION_2024: Decimal = Decimal::from_parts(13850, 0, 0, false, 0);

/// Flat approximation of combined Social Security and Medicare SE tax (14.13%).
pub const SE_TAX_RATE: Decimal = Decimal::from_parts(1413, 0, 0, false, 4);

/// Errors raised when a tax table fails validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TaxTableError {
    #[error("no tax brackets provided")]
    NoBrackets,

    #[error("first bracket must start at 0, got {0}")]
    FirstBracketNotZero(Decimal),

    #[error("bracket {index} starts at {found} but the previous bracket ends at {expected}")]
    Discontinuous {
        index: usize,
        expected: Decimal,
        found: Decimal,
    },

    #[error("bracket {0} has no upper bound but is not the last bracket")]
    UnboundedBeforeEnd(usize),

    #[error("last bracket must be unbounded")]
    BoundedTopBracket,

    #[error("bracket {index} has an upper bound {max} not above its lower bound {min}")]
    EmptyBracket {
        index: usize,
        min: Decimal,
        max: Decimal,
    },

    #[error("bracket {index} has rate {rate} outside [0, 1]")]
    InvalidRate { index: usize, rate: Decimal },

    #[error("standard deduction must be non-negative, got {0}")]
    NegativeStandardDeduction(Decimal),

    #[error("self-employment tax rate must be between 0 and 1, got {0}")]
    InvalidSeTaxRate(Decimal),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxTable {
    tax_year: i32,
    filing_status: FilingStatusCode,
    brackets: Vec<TaxBracket>,
    standard_deduction: Decimal,
    se_tax_rate: Decimal,
}

impl TaxTable {
    /// Builds a validated table.
    ///
    /// # Errors
    ///
    /// Returns [`TaxTableError`] if the brackets are empty, do not start at
    /// zero, leave gaps, overlap, end with a bounded bracket, or carry a rate
    /// outside `[0, 1]`; or if the deduction or SE rate is out of range.
    pub fn new(
        tax_year: i32,
        filing_status: FilingStatusCode,
        brackets: Vec<TaxBracket>,
        standard_deduction: Decimal,
        se_tax_rate: Decimal,
    ) -> Result<Self, TaxTableError> {
        validate_brackets(&brackets)?;

        if standard_deduction < Decimal::ZERO {
            return Err(TaxTableError::NegativeStandardDeduction(standard_deduction));
        }
        if se_tax_rate < Decimal::ZERO || se_tax_rate > Decimal::ONE {
            return Err(TaxTableError::InvalidSeTaxRate(se_tax_rate));
        }

        Ok(Self {
            tax_year,
            filing_status,
            brackets,
            standard_deduction,
            se_tax_rate,
        })
    }

    /// 2024 single-filer brackets, $13,850 standard deduction, 14.13% SE rate.
    pub fn single_filer_2024() -> Self {
        Self {
            tax_year: 2024,
            filing_status: FilingStatusCode::Single,
            brackets: single_filer_2024_brackets(),
            standard_deduction: STANDARD_DEDUCTION_2024,
            se_tax_rate: SE_TAX_RATE,
        }
    }

    pub fn tax_year(&self) -> i32 {
        self.tax_year
    }

    pub fn filing_status(&self) -> FilingStatusCode {
        self.filing_status
    }

    /// Brackets in ascending order.
    pub fn brackets(&self) -> &[TaxBracket] {
        &self.brackets
    }

    pub fn standard_deduction(&self) -> Decimal {
        self.standard_deduction
    }

    pub fn se_tax_rate(&self) -> Decimal {
        self.se_tax_rate
    }

    pub fn top_bracket(&self) -> &TaxBracket {
        // Non-empty by construction.
        &self.brackets[self.brackets.len() - 1]
    }
}

impl Default for TaxTable {
    fn default() -> Self {
        Self::single_filer_2024()
    }
}

fn single_filer_2024_brackets() -> Vec<TaxBracket> {
    let bounds: [(i64, Option<i64>, i64); 7] = [
        (0, Some(11_000), 10),
        (11_000, Some(44_725), 12),
        (44_725, Some(95_375), 22),
        (95_375, Some(182_050), 24),
        (182_050, Some(231_250), 32),
        (231_250, Some(578_125), 35),
        (578_125, None, 37),
    ];

    bounds
        .into_iter()
        .map(|(min, max, pct)| {
            TaxBracket::new(
                Decimal::from(min),
                max.map(Decimal::from),
                Decimal::new(pct, 2),
            )
        })
        .collect()
}

fn validate_brackets(brackets: &[TaxBracket]) -> Result<(), TaxTableError> {
    let first = brackets.first().ok_or(TaxTableError::NoBrackets)?;
    if !first.min_income.is_zero() {
        return Err(TaxTableError::FirstBracketNotZero(first.min_income));
    }

    let last_index = brackets.len() - 1;
    let mut previous_max = Decimal::ZERO;

    for (index, bracket) in brackets.iter().enumerate() {
        if bracket.tax_rate < Decimal::ZERO || bracket.tax_rate > Decimal::ONE {
            return Err(TaxTableError::InvalidRate {
                index,
                rate: bracket.tax_rate,
            });
        }

        if bracket.min_income != previous_max {
            return Err(TaxTableError::Discontinuous {
                index,
                expected: previous_max,
                found: bracket.min_income,
            });
        }

        match bracket.max_income {
            Some(_) if index == last_index => return Err(TaxTableError::BoundedTopBracket),
            Some(max) if max <= bracket.min_income => {
                return Err(TaxTableError::EmptyBracket {
                    index,
                    min: bracket.min_income,
                    max,
                });
            }
            Some(max) => previous_max = max,
            None if index != last_index => return Err(TaxTableError::UnboundedBeforeEnd(index)),
            None => {}
        }
    }

    Ok(())
}
