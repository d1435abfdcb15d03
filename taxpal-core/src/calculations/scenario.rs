//! What-if comparison of the current ledger against hypothetical changes.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::TaxTable;
use crate::calculations::common::checked_total;
use crate::calculations::estimate::{
    EstimateCalculator, EstimateError, TaxProjection, ensure_amount,
};

/// Hypothetical changes; every field defaults to zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScenarioDelta {
    pub additional_income: Decimal,
    pub additional_expenses: Decimal,
    pub retirement_contribution: Decimal,
}

impl ScenarioDelta {
    /// Each change must lie within `0..=MAX_AMOUNT`.
    pub fn validate(&self) -> Result<(), EstimateError> {
        ensure_amount("additional_income", self.additional_income)?;
        ensure_amount("additional_expenses", self.additional_expenses)?;
        ensure_amount("retirement_contribution", self.retirement_contribution)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioDifference {
    pub income: Decimal,
    pub expenses: Decimal,
    pub retirement_contribution: Decimal,
    /// Positive when the scenario owes less.
    pub tax_savings: Decimal,
    /// Extra income kept after the change in tax.
    pub net_impact: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioComparison {
    pub current: TaxProjection,
    pub scenario: TaxProjection,
    pub difference: ScenarioDifference,
}

#[derive(Debug, Clone, Copy)]
pub struct ScenarioComparator<'a> {
    estimator: EstimateCalculator<'a>,
}

impl<'a> ScenarioComparator<'a> {
    pub fn new(table: &'a TaxTable) -> Self {
        Self {
            estimator: EstimateCalculator::new(table),
        }
    }

    /// Projects the current figures and the figures with `delta` applied.
    ///
    /// Additional expenses and retirement contributions both add to the
    /// deductible amount.
    pub fn compare(
        &self,
        current_income: Decimal,
        current_deductible: Decimal,
        delta: &ScenarioDelta,
    ) -> Result<ScenarioComparison, EstimateError> {
        delta.validate()?;

        let current = self.estimator.project(current_income, current_deductible)?;
        let scenario_income = checked_total([current_income, delta.additional_income])
            .ok_or(EstimateError::Overflow("scenario income"))?;
        let scenario_deductible = checked_total([
            current_deductible,
            delta.additional_expenses,
            delta.retirement_contribution,
        ])
        .ok_or(EstimateError::Overflow("scenario deductions"))?;
        let scenario = self.estimator.project(scenario_income, scenario_deductible)?;

        let difference = ScenarioDifference {
            income: delta.additional_income,
            expenses: delta.additional_expenses,
            retirement_contribution: delta.retirement_contribution,
            tax_savings: current.total_tax - scenario.total_tax,
            net_impact: delta.additional_income - (scenario.total_tax - current.total_tax),
        };

        Ok(ScenarioComparison {
            current,
            scenario,
            difference,
        })
    }
}
