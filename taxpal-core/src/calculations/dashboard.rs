use std::cmp::Reverse;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::{percent_of, round_half_up};
use crate::calculations::estimate::{EstimateCalculator, EstimateError};
use crate::calculations::report::{
    ExpenseCategoryTotal, IncomeCategoryTotal, MonthlyTotal, expenses_by_category,
    income_by_category, monthly_totals,
};
use crate::{ExpenseRecord, IncomeRecord, LedgerTotals, TaxTable};

/// Entries of each kind listed under `recent` in the summary.
pub const RECENT_ENTRIES: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardOverview {
    pub year: i32,
    pub total_income: Decimal,
    pub non_taxable_income: Decimal,
    pub total_expenses: Decimal,
    pub deductible_expenses: Decimal,
    pub estimated_tax: Decimal,
    pub quarterly_tax: Decimal,
    pub income_entries: usize,
    pub expense_entries: usize,
    /// Deductible share of all expenses, in percent.
    pub deduction_coverage: Decimal,
    pub monthly_breakdown: Vec<MonthlyTotal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthTrend {
    pub month: u32,
    pub income: Decimal,
    pub expenses: Decimal,
    pub profit: Decimal,
    pub income_count: usize,
    pub expense_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTrends {
    pub year: i32,
    pub months: Vec<MonthTrend>,
}

pub fn overview(
    table: &TaxTable,
    year: i32,
    incomes: &[IncomeRecord],
    expenses: &[ExpenseRecord],
) -> Result<DashboardOverview, EstimateError> {
    let totals = LedgerTotals::from_records(incomes, expenses)?;
    let estimate = EstimateCalculator::new(table).estimate(&totals, year)?;

    Ok(DashboardOverview {
        year,
        total_income: estimate.total_income,
        non_taxable_income: estimate.non_taxable_income,
        total_expenses: estimate.total_expenses,
        deductible_expenses: estimate.deductible_expenses,
        estimated_tax: estimate.total_tax,
        quarterly_tax: estimate.quarterly_payment,
        income_entries: totals.income_entries,
        expense_entries: totals.expense_entries,
        deduction_coverage: percent_of(totals.deductible_expenses, totals.total_expenses),
        monthly_breakdown: monthly_totals(year, incomes, expenses),
    })
}

pub fn monthly_trends(
    year: i32,
    incomes: &[IncomeRecord],
    expenses: &[ExpenseRecord],
) -> Result<MonthlyTrends, EstimateError> {
    // per-month sums are bounded by the year's totals
    LedgerTotals::from_records(incomes, expenses)?;

    let months = monthly_totals(year, incomes, expenses)
        .into_iter()
        .map(|row| MonthTrend {
            month: row.month_number,
            income: row.income,
            expenses: row.expenses,
            profit: row.net_income,
            income_count: row.income_count,
            expense_count: row.expense_count,
        })
        .collect();

    Ok(MonthlyTrends { year, months })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeSummary {
    pub total: Decimal,
    pub monthly: Decimal,
    pub yearly: Decimal,
    pub by_category: Vec<IncomeCategoryTotal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseSummary {
    pub total: Decimal,
    pub monthly: Decimal,
    pub yearly: Decimal,
    /// All-time deductible expenses.
    pub deductible: Decimal,
    pub by_category: Vec<ExpenseCategoryTotal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitSummary {
    pub total: Decimal,
    pub monthly: Decimal,
    pub yearly: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentEntries {
    pub income: Vec<IncomeRecord>,
    pub expenses: Vec<ExpenseRecord>,
}

/// The current year's estimate, reduced to the figures the dashboard shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxSnapshot {
    pub year: i32,
    pub taxable_income: Decimal,
    pub deductible_amount: Decimal,
    pub estimated_tax: Decimal,
    pub quarterly_payment: Decimal,
    pub effective_rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub income: IncomeSummary,
    pub expenses: ExpenseSummary,
    pub profit: ProfitSummary,
    pub recent: RecentEntries,
    pub tax_estimate: TaxSnapshot,
}

/// All-time, current-year and current-month figures for one user.
///
/// `today` picks the year and month; `incomes` and `expenses` are the
/// user's whole ledger. The tax snapshot runs the bracket engine over the
/// current year only.
pub fn summary(
    table: &TaxTable,
    today: NaiveDate,
    incomes: &[IncomeRecord],
    expenses: &[ExpenseRecord],
) -> Result<DashboardSummary, EstimateError> {
    let year = today.year();
    let in_year = |date: NaiveDate| date.year() == year;
    let in_month = |date: NaiveDate| in_year(date) && date.month() == today.month();

    let all_time = LedgerTotals::from_records(incomes, expenses)?;
    let yearly = totals_where(incomes, expenses, in_year)?;
    let monthly = totals_where(incomes, expenses, in_month)?;
    let estimate = EstimateCalculator::new(table).estimate(&yearly, year)?;

    Ok(DashboardSummary {
        income: IncomeSummary {
            total: round_half_up(all_time.gross_income()),
            monthly: round_half_up(monthly.gross_income()),
            yearly: round_half_up(yearly.gross_income()),
            by_category: income_by_category(incomes, all_time.gross_income()),
        },
        expenses: ExpenseSummary {
            total: round_half_up(all_time.total_expenses),
            monthly: round_half_up(monthly.total_expenses),
            yearly: round_half_up(yearly.total_expenses),
            deductible: round_half_up(all_time.deductible_expenses),
            by_category: expenses_by_category(expenses, all_time.total_expenses),
        },
        profit: ProfitSummary {
            total: round_half_up(all_time.net_income()),
            monthly: round_half_up(monthly.net_income()),
            yearly: round_half_up(yearly.net_income()),
        },
        recent: RecentEntries {
            income: most_recent(incomes, |i| (i.date, i.id)),
            expenses: most_recent(expenses, |e| (e.date, e.id)),
        },
        tax_estimate: TaxSnapshot {
            year,
            taxable_income: estimate.taxable_income,
            deductible_amount: estimate.deductible_expenses,
            estimated_tax: estimate.total_tax,
            quarterly_payment: estimate.quarterly_payment,
            effective_rate: estimate.effective_rate,
        },
    })
}

fn totals_where(
    incomes: &[IncomeRecord],
    expenses: &[ExpenseRecord],
    keep: impl Fn(NaiveDate) -> bool,
) -> Result<LedgerTotals, EstimateError> {
    let incomes: Vec<IncomeRecord> = incomes.iter().filter(|i| keep(i.date)).cloned().collect();
    let expenses: Vec<ExpenseRecord> = expenses.iter().filter(|e| keep(e.date)).cloned().collect();
    LedgerTotals::from_records(&incomes, &expenses)
}

/// Newest first by date, then by id.
fn most_recent<T: Clone>(
    records: &[T],
    key: impl Fn(&T) -> (NaiveDate, i64),
) -> Vec<T> {
    let mut records = records.to_vec();
    records.sort_by_key(|record| Reverse(key(record)));
    records.truncate(RECENT_ENTRIES);
    records
}
