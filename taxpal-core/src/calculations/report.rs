//! Annual report and year-over-year summary over a user's ledger.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calculations::common::{percent_change, percent_of, round_half_up};
use crate::calculations::estimate::{EstimateCalculator, EstimateError, TaxEstimate};
use crate::calculations::recommendations::{TREND_RULES, TrendSignals, evaluate};
use crate::calculations::schedule::{QuarterlyPayment, TaxDeadline, quarterly_schedule, tax_deadlines};
use crate::{ExpenseCategory, ExpenseRecord, IncomeCategory, IncomeRecord, LedgerTotals, TaxTable};

pub const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_income: Decimal,
    pub non_taxable_income: Decimal,
    pub total_expenses: Decimal,
    pub deductible_expenses: Decimal,
    pub taxable_income: Decimal,
    pub estimated_tax: Decimal,
    pub net_income: Decimal,
    pub effective_rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeCategoryTotal {
    pub category: IncomeCategory,
    pub amount: Decimal,
    pub count: usize,
    /// Share of gross income.
    pub percentage: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseCategoryTotal {
    pub category: ExpenseCategory,
    pub amount: Decimal,
    pub count: usize,
    pub deductible_amount: Decimal,
    /// Share of total expenses.
    pub percentage: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTotal {
    pub month: String,
    pub month_number: u32,
    pub income: Decimal,
    pub expenses: Decimal,
    pub net_income: Decimal,
    pub income_count: usize,
    pub expense_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportBreakdown {
    pub income_by_category: Vec<IncomeCategoryTotal>,
    pub expenses_by_category: Vec<ExpenseCategoryTotal>,
    pub monthly_breakdown: Vec<MonthlyTotal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledPayment {
    #[serde(flatten)]
    pub payment: QuarterlyPayment,
    pub paid: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportTax {
    pub quarterly_payments: Vec<ScheduledPayment>,
    pub deadlines: Vec<TaxDeadline>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDetails {
    pub income_entries: usize,
    pub expense_entries: usize,
    pub avg_monthly_income: Decimal,
    pub avg_monthly_expenses: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnualReport {
    pub year: i32,
    pub generated_at: DateTime<Utc>,
    pub summary: ReportSummary,
    pub breakdown: ReportBreakdown,
    pub tax: ReportTax,
    pub details: ReportDetails,
}

#[derive(Debug, Clone, Copy)]
pub struct ReportGenerator<'a> {
    estimator: EstimateCalculator<'a>,
}

impl<'a> ReportGenerator<'a> {
    pub fn new(table: &'a TaxTable) -> Self {
        Self {
            estimator: EstimateCalculator::new(table),
        }
    }

    /// Builds the annual report for `year` from that year's entries.
    ///
    /// Entries dated outside `year` still count towards the totals but are
    /// left out of the monthly breakdown.
    pub fn annual(
        &self,
        year: i32,
        incomes: &[IncomeRecord],
        expenses: &[ExpenseRecord],
        generated_at: DateTime<Utc>,
    ) -> Result<AnnualReport, EstimateError> {
        let totals = LedgerTotals::from_records(incomes, expenses)?;
        let estimate = self.estimator.estimate(&totals, year)?;
        let schedule = quarterly_schedule(estimate.total_tax, year)?;
        let twelve = Decimal::from(12);

        Ok(AnnualReport {
            year,
            generated_at,
            summary: summarize(&totals, &estimate),
            breakdown: ReportBreakdown {
                income_by_category: income_by_category(incomes, totals.gross_income()),
                expenses_by_category: expenses_by_category(expenses, totals.total_expenses),
                monthly_breakdown: monthly_totals(year, incomes, expenses),
            },
            tax: ReportTax {
                quarterly_payments: schedule
                    .schedule
                    .into_iter()
                    .map(|payment| ScheduledPayment {
                        payment,
                        paid: false,
                    })
                    .collect(),
                deadlines: tax_deadlines(year)?,
                recommendations: estimate.recommendations,
            },
            details: ReportDetails {
                income_entries: totals.income_entries,
                expense_entries: totals.expense_entries,
                avg_monthly_income: round_half_up(totals.gross_income() / twelve),
                avg_monthly_expenses: round_half_up(totals.total_expenses / twelve),
            },
        })
    }
}

fn summarize(
    totals: &LedgerTotals,
    estimate: &TaxEstimate,
) -> ReportSummary {
    ReportSummary {
        total_income: estimate.total_income,
        non_taxable_income: estimate.non_taxable_income,
        total_expenses: estimate.total_expenses,
        deductible_expenses: estimate.deductible_expenses,
        taxable_income: estimate.taxable_income,
        estimated_tax: estimate.total_tax,
        net_income: round_half_up(totals.net_income()),
        effective_rate: estimate.effective_rate,
    }
}

/// Grouped by category, largest amount first.
///
/// Group sums are bounded by the totals from
/// [`LedgerTotals::from_records`], which callers compute first.
pub fn income_by_category(
    incomes: &[IncomeRecord],
    gross_income: Decimal,
) -> Vec<IncomeCategoryTotal> {
    let mut groups: BTreeMap<IncomeCategory, (Decimal, usize)> = BTreeMap::new();
    for income in incomes {
        let entry = groups.entry(income.category).or_default();
        entry.0 += income.amount;
        entry.1 += 1;
    }

    let mut rows: Vec<_> = groups
        .into_iter()
        .map(|(category, (amount, count))| IncomeCategoryTotal {
            category,
            amount: round_half_up(amount),
            count,
            percentage: percent_of(amount, gross_income),
        })
        .collect();
    rows.sort_by(|a, b| b.amount.cmp(&a.amount));
    rows
}

/// Grouped by category, largest amount first.
pub fn expenses_by_category(
    expenses: &[ExpenseRecord],
    total_expenses: Decimal,
) -> Vec<ExpenseCategoryTotal> {
    let mut groups: BTreeMap<ExpenseCategory, (Decimal, usize, Decimal)> = BTreeMap::new();
    for expense in expenses {
        let entry = groups.entry(expense.category).or_default();
        entry.0 += expense.amount;
        entry.1 += 1;
        if expense.is_deductible {
            entry.2 += expense.amount;
        }
    }

    let mut rows: Vec<_> = groups
        .into_iter()
        .map(
            |(category, (amount, count, deductible_amount))| ExpenseCategoryTotal {
                category,
                amount: round_half_up(amount),
                count,
                deductible_amount: round_half_up(deductible_amount),
                percentage: percent_of(amount, total_expenses),
            },
        )
        .collect();
    rows.sort_by(|a, b| b.amount.cmp(&a.amount));
    rows
}

/// Twelve rows, January first, summing every entry dated in `year`.
pub fn monthly_totals(
    year: i32,
    incomes: &[IncomeRecord],
    expenses: &[ExpenseRecord],
) -> Vec<MonthlyTotal> {
    let mut months: Vec<MonthlyTotal> = MONTH_NAMES
        .iter()
        .zip(1u32..)
        .map(|(name, month_number)| MonthlyTotal {
            month: (*name).to_string(),
            month_number,
            income: Decimal::ZERO,
            expenses: Decimal::ZERO,
            net_income: Decimal::ZERO,
            income_count: 0,
            expense_count: 0,
        })
        .collect();

    for income in incomes {
        if let Some(row) = month_slot(&mut months, year, income.date) {
            row.income += income.amount;
            row.income_count += 1;
        }
    }
    for expense in expenses {
        if let Some(row) = month_slot(&mut months, year, expense.date) {
            row.expenses += expense.amount;
            row.expense_count += 1;
        }
    }

    for row in &mut months {
        row.income = round_half_up(row.income);
        row.expenses = round_half_up(row.expenses);
        row.net_income = row.income - row.expenses;
    }
    months
}

fn month_slot(
    months: &mut [MonthlyTotal],
    year: i32,
    date: NaiveDate,
) -> Option<&mut MonthlyTotal> {
    if date.year() != year {
        return None;
    }
    months.get_mut(date.month0() as usize)
}

/// One year's figures; `total_income` counts taxable and non-taxable entries
/// alike, so `total_income - total_expenses == net_income`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearTotals {
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub deductible_expenses: Decimal,
    pub net_income: Decimal,
    pub entry_count: usize,
}

impl From<&LedgerTotals> for YearTotals {
    fn from(totals: &LedgerTotals) -> Self {
        Self {
            total_income: round_half_up(totals.gross_income()),
            total_expenses: round_half_up(totals.total_expenses),
            deductible_expenses: round_half_up(totals.deductible_expenses),
            net_income: round_half_up(totals.net_income()),
            entry_count: totals.income_entries + totals.expense_entries,
        }
    }
}

/// Percentage changes against the previous year; `0` where the previous
/// figure is not positive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearChanges {
    pub income: Decimal,
    pub expenses: Decimal,
    pub deductible: Decimal,
    pub net_income: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearOverYearSummary {
    pub current_year: i32,
    pub current: YearTotals,
    pub previous: YearTotals,
    pub changes: YearChanges,
    pub recommendations: Vec<String>,
}

pub fn year_over_year(
    current_year: i32,
    current: &LedgerTotals,
    previous: &LedgerTotals,
) -> YearOverYearSummary {
    let current = YearTotals::from(current);
    let previous = YearTotals::from(previous);

    let changes = YearChanges {
        income: percent_change(current.total_income, previous.total_income),
        expenses: percent_change(current.total_expenses, previous.total_expenses),
        deductible: percent_change(current.deductible_expenses, previous.deductible_expenses),
        net_income: percent_change(current.net_income, previous.net_income),
    };

    let recommendations = evaluate(
        TREND_RULES,
        &TrendSignals {
            income_change: changes.income,
            expense_change: changes.expenses,
            total_income: current.total_income,
            deductible_expenses: current.deductible_expenses,
        },
    );

    YearOverYearSummary {
        current_year,
        current,
        previous,
        changes,
        recommendations,
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;

    use crate::{ExpenseCategory, ExpenseRecord, IncomeCategory, IncomeRecord, PaymentMethod, Platform};

    pub fn income(
        date: (i32, u32, u32),
        amount: Decimal,
        category: IncomeCategory,
        taxable: bool,
    ) -> IncomeRecord {
        let now = Utc::now();
        IncomeRecord {
            id: 0,
            user_id: "u1".to_string(),
            source: "Client".to_string(),
            description: "Work".to_string(),
            amount,
            category,
            platform: Platform::Other,
            invoice_number: None,
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            is_recurring: false,
            taxable,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn expense(
        date: (i32, u32, u32),
        amount: Decimal,
        category: ExpenseCategory,
        is_deductible: bool,
    ) -> ExpenseRecord {
        let now = Utc::now();
        ExpenseRecord {
            id: 0,
            user_id: "u1".to_string(),
            description: "Purchase".to_string(),
            amount,
            category,
            payment_method: PaymentMethod::CreditCard,
            receipt_url: None,
            vendor: None,
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            is_recurring: false,
            is_deductible,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::fixtures::{expense, income};
    use super::*;

    fn ledger() -> (Vec<IncomeRecord>, Vec<ExpenseRecord>) {
        let incomes = vec![
            income((2024, 1, 10), dec!(30000), IncomeCategory::Freelance, true),
            income((2024, 3, 5), dec!(50000), IncomeCategory::Consulting, true),
            income((2024, 3, 20), dec!(20000), IncomeCategory::Investment, false),
        ];
        let expenses = vec![
            expense((2024, 1, 15), dec!(6000), ExpenseCategory::Software, true),
            expense((2024, 3, 1), dec!(4000), ExpenseCategory::Equipment, true),
            expense((2024, 12, 31), dec!(2500), ExpenseCategory::Meals, false),
        ];
        (incomes, expenses)
    }

    // ===== annual report tests =====

    #[test]
    fn annual_summary_uses_the_bracket_engine() {
        let table = TaxTable::single_filer_2024();
        let (incomes, expenses) = ledger();

        let report = ReportGenerator::new(&table)
            .annual(2024, &incomes, &expenses, Utc::now())
            .unwrap();

        assert_eq!(report.summary.total_income, dec!(80000));
        assert_eq!(report.summary.non_taxable_income, dec!(20000));
        assert_eq!(report.summary.deductible_expenses, dec!(10000));
        assert_eq!(report.summary.taxable_income, dec!(70000));
        assert_eq!(report.summary.estimated_tax, dec!(18964.50));
        assert_eq!(report.summary.net_income, dec!(87500));
        assert_eq!(report.summary.effective_rate, dec!(23.71));
    }

    #[test]
    fn annual_breakdowns_are_sorted_by_amount() {
        let table = TaxTable::single_filer_2024();
        let (incomes, expenses) = ledger();

        let report = ReportGenerator::new(&table)
            .annual(2024, &incomes, &expenses, Utc::now())
            .unwrap();

        let income_rows: Vec<(IncomeCategory, Decimal)> = report
            .breakdown
            .income_by_category
            .iter()
            .map(|r| (r.category, r.percentage))
            .collect();
        assert_eq!(
            income_rows,
            vec![
                (IncomeCategory::Consulting, dec!(50)),
                (IncomeCategory::Freelance, dec!(30)),
                (IncomeCategory::Investment, dec!(20)),
            ]
        );

        let meals = &report.breakdown.expenses_by_category[2];
        assert_eq!(meals.category, ExpenseCategory::Meals);
        assert_eq!(meals.deductible_amount, dec!(0));
        assert_eq!(meals.percentage, dec!(20));
    }

    #[test]
    fn annual_monthly_breakdown_has_twelve_rows() {
        let table = TaxTable::single_filer_2024();
        let (incomes, expenses) = ledger();

        let report = ReportGenerator::new(&table)
            .annual(2024, &incomes, &expenses, Utc::now())
            .unwrap();

        let months = &report.breakdown.monthly_breakdown;
        assert_eq!(months.len(), 12);
        assert_eq!(months[0].month, "Jan");
        assert_eq!(months[0].net_income, dec!(24000));
        assert_eq!(months[2].income, dec!(70000));
        assert_eq!(months[2].income_count, 2);
        assert_eq!(months[11].month_number, 12);
        assert_eq!(months[11].net_income, dec!(-2500));
    }

    #[test]
    fn annual_tax_section_lists_unpaid_quarters_and_deadlines() {
        let table = TaxTable::single_filer_2024();
        let (incomes, expenses) = ledger();

        let report = ReportGenerator::new(&table)
            .annual(2024, &incomes, &expenses, Utc::now())
            .unwrap();

        assert_eq!(report.tax.quarterly_payments.len(), 4);
        assert!(report.tax.quarterly_payments.iter().all(|p| !p.paid));
        assert_eq!(report.tax.quarterly_payments[0].payment.amount, dec!(4741.13));
        assert_eq!(report.tax.deadlines.len(), 6);
        assert_eq!(report.details.avg_monthly_income, dec!(8333.33));
        assert_eq!(report.details.avg_monthly_expenses, dec!(1041.67));

        let json = serde_json::to_value(&report.tax.quarterly_payments[0]).unwrap();
        assert_eq!(json["paid"], false);
        assert_eq!(json["dueDate"], "2024-04-15");
    }

    #[test]
    fn empty_year_report_has_zero_percentages() {
        let table = TaxTable::single_filer_2024();

        let report = ReportGenerator::new(&table)
            .annual(2024, &[], &[], Utc::now())
            .unwrap();

        assert!(report.breakdown.income_by_category.is_empty());
        assert_eq!(report.summary.effective_rate, dec!(0));
        assert_eq!(report.details.avg_monthly_income, dec!(0));
    }

    #[test]
    fn entries_outside_year_skip_monthly_rows() {
        let incomes = vec![income((2023, 6, 1), dec!(100), IncomeCategory::Other, true)];

        let months = monthly_totals(2024, &incomes, &[]);

        assert!(months.iter().all(|m| m.income.is_zero()));
    }

    // ===== year_over_year tests =====

    #[test]
    fn year_over_year_changes_and_recommendations() {
        let current = LedgerTotals {
            total_income: dec!(45000),
            total_expenses: dec!(12000),
            deductible_expenses: dec!(3000),
            income_entries: 10,
            expense_entries: 4,
            ..Default::default()
        };
        let previous = LedgerTotals {
            total_income: dec!(60000),
            total_expenses: dec!(8000),
            deductible_expenses: dec!(6000),
            income_entries: 12,
            expense_entries: 3,
            ..Default::default()
        };

        let summary = year_over_year(2024, &current, &previous);

        assert_eq!(summary.current.entry_count, 14);
        assert_eq!(summary.previous.net_income, dec!(52000));
        assert_eq!(
            summary.changes,
            YearChanges {
                income: dec!(-25),
                expenses: dec!(50),
                deductible: dec!(-50),
                net_income: dec!(-36.54),
            }
        );
        assert_eq!(summary.recommendations.len(), 3);
    }

    #[test]
    fn year_over_year_counts_non_taxable_income() {
        let current = LedgerTotals {
            total_income: dec!(40000),
            non_taxable_income: dec!(20000),
            total_expenses: dec!(15000),
            deductible_expenses: dec!(10000),
            ..Default::default()
        };
        let previous = LedgerTotals {
            total_income: dec!(50000),
            total_expenses: dec!(10000),
            deductible_expenses: dec!(10000),
            ..Default::default()
        };

        let summary = year_over_year(2024, &current, &previous);

        assert_eq!(summary.current.total_income, dec!(60000));
        assert_eq!(
            summary.current.total_income - summary.current.total_expenses,
            summary.current.net_income
        );
        // 60,000 against 50,000 is growth, so no diversification advice
        assert_eq!(summary.changes.income, dec!(20));
        assert_eq!(summary.changes.net_income, dec!(12.5));
        assert!(summary.recommendations.iter().all(|r| !r.contains("diversif")));
    }

    #[test]
    fn year_over_year_without_history_reports_zero_change() {
        let current = LedgerTotals {
            total_income: dec!(10000),
            deductible_expenses: dec!(2000),
            total_expenses: dec!(2000),
            ..Default::default()
        };

        let summary = year_over_year(2024, &current, &LedgerTotals::default());

        assert_eq!(summary.changes.income, dec!(0));
        assert_eq!(summary.changes.net_income, dec!(0));
        assert!(summary.recommendations.is_empty());
    }
}
