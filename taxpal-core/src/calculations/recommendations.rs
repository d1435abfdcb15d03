//! Ordered `(predicate, message)` rule tables.
//!
//! Rules are evaluated top to bottom and every rule that applies contributes
//! its message, so the output order is fixed by the table order.

use rust_decimal::Decimal;

const TEN_PERCENT: Decimal = Decimal::from_parts(10, 0, 0, false, 2);
const FIFTEEN_PERCENT: Decimal = Decimal::from_parts(15, 0, 0, false, 2);
const TWENTY_PERCENT: Decimal = Decimal::from_parts(20, 0, 0, false, 2);
/// Effective rate, in percent.
const HIGH_EFFECTIVE_RATE: Decimal = Decimal::from_parts(25, 0, 0, false, 0);

const QUARTERLY_INCOME_THRESHOLD: Decimal = Decimal::from_parts(30_000, 0, 0, false, 0);
const SECTION_179_INCOME_THRESHOLD: Decimal = Decimal::from_parts(40_000, 0, 0, false, 0);
const HIGH_INCOME_THRESHOLD: Decimal = Decimal::from_parts(50_000, 0, 0, false, 0);
const MIN_EXPECTED_DEDUCTIONS: Decimal = Decimal::from_parts(5_000, 0, 0, false, 0);

/// Shown when no estimate rule applies.
pub const WELL_OPTIMIZED: &str =
    "Your tax situation looks well-optimized! Keep tracking expenses consistently.";

pub struct Rule<T> {
    pub applies: fn(&T) -> bool,
    pub message: &'static str,
}

/// Messages of every rule in `rules` that applies to `subject`, in table order.
pub fn evaluate<T>(
    rules: &[Rule<T>],
    subject: &T,
) -> Vec<String> {
    rules
        .iter()
        .filter(|rule| (rule.applies)(subject))
        .map(|rule| rule.message.to_string())
        .collect()
}

/// Figures the estimate rules look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EstimateSignals {
    pub total_income: Decimal,
    pub deductible_expenses: Decimal,
    pub total_expenses: Decimal,
    /// Percentage, already rounded.
    pub effective_rate: Decimal,
}

pub const ESTIMATE_RULES: &[Rule<EstimateSignals>] = &[
    Rule {
        applies: |s| s.deductible_expenses < s.total_income * FIFTEEN_PERCENT,
        message: "Consider tracking more business expenses - you may be missing valuable deductions",
    },
    Rule {
        applies: |s| s.effective_rate > HIGH_EFFECTIVE_RATE,
        message: "Your effective tax rate is high - consider maximizing retirement contributions (SEP-IRA, Solo 401k)",
    },
    Rule {
        applies: |s| s.total_expenses - s.deductible_expenses > s.total_income * TEN_PERCENT,
        message: "You have significant non-deductible expenses - review your business spending strategy",
    },
    Rule {
        applies: |s| {
            s.total_income > HIGH_INCOME_THRESHOLD && s.deductible_expenses < MIN_EXPECTED_DEDUCTIONS
        },
        message: "With your income level, you should have more business deductions - track home office, equipment, and professional expenses",
    },
    Rule {
        applies: |s| s.total_income > QUARTERLY_INCOME_THRESHOLD,
        message: "Consider making quarterly estimated tax payments to avoid penalties",
    },
    Rule {
        applies: |s| {
            s.total_income > SECTION_179_INCOME_THRESHOLD
                && s.deductible_expenses < s.total_income * TWENTY_PERCENT
        },
        message: "Look into Section 179 deductions for business equipment purchases",
    },
];

/// Estimate rules, falling back to [`WELL_OPTIMIZED`] when none apply.
pub fn estimate_recommendations(signals: &EstimateSignals) -> Vec<String> {
    let mut messages = evaluate(ESTIMATE_RULES, signals);
    if messages.is_empty() {
        messages.push(WELL_OPTIMIZED.to_string());
    }
    messages
}

/// Figures the year-over-year rules look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendSignals {
    /// Percentage change in income against the previous year.
    pub income_change: Decimal,
    /// Percentage change in expenses against the previous year.
    pub expense_change: Decimal,
    pub total_income: Decimal,
    pub deductible_expenses: Decimal,
}

const INCOME_DROP_THRESHOLD: Decimal = Decimal::from_parts(10, 0, 0, true, 0);
const EXPENSE_GROWTH_THRESHOLD: Decimal = Decimal::from_parts(20, 0, 0, false, 0);

pub const TREND_RULES: &[Rule<TrendSignals>] = &[
    Rule {
        applies: |s| s.income_change < INCOME_DROP_THRESHOLD,
        message: "Income has decreased significantly - consider diversifying income sources",
    },
    Rule {
        applies: |s| s.expense_change > EXPENSE_GROWTH_THRESHOLD,
        message: "Expenses have increased substantially - review spending categories",
    },
    Rule {
        applies: |s| s.deductible_expenses < s.total_income * FIFTEEN_PERCENT,
        message: "You may be missing tax deductions - track more business expenses",
    },
];
