use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::validation::ValidationErrors;
use super::{ExpenseRecord, IncomeRecord};
use crate::calculations::EstimateError;
use crate::calculations::common::checked_total;

pub const DEFAULT_PAGE_LIMIT: u32 = 20;
pub const MAX_PAGE_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    #[default]
    Date,
    Amount,
    /// `source` for income, `description` for expenses.
    #[serde(alias = "source", alias = "description")]
    Label,
    CreatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Filters, ordering and pagination for a ledger listing.
///
/// `C` is the category type of the ledger being listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerQuery<C> {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub category: Option<C>,
    /// Case-insensitive substring match on the entry's text fields.
    pub search: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Expenses only; ignored for income.
    pub is_deductible: Option<bool>,
    pub sort_by: Option<SortField>,
    pub sort_order: Option<SortOrder>,
}

impl<C> Default for LedgerQuery<C> {
    fn default() -> Self {
        Self {
            page: None,
            limit: None,
            category: None,
            search: None,
            start_date: None,
            end_date: None,
            is_deductible: None,
            sort_by: None,
            sort_order: None,
        }
    }
}

impl<C> LedgerQuery<C> {
    /// Every entry dated within `[start, end]`, oldest first, unpaginated.
    pub fn date_range(
        start: NaiveDate,
        end: NaiveDate,
    ) -> Self {
        Self {
            start_date: Some(start),
            end_date: Some(end),
            sort_order: Some(SortOrder::Asc),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        if self.page == Some(0) {
            errors.0.push("page must be at least 1".to_string());
        }
        if let Some(limit) = self.limit
            && !(1..=MAX_PAGE_LIMIT).contains(&limit)
        {
            errors
                .0
                .push(format!("limit must be between 1 and {MAX_PAGE_LIMIT}"));
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date)
            && start > end
        {
            errors
                .0
                .push("startDate must not be after endDate".to_string());
        }
        errors.into_result()
    }

    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> u32 {
        self.limit
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .clamp(1, MAX_PAGE_LIMIT)
    }

    pub fn offset(&self) -> u32 {
        (self.page() - 1) * self.limit()
    }

    pub fn sort_by(&self) -> SortField {
        self.sort_by.unwrap_or_default()
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order.unwrap_or_default()
    }

    /// Trimmed search term, `None` when blank.
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// One page of a ledger listing plus totals over every matching entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub entries: Vec<T>,
    pub pagination: Pagination,
    pub summary: PageSummary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSummary {
    pub total_amount: Decimal,
    pub total_entries: u64,
}

impl<T> Page<T> {
    pub fn new(
        entries: Vec<T>,
        page: u32,
        limit: u32,
        total: u64,
        total_amount: Decimal,
    ) -> Self {
        Self {
            entries,
            pagination: Pagination {
                page,
                limit,
                total,
                pages: total.div_ceil(u64::from(limit.max(1))),
            },
            summary: PageSummary {
                total_amount,
                total_entries: total,
            },
        }
    }
}

/// Aggregated ledger figures for a period, the engine's only input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerTotals {
    /// Taxable income only.
    pub total_income: Decimal,
    pub non_taxable_income: Decimal,
    pub total_expenses: Decimal,
    /// Subset of `total_expenses` flagged deductible.
    pub deductible_expenses: Decimal,
    pub income_entries: usize,
    pub expense_entries: usize,
}

impl LedgerTotals {
    /// # Errors
    ///
    /// [`EstimateError::Overflow`] if any total, or gross income, does not
    /// fit in a `Decimal`. Every other figure derived from these totals is
    /// then bounded by them.
    pub fn from_records(
        incomes: &[IncomeRecord],
        expenses: &[ExpenseRecord],
    ) -> Result<Self, EstimateError> {
        let total = |field: &'static str, values: Vec<Decimal>| {
            checked_total(values).ok_or(EstimateError::Overflow(field))
        };
        let (taxable, non_taxable): (Vec<_>, Vec<_>) = incomes.iter().partition(|i| i.taxable);

        let totals = Self {
            total_income: total("income", taxable.iter().map(|i| i.amount).collect())?,
            non_taxable_income: total(
                "non-taxable income",
                non_taxable.iter().map(|i| i.amount).collect(),
            )?,
            total_expenses: total("expenses", expenses.iter().map(|e| e.amount).collect())?,
            deductible_expenses: total(
                "deductible expenses",
                expenses
                    .iter()
                    .filter(|e| e.is_deductible)
                    .map(|e| e.amount)
                    .collect(),
            )?,
            income_entries: incomes.len(),
            expense_entries: expenses.len(),
        };
        totals
            .total_income
            .checked_add(totals.non_taxable_income)
            .ok_or(EstimateError::Overflow("gross income"))?;
        Ok(totals)
    }

    /// Taxable plus non-taxable income; checked to fit by
    /// [`LedgerTotals::from_records`].
    pub fn gross_income(&self) -> Decimal {
        self.total_income + self.non_taxable_income
    }

    pub fn net_income(&self) -> Decimal {
        self.gross_income() - self.total_expenses
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{ExpenseCategory, IncomeCategory, PaymentMethod, Platform};

    fn income(
        amount: Decimal,
        taxable: bool,
    ) -> IncomeRecord {
        let now = Utc::now();
        IncomeRecord {
            id: 0,
            user_id: "u1".to_string(),
            source: "Client".to_string(),
            description: "Work".to_string(),
            amount,
            category: IncomeCategory::Freelance,
            platform: Platform::Other,
            invoice_number: None,
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            is_recurring: false,
            taxable,
            created_at: now,
            updated_at: now,
        }
    }

    fn expense(
        amount: Decimal,
        is_deductible: bool,
    ) -> ExpenseRecord {
        let now = Utc::now();
        ExpenseRecord {
            id: 0,
            user_id: "u1".to_string(),
            description: "Stuff".to_string(),
            amount,
            category: ExpenseCategory::Other,
            payment_method: PaymentMethod::Cash,
            receipt_url: None,
            vendor: None,
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            is_recurring: false,
            is_deductible,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn totals_split_taxable_and_deductible() {
        let incomes = [income(dec!(1000), true), income(dec!(250), false), income(dec!(500), true)];
        let expenses = [expense(dec!(300), true), expense(dec!(120), false)];

        let totals = LedgerTotals::from_records(&incomes, &expenses).unwrap();

        assert_eq!(totals.total_income, dec!(1500));
        assert_eq!(totals.non_taxable_income, dec!(250));
        assert_eq!(totals.gross_income(), dec!(1750));
        assert_eq!(totals.total_expenses, dec!(420));
        assert_eq!(totals.deductible_expenses, dec!(300));
        assert_eq!(totals.net_income(), dec!(1330));
        assert_eq!(totals.income_entries, 3);
        assert_eq!(totals.expense_entries, 2);
    }

    #[test]
    fn totals_of_empty_ledger_are_zero() {
        let totals = LedgerTotals::from_records(&[], &[]).unwrap();

        assert_eq!(totals, LedgerTotals::default());
    }

    #[test]
    fn totals_that_overflow_are_an_error() {
        let incomes = [income(Decimal::MAX, true), income(Decimal::MAX, true)];

        let result = LedgerTotals::from_records(&incomes, &[]);

        assert_eq!(result, Err(EstimateError::Overflow("income")));
    }

    #[test]
    fn gross_income_must_fit_too() {
        let incomes = [income(Decimal::MAX, true), income(Decimal::MAX, false)];
        let expenses = [expense(Decimal::MAX, true), expense(Decimal::MAX, false)];

        assert_eq!(
            LedgerTotals::from_records(&incomes, &[]),
            Err(EstimateError::Overflow("gross income"))
        );
        assert_eq!(
            LedgerTotals::from_records(&[], &expenses),
            Err(EstimateError::Overflow("expenses"))
        );
    }

    #[test]
    fn query_defaults_and_offset() {
        let query = LedgerQuery::<IncomeCategory> {
            page: Some(3),
            ..Default::default()
        };

        assert_eq!(query.limit(), 20);
        assert_eq!(query.offset(), 40);
        assert_eq!(query.sort_by(), SortField::Date);
        assert_eq!(query.sort_order(), SortOrder::Desc);
    }

    #[test]
    fn query_validation_flags_bad_paging_and_dates() {
        let query = LedgerQuery::<IncomeCategory> {
            page: Some(0),
            limit: Some(500),
            start_date: NaiveDate::from_ymd_opt(2024, 5, 1),
            end_date: NaiveDate::from_ymd_opt(2024, 4, 1),
            ..Default::default()
        };

        let errors = query.validate().unwrap_err();

        assert_eq!(errors.0.len(), 3);
    }

    #[test]
    fn sort_field_accepts_ledger_specific_aliases() {
        let source: SortField = serde_json::from_str("\"source\"").unwrap();
        let description: SortField = serde_json::from_str("\"description\"").unwrap();
        let created: SortField = serde_json::from_str("\"createdAt\"").unwrap();

        assert_eq!(source, SortField::Label);
        assert_eq!(description, SortField::Label);
        assert_eq!(created, SortField::CreatedAt);
    }

    #[test]
    fn page_counts_partial_last_page() {
        let page = Page::new(vec![1, 2], 1, 20, 41, dec!(10));

        assert_eq!(page.pagination.pages, 3);
        assert_eq!(page.summary.total_entries, 41);
    }
}
