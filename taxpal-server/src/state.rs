use std::sync::Arc;

use chrono::NaiveDate;
use taxpal_core::calculations::year_range;
use taxpal_core::{ExpenseRecord, IncomeRecord, LedgerRepository, LedgerTotals, TaxTable};

use crate::error::ApiError;

/// Shared by every handler. The table is read-only after startup.
pub struct AppState {
    pub repo: Arc<dyn LedgerRepository>,
    pub table: Arc<TaxTable>,
}

impl AppState {
    pub fn new(
        repo: Arc<dyn LedgerRepository>,
        table: TaxTable,
    ) -> Self {
        Self {
            repo,
            table: Arc::new(table),
        }
    }

    /// Every entry `user_id` recorded in calendar year `year`.
    pub async fn year_ledger(
        &self,
        user_id: &str,
        year: i32,
    ) -> Result<(Vec<IncomeRecord>, Vec<ExpenseRecord>), ApiError> {
        let (start, end) = year_range(year)?;
        let incomes = self.repo.income_in_range(user_id, start, end).await?;
        let expenses = self.repo.expenses_in_range(user_id, start, end).await?;
        Ok((incomes, expenses))
    }

    /// Every entry `user_id` ever recorded.
    pub async fn full_ledger(
        &self,
        user_id: &str,
    ) -> Result<(Vec<IncomeRecord>, Vec<ExpenseRecord>), ApiError> {
        let (start, end) = NaiveDate::from_ymd_opt(1, 1, 1)
            .zip(NaiveDate::from_ymd_opt(9999, 12, 31))
            .ok_or_else(|| ApiError::Internal("ledger date bounds".to_string()))?;
        let incomes = self.repo.income_in_range(user_id, start, end).await?;
        let expenses = self.repo.expenses_in_range(user_id, start, end).await?;
        Ok((incomes, expenses))
    }

    pub async fn year_totals(
        &self,
        user_id: &str,
        year: i32,
    ) -> Result<LedgerTotals, ApiError> {
        let (incomes, expenses) = self.year_ledger(user_id, year).await?;
        Ok(LedgerTotals::from_records(&incomes, &expenses)?)
    }
}
