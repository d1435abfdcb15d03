use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{
    ExpenseCategory, ExpenseRecord, ExpenseUpdate, IncomeCategory, IncomeRecord, IncomeUpdate,
    LedgerQuery, NewExpense, NewIncome, Page,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Per-user storage for income and expense entries.
///
/// Every method is scoped by `user_id`; an entry owned by another user is
/// reported as [`RepositoryError::NotFound`].
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    // Income
    async fn create_income(
        &self,
        user_id: &str,
        income: NewIncome,
    ) -> Result<IncomeRecord, RepositoryError>;

    async fn get_income(
        &self,
        user_id: &str,
        id: i64,
    ) -> Result<IncomeRecord, RepositoryError>;

    async fn update_income(
        &self,
        user_id: &str,
        id: i64,
        update: IncomeUpdate,
    ) -> Result<IncomeRecord, RepositoryError>;

    async fn delete_income(
        &self,
        user_id: &str,
        id: i64,
    ) -> Result<(), RepositoryError>;

    async fn list_income(
        &self,
        user_id: &str,
        query: &LedgerQuery<IncomeCategory>,
    ) -> Result<Page<IncomeRecord>, RepositoryError>;

    /// Every income entry dated within `[start, end]`, oldest first.
    async fn income_in_range(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<IncomeRecord>, RepositoryError>;

    // Expenses
    async fn create_expense(
        &self,
        user_id: &str,
        expense: NewExpense,
    ) -> Result<ExpenseRecord, RepositoryError>;

    async fn get_expense(
        &self,
        user_id: &str,
        id: i64,
    ) -> Result<ExpenseRecord, RepositoryError>;

    async fn update_expense(
        &self,
        user_id: &str,
        id: i64,
        update: ExpenseUpdate,
    ) -> Result<ExpenseRecord, RepositoryError>;

    async fn delete_expense(
        &self,
        user_id: &str,
        id: i64,
    ) -> Result<(), RepositoryError>;

    async fn list_expenses(
        &self,
        user_id: &str,
        query: &LedgerQuery<ExpenseCategory>,
    ) -> Result<Page<ExpenseRecord>, RepositoryError>;

    /// Every expense dated within `[start, end]`, oldest first.
    async fn expenses_in_range(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ExpenseRecord>, RepositoryError>;
}
