//! CSV import of income and expense entries into any [`LedgerRepository`].
//!
//! Enum cells use the same kebab-case names as the JSON API (`home-office`,
//! `credit-card`). Optional cells may be left empty; empty booleans take the
//! same defaults as a new entry created through the API.

use std::io::Read;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use taxpal_core::{
    ExpenseCategory, IncomeCategory, LedgerRepository, NewExpense, NewIncome, PaymentMethod,
    Platform, RepositoryError, ValidationErrors,
};
use thiserror::Error;
use tracing::{debug, info};

/// Import failures; `line` is the 1-based line in the CSV file.
#[derive(Debug, Error)]
pub enum LedgerImportError {
    #[error("line {line}: CSV parse error: {message}")]
    CsvParse { line: u64, message: String },

    #[error("line {line}: {errors}")]
    Invalid {
        line: u64,
        errors: ValidationErrors,
    },

    #[error("line {line}: {source}")]
    Repository {
        line: u64,
        #[source]
        source: RepositoryError,
    },
}

/// A parsed, normalized and validated entry with the line it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRow<T> {
    pub line: u64,
    pub entry: T,
}

#[derive(Debug, Deserialize)]
struct IncomeRow {
    source: String,
    description: String,
    amount: Decimal,
    category: IncomeCategory,
    platform: Option<Platform>,
    invoice_number: Option<String>,
    date: NaiveDate,
    is_recurring: Option<bool>,
    taxable: Option<bool>,
}

impl From<IncomeRow> for NewIncome {
    fn from(row: IncomeRow) -> Self {
        NewIncome {
            source: row.source,
            description: row.description,
            amount: row.amount,
            category: row.category,
            platform: row.platform.unwrap_or_default(),
            invoice_number: row.invoice_number,
            date: row.date,
            is_recurring: row.is_recurring.unwrap_or(false),
            taxable: row.taxable.unwrap_or(true),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ExpenseRow {
    description: String,
    amount: Decimal,
    category: ExpenseCategory,
    payment_method: Option<PaymentMethod>,
    receipt_url: Option<String>,
    vendor: Option<String>,
    date: NaiveDate,
    is_recurring: Option<bool>,
    is_deductible: Option<bool>,
    notes: Option<String>,
}

impl From<ExpenseRow> for NewExpense {
    fn from(row: ExpenseRow) -> Self {
        NewExpense {
            description: row.description,
            amount: row.amount,
            category: row.category,
            payment_method: row.payment_method.unwrap_or_default(),
            receipt_url: row.receipt_url,
            vendor: row.vendor,
            date: row.date,
            is_recurring: row.is_recurring.unwrap_or(false),
            is_deductible: row.is_deductible.unwrap_or(true),
            notes: row.notes,
        }
    }
}

/// Stops at the first bad row so nothing is written from a broken file.
fn parse_rows<R, Row, T>(
    reader: R,
    prepare: fn(Row) -> Result<T, ValidationErrors>,
) -> Result<Vec<ImportRow<T>>, LedgerImportError>
where
    R: Read,
    Row: DeserializeOwned,
{
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = csv_reader
        .headers()
        .map_err(|e| LedgerImportError::CsvParse {
            line: 1,
            message: e.to_string(),
        })?
        .clone();

    let mut rows = Vec::new();
    for result in csv_reader.records() {
        let record = result.map_err(|e| LedgerImportError::CsvParse {
            line: e.position().map_or(0, |p| p.line()),
            message: e.to_string(),
        })?;
        let line = record.position().map_or(0, |p| p.line());

        let row: Row = record
            .deserialize(Some(&headers))
            .map_err(|e| LedgerImportError::CsvParse {
                line,
                message: e.to_string(),
            })?;
        let entry = prepare(row).map_err(|errors| LedgerImportError::Invalid { line, errors })?;
        rows.push(ImportRow { line, entry });
    }

    Ok(rows)
}

fn prepare_income(row: IncomeRow) -> Result<NewIncome, ValidationErrors> {
    let mut income = NewIncome::from(row);
    income.normalize();
    income.validate()?;
    Ok(income)
}

fn prepare_expense(row: ExpenseRow) -> Result<NewExpense, ValidationErrors> {
    let mut expense = NewExpense::from(row);
    expense.normalize();
    expense.validate()?;
    Ok(expense)
}

pub struct LedgerImporter;

impl LedgerImporter {
    /// Parse income rows with the header
    /// `source,description,amount,category,platform,invoice_number,date,is_recurring,taxable`.
    pub fn parse_income<R: Read>(
        reader: R
    ) -> Result<Vec<ImportRow<NewIncome>>, LedgerImportError> {
        parse_rows(reader, prepare_income)
    }

    /// Parse expense rows with the header
    /// `description,amount,category,payment_method,receipt_url,vendor,date,is_recurring,is_deductible,notes`.
    pub fn parse_expenses<R: Read>(
        reader: R
    ) -> Result<Vec<ImportRow<NewExpense>>, LedgerImportError> {
        parse_rows(reader, prepare_expense)
    }

    /// Create every row for `user_id`, in file order. Returns the number
    /// of entries created.
    pub async fn load_income<R: LedgerRepository + ?Sized>(
        repo: &R,
        user_id: &str,
        rows: Vec<ImportRow<NewIncome>>,
    ) -> Result<usize, LedgerImportError> {
        let mut created = 0;
        for ImportRow { line, entry } in rows {
            let record = repo
                .create_income(user_id, entry)
                .await
                .map_err(|source| LedgerImportError::Repository { line, source })?;
            debug!(line, id = record.id, "imported income");
            created += 1;
        }
        info!(user_id, created, "income import complete");
        Ok(created)
    }

    /// Create every row for `user_id`, in file order. Returns the number
    /// of entries created.
    pub async fn load_expenses<R: LedgerRepository + ?Sized>(
        repo: &R,
        user_id: &str,
        rows: Vec<ImportRow<NewExpense>>,
    ) -> Result<usize, LedgerImportError> {
        let mut created = 0;
        for ImportRow { line, entry } in rows {
            let record = repo
                .create_expense(user_id, entry)
                .await
                .map_err(|source| LedgerImportError::Repository { line, source })?;
            debug!(line, id = record.id, "imported expense");
            created += 1;
        }
        info!(user_id, created, "expense import complete");
        Ok(created)
    }
}
