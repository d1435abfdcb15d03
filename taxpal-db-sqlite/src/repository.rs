use std::str::FromStr;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::query::Query;
use sqlx::sqlite::{
    Sqlite, SqliteArguments, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow,
};
use sqlx::Row;
use taxpal_core::calculations::common::checked_total;
use taxpal_core::{
    ExpenseCategory, ExpenseRecord, ExpenseUpdate, IncomeCategory, IncomeRecord, IncomeUpdate,
    LedgerQuery, LedgerRepository, NewExpense, NewIncome, Page, PaymentMethod, Platform,
    RepositoryError, SortField,
};
use tracing::debug;

use crate::decimal::{decimal_to_text, get_decimal};

const INCOME_COLUMNS: &str = "id, user_id, source, description, amount, category, platform,
    invoice_number, date, is_recurring, taxable, created_at, updated_at";

const EXPENSE_COLUMNS: &str = "id, user_id, description, amount, category, payment_method,
    receipt_url, vendor, date, is_recurring, is_deductible, notes, created_at, updated_at";

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Opens (creating if missing) the database at `database_url`.
    ///
    /// Accepts sqlx URLs (`sqlite://taxpal.db`), bare paths and `:memory:`.
    pub async fn new(database_url: &str) -> Result<Self, RepositoryError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| RepositoryError::Configuration(e.to_string()))?
            .create_if_missing(true);

        // Every connection to an in-memory database sees its own copy unless
        // the pool keeps exactly one alive.
        let pool_options = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| RepositoryError::Connection(format!("{database_url}: {e}")))?;
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<(), RepositoryError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(format!("Failed to run migrations: {e}")))?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn list<T>(
        &self,
        table: &str,
        columns: &str,
        filter: &Filter,
        order_by: &str,
        page: u32,
        limit: u32,
        to_record: fn(&SqliteRow) -> Result<T, RepositoryError>,
    ) -> Result<Page<T>, RepositoryError> {
        let where_sql = filter.sql();

        // Amounts are TEXT, so the summary total is added up here rather than
        // with SUM() to keep it exact.
        let amount_sql = format!("SELECT amount FROM {table} WHERE {where_sql}");
        let amount_rows = filter
            .bind(sqlx::query(&amount_sql))
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        let amounts = amount_rows
            .iter()
            .map(|row| get_decimal(row, "amount"))
            .collect::<Result<Vec<Decimal>, _>>()?;
        let total_amount = checked_total(amounts).ok_or_else(|| {
            RepositoryError::Database(format!("{table} amount total overflowed"))
        })?;
        let total = amount_rows.len() as u64;

        let page_sql = format!(
            "SELECT {columns} FROM {table} WHERE {where_sql} ORDER BY {order_by} LIMIT ? OFFSET ?"
        );
        let rows = filter
            .bind(sqlx::query(&page_sql))
            .bind(i64::from(limit))
            .bind(i64::from(page.saturating_sub(1)) * i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        let entries = rows.iter().map(to_record).collect::<Result<Vec<_>, _>>()?;
        debug!(table, total, page, returned = entries.len(), "listed ledger entries");

        Ok(Page::new(entries, page, limit, total, total_amount))
    }
}

/// A positional value for a dynamically built WHERE clause.
#[derive(Debug, Clone)]
enum Arg {
    Text(String),
    Date(NaiveDate),
    Bool(bool),
}

/// WHERE clause plus its arguments, bound in the order the clauses were added.
#[derive(Debug, Clone)]
struct Filter {
    clauses: Vec<String>,
    args: Vec<Arg>,
}

impl Filter {
    fn for_user(user_id: &str) -> Self {
        Self {
            clauses: vec!["user_id = ?".to_string()],
            args: vec![Arg::Text(user_id.to_string())],
        }
    }

    fn push(
        &mut self,
        clause: impl Into<String>,
        args: impl IntoIterator<Item = Arg>,
    ) {
        self.clauses.push(clause.into());
        self.args.extend(args);
    }

    /// Shared filters of both ledgers. `search_columns` are matched
    /// case-insensitively against the search term.
    fn from_query<C>(
        user_id: &str,
        query: &LedgerQuery<C>,
        category: Option<&'static str>,
        search_columns: &[&str],
    ) -> Self {
        let mut filter = Self::for_user(user_id);

        if let Some(category) = category {
            filter.push("category = ?", [Arg::Text(category.to_string())]);
        }
        if let Some(start) = query.start_date {
            filter.push("date >= ?", [Arg::Date(start)]);
        }
        if let Some(end) = query.end_date {
            filter.push("date <= ?", [Arg::Date(end)]);
        }
        if let Some(term) = query.search_term() {
            let pattern = format!("%{}%", escape_like(&term.to_lowercase()));
            let clause = search_columns
                .iter()
                .map(|col| format!("LOWER({col}) LIKE ? ESCAPE '\\'"))
                .collect::<Vec<_>>()
                .join(" OR ");
            filter.push(
                format!("({clause})"),
                search_columns.iter().map(|_| Arg::Text(pattern.clone())),
            );
        }
        filter
    }

    fn sql(&self) -> String {
        self.clauses.join(" AND ")
    }

    fn bind<'q>(
        &self,
        mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        for arg in &self.args {
            query = match arg {
                Arg::Text(s) => query.bind(s.clone()),
                Arg::Date(d) => query.bind(*d),
                Arg::Bool(b) => query.bind(*b),
            };
        }
        query
    }
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn order_by<C>(
    query: &LedgerQuery<C>,
    label_column: &str,
) -> String {
    let column = match query.sort_by() {
        SortField::Date => "date",
        SortField::Amount => "CAST(amount AS REAL)",
        SortField::Label => label_column,
        SortField::CreatedAt => "created_at",
    };
    let direction = query.sort_order().as_sql();
    format!("{column} {direction}, id {direction}")
}

fn db_err(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

fn get_text(
    row: &SqliteRow,
    column: &str,
) -> Result<String, RepositoryError> {
    row.try_get(column)
        .map_err(|e| RepositoryError::Database(format!("Failed to get {column}: {e}")))
}

fn parse_column<T>(
    row: &SqliteRow,
    column: &str,
    parse: fn(&str) -> Option<T>,
) -> Result<T, RepositoryError> {
    let value = get_text(row, column)?;
    parse(&value)
        .ok_or_else(|| RepositoryError::Database(format!("Invalid {column}: {value}")))
}

fn row_to_income(row: &SqliteRow) -> Result<IncomeRecord, RepositoryError> {
    Ok(IncomeRecord {
        id: row.try_get("id").map_err(db_err)?,
        user_id: get_text(row, "user_id")?,
        source: get_text(row, "source")?,
        description: get_text(row, "description")?,
        amount: get_decimal(row, "amount")?,
        category: parse_column(row, "category", IncomeCategory::parse)?,
        platform: parse_column(row, "platform", Platform::parse)?,
        invoice_number: row.try_get("invoice_number").map_err(db_err)?,
        date: row
            .try_get("date")
            .map_err(|e| RepositoryError::Database(format!("Failed to get date: {e}")))?,
        is_recurring: row.try_get("is_recurring").map_err(db_err)?,
        taxable: row.try_get("taxable").map_err(db_err)?,
        created_at: row
            .try_get("created_at")
            .map_err(|e| RepositoryError::Database(format!("Failed to get created_at: {e}")))?,
        updated_at: row
            .try_get("updated_at")
            .map_err(|e| RepositoryError::Database(format!("Failed to get updated_at: {e}")))?,
    })
}

fn row_to_expense(row: &SqliteRow) -> Result<ExpenseRecord, RepositoryError> {
    Ok(ExpenseRecord {
        id: row.try_get("id").map_err(db_err)?,
        user_id: get_text(row, "user_id")?,
        description: get_text(row, "description")?,
        amount: get_decimal(row, "amount")?,
        category: parse_column(row, "category", ExpenseCategory::parse)?,
        payment_method: parse_column(row, "payment_method", PaymentMethod::parse)?,
        receipt_url: row.try_get("receipt_url").map_err(db_err)?,
        vendor: row.try_get("vendor").map_err(db_err)?,
        date: row
            .try_get("date")
            .map_err(|e| RepositoryError::Database(format!("Failed to get date: {e}")))?,
        is_recurring: row.try_get("is_recurring").map_err(db_err)?,
        is_deductible: row.try_get("is_deductible").map_err(db_err)?,
        notes: row.try_get("notes").map_err(db_err)?,
        created_at: row
            .try_get("created_at")
            .map_err(|e| RepositoryError::Database(format!("Failed to get created_at: {e}")))?,
        updated_at: row
            .try_get("updated_at")
            .map_err(|e| RepositoryError::Database(format!("Failed to get updated_at: {e}")))?,
    })
}

#[async_trait]
impl LedgerRepository for SqliteRepository {
    async fn create_income(
        &self,
        user_id: &str,
        income: NewIncome,
    ) -> Result<IncomeRecord, RepositoryError> {
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO income (
                user_id, source, description, amount, category, platform,
                invoice_number, date, is_recurring, taxable, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(&income.source)
        .bind(&income.description)
        .bind(decimal_to_text(income.amount))
        .bind(income.category.as_str())
        .bind(income.platform.as_str())
        .bind(&income.invoice_number)
        .bind(income.date)
        .bind(income.is_recurring)
        .bind(income.taxable)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        let id = result.last_insert_rowid();
        debug!(id, user_id, "created income entry");
        self.get_income(user_id, id).await
    }

    async fn get_income(
        &self,
        user_id: &str,
        id: i64,
    ) -> Result<IncomeRecord, RepositoryError> {
        let sql = format!("SELECT {INCOME_COLUMNS} FROM income WHERE id = ? AND user_id = ?");
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .ok_or(RepositoryError::NotFound)?;

        row_to_income(&row)
    }

    async fn update_income(
        &self,
        user_id: &str,
        id: i64,
        update: IncomeUpdate,
    ) -> Result<IncomeRecord, RepositoryError> {
        let mut record = self.get_income(user_id, id).await?;
        update.apply_to(&mut record);

        let result = sqlx::query(
            "UPDATE income SET
                source = ?, description = ?, amount = ?, category = ?, platform = ?,
                invoice_number = ?, date = ?, is_recurring = ?, taxable = ?, updated_at = ?
             WHERE id = ? AND user_id = ?",
        )
        .bind(&record.source)
        .bind(&record.description)
        .bind(decimal_to_text(record.amount))
        .bind(record.category.as_str())
        .bind(record.platform.as_str())
        .bind(&record.invoice_number)
        .bind(record.date)
        .bind(record.is_recurring)
        .bind(record.taxable)
        .bind(Utc::now())
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get_income(user_id, id).await
    }

    async fn delete_income(
        &self,
        user_id: &str,
        id: i64,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM income WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn list_income(
        &self,
        user_id: &str,
        query: &LedgerQuery<IncomeCategory>,
    ) -> Result<Page<IncomeRecord>, RepositoryError> {
        let filter = Filter::from_query(
            user_id,
            query,
            query.category.map(|c| c.as_str()),
            &["source", "description"],
        );

        self.list(
            "income",
            INCOME_COLUMNS,
            &filter,
            &order_by(query, "source"),
            query.page(),
            query.limit(),
            row_to_income,
        )
        .await
    }

    async fn income_in_range(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<IncomeRecord>, RepositoryError> {
        let sql = format!(
            "SELECT {INCOME_COLUMNS} FROM income
             WHERE user_id = ? AND date >= ? AND date <= ?
             ORDER BY date ASC, id ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        rows.iter().map(row_to_income).collect()
    }

    async fn create_expense(
        &self,
        user_id: &str,
        expense: NewExpense,
    ) -> Result<ExpenseRecord, RepositoryError> {
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO expenses (
                user_id, description, amount, category, payment_method, receipt_url,
                vendor, date, is_recurring, is_deductible, notes, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(&expense.description)
        .bind(decimal_to_text(expense.amount))
        .bind(expense.category.as_str())
        .bind(expense.payment_method.as_str())
        .bind(&expense.receipt_url)
        .bind(&expense.vendor)
        .bind(expense.date)
        .bind(expense.is_recurring)
        .bind(expense.is_deductible)
        .bind(&expense.notes)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        let id = result.last_insert_rowid();
        debug!(id, user_id, "created expense entry");
        self.get_expense(user_id, id).await
    }

    async fn get_expense(
        &self,
        user_id: &str,
        id: i64,
    ) -> Result<ExpenseRecord, RepositoryError> {
        let sql = format!("SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = ? AND user_id = ?");
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .ok_or(RepositoryError::NotFound)?;

        row_to_expense(&row)
    }

    async fn update_expense(
        &self,
        user_id: &str,
        id: i64,
        update: ExpenseUpdate,
    ) -> Result<ExpenseRecord, RepositoryError> {
        let mut record = self.get_expense(user_id, id).await?;
        update.apply_to(&mut record);

        let result = sqlx::query(
            "UPDATE expenses SET
                description = ?, amount = ?, category = ?, payment_method = ?, receipt_url = ?,
                vendor = ?, date = ?, is_recurring = ?, is_deductible = ?, notes = ?,
                updated_at = ?
             WHERE id = ? AND user_id = ?",
        )
        .bind(&record.description)
        .bind(decimal_to_text(record.amount))
        .bind(record.category.as_str())
        .bind(record.payment_method.as_str())
        .bind(&record.receipt_url)
        .bind(&record.vendor)
        .bind(record.date)
        .bind(record.is_recurring)
        .bind(record.is_deductible)
        .bind(&record.notes)
        .bind(Utc::now())
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.get_expense(user_id, id).await
    }

    async fn delete_expense(
        &self,
        user_id: &str,
        id: i64,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn list_expenses(
        &self,
        user_id: &str,
        query: &LedgerQuery<ExpenseCategory>,
    ) -> Result<Page<ExpenseRecord>, RepositoryError> {
        let mut filter = Filter::from_query(
            user_id,
            query,
            query.category.map(|c| c.as_str()),
            &["description", "vendor"],
        );
        if let Some(deductible) = query.is_deductible {
            filter.push("is_deductible = ?", [Arg::Bool(deductible)]);
        }

        self.list(
            "expenses",
            EXPENSE_COLUMNS,
            &filter,
            &order_by(query, "description"),
            query.page(),
            query.limit(),
            row_to_expense,
        )
        .await
    }

    async fn expenses_in_range(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ExpenseRecord>, RepositoryError> {
        let sql = format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses
             WHERE user_id = ? AND date >= ? AND date <= ?
             ORDER BY date ASC, id ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        rows.iter().map(row_to_expense).collect()
    }
}
