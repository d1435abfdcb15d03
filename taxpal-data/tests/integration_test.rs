//! Integration tests for CSV loading against the SQLite backend.

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use sqlx::sqlite::SqlitePoolOptions;
use taxpal_core::{
    FilingStatusCode, LedgerQuery, LedgerRepository, LedgerTotals, NewIncome, RepositoryError,
    SE_TAX_RATE, STANDARD_DEDUCTION_2024, TaxTable,
};
use taxpal_data::{ImportRow, LedgerImportError, LedgerImporter, TaxTableLoader};
use taxpal_db_sqlite::SqliteRepository;

const BRACKETS_2024: &str = include_str!("../test-data/tax_brackets_2024.csv");
const INCOME_CSV: &str = include_str!("../test-data/income.csv");
const EXPENSES_CSV: &str = include_str!("../test-data/expenses.csv");

async fn setup_test_db() -> SqliteRepository {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    let repo = SqliteRepository::new_with_pool(pool).await;
    repo.run_migrations()
        .await
        .expect("Failed to run migrations");
    repo
}

fn year_2024() -> (NaiveDate, NaiveDate) {
    (
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
    )
}

// ===== tax table =====

#[test]
fn schedule_x_matches_built_in_single_filer_table() {
    let records = TaxTableLoader::parse(BRACKETS_2024.as_bytes()).expect("Failed to parse CSV");

    let table = TaxTableLoader::build(
        &records,
        2024,
        FilingStatusCode::Single,
        STANDARD_DEDUCTION_2024,
        SE_TAX_RATE,
    )
    .expect("Failed to build table");

    assert_eq!(table, TaxTable::single_filer_2024());
}

#[test]
fn every_schedule_in_the_file_builds() {
    let records = TaxTableLoader::parse(BRACKETS_2024.as_bytes()).expect("Failed to parse CSV");

    for status in [
        FilingStatusCode::Single,
        FilingStatusCode::MarriedFilingJointly,
        FilingStatusCode::MarriedFilingSeparately,
        FilingStatusCode::HeadOfHousehold,
        FilingStatusCode::QualifyingSurvivingSpouse,
    ] {
        let table = TaxTableLoader::build(&records, 2024, status, dec!(0), SE_TAX_RATE)
            .unwrap_or_else(|e| panic!("{status:?}: {e}"));
        assert_eq!(table.brackets().len(), 7, "{status:?}");
        assert_eq!(table.top_bracket().tax_rate, dec!(0.37));
    }
}

#[test]
fn joint_and_surviving_spouse_share_schedule_y1() {
    let records = TaxTableLoader::parse(BRACKETS_2024.as_bytes()).expect("Failed to parse CSV");

    let mfj = TaxTableLoader::build(
        &records,
        2024,
        FilingStatusCode::MarriedFilingJointly,
        dec!(0),
        SE_TAX_RATE,
    )
    .unwrap();
    let qss = TaxTableLoader::build(
        &records,
        2024,
        FilingStatusCode::QualifyingSurvivingSpouse,
        dec!(0),
        SE_TAX_RATE,
    )
    .unwrap();

    assert_eq!(mfj.brackets(), qss.brackets());
    assert_eq!(mfj.brackets()[0].max_income, Some(dec!(22000)));
}

// ===== ledger import =====

#[tokio::test]
async fn imports_income_file() {
    let repo = setup_test_db().await;

    let rows = LedgerImporter::parse_income(INCOME_CSV.as_bytes()).expect("Failed to parse CSV");
    let created = LedgerImporter::load_income(&repo, "u1", rows)
        .await
        .expect("Failed to import");

    assert_eq!(created, 4);

    let page = repo
        .list_income("u1", &LedgerQuery::default())
        .await
        .unwrap();
    assert_eq!(page.pagination.total, 4);
    assert_eq!(page.summary.total_amount, dec!(5250.50));

    // Quoted cells keep their commas.
    let initech = page
        .entries
        .iter()
        .find(|e| e.source == "Initech, LLC")
        .expect("quoted source imported");
    assert_eq!(initech.description, "Logo, business cards");
    assert_eq!(initech.invoice_number.as_deref(), Some("INV-002"));
}

#[tokio::test]
async fn imported_ledger_feeds_the_totals() {
    let repo = setup_test_db().await;
    let income = LedgerImporter::parse_income(INCOME_CSV.as_bytes()).unwrap();
    let expenses = LedgerImporter::parse_expenses(EXPENSES_CSV.as_bytes()).unwrap();
    LedgerImporter::load_income(&repo, "u1", income)
        .await
        .unwrap();
    LedgerImporter::load_expenses(&repo, "u1", expenses)
        .await
        .unwrap();

    let (start, end) = year_2024();
    let incomes = repo.income_in_range("u1", start, end).await.unwrap();
    let expenses = repo.expenses_in_range("u1", start, end).await.unwrap();
    let totals = LedgerTotals::from_records(&incomes, &expenses).unwrap();

    assert_eq!(totals.total_income, dec!(4950.50));
    assert_eq!(totals.non_taxable_income, dec!(300));
    assert_eq!(totals.total_expenses, dec!(1999.19));
    assert_eq!(totals.deductible_expenses, dec!(1914.99));
    assert_eq!(totals.income_entries, 4);
    assert_eq!(totals.expense_entries, 3);
}

#[tokio::test]
async fn imports_are_scoped_to_the_given_user() {
    let repo = setup_test_db().await;
    let rows = LedgerImporter::parse_expenses(EXPENSES_CSV.as_bytes()).unwrap();

    LedgerImporter::load_expenses(&repo, "u1", rows)
        .await
        .unwrap();

    let (start, end) = year_2024();
    assert!(
        repo.expenses_in_range("u2", start, end)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn repository_failure_reports_the_line() {
    let repo = setup_test_db().await;
    sqlx::query("DROP TABLE income")
        .execute(repo.pool())
        .await
        .unwrap();
    let rows = vec![ImportRow {
        line: 7,
        entry: NewIncome {
            source: "Acme".to_string(),
            description: "Logo".to_string(),
            amount: dec!(10),
            category: taxpal_core::IncomeCategory::Freelance,
            platform: taxpal_core::Platform::Other,
            invoice_number: None,
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            is_recurring: false,
            taxable: true,
        },
    }];

    let err = LedgerImporter::load_income(&repo, "u1", rows)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        LedgerImportError::Repository {
            line: 7,
            source: RepositoryError::Database(_)
        }
    ));
}
