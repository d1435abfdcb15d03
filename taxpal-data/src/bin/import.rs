use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use taxpal_core::{FilingStatusCode, SE_TAX_RATE, STANDARD_DEDUCTION_2024};
use taxpal_data::{LedgerImporter, TaxTableLoader};
use taxpal_db_sqlite::SqliteRepository;
use tracing_subscriber::EnvFilter;

/// Import ledger CSV files into a TaxPal database, or check a tax table CSV.
#[derive(Parser, Debug)]
#[command(name = "taxpal-import")]
#[command(version, about, long_about = None)]
struct Args {
    /// SQLite database path or URL; created and migrated if missing
    #[arg(short, long, global = true, default_value = "taxpal.db")]
    database: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import income entries
    ///
    /// Columns: source, description, amount, category, platform,
    /// invoice_number, date, is_recurring, taxable
    Income {
        /// Path to the income CSV file
        #[arg(short, long)]
        file: PathBuf,

        /// Owner of the imported entries
        #[arg(short, long)]
        user: String,
    },

    /// Import expense entries
    ///
    /// Columns: description, amount, category, payment_method, receipt_url,
    /// vendor, date, is_recurring, is_deductible, notes
    Expenses {
        /// Path to the expense CSV file
        #[arg(short, long)]
        file: PathBuf,

        /// Owner of the imported entries
        #[arg(short, long)]
        user: String,
    },

    /// Validate a tax bracket CSV and print the selected table
    TaxTable {
        /// Path to the bracket CSV file
        #[arg(short, long)]
        file: PathBuf,

        /// Tax year to select
        #[arg(short, long, default_value_t = 2024)]
        year: i32,

        /// Filing status code (S, MFJ, MFS, HOH, QSS)
        #[arg(short, long, default_value = "S", value_parser = parse_status)]
        status: FilingStatusCode,

        #[arg(long, default_value_t = STANDARD_DEDUCTION_2024)]
        standard_deduction: Decimal,

        #[arg(long, default_value_t = SE_TAX_RATE)]
        se_tax_rate: Decimal,
    },
}

fn parse_status(s: &str) -> Result<FilingStatusCode, String> {
    FilingStatusCode::parse(s).ok_or_else(|| format!("unknown filing status '{s}'"))
}

fn open(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!("Failed to open: {}", path.display()))
}

async fn connect(database: &str) -> Result<SqliteRepository> {
    let repo = SqliteRepository::new(database)
        .await
        .with_context(|| format!("Failed to connect to database: {database}"))?;
    repo.run_migrations()
        .await
        .context("Failed to run migrations")?;
    Ok(repo)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();

    match args.command {
        Command::Income { file, user } => {
            println!("Loading income from: {}", file.display());
            let rows = LedgerImporter::parse_income(open(&file)?)
                .with_context(|| format!("Failed to parse CSV: {}", file.display()))?;
            println!("Parsed {} rows from CSV", rows.len());

            let repo = connect(&args.database).await?;
            let created = LedgerImporter::load_income(&repo, &user, rows)
                .await
                .context("Failed to import income")?;
            println!("Imported {created} income entries for {user}.");
        }
        Command::Expenses { file, user } => {
            println!("Loading expenses from: {}", file.display());
            let rows = LedgerImporter::parse_expenses(open(&file)?)
                .with_context(|| format!("Failed to parse CSV: {}", file.display()))?;
            println!("Parsed {} rows from CSV", rows.len());

            let repo = connect(&args.database).await?;
            let created = LedgerImporter::load_expenses(&repo, &user, rows)
                .await
                .context("Failed to import expenses")?;
            println!("Imported {created} expense entries for {user}.");
        }
        Command::TaxTable {
            file,
            year,
            status,
            standard_deduction,
            se_tax_rate,
        } => {
            let table =
                TaxTableLoader::from_path(&file, year, status, standard_deduction, se_tax_rate)
                    .with_context(|| format!("Invalid tax table: {}", file.display()))?;

            println!(
                "{} schedule {} ({}), standard deduction {}, SE rate {}",
                table.tax_year(),
                status.schedule(),
                status.as_str(),
                table.standard_deduction(),
                table.se_tax_rate()
            );
            for bracket in table.brackets() {
                match bracket.max_income {
                    Some(max) => println!(
                        "  {:>10} - {:>10}  {}",
                        bracket.min_income, max, bracket.tax_rate
                    ),
                    None => println!("  {:>10} +             {}", bracket.min_income, bracket.tax_rate),
                }
            }
        }
    }

    Ok(())
}
