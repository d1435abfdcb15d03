//! Server configuration.
//!
//! Values are resolved in three layers: built-in defaults, then an optional
//! TOML file (`--config`), then individual command-line flags.
//!
//! ```toml
//! bind = "0.0.0.0:3000"
//! log_level = "info,taxpal_server=debug"
//! log_file = "taxpal.log"
//!
//! [database]
//! backend = "sqlite"
//! connection_string = "sqlite://data/taxpal.db"
//!
//! [tax]
//! table = "taxpal-data/test-data/tax_brackets_2024.csv"
//! year = 2024
//! filing_status = "HOH"
//! standard_deduction = "21900"
//! ```

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use rust_decimal::Decimal;
use serde::Deserialize;
use taxpal_core::db::DbConfig;
use taxpal_core::{FilingStatusCode, SE_TAX_RATE, STANDARD_DEDUCTION_2024, TaxTable};
use taxpal_data::TaxTableLoader;

/// TaxPal HTTP API server
#[derive(Parser, Debug, Default)]
#[command(name = "taxpal-server")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to listen on, e.g. 127.0.0.1:3000
    #[arg(short, long)]
    pub bind: Option<SocketAddr>,

    /// Storage backend (sqlite)
    #[arg(long)]
    pub backend: Option<String>,

    /// Database path or connection string
    #[arg(long)]
    pub db: Option<String>,

    /// Tax bracket CSV replacing the built-in 2024 single-filer table
    #[arg(long)]
    pub tax_table: Option<PathBuf>,

    /// Tracing filter, e.g. "info" or "info,taxpal_server=debug"
    #[arg(long)]
    pub log_level: Option<String>,

    /// Also append logs to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    pub database: DatabaseConfig,
    pub tax: TaxConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 3000)),
            log_level: "info".to_string(),
            log_file: None,
            database: DatabaseConfig::default(),
            tax: TaxConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    pub backend: String,
    pub connection_string: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let DbConfig {
            backend,
            connection_string,
        } = DbConfig::default();
        Self {
            backend,
            connection_string,
        }
    }
}

impl DatabaseConfig {
    pub fn db_config(&self) -> DbConfig {
        DbConfig {
            backend: self.backend.clone(),
            connection_string: self.connection_string.clone(),
        }
    }
}

/// Which tax table the engine runs on. `year` and `filing_status` select
/// rows from `table`; without a table only the built-in single-filer
/// brackets are available.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TaxConfig {
    pub table: Option<PathBuf>,
    pub year: i32,
    pub filing_status: FilingStatusCode,
    pub standard_deduction: Decimal,
    pub se_tax_rate: Decimal,
}

impl Default for TaxConfig {
    fn default() -> Self {
        Self {
            table: None,
            year: 2024,
            filing_status: FilingStatusCode::Single,
            standard_deduction: STANDARD_DEDUCTION_2024,
            se_tax_rate: SE_TAX_RATE,
        }
    }
}

impl TaxConfig {
    pub fn build_table(&self) -> Result<TaxTable> {
        if let Some(path) = &self.table {
            return TaxTableLoader::from_path(
                path,
                self.year,
                self.filing_status,
                self.standard_deduction,
                self.se_tax_rate,
            )
            .with_context(|| format!("Failed to load tax table: {}", path.display()));
        }

        if self.filing_status != FilingStatusCode::Single {
            bail!(
                "filing status {} needs a tax table file; the built-in table is single-filer only",
                self.filing_status.as_str()
            );
        }
        let builtin = TaxTable::single_filer_2024();
        TaxTable::new(
            builtin.tax_year(),
            builtin.filing_status(),
            builtin.brackets().to_vec(),
            self.standard_deduction,
            self.se_tax_rate,
        )
        .context("Invalid tax settings")
    }
}

impl ServerConfig {
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).context("Failed to parse configuration")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid config: {}", path.display()))
    }

    /// Defaults, then the `--config` file, then flags.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_cli(cli);
        Ok(config)
    }

    fn apply_cli(
        &mut self,
        cli: &Cli,
    ) {
        if let Some(bind) = cli.bind {
            self.bind = bind;
        }
        if let Some(backend) = &cli.backend {
            self.database.backend = backend.clone();
        }
        if let Some(db) = &cli.db {
            self.database.connection_string = db.clone();
        }
        if let Some(table) = &cli.tax_table {
            self.tax.table = Some(table.clone());
        }
        if let Some(level) = &cli.log_level {
            self.log_level = level.clone();
        }
        if let Some(file) = &cli.log_file {
            self.log_file = Some(file.clone());
        }
    }
}
