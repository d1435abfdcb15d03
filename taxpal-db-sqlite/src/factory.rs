use async_trait::async_trait;
use taxpal_core::db::{DbConfig, RepositoryFactory};
use taxpal_core::{LedgerRepository, RepositoryError};

use crate::repository::SqliteRepository;

/// [`RepositoryFactory`] for SQLite.
///
/// Register this with a [`taxpal_core::db::RepositoryRegistry`] to make the
/// `"sqlite"` backend available:
///
/// ```rust,no_run
/// use taxpal_core::db::RepositoryRegistry;
/// use taxpal_db_sqlite::SqliteRepositoryFactory;
///
/// let mut registry = RepositoryRegistry::new();
/// registry.register(Box::new(SqliteRepositoryFactory));
/// ```
pub struct SqliteRepositoryFactory;

#[async_trait]
impl RepositoryFactory for SqliteRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// Open the database described by `config.connection_string` and apply
    /// pending migrations.
    ///
    /// Accepted connection-string values:
    /// * A bare file path, e.g. `"taxpal.db"`. The file is created if it
    ///   does not exist.
    /// * A sqlx URL, e.g. `"sqlite://data/taxpal.db"`.
    /// * `":memory:"`, an ephemeral in-memory database.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn LedgerRepository>, RepositoryError> {
        let repo = SqliteRepository::new(&config.connection_string).await?;
        repo.run_migrations().await?;
        Ok(Box::new(repo))
    }
}
