use std::collections::HashMap;

use async_trait::async_trait;
use tracing::info;

use super::repository::{LedgerRepository, RepositoryError};

/// Backend-agnostic connection configuration.
///
/// `backend` must match the [`RepositoryFactory::backend_name`] of a
/// registered factory. `connection_string` is handed to that factory as is.
///
/// | backend    | connection_string examples                     |
/// |------------|------------------------------------------------|
/// | `sqlite`   | `taxpal.db`, `sqlite://data/taxpal.db`, `:memory:` |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub backend: String,
    pub connection_string: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            backend: "sqlite".to_string(),
            connection_string: "taxpal.db".to_string(),
        }
    }
}

/// One implementation per storage backend, registered with a
/// [`RepositoryRegistry`] at startup.
#[async_trait]
pub trait RepositoryFactory: Send + Sync {
    /// Unique, lowercase identifier for this backend.
    fn backend_name(&self) -> &'static str;

    /// Opens the store and returns a repository ready for use, with any
    /// schema migrations already applied.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn LedgerRepository>, RepositoryError>;
}

/// Registry of [`RepositoryFactory`] instances, keyed by backend name.
#[derive(Default)]
pub struct RepositoryRegistry {
    factories: HashMap<&'static str, Box<dyn RepositoryFactory>>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a backend, replacing any factory with the same name.
    pub fn register(
        &mut self,
        factory: Box<dyn RepositoryFactory>,
    ) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Names of every registered backend, sorted alphabetically.
    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Dispatches to the factory matching `config.backend`.
    ///
    /// # Errors
    /// * [`RepositoryError::Configuration`] when no factory is registered
    ///   under the requested name.
    /// * Any error the chosen factory returns.
    pub async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn LedgerRepository>, RepositoryError> {
        let factory = self
            .factories
            .get(config.backend.as_str())
            .ok_or_else(|| {
                RepositoryError::Configuration(format!(
                    "unknown backend '{}'; available: {:?}",
                    config.backend,
                    self.available_backends()
                ))
            })?;

        info!(backend = %config.backend, "opening ledger repository");
        factory.create(config).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use async_trait::async_trait;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::{
        ExpenseCategory, ExpenseRecord, ExpenseUpdate, IncomeCategory, IncomeRecord, IncomeUpdate,
        LedgerQuery, NewExpense, NewIncome, Page,
    };

    // Routing is all these tests check; no repository method is ever called.
    struct StubRepository;

    #[async_trait]
    impl LedgerRepository for StubRepository {
        async fn create_income(
            &self,
            _user_id: &str,
            _income: NewIncome,
        ) -> Result<IncomeRecord, RepositoryError> {
            unimplemented!()
        }
        async fn get_income(
            &self,
            _user_id: &str,
            _id: i64,
        ) -> Result<IncomeRecord, RepositoryError> {
            unimplemented!()
        }
        async fn update_income(
            &self,
            _user_id: &str,
            _id: i64,
            _update: IncomeUpdate,
        ) -> Result<IncomeRecord, RepositoryError> {
            unimplemented!()
        }
        async fn delete_income(
            &self,
            _user_id: &str,
            _id: i64,
        ) -> Result<(), RepositoryError> {
            unimplemented!()
        }
        async fn list_income(
            &self,
            _user_id: &str,
            _query: &LedgerQuery<IncomeCategory>,
        ) -> Result<Page<IncomeRecord>, RepositoryError> {
            unimplemented!()
        }
        async fn income_in_range(
            &self,
            _user_id: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Vec<IncomeRecord>, RepositoryError> {
            unimplemented!()
        }
        async fn create_expense(
            &self,
            _user_id: &str,
            _expense: NewExpense,
        ) -> Result<ExpenseRecord, RepositoryError> {
            unimplemented!()
        }
        async fn get_expense(
            &self,
            _user_id: &str,
            _id: i64,
        ) -> Result<ExpenseRecord, RepositoryError> {
            unimplemented!()
        }
        async fn update_expense(
            &self,
            _user_id: &str,
            _id: i64,
            _update: ExpenseUpdate,
        ) -> Result<ExpenseRecord, RepositoryError> {
            unimplemented!()
        }
        async fn delete_expense(
            &self,
            _user_id: &str,
            _id: i64,
        ) -> Result<(), RepositoryError> {
            unimplemented!()
        }
        async fn list_expenses(
            &self,
            _user_id: &str,
            _query: &LedgerQuery<ExpenseCategory>,
        ) -> Result<Page<ExpenseRecord>, RepositoryError> {
            unimplemented!()
        }
        async fn expenses_in_range(
            &self,
            _user_id: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Vec<ExpenseRecord>, RepositoryError> {
            unimplemented!()
        }
    }

    /// Flips `called` when `create` runs.
    struct StubFactory {
        name: &'static str,
        called: Arc<AtomicBool>,
    }

    #[async_trait]
    impl RepositoryFactory for StubFactory {
        fn backend_name(&self) -> &'static str {
            self.name
        }
        async fn create(
            &self,
            _config: &DbConfig,
        ) -> Result<Box<dyn LedgerRepository>, RepositoryError> {
            self.called.store(true, Ordering::SeqCst);
            Ok(Box::new(StubRepository))
        }
    }

    struct FailingFactory;

    #[async_trait]
    impl RepositoryFactory for FailingFactory {
        fn backend_name(&self) -> &'static str {
            "failing"
        }
        async fn create(
            &self,
            _config: &DbConfig,
        ) -> Result<Box<dyn LedgerRepository>, RepositoryError> {
            Err(RepositoryError::Connection("disk unavailable".to_string()))
        }
    }

    fn stub_factory(name: &'static str) -> (Box<dyn RepositoryFactory>, Arc<AtomicBool>) {
        let flag = Arc::new(AtomicBool::new(false));
        (
            Box::new(StubFactory {
                name,
                called: flag.clone(),
            }),
            flag,
        )
    }

    fn config(backend: &str) -> DbConfig {
        DbConfig {
            backend: backend.to_string(),
            connection_string: ":memory:".to_string(),
        }
    }

    // ===== DbConfig tests =====

    #[test]
    fn default_config_is_sqlite_file() {
        let cfg = DbConfig::default();

        assert_eq!(cfg.backend, "sqlite");
        assert_eq!(cfg.connection_string, "taxpal.db");
    }

    // ===== registration tests =====

    #[test]
    fn new_registry_has_no_backends() {
        assert!(RepositoryRegistry::new().available_backends().is_empty());
    }

    #[test]
    fn available_backends_is_sorted() {
        let mut reg = RepositoryRegistry::new();
        let (f1, _) = stub_factory("sqlite");
        let (f2, _) = stub_factory("postgres");
        reg.register(f1);
        reg.register(f2);

        assert_eq!(reg.available_backends(), vec!["postgres", "sqlite"]);
    }

    #[test]
    fn duplicate_registration_replaces_previous() {
        let mut reg = RepositoryRegistry::new();
        let (old, _) = stub_factory("sqlite");
        let (new, _) = stub_factory("sqlite");
        reg.register(old);
        reg.register(new);

        assert_eq!(reg.available_backends(), vec!["sqlite"]);
    }

    // ===== dispatch tests =====

    #[tokio::test]
    async fn create_calls_only_the_matching_factory() {
        let mut reg = RepositoryRegistry::new();
        let (sqlite, sqlite_called) = stub_factory("sqlite");
        let (postgres, postgres_called) = stub_factory("postgres");
        reg.register(sqlite);
        reg.register(postgres);

        let result = reg.create(&config("sqlite")).await;

        assert!(result.is_ok());
        assert!(sqlite_called.load(Ordering::SeqCst));
        assert!(!postgres_called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn unknown_backend_names_requested_and_available() {
        let mut reg = RepositoryRegistry::new();
        let (f, _) = stub_factory("sqlite");
        reg.register(f);

        match reg.create(&config("postgres")).await {
            Err(RepositoryError::Configuration(msg)) => {
                assert!(msg.contains("postgres"));
                assert!(msg.contains("sqlite"));
            }
            Err(other) => panic!("expected Configuration error, got {other:?}"),
            Ok(_) => panic!("expected Configuration error, got a repository"),
        }
    }

    #[tokio::test]
    async fn create_propagates_factory_error() {
        let mut reg = RepositoryRegistry::new();
        reg.register(Box::new(FailingFactory));

        let result = reg.create(&config("failing")).await;

        assert!(matches!(
            result,
            Err(RepositoryError::Connection(msg)) if msg == "disk unavailable"
        ));
    }
}
