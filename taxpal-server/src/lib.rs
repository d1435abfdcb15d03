//! HTTP API for TaxPal: ledger CRUD, tax estimates, reports and the
//! dashboard, over any registered [`LedgerRepository`] backend.
//!
//! [`LedgerRepository`]: taxpal_core::LedgerRepository

pub mod config;
pub mod error;
pub mod logging;
pub mod response;
pub mod routes;
pub mod state;

pub use config::{Cli, ServerConfig};
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
