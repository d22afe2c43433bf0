//! Product persistence.
//!
//! [`ProductStore`] is the single data-access contract used by the HTTP
//! layer. Two adapters implement it: PostgreSQL for deployments and SQLite
//! for tests and local runs. [`connect`] picks one from the connection string.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{error, info};

use crate::products::{Product, ProductFields};

pub mod postgres;
pub mod schema;
pub mod sqlite;

pub use postgres::PgProductStore;
pub use sqlite::SqliteProductStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A storage-level check constraint rejected the row.
    #[error("constraint violated: {0}")]
    Constraint(String),
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
    #[error("invalid persisted product data: {0}")]
    InvalidData(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if matches!(db_err.kind(), sqlx::error::ErrorKind::CheckViolation) {
                return Self::Constraint(db_err.message().to_string());
            }
        }
        Self::Database(err)
    }
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Short backend name used in logs.
    fn backend(&self) -> &'static str;

    /// Create the table and indexes if absent, then seed an empty table.
    async fn initialize(&self) -> StoreResult<()>;

    async fn ping(&self) -> StoreResult<()>;

    /// All products, newest first.
    async fn list_all(&self) -> StoreResult<Vec<Product>>;

    async fn get_by_id(&self, id: i64) -> StoreResult<Option<Product>>;

    async fn create(&self, fields: &ProductFields) -> StoreResult<Product>;

    /// Overwrites name, price and description. `None` when `id` is unknown.
    async fn update(&self, id: i64, fields: &ProductFields) -> StoreResult<Option<Product>>;

    /// Returns whether a row was removed.
    async fn delete(&self, id: i64) -> StoreResult<bool>;
}

/// Open the store named by `database_url`.
pub async fn connect(database_url: &str) -> anyhow::Result<Arc<dyn ProductStore>> {
    let store: Arc<dyn ProductStore> =
        if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
            Arc::new(PgProductStore::connect(database_url).await?)
        } else if database_url.starts_with("sqlite:") {
            Arc::new(SqliteProductStore::connect(database_url).await?)
        } else {
            anyhow::bail!("unsupported database url scheme");
        };
    info!(backend = store.backend(), "product store connected");
    Ok(store)
}

/// Current UTC time truncated to microseconds, the finest precision both
/// backends keep.
pub(crate) fn now_utc() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    now.replace_nanosecond(now.nanosecond() / 1_000 * 1_000)
        .unwrap_or(now)
}

/// Price as stored: two decimal places, midpoint away from zero (NUMERIC(10,2)).
pub(crate) fn storage_price(price: Decimal) -> Decimal {
    price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Log a failed store operation and hand the error back unchanged.
pub(crate) fn log_failure(backend: &'static str, op: &'static str, err: StoreError) -> StoreError {
    error!(backend, op, error = %err, "product store operation failed");
    err
}

pub(crate) fn ensure_url_scheme(database_url: &str, prefixes: &[&str]) -> anyhow::Result<()> {
    prefixes
        .iter()
        .any(|p| database_url.starts_with(p))
        .then_some(())
        .with_context(|| format!("expected a url starting with one of {prefixes:?}"))
}
