use std::str::FromStr;

use anyhow::Context;
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    FromRow, SqlitePool,
};
use time::{
    format_description::well_known::Rfc3339, macros::format_description, OffsetDateTime,
    UtcOffset,
};
use tracing::{debug, info, instrument};

use super::{
    ensure_url_scheme, log_failure, now_utc, schema, storage_price, ProductStore, StoreError,
    StoreResult,
};
use crate::products::{Product, ProductFields};

const BACKEND: &str = "sqlite";

/// Raw row; SQLite keeps the price as decimal text and timestamps as
/// fixed-width UTC text.
#[derive(Debug, FromRow)]
struct ProductRow {
    id: i64,
    name: String,
    price: String,
    description: Option<String>,
    created_at: String,
    updated_at: Option<String>,
}

/// `YYYY-MM-DDTHH:MM:SS.ffffffZ`. Every value has the same width, so text
/// order is time order.
fn timestamp_text(ts: OffsetDateTime) -> StoreResult<String> {
    let format = format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]Z"
    );
    ts.to_offset(UtcOffset::UTC)
        .format(format)
        .map_err(|e| StoreError::InvalidData(format!("timestamp {ts}: {e}")))
}

fn parse_timestamp(id: i64, raw: &str) -> StoreResult<OffsetDateTime> {
    OffsetDateTime::parse(raw, &Rfc3339)
        .map_err(|e| StoreError::InvalidData(format!("timestamp {raw:?} of product {id}: {e}")))
}

impl TryFrom<ProductRow> for Product {
    type Error = StoreError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Decimal::from_str(&row.price).map_err(|e| {
            StoreError::InvalidData(format!("price {:?} of product {}: {e}", row.price, row.id))
        })?;
        let created_at = parse_timestamp(row.id, &row.created_at)?;
        let updated_at = row
            .updated_at
            .as_deref()
            .map(|raw| parse_timestamp(row.id, raw))
            .transpose()?;
        Ok(Self {
            id: row.id,
            name: row.name,
            price,
            description: row.description,
            created_at,
            updated_at,
        })
    }
}

/// SQLite adapter. An in-memory database lives on a single connection that
/// the pool never recycles.
#[derive(Clone)]
pub struct SqliteProductStore {
    pool: SqlitePool,
}

impl SqliteProductStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        ensure_url_scheme(database_url, &["sqlite:"])?;
        let options = SqliteConnectOptions::from_str(database_url)
            .context("parse sqlite url")?
            .create_if_missing(true);

        let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .context("connect to sqlite")?;
        Ok(Self { pool })
    }

    /// Fresh, empty in-memory store.
    pub async fn in_memory() -> anyhow::Result<Self> {
        Self::connect("sqlite::memory:").await
    }

    async fn seed_if_empty(&self) -> StoreResult<()> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;
        if count > 0 {
            info!(count, "skipping seed, products already exist");
            return Ok(());
        }

        info!("seeding initial product data");
        let created_at = timestamp_text(now_utc())?;
        let mut tx = self.pool.begin().await?;
        for seed in schema::SEED_PRODUCTS {
            sqlx::query(
                "INSERT INTO products (name, price, description, created_at) VALUES (?, ?, ?, ?)",
            )
            .bind(seed.name)
            .bind(seed.price().to_string())
            .bind(seed.description)
            .bind(created_at.as_str())
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl ProductStore for SqliteProductStore {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    #[instrument(skip(self))]
    async fn initialize(&self) -> StoreResult<()> {
        let result = async {
            for statement in schema::SQLITE_SCHEMA {
                sqlx::query(statement).execute(&self.pool).await?;
            }
            info!("products table and indexes ready");
            self.seed_if_empty().await
        }
        .await;
        result.map_err(|e| log_failure(BACKEND, "initialize", e))
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| log_failure(BACKEND, "ping", e.into()))
    }

    #[instrument(skip(self))]
    async fn list_all(&self) -> StoreResult<Vec<Product>> {
        debug!("executing list_all query");
        let rows = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, name, price, description, created_at, updated_at
            FROM products
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| log_failure(BACKEND, "list_all", e.into()))?;

        rows.into_iter()
            .map(Product::try_from)
            .collect::<StoreResult<Vec<_>>>()
            .map_err(|e| log_failure(BACKEND, "list_all", e))
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: i64) -> StoreResult<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, name, price, description, created_at, updated_at
            FROM products
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| log_failure(BACKEND, "get_by_id", e.into()))?;

        row.map(Product::try_from)
            .transpose()
            .map_err(|e| log_failure(BACKEND, "get_by_id", e))
    }

    #[instrument(skip(self, fields))]
    async fn create(&self, fields: &ProductFields) -> StoreResult<Product> {
        let created_at = timestamp_text(now_utc()).map_err(|e| log_failure(BACKEND, "create", e))?;
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            INSERT INTO products (name, price, description, created_at, updated_at)
            VALUES (?, ?, ?, ?, NULL)
            RETURNING id, name, price, description, created_at, updated_at
            "#,
        )
        .bind(&fields.name)
        .bind(storage_price(fields.price).to_string())
        .bind(fields.description.as_deref())
        .bind(created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| log_failure(BACKEND, "create", e.into()))?;

        let product = Product::try_from(row).map_err(|e| log_failure(BACKEND, "create", e))?;
        debug!(product_id = product.id, "product inserted");
        Ok(product)
    }

    #[instrument(skip(self, fields))]
    async fn update(&self, id: i64, fields: &ProductFields) -> StoreResult<Option<Product>> {
        let updated_at = timestamp_text(now_utc()).map_err(|e| log_failure(BACKEND, "update", e))?;
        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            UPDATE products
            SET name = ?, price = ?, description = ?, updated_at = ?
            WHERE id = ?
            RETURNING id, name, price, description, created_at, updated_at
            "#,
        )
        .bind(&fields.name)
        .bind(storage_price(fields.price).to_string())
        .bind(fields.description.as_deref())
        .bind(updated_at)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| log_failure(BACKEND, "update", e.into()))?;

        row.map(Product::try_from)
            .transpose()
            .map_err(|e| log_failure(BACKEND, "update", e))
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| log_failure(BACKEND, "delete", e.into()))?;
        Ok(result.rows_affected() > 0)
    }
}
