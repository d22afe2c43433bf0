use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{debug, info, instrument};

use super::{
    ensure_url_scheme, log_failure, now_utc, schema, storage_price, ProductStore, StoreResult,
};
use crate::products::{Product, ProductFields};

const BACKEND: &str = "postgres";

/// PostgreSQL adapter over a shared connection pool.
#[derive(Clone)]
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        ensure_url_scheme(database_url, &["postgres://", "postgresql://"])?;
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("connect to postgres")?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
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
        let created_at = now_utc();
        let mut tx = self.pool.begin().await?;
        for seed in schema::SEED_PRODUCTS {
            sqlx::query(
                r#"
                INSERT INTO products (name, price, description, created_at)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(seed.name)
            .bind(seed.price())
            .bind(seed.description)
            .bind(created_at)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    #[instrument(skip(self))]
    async fn initialize(&self) -> StoreResult<()> {
        let result = async {
            for statement in schema::POSTGRES_SCHEMA {
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
        sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, price, description, created_at, updated_at
            FROM products
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| log_failure(BACKEND, "list_all", e.into()))
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: i64) -> StoreResult<Option<Product>> {
        sqlx::query_as::<_, Product>(
            r#"
            SELECT id, name, price, description, created_at, updated_at
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| log_failure(BACKEND, "get_by_id", e.into()))
    }

    #[instrument(skip(self, fields))]
    async fn create(&self, fields: &ProductFields) -> StoreResult<Product> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (name, price, description, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, price, description, created_at, updated_at
            "#,
        )
        .bind(&fields.name)
        .bind(storage_price(fields.price))
        .bind(fields.description.as_deref())
        .bind(now_utc())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| log_failure(BACKEND, "create", e.into()))?;
        debug!(product_id = product.id, "product inserted");
        Ok(product)
    }

    #[instrument(skip(self, fields))]
    async fn update(&self, id: i64, fields: &ProductFields) -> StoreResult<Option<Product>> {
        sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET name = $1, price = $2, description = $3, updated_at = $4
            WHERE id = $5
            RETURNING id, name, price, description, created_at, updated_at
            "#,
        )
        .bind(&fields.name)
        .bind(storage_price(fields.price))
        .bind(fields.description.as_deref())
        .bind(now_utc())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| log_failure(BACKEND, "update", e.into()))
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| log_failure(BACKEND, "delete", e.into()))?;
        Ok(result.rows_affected() > 0)
    }
}
