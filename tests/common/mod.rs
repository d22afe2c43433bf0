//! Shared helpers for the HTTP integration tests.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use product_catalog::app::build_app;
use product_catalog::config::{AppConfig, Environment};
use product_catalog::products::{Product, ProductFields};
use product_catalog::state::AppState;
use product_catalog::store::{ProductStore, SqliteProductStore, StoreError, StoreResult};
use rust_decimal::Decimal;
use tokio::net::TcpListener;

/// Running server plus the address it listens on.
#[allow(dead_code)]
pub struct TestServer {
    pub addr: SocketAddr,
    pub store: Arc<dyn ProductStore>,
}

#[allow(dead_code)]
impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

/// Serve `store` on an ephemeral port.
pub async fn spawn_with_store(store: Arc<dyn ProductStore>, environment: Environment) -> TestServer {
    let config = Arc::new(AppConfig::local("sqlite::memory:", environment));
    let app = build_app(AppState::from_parts(store.clone(), config));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer { addr, store }
}

/// Server backed by a fresh, seeded in-memory SQLite store.
pub async fn spawn_seeded() -> TestServer {
    let store = SqliteProductStore::in_memory().await.unwrap();
    store.initialize().await.unwrap();
    spawn_with_store(Arc::new(store), Environment::Production).await
}

#[allow(dead_code)]
pub fn fields(name: &str, price: Decimal, description: Option<&str>) -> ProductFields {
    ProductFields {
        name: name.into(),
        price,
        description: description.map(String::from),
    }
}

/// Store whose every call fails like a dropped database.
#[allow(dead_code)]
pub struct FailingStore;

#[async_trait]
impl ProductStore for FailingStore {
    fn backend(&self) -> &'static str {
        "failing"
    }

    async fn initialize(&self) -> StoreResult<()> {
        Err(down())
    }

    async fn ping(&self) -> StoreResult<()> {
        Err(down())
    }

    async fn list_all(&self) -> StoreResult<Vec<Product>> {
        Err(down())
    }

    async fn get_by_id(&self, _id: i64) -> StoreResult<Option<Product>> {
        Err(down())
    }

    async fn create(&self, _fields: &ProductFields) -> StoreResult<Product> {
        Err(down())
    }

    async fn update(&self, _id: i64, _fields: &ProductFields) -> StoreResult<Option<Product>> {
        Err(down())
    }

    async fn delete(&self, _id: i64) -> StoreResult<bool> {
        Err(down())
    }
}

fn down() -> StoreError {
    StoreError::Database(sqlx::Error::PoolClosed)
}

/// Store that panics on `list_all`; everything else behaves like an empty table.
#[allow(dead_code)]
pub struct PanickingStore;

#[async_trait]
impl ProductStore for PanickingStore {
    fn backend(&self) -> &'static str {
        "panicking"
    }

    async fn initialize(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn list_all(&self) -> StoreResult<Vec<Product>> {
        panic!("list_all exploded")
    }

    async fn get_by_id(&self, _id: i64) -> StoreResult<Option<Product>> {
        Ok(None)
    }

    async fn create(&self, _fields: &ProductFields) -> StoreResult<Product> {
        Err(StoreError::Constraint("read only".into()))
    }

    async fn update(&self, _id: i64, _fields: &ProductFields) -> StoreResult<Option<Product>> {
        Ok(None)
    }

    async fn delete(&self, _id: i64) -> StoreResult<bool> {
        Ok(false)
    }
}
