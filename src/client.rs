//! Typed HTTP client for the product endpoints.
//!
//! Mirrors [`ProductStore`](crate::store::ProductStore): a 404 on a single
//! product is `None`/`false`, every other failure is a [`ClientError`].

use std::fmt;

use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::products::{Product, ProductFields};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ListAll,
    GetById,
    Create,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ListAll => "list products",
            Self::GetById => "get product",
            Self::Create => "create product",
            Self::Update => "update product",
            Self::Delete => "delete product",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum ClientErrorKind {
    #[error("server responded with {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
#[error("failed to {operation}{}", .id.map(|id| format!(" {id}")).unwrap_or_default())]
pub struct ClientError {
    pub operation: Operation,
    pub id: Option<i64>,
    #[source]
    pub cause: ClientErrorKind,
}

impl ClientError {
    fn new(operation: Operation, id: Option<i64>, cause: impl Into<ClientErrorKind>) -> Self {
        Self {
            operation,
            id,
            cause: cause.into(),
        }
    }

    /// HTTP status, when the server answered.
    pub fn status(&self) -> Option<StatusCode> {
        match &self.cause {
            ClientErrorKind::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Clone)]
pub struct ProductApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ProductApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn products_url(&self) -> String {
        format!("{}/products", self.base_url)
    }

    fn product_url(&self, id: i64) -> String {
        format!("{}/products/{id}", self.base_url)
    }

    #[instrument(skip(self))]
    pub async fn list_all(&self) -> ClientResult<Vec<Product>> {
        let op = Operation::ListAll;
        let response = self
            .http
            .get(self.products_url())
            .send()
            .await
            .map_err(|e| transport(op, None, e))?;

        let products: Vec<Product> = read_json(op, None, ensure_success(op, None, response).await?).await?;
        info!(count = products.len(), "retrieved products");
        Ok(products)
    }

    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: i64) -> ClientResult<Option<Product>> {
        let op = Operation::GetById;
        let response = self
            .http
            .get(self.product_url(id))
            .send()
            .await
            .map_err(|e| transport(op, Some(id), e))?;

        if response.status() == StatusCode::NOT_FOUND {
            warn!(product_id = id, "product not found");
            return Ok(None);
        }
        let response = ensure_success(op, Some(id), response).await?;
        read_json(op, Some(id), response).await.map(Some)
    }

    #[instrument(skip(self, fields))]
    pub async fn create(&self, fields: &ProductFields) -> ClientResult<Product> {
        let op = Operation::Create;
        let response = self
            .http
            .post(self.products_url())
            .json(fields)
            .send()
            .await
            .map_err(|e| transport(op, None, e))?;

        let product: Product = read_json(op, None, ensure_success(op, None, response).await?).await?;
        info!(product_id = product.id, "product created");
        Ok(product)
    }

    #[instrument(skip(self, fields))]
    pub async fn update(&self, id: i64, fields: &ProductFields) -> ClientResult<Option<Product>> {
        let op = Operation::Update;
        let response = self
            .http
            .put(self.product_url(id))
            .json(fields)
            .send()
            .await
            .map_err(|e| transport(op, Some(id), e))?;

        if response.status() == StatusCode::NOT_FOUND {
            warn!(product_id = id, "product not found for update");
            return Ok(None);
        }
        let response = ensure_success(op, Some(id), response).await?;
        read_json(op, Some(id), response).await.map(Some)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> ClientResult<bool> {
        let op = Operation::Delete;
        let response = self
            .http
            .delete(self.product_url(id))
            .send()
            .await
            .map_err(|e| transport(op, Some(id), e))?;

        if response.status() == StatusCode::NOT_FOUND {
            warn!(product_id = id, "product not found for deletion");
            return Ok(false);
        }
        ensure_success(op, Some(id), response).await?;
        info!(product_id = id, "product deleted");
        Ok(true)
    }
}

fn transport(op: Operation, id: Option<i64>, err: reqwest::Error) -> ClientError {
    error!(operation = %op, product_id = ?id, error = %err, "request failed");
    ClientError::new(op, id, err)
}

async fn ensure_success(op: Operation, id: Option<i64>, response: Response) -> ClientResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            warn!(operation = %op, product_id = ?id, %status, error = %e, "could not read error body");
            String::new()
        }
    };
    error!(operation = %op, product_id = ?id, %status, %body, "api error response");
    Err(ClientError::new(op, id, ClientErrorKind::Status { status, body }))
}

async fn read_json<T: DeserializeOwned>(op: Operation, id: Option<i64>, response: Response) -> ClientResult<T> {
    let bytes = response.bytes().await.map_err(|e| transport(op, id, e))?;
    serde_json::from_slice(&bytes).map_err(|e| {
        error!(operation = %op, product_id = ?id, error = %e, "could not decode response");
        ClientError::new(op, id, e)
    })
}
