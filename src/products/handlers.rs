use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use super::{
    dto::ProductFields,
    extractors::{ProductId, ValidJson},
    repo_types::Product,
};
use crate::{error::ApiError, state::AppState};

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

#[instrument(skip(state))]
pub async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<Product>>, ApiError> {
    info!("retrieving all products");
    let products = state.store.list_all().await.map_err(|e| {
        error!(error = %e, "error retrieving all products");
        e
    })?;
    info!(count = products.len(), "retrieved products");
    Ok(Json(products))
}

#[instrument(skip(state))]
pub async fn get_product(
    State(state): State<AppState>,
    ProductId(id): ProductId,
) -> Result<Json<Product>, ApiError> {
    info!(product_id = id, "retrieving product");
    let product = state.store.get_by_id(id).await.map_err(|e| {
        error!(error = %e, product_id = id, "error retrieving product");
        e
    })?;

    match product {
        Some(product) => Ok(Json(product)),
        None => {
            warn!(product_id = id, "product not found");
            Err(ApiError::NotFound(id))
        }
    }
}

#[instrument(skip(state, fields))]
pub async fn create_product(
    State(state): State<AppState>,
    ValidJson(fields): ValidJson<ProductFields>,
) -> Result<impl IntoResponse, ApiError> {
    info!(name = %fields.name, "creating product");
    let product = state.store.create(&fields).await.map_err(|e| {
        error!(error = %e, name = %fields.name, "error creating product");
        e
    })?;

    info!(product_id = product.id, "product created");
    let location = format!("/products/{}", product.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(product),
    ))
}

#[instrument(skip(state, fields))]
pub async fn update_product(
    State(state): State<AppState>,
    ProductId(id): ProductId,
    ValidJson(fields): ValidJson<ProductFields>,
) -> Result<Json<Product>, ApiError> {
    info!(product_id = id, "updating product");
    let product = state.store.update(id, &fields).await.map_err(|e| {
        error!(error = %e, product_id = id, "error updating product");
        e
    })?;

    match product {
        Some(product) => {
            info!(product_id = id, "product updated");
            Ok(Json(product))
        }
        None => {
            warn!(product_id = id, "product not found for update");
            Err(ApiError::NotFound(id))
        }
    }
}

#[instrument(skip(state))]
pub async fn delete_product(
    State(state): State<AppState>,
    ProductId(id): ProductId,
) -> Result<StatusCode, ApiError> {
    info!(product_id = id, "deleting product");
    let deleted = state.store.delete(id).await.map_err(|e| {
        error!(error = %e, product_id = id, "error deleting product");
        e
    })?;

    if !deleted {
        warn!(product_id = id, "product not found for deletion");
        return Err(ApiError::NotFound(id));
    }
    info!(product_id = id, "product deleted");
    Ok(StatusCode::NO_CONTENT)
}
