use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use tracing::warn;

use super::validation::{validate_id, Validate};
use crate::error::ApiError;

/// Positive product id taken from the `{id}` path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductId(pub i64);

#[async_trait]
impl<S> FromRequestParts<S> for ProductId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i64>::from_request_parts(parts, state)
            .await
            .map_err(|e| {
                warn!(error = %e, "invalid product id in path");
                ApiError::BadRequest(e.body_text())
            })?;

        let id = validate_id(id).map_err(|errors| {
            warn!(product_id = id, "non-positive product id");
            ApiError::Validation(errors)
        })?;
        Ok(ProductId(id))
    }
}

/// JSON body that passed its field rules.
#[derive(Debug)]
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate + Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|e| {
            warn!(error = %e, "malformed json body");
            ApiError::BadRequest(e.body_text())
        })?;

        value.validate().map_err(|errors| {
            warn!(?errors, "request body failed validation");
            ApiError::Validation(errors)
        })?;
        Ok(ValidJson(value))
    }
}
