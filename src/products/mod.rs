mod dto;
pub(crate) mod extractors;
pub mod handlers;
mod repo_types;
pub mod validation;

use crate::state::AppState;
use axum::Router;

pub use dto::ProductFields;
pub use repo_types::Product;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::product_routes())
}
