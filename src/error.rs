//! HTTP error taxonomy.
//!
//! Handlers return [`ApiError`]; its `IntoResponse` impl is the one place
//! that turns failures into problem responses. Server errors carry a generic
//! detail. In development the [`expose_error_detail`] middleware swaps in the
//! real message.

use std::any::Any;

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

use crate::{products::validation::FieldErrors, store::StoreError};

pub const GENERIC_ERROR_DETAIL: &str = "An error occurred while processing your request.";
pub const CONSTRAINT_DETAIL: &str = "The product could not be saved because one of its values is not allowed.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("one or more validation errors occurred")]
    Validation(FieldErrors),
    #[error("{0}")]
    BadRequest(String),
    #[error("product {0} not found")]
    NotFound(i64),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Problem response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

impl ProblemDetails {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            kind: problem_type(status).into(),
            title: status.canonical_reason().unwrap_or("Error").into(),
            status: status.as_u16(),
            detail: detail.into(),
            errors: None,
        }
    }

    pub fn with_errors(mut self, errors: FieldErrors) -> Self {
        self.errors = Some(errors);
        self
    }
}

impl IntoResponse for ProblemDetails {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (
            status,
            [(header::CONTENT_TYPE, "application/problem+json")],
            Json(self),
        )
            .into_response()
    }
}

fn problem_type(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => "https://tools.ietf.org/html/rfc9110#section-15.5.1",
        StatusCode::NOT_FOUND => "https://tools.ietf.org/html/rfc9110#section-15.5.5",
        _ => "https://tools.ietf.org/html/rfc9110#section-15.6.1",
    }
}

/// Real message of a server error, kept out of the response body.
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub String);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Store(StoreError::Constraint(_)) => StatusCode::BAD_REQUEST,
            Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::Validation(errors) => {
                ProblemDetails::new(status, "One or more validation errors occurred.")
                    .with_errors(errors)
                    .into_response()
            }
            Self::BadRequest(message) => ProblemDetails::new(status, message).into_response(),
            Self::NotFound(id) => {
                ProblemDetails::new(status, format!("Product {id} was not found.")).into_response()
            }
            Self::Store(StoreError::Constraint(message)) => {
                warn!(constraint = %message, "store rejected product");
                ProblemDetails::new(status, CONSTRAINT_DETAIL).into_response()
            }
            Self::Store(err) => {
                error!(error = %err, "unhandled store error");
                let mut response = ProblemDetails::new(status, GENERIC_ERROR_DETAIL).into_response();
                response.extensions_mut().insert(ErrorDetail(err.to_string()));
                response
            }
        }
    }
}

/// Development-only middleware: rewrites server errors to include the real
/// message.
pub async fn expose_error_detail(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    let detail = response
        .extensions()
        .get::<ErrorDetail>()
        .map(|ErrorDetail(detail)| detail.clone());
    match detail {
        Some(detail) => ProblemDetails::new(response.status(), detail).into_response(),
        None => response,
    }
}

/// Panic handler for `CatchPanicLayer`.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(panic = message, "handler panicked");
    ProblemDetails::new(StatusCode::INTERNAL_SERVER_ERROR, GENERIC_ERROR_DETAIL).into_response()
}
