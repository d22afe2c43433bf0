//! Field rules for product input.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::dto::ProductFields;
use crate::store::storage_price;

pub const NAME_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MAX_CHARS: usize = 500;

/// Largest accepted price, 999999.99.
pub fn max_price() -> Decimal {
    Decimal::new(99_999_999, 2)
}

/// Messages keyed by camelCase field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

pub trait Validate {
    fn validate(&self) -> Result<(), FieldErrors>;
}

impl Validate for ProductFields {
    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();

        if self.name.trim().is_empty() {
            errors.add("name", "Product name is required");
        } else if self.name.chars().count() > NAME_MAX_CHARS {
            errors.add("name", "Product name cannot exceed 100 characters");
        }

        // Checked as stored: two places, so 0.004 counts as zero.
        let price = storage_price(self.price);
        if price <= Decimal::ZERO {
            errors.add("price", "Product price must be greater than 0");
        } else if price > max_price() {
            errors.add("price", "Product price cannot exceed $999,999.99");
        }

        if let Some(description) = &self.description {
            if description.chars().count() > DESCRIPTION_MAX_CHARS {
                errors.add("description", "Product description cannot exceed 500 characters");
            }
        }

        errors.into_result()
    }
}

pub fn validate_id(id: i64) -> Result<i64, FieldErrors> {
    if id > 0 {
        return Ok(id);
    }
    let mut errors = FieldErrors::default();
    errors.add("id", "Product ID must be greater than 0");
    Err(errors)
}
