use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Request body for create and update. Absent `name`/`price` fall back to
/// empty values so they are reported as field errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFields {
    #[serde(default)]
    pub name: String,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default)]
    pub description: Option<String>,
}
