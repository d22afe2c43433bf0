//! Table definitions and seed rows for each backend.
//!
//! Statements are kept one per entry so they can run through the prepared
//! statement path of either driver.

use rust_decimal::Decimal;

pub const POSTGRES_SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS products (
        id          BIGSERIAL PRIMARY KEY,
        name        VARCHAR(100) NOT NULL,
        price       NUMERIC(10, 2) NOT NULL CHECK (price > 0),
        description VARCHAR(500),
        created_at  TIMESTAMPTZ NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at  TIMESTAMPTZ
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_products_name ON products (name)",
    "CREATE INDEX IF NOT EXISTS idx_products_created_at ON products (created_at)",
];

// SQLite has no exact numeric type; price is decimal text
pub const SQLITE_SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS products (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        name        TEXT NOT NULL,
        price       TEXT NOT NULL CHECK (CAST(price AS REAL) > 0),
        description TEXT,
        created_at  TEXT NOT NULL,
        updated_at  TEXT
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_products_name ON products (name)",
    "CREATE INDEX IF NOT EXISTS idx_products_created_at ON products (created_at)",
];

/// A sample row inserted into an empty table.
#[derive(Debug, Clone, Copy)]
pub struct SeedProduct {
    pub name: &'static str,
    pub price_cents: i64,
    pub description: &'static str,
}

impl SeedProduct {
    pub fn price(&self) -> Decimal {
        Decimal::new(self.price_cents, 2)
    }
}

pub const SEED_PRODUCTS: [SeedProduct; 3] = [
    SeedProduct {
        name: "Sample Product 1",
        price_cents: 1099,
        description: "A sample product for testing.",
    },
    SeedProduct {
        name: "Sample Product 2",
        price_cents: 2550,
        description: "Another sample product.",
    },
    SeedProduct {
        name: "Sample Product 3",
        price_cents: 500,
        description: "Third sample product.",
    },
];
