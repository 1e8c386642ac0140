//! Book (catalog entry) model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Largest amount a `NUMERIC(10, 2)` column holds: 99999999.99
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0x540B_E3FF, 2, 0, false, 2);

/// Catalog book. `quantity` is the number of copies currently on the shelf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub quantity: i32,
    /// Fine charged per day a copy is kept past its expected-return date
    pub fine_rate: Decimal,
}

/// Create book request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewBook {
    #[validate(length(min = 1, max = 200, message = "Title is required (max 200 characters)"))]
    pub title: String,
    #[validate(length(min = 1, max = 200, message = "Author is required (max 200 characters)"))]
    pub author: String,
    #[validate(length(min = 10, max = 13, message = "ISBN must be 10 to 13 characters"))]
    pub isbn: String,
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: i32,
    pub fine_rate: Decimal,
}

impl NewBook {
    /// Strip separators so "978-2-07-040850-4" and "9782070408504" collide
    pub fn normalize_isbn(isbn: &str) -> String {
        isbn.chars()
            .filter(|c| c.is_ascii_digit() || *c == 'X' || *c == 'x')
            .map(|c| c.to_ascii_uppercase())
            .collect()
    }
}
