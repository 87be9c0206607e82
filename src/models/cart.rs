//! Shopping cart lines and quantity reconciliation

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Stored cart line; unique per (user, book), quantity always > 0
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct CartLine {
    pub id: i64,
    pub user_id: Uuid,
    pub book_id: i32,
    pub quantity: i32,
    /// Row version, bumped on every write
    pub version: i32,
}

/// Write needed to remove quantity from one line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineChange {
    Delete { line_id: i64, version: i32 },
    Decrement { line_id: i64, version: i32, remaining: i32 },
}

/// Quantity of a line after adding `added` units to it
pub fn merge_quantity(current: i32, added: i32) -> AppResult<i32> {
    if added <= 0 {
        return Err(AppError::InvalidQuantity(added));
    }
    current.checked_add(added).ok_or(AppError::InvalidQuantity(added))
}

/// Plan the removal of `quantity` units of a book from its matching lines.
///
/// Applied per line: a line holding no more than `quantity` is deleted,
/// otherwise it keeps `line.quantity - quantity`.
pub fn plan_removal(lines: &[CartLine], quantity: i32) -> Vec<LineChange> {
    lines
        .iter()
        .map(|line| {
            if line.quantity <= quantity {
                LineChange::Delete {
                    line_id: line.id,
                    version: line.version,
                }
            } else {
                LineChange::Decrement {
                    line_id: line.id,
                    version: line.version,
                    remaining: line.quantity - quantity,
                }
            }
        })
        .collect()
}

/// Cart line joined with the current book attributes
#[derive(Debug, Clone, FromRow)]
pub struct CartLineRow {
    pub book_id: i32,
    pub title: String,
    pub authors: String,
    pub genres: String,
    pub year: Option<i32>,
    pub publisher: Option<String>,
    pub price: Decimal,
    pub quantity: i32,
}

impl From<CartLineRow> for CartLineView {
    fn from(row: CartLineRow) -> Self {
        CartLineView {
            subtotal: row.price * Decimal::from(row.quantity),
            book_id: row.book_id,
            title: row.title,
            authors: row.authors,
            genres: row.genres,
            year: row.year,
            publisher: row.publisher,
            price: row.price,
            quantity: row.quantity,
        }
    }
}

/// Cart line as shown to the user
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CartLineView {
    pub book_id: i32,
    pub title: String,
    pub authors: String,
    pub genres: String,
    pub year: Option<i32>,
    pub publisher: Option<String>,
    pub price: Decimal,
    pub quantity: i32,
    /// quantity × price
    pub subtotal: Decimal,
}

/// Whole cart with its total
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CartView {
    pub items: Vec<CartLineView>,
    pub total: Decimal,
}

impl CartView {
    pub fn from_lines(items: Vec<CartLineView>) -> Self {
        let total = items.iter().map(|line| line.subtotal).sum();
        Self { items, total }
    }

    pub fn line(&self, book_id: i32) -> Option<&CartLineView> {
        self.items.iter().find(|line| line.book_id == book_id)
    }
}

/// Cart quantity query parameter; defaults to a single unit
#[derive(Debug, serde::Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct QuantityQuery {
    pub quantity: Option<i32>,
}

impl QuantityQuery {
    pub fn quantity(&self) -> i32 {
        self.quantity.unwrap_or(1)
    }
}
