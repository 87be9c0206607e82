//! Carts repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::CartStore;
use crate::{
    error::{AppError, AppResult},
    models::cart::{plan_removal, CartLine, CartLineRow, CartLineView, LineChange},
};

#[derive(Clone)]
pub struct CartsRepository {
    pool: Pool<Postgres>,
}

impl CartsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartStore for CartsRepository {
    /// Upsert the (user, book) line, summing quantities on conflict
    async fn add_line(&self, user_id: Uuid, book_id: i32, quantity: i32) -> AppResult<CartLine> {
        let line = sqlx::query_as::<_, CartLine>(
            r#"
            INSERT INTO cart_items (user_id, book_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, book_id) DO UPDATE SET
                quantity = cart_items.quantity + EXCLUDED.quantity,
                version = cart_items.version + 1,
                updated_at = NOW()
            RETURNING id, user_id, book_id, quantity, version
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .bind(quantity)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            let code = e.as_database_error().and_then(|db| db.code()).map(|c| c.into_owned());
            match code.as_deref() {
                // numeric_value_out_of_range: the summed quantity overflowed
                Some("22003") => AppError::InvalidQuantity(quantity),
                // foreign_key_violation: the book went away after it was looked up
                Some("23503") => AppError::NotFound(format!("Book with id {} not found", book_id)),
                _ => AppError::Database(e),
            }
        })?;

        Ok(line)
    }

    /// Every write is guarded by the version read at the start of the transaction
    async fn remove_quantity(&self, user_id: Uuid, book_id: i32, quantity: i32) -> AppResult<Vec<LineChange>> {
        let mut tx = self.pool.begin().await?;

        let lines = sqlx::query_as::<_, CartLine>(
            r#"
            SELECT id, user_id, book_id, quantity, version
            FROM cart_items
            WHERE user_id = $1 AND book_id = $2
            ORDER BY id
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_all(&mut *tx)
        .await?;

        if lines.is_empty() {
            return Err(AppError::NotFound(format!("Book {} is not in the cart", book_id)));
        }

        let changes = plan_removal(&lines, quantity);
        for change in &changes {
            let affected = match *change {
                LineChange::Delete { line_id, version } => {
                    sqlx::query("DELETE FROM cart_items WHERE id = $1 AND version = $2")
                        .bind(line_id)
                        .bind(version)
                        .execute(&mut *tx)
                        .await?
                        .rows_affected()
                }
                LineChange::Decrement {
                    line_id,
                    version,
                    remaining,
                } => {
                    sqlx::query(
                        r#"
                        UPDATE cart_items
                        SET quantity = $3, version = version + 1, updated_at = NOW()
                        WHERE id = $1 AND version = $2
                        "#,
                    )
                    .bind(line_id)
                    .bind(version)
                    .bind(remaining)
                    .execute(&mut *tx)
                    .await?
                    .rows_affected()
                }
            };

            if affected == 0 {
                // Dropping the transaction rolls back earlier writes
                return Err(AppError::Conflict(
                    "Cart was modified concurrently, retry the request".to_string(),
                ));
            }
        }

        tx.commit().await?;
        Ok(changes)
    }

    async fn lines(&self, user_id: Uuid) -> AppResult<Vec<CartLineView>> {
        let rows = sqlx::query_as::<_, CartLineRow>(
            r#"
            SELECT b.id AS book_id, b.title, b.authors, b.genres, b.year, b.publisher, b.price,
                   c.quantity
            FROM cart_items c
            JOIN books b ON b.id = c.book_id
            WHERE c.user_id = $1
            ORDER BY c.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CartLineView::from).collect())
    }
}
