//! Shopping cart service

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{cart::CartView, user::RequestContext},
    repository::{BookStore, CartStore},
};

#[derive(Clone)]
pub struct CartService {
    carts: Arc<dyn CartStore>,
    books: Arc<dyn BookStore>,
}

impl CartService {
    pub fn new(carts: Arc<dyn CartStore>, books: Arc<dyn BookStore>) -> Self {
        Self { carts, books }
    }

    /// Add `quantity` copies of a book, merging with an existing line
    pub async fn add_line(&self, ctx: &RequestContext, book_id: i32, quantity: i32) -> AppResult<CartView> {
        let identity = ctx.require_user()?;
        if quantity <= 0 {
            return Err(AppError::InvalidQuantity(quantity));
        }

        if self.books.get(book_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Book with id {} not found", book_id)));
        }

        let line = self.carts.add_line(identity.user_id, book_id, quantity).await?;
        tracing::debug!(
            user_id = %identity.user_id,
            book_id,
            quantity = line.quantity,
            "Cart line added"
        );

        self.view(identity.user_id).await
    }

    /// Remove `quantity` copies of a book; lines that run out are deleted
    pub async fn remove_line(&self, ctx: &RequestContext, book_id: i32, quantity: i32) -> AppResult<CartView> {
        let identity = ctx.require_user()?;
        if quantity <= 0 {
            return Err(AppError::InvalidQuantity(quantity));
        }

        let changes = self
            .carts
            .remove_quantity(identity.user_id, book_id, quantity)
            .await?;
        tracing::debug!(user_id = %identity.user_id, book_id, "Cart lines changed: {:?}", changes);

        self.view(identity.user_id).await
    }

    pub async fn view_cart(&self, ctx: &RequestContext) -> AppResult<CartView> {
        let identity = ctx.require_user()?;
        self.view(identity.user_id).await
    }

    async fn view(&self, user_id: uuid::Uuid) -> AppResult<CartView> {
        let lines = self.carts.lines(user_id).await?;
        Ok(CartView::from_lines(lines))
    }
}
