//! Shopping cart endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::{
    error::AppResult,
    models::{
        cart::{CartView, QuantityQuery},
        user::RequestContext,
    },
};

/// Add copies of a book to the caller's cart
#[utoipa::path(
    post,
    path = "/book/add-to-cart/{id}",
    tag = "cart",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID"),
        QuantityQuery
    ),
    responses(
        (status = 200, description = "Updated cart", body = CartView),
        (status = 400, description = "Invalid quantity"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn add_to_cart(
    State(state): State<crate::AppState>,
    ctx: RequestContext,
    Path(id): Path<i32>,
    Query(query): Query<QuantityQuery>,
) -> AppResult<Json<CartView>> {
    let cart = state.services.cart.add_line(&ctx, id, query.quantity()).await?;
    Ok(Json(cart))
}

/// Remove copies of a book from the caller's cart
#[utoipa::path(
    post,
    path = "/book/delete-from-cart/{id}",
    tag = "cart",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID"),
        QuantityQuery
    ),
    responses(
        (status = 200, description = "Updated cart", body = CartView),
        (status = 400, description = "Invalid quantity"),
        (status = 404, description = "Book not in cart"),
        (status = 409, description = "Cart changed concurrently")
    )
)]
pub async fn delete_from_cart(
    State(state): State<crate::AppState>,
    ctx: RequestContext,
    Path(id): Path<i32>,
    Query(query): Query<QuantityQuery>,
) -> AppResult<Json<CartView>> {
    let cart = state.services.cart.remove_line(&ctx, id, query.quantity()).await?;
    Ok(Json(cart))
}

/// View the caller's cart
#[utoipa::path(
    get,
    path = "/book/view-cart",
    tag = "cart",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Cart contents", body = CartView),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn view_cart(
    State(state): State<crate::AppState>,
    ctx: RequestContext,
) -> AppResult<Json<CartView>> {
    let cart = state.services.cart.view_cart(&ctx).await?;
    Ok(Json(cart))
}
