//! API handlers for the bookstore REST endpoints

pub mod auth;
pub mod books;
pub mod cart;
pub mod health;
pub mod openapi;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, models::user::RequestContext, AppState};

/// Resolves the caller from an optional `Authorization: Bearer` header.
///
/// No header yields an anonymous context; a malformed or invalid token is
/// rejected outright.
#[async_trait]
impl FromRequestParts<AppState> for RequestContext {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(header) = parts.headers.get(AUTHORIZATION) else {
            return Ok(RequestContext::anonymous());
        };

        let value = header
            .to_str()
            .map_err(|_| AppError::Authentication("Invalid authorization header".to_string()))?;

        let token = value
            .strip_prefix("Bearer ")
            .map(str::trim)
            .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

        let identity = state.services.auth.authenticate_token(token)?;
        Ok(RequestContext::authenticated(identity))
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let routes = Router::new()
        // Health
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Authentication
        .route("/api/Authentication/Register", post(auth::register))
        .route("/api/Authentication/Login", post(auth::login))
        .route("/api/Authentication/Me", get(auth::me))
        // Catalog
        .route("/book/all", get(books::list_all))
        .route("/book/search", get(books::search))
        .route("/book/get-by-id/:id", get(books::get_by_id))
        .route("/book/get-by-genre/:genre", get(books::get_by_genre))
        .route("/book/get-by-author/:author", get(books::get_by_author))
        .route("/book/create", post(books::create_book))
        .route("/book/update/:id", put(books::update_book))
        .route("/book/delete/:id", delete(books::delete_book))
        // Cart
        .route("/book/add-to-cart/:id", post(cart::add_to_cart))
        .route("/book/delete-from-cart/:id", post(cart::delete_from_cart))
        .route("/book/view-cart", get(cart::view_cart))
        .with_state(state);

    Router::new()
        .merge(routes)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
