//! Business logic services

pub mod auth;
pub mod cart;
pub mod catalog;

use std::sync::Arc;

use crate::{
    config::AuthConfig,
    repository::{BookStore, CartStore, Repository, RoleProvider, UserStore},
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub catalog: catalog::CatalogService,
    pub cart: cart::CartService,
}

impl Services {
    /// Create all services backed by the Postgres repository
    pub fn new(repository: Repository, auth_config: &AuthConfig) -> Self {
        let users = Arc::new(repository.users);
        Self::from_stores(
            users.clone(),
            users,
            Arc::new(repository.books),
            Arc::new(repository.carts),
            auth::TokenSettings::from(auth_config),
        )
    }

    /// Wire services onto arbitrary store implementations
    pub fn from_stores(
        users: Arc<dyn UserStore>,
        roles: Arc<dyn RoleProvider>,
        books: Arc<dyn BookStore>,
        carts: Arc<dyn CartStore>,
        token_settings: auth::TokenSettings,
    ) -> Self {
        Self {
            auth: auth::AuthService::new(users, roles, token_settings),
            catalog: catalog::CatalogService::new(books.clone()),
            cart: cart::CartService::new(carts, books),
        }
    }
}
