//! Repository layer for database operations
//!
//! Services depend on the store traits below; the Postgres repositories are
//! the production implementations.

pub mod books;
pub mod carts;
pub mod users;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Book, BookChanges, CartLine, CartLineView, Claim, LineChange, NewBook, Role, SearchCriteria, User},
    models::user::NewUser,
};

/// Account persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;
    async fn email_exists(&self, email: &str) -> AppResult<bool>;
    /// Insert the account and grant it `role`. A taken email is a `Conflict`.
    async fn create(&self, user: &NewUser, role: &str) -> AppResult<User>;
    async fn assign_role(&self, user_id: Uuid, role: &str) -> AppResult<()>;
    /// Claims attached directly to the user
    async fn claims_of(&self, user_id: Uuid) -> AppResult<Vec<Claim>>;
}

/// Role and role-claim lookup
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoleProvider: Send + Sync {
    async fn roles_of(&self, user_id: Uuid) -> AppResult<Vec<Role>>;
}

/// Catalog persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookStore: Send + Sync {
    async fn list_all(&self) -> AppResult<Vec<Book>>;
    async fn get(&self, id: i32) -> AppResult<Option<Book>>;
    async fn search(&self, criteria: &SearchCriteria) -> AppResult<Vec<Book>>;
    /// Books whose genre list holds `genre` as a whole entry
    async fn with_genre(&self, genre: &str) -> AppResult<Vec<Book>>;
    /// Books whose author list holds `author` as a whole entry
    async fn with_author(&self, author: &str) -> AppResult<Vec<Book>>;
    async fn duplicate_exists(&self, title: &str, authors: &str, exclude_id: Option<i32>) -> AppResult<bool>;
    async fn create(&self, book: &NewBook) -> AppResult<Book>;
    async fn update(&self, id: i32, changes: &BookChanges) -> AppResult<Option<Book>>;
    async fn delete(&self, id: i32) -> AppResult<bool>;
    /// Whether any cart line references the book
    async fn in_any_cart(&self, id: i32) -> AppResult<bool>;
    async fn ping(&self) -> AppResult<()>;
}

/// Cart persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Create the (user, book) line or add `quantity` to it
    async fn add_line(&self, user_id: Uuid, book_id: i32, quantity: i32) -> AppResult<CartLine>;
    /// Remove `quantity` from every matching line atomically.
    /// No matching line is `NotFound`; a concurrent write is `Conflict`.
    async fn remove_quantity(&self, user_id: Uuid, book_id: i32, quantity: i32) -> AppResult<Vec<LineChange>>;
    async fn lines(&self, user_id: Uuid) -> AppResult<Vec<CartLineView>>;
}

/// Postgres-backed stores sharing one connection pool
#[derive(Clone)]
pub struct Repository {
    pub books: books::BooksRepository,
    pub carts: carts::CartsRepository,
    pub users: users::UsersRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: books::BooksRepository::new(pool.clone()),
            carts: carts::CartsRepository::new(pool.clone()),
            users: users::UsersRepository::new(pool),
        }
    }
}

/// Whether a sqlx error is a unique-constraint violation
pub(crate) fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_unique_violation())
}
