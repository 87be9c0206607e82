//! Catalog management service

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{title_keywords, Book, BookQuery, CreateBook, SearchCriteria, SearchFilter, UpdateBook},
        user::{RequestContext, ADMIN_ROLE},
    },
    repository::BookStore,
};

#[derive(Clone)]
pub struct CatalogService {
    books: Arc<dyn BookStore>,
}

impl CatalogService {
    pub fn new(books: Arc<dyn BookStore>) -> Self {
        Self { books }
    }

    pub async fn list_all(&self) -> AppResult<Vec<Book>> {
        self.books.list_all().await
    }

    /// Search by title, author or genre.
    ///
    /// A missing term or filter lists the whole catalog.
    pub async fn search(&self, query: &BookQuery) -> AppResult<Vec<Book>> {
        let term = query.search_term.as_deref().map(str::trim).unwrap_or_default();
        let filter = query.filter.as_deref().map(str::trim).unwrap_or_default();

        if term.is_empty() || filter.is_empty() {
            return self.books.list_all().await;
        }

        let criteria = match filter.parse::<SearchFilter>()? {
            SearchFilter::Title => match title_keywords(term) {
                Some(keywords) => SearchCriteria::TitleKeywords(keywords),
                None => return Ok(Vec::new()),
            },
            SearchFilter::Author => SearchCriteria::AuthorContains(term.to_string()),
            SearchFilter::Genre => SearchCriteria::GenreContains(term.to_string()),
        };

        tracing::debug!("Book search: {:?}", criteria);
        self.books.search(&criteria).await
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        self.books
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    pub async fn get_by_genre(&self, genre: &str) -> AppResult<Vec<Book>> {
        let books = self.books.with_genre(genre).await?;
        if books.is_empty() {
            return Err(AppError::NotFound(format!("No books in genre {}", genre)));
        }
        Ok(books)
    }

    pub async fn get_by_author(&self, author: &str) -> AppResult<Vec<Book>> {
        let books = self.books.with_author(author).await?;
        if books.is_empty() {
            return Err(AppError::NotFound(format!("No books by {}", author)));
        }
        Ok(books)
    }

    /// Add a book to the catalog (Admin only)
    pub async fn create(&self, ctx: &RequestContext, request: CreateBook) -> AppResult<Book> {
        ctx.require_role(ADMIN_ROLE)?;

        let book = request.into_new_book()?;
        if self.books.duplicate_exists(&book.title, &book.authors, None).await? {
            return Err(AppError::Conflict(
                "A book with this title and authors already exists".to_string(),
            ));
        }

        let created = self.books.create(&book).await?;
        tracing::info!(book_id = created.id, "Book created");
        Ok(created)
    }

    /// Partially update a book (Admin only).
    ///
    /// The price is frozen while any cart references the book.
    pub async fn update(&self, ctx: &RequestContext, id: i32, request: UpdateBook) -> AppResult<Book> {
        ctx.require_role(ADMIN_ROLE)?;

        let changes = request.into_changes()?;
        let existing = self.get_by_id(id).await?;
        if changes.is_empty() {
            return Ok(existing);
        }

        if let Some(price) = changes.price {
            if price != existing.price && self.books.in_any_cart(id).await? {
                return Err(AppError::Conflict(
                    "Price cannot change while the book is in a cart".to_string(),
                ));
            }
        }

        if changes.title.is_some() || changes.authors.is_some() {
            let title = changes.title.as_deref().unwrap_or(&existing.title);
            let authors = changes.authors.as_deref().unwrap_or(&existing.authors);
            if self.books.duplicate_exists(title, authors, Some(id)).await? {
                return Err(AppError::Conflict(
                    "A book with this title and authors already exists".to_string(),
                ));
            }
        }

        let updated = self
            .books
            .update(id, &changes)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))?;
        tracing::info!(book_id = id, "Book updated");
        Ok(updated)
    }

    /// Remove a book (Admin only); cart lines referencing it go with it
    pub async fn delete(&self, ctx: &RequestContext, id: i32) -> AppResult<()> {
        ctx.require_role(ADMIN_ROLE)?;

        if !self.books.delete(id).await? {
            return Err(AppError::NotFound(format!("Book with id {} not found", id)));
        }
        tracing::info!(book_id = id, "Book deleted");
        Ok(())
    }

    /// Store reachability for the readiness check
    pub async fn ping(&self) -> AppResult<()> {
        self.books.ping().await
    }
}
