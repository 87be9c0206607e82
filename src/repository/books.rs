//! Books repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use super::{is_unique_violation, BookStore};
use crate::{
    error::{AppError, AppResult},
    models::book::{escape_like, Book, BookChanges, NewBook, SearchCriteria},
};

const BOOK_COLUMNS: &str = "id, title, authors, genres, year, publisher, price, created_at, updated_at";

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn duplicate_error(e: sqlx::Error) -> AppError {
        if is_unique_violation(&e) {
            AppError::Conflict("A book with this title and authors already exists".to_string())
        } else {
            AppError::Database(e)
        }
    }
}

#[async_trait]
impl BookStore for BooksRepository {
    async fn list_all(&self) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(&format!("SELECT {} FROM books ORDER BY id", BOOK_COLUMNS))
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    async fn get(&self, id: i32) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(&format!("SELECT {} FROM books WHERE id = $1", BOOK_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    /// Case-insensitive substring search; title keywords are AND-ed
    async fn search(&self, criteria: &SearchCriteria) -> AppResult<Vec<Book>> {
        let (column, patterns): (&str, Vec<String>) = match criteria {
            SearchCriteria::TitleKeywords(keywords) => (
                "title",
                keywords.iter().map(|k| format!("%{}%", escape_like(k))).collect(),
            ),
            SearchCriteria::AuthorContains(term) => ("authors", vec![format!("%{}%", escape_like(term))]),
            SearchCriteria::GenreContains(term) => ("genres", vec![format!("%{}%", escape_like(term))]),
        };

        let conditions: Vec<String> = (1..=patterns.len())
            .map(|idx| format!("{} ILIKE ${}", column, idx))
            .collect();

        let query = format!(
            "SELECT {} FROM books WHERE {} ORDER BY id",
            BOOK_COLUMNS,
            conditions.join(" AND ")
        );

        let mut builder = sqlx::query_as::<_, Book>(&query);
        for pattern in &patterns {
            builder = builder.bind(pattern);
        }

        Ok(builder.fetch_all(&self.pool).await?)
    }

    async fn with_genre(&self, genre: &str) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(&format!(
            "SELECT {} FROM books WHERE LOWER($1) = ANY(string_to_array(LOWER(genres), ', ')) ORDER BY id",
            BOOK_COLUMNS
        ))
        .bind(genre.trim())
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    async fn with_author(&self, author: &str) -> AppResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(&format!(
            "SELECT {} FROM books WHERE LOWER($1) = ANY(string_to_array(LOWER(authors), ', ')) ORDER BY id",
            BOOK_COLUMNS
        ))
        .bind(author.trim())
        .fetch_all(&self.pool)
        .await?;
        Ok(books)
    }

    async fn duplicate_exists(&self, title: &str, authors: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM books
                WHERE LOWER(title) = LOWER($1) AND LOWER(authors) = LOWER($2)
                  AND ($3::INTEGER IS NULL OR id <> $3)
            )
            "#,
        )
        .bind(title)
        .bind(authors)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn create(&self, book: &NewBook) -> AppResult<Book> {
        sqlx::query_as::<_, Book>(&format!(
            r#"
            INSERT INTO books (title, authors, genres, year, publisher, price)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            BOOK_COLUMNS
        ))
        .bind(&book.title)
        .bind(&book.authors)
        .bind(&book.genres)
        .bind(book.year)
        .bind(&book.publisher)
        .bind(book.price)
        .fetch_one(&self.pool)
        .await
        .map_err(Self::duplicate_error)
    }

    async fn update(&self, id: i32, changes: &BookChanges) -> AppResult<Option<Book>> {
        sqlx::query_as::<_, Book>(&format!(
            r#"
            UPDATE books SET
                title = COALESCE($2, title),
                authors = COALESCE($3, authors),
                genres = COALESCE($4, genres),
                year = COALESCE($5, year),
                publisher = COALESCE($6, publisher),
                price = COALESCE($7, price),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            BOOK_COLUMNS
        ))
        .bind(id)
        .bind(&changes.title)
        .bind(&changes.authors)
        .bind(&changes.genres)
        .bind(changes.year)
        .bind(&changes.publisher)
        .bind(changes.price)
        .fetch_optional(&self.pool)
        .await
        .map_err(Self::duplicate_error)
    }

    /// Delete a book; its cart lines cascade
    async fn delete(&self, id: i32) -> AppResult<bool> {
        let deleted = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(deleted > 0)
    }

    async fn in_any_cart(&self, id: i32) -> AppResult<bool> {
        let referenced: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM cart_items WHERE book_id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(referenced)
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
