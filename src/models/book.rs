//! Book (catalog entry) model and related types

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::validation_messages;
use crate::error::{AppError, AppResult};

/// Book as stored in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    /// Comma-joined normalized author list ("Terry Pratchett, Neil Gaiman")
    pub authors: String,
    /// Comma-joined normalized genre list
    pub genres: String,
    pub year: Option<i32>,
    pub publisher: Option<String>,
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "At least one author is required"))]
    pub authors: String,
    #[serde(default)]
    pub genres: Option<String>,
    #[validate(range(min = 0, max = 9999, message = "Year must be between 0 and 9999"))]
    pub year: Option<i32>,
    pub publisher: Option<String>,
    #[schema(value_type = String, example = "12.50")]
    pub price: Decimal,
}

/// Update book request. Only provided, non-empty fields are changed.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    pub title: Option<String>,
    pub authors: Option<String>,
    pub genres: Option<String>,
    #[validate(range(min = 0, max = 9999, message = "Year must be between 0 and 9999"))]
    pub year: Option<i32>,
    pub publisher: Option<String>,
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
}

/// Normalized, validated values for a new book
#[derive(Debug, Clone, PartialEq)]
pub struct NewBook {
    pub title: String,
    pub authors: String,
    pub genres: String,
    pub year: Option<i32>,
    pub publisher: Option<String>,
    pub price: Decimal,
}

/// Normalized column changes for an update; `None` keeps the current value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookChanges {
    pub title: Option<String>,
    pub authors: Option<String>,
    pub genres: Option<String>,
    pub year: Option<i32>,
    pub publisher: Option<String>,
    pub price: Option<Decimal>,
}

impl CreateBook {
    /// Validate and normalize into insertable values
    pub fn into_new_book(self) -> AppResult<NewBook> {
        let mut errors = validation_messages(self.validate());

        let title = self.title.trim().to_string();
        let authors = normalize_list(&self.authors);
        if title.is_empty() {
            push_unique(&mut errors, "Title is required");
        }
        if authors.is_empty() {
            push_unique(&mut errors, "At least one author is required");
        }
        errors.extend(price_error(self.price));

        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        Ok(NewBook {
            title,
            authors,
            genres: self.genres.as_deref().map(normalize_list).unwrap_or_default(),
            year: self.year,
            publisher: non_empty(self.publisher),
            price: self.price,
        })
    }
}

impl UpdateBook {
    /// Validate and keep only the fields that carry a value
    pub fn into_changes(self) -> AppResult<BookChanges> {
        let mut errors = validation_messages(self.validate());

        errors.extend(self.price.and_then(price_error));

        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        Ok(BookChanges {
            title: non_empty(self.title),
            authors: self.authors.as_deref().map(normalize_list).filter(|a| !a.is_empty()),
            genres: self.genres.as_deref().map(normalize_list).filter(|g| !g.is_empty()),
            year: self.year,
            publisher: non_empty(self.publisher),
            price: self.price,
        })
    }
}

impl BookChanges {
    pub fn is_empty(&self) -> bool {
        *self == BookChanges::default()
    }
}

/// Which field a search term is matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchFilter {
    Title,
    Author,
    Genre,
}

impl std::str::FromStr for SearchFilter {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "title" => Ok(SearchFilter::Title),
            "author" => Ok(SearchFilter::Author),
            "genre" => Ok(SearchFilter::Genre),
            _ => Err(AppError::BadRequest("Invalid filter parameter.".to_string())),
        }
    }
}

/// Resolved search handed to the book store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchCriteria {
    /// Every keyword must appear in the title
    TitleKeywords(Vec<String>),
    AuthorContains(String),
    GenreContains(String),
}

/// Book search query parameters
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    #[serde(rename = "searchTerm")]
    pub search_term: Option<String>,
    /// One of: title, author, genre
    pub filter: Option<String>,
}

/// Split a title search term into keywords.
///
/// Returns `None` for fewer than two keywords: single-word title searches
/// intentionally match nothing.
pub fn title_keywords(term: &str) -> Option<Vec<String>> {
    let keywords: Vec<String> = term.split_whitespace().map(str::to_string).collect();
    if keywords.len() < 2 {
        None
    } else {
        Some(keywords)
    }
}

/// Normalize a comma-joined list: trim entries, drop empties, join with ", "
pub fn normalize_list(raw: &str) -> String {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Escape LIKE wildcards so user input matches literally
pub fn escape_like(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn price_error(price: Decimal) -> Option<String> {
    // Prices are stored as NUMERIC(18, 2)
    let limit = Decimal::new(10_000_000_000_000_000, 0);

    if price < Decimal::ZERO {
        Some("Price must not be negative".to_string())
    } else if price >= limit {
        Some("Price is too large".to_string())
    } else {
        None
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn push_unique(errors: &mut Vec<String>, message: &str) {
    if !errors.iter().any(|e| e == message) {
        errors.push(message.to_string());
    }
}
