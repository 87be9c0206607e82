//! Book catalog endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::AppResult,
    models::{
        book::{Book, BookQuery, CreateBook, UpdateBook},
        user::RequestContext,
    },
};

/// List the whole catalog
#[utoipa::path(
    get,
    path = "/book/all",
    tag = "books",
    responses(
        (status = 200, description = "All books", body = Vec<Book>)
    )
)]
pub async fn list_all(State(state): State<crate::AppState>) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.catalog.list_all().await?;
    Ok(Json(books))
}

/// Search books by title, author or genre
#[utoipa::path(
    get,
    path = "/book/search",
    tag = "books",
    params(BookQuery),
    responses(
        (status = 200, description = "Matching books", body = Vec<Book>),
        (status = 400, description = "Invalid filter parameter")
    )
)]
pub async fn search(
    State(state): State<crate::AppState>,
    Query(query): Query<BookQuery>,
) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.catalog.search(&query).await?;
    Ok(Json(books))
}

/// Get a book by ID
#[utoipa::path(
    get,
    path = "/book/get-by-id/{id}",
    tag = "books",
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_by_id(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Book>> {
    let book = state.services.catalog.get_by_id(id).await?;
    Ok(Json(book))
}

/// List books listing the given genre
#[utoipa::path(
    get,
    path = "/book/get-by-genre/{genre}",
    tag = "books",
    params(
        ("genre" = String, Path, description = "Genre name")
    ),
    responses(
        (status = 200, description = "Books in genre", body = Vec<Book>),
        (status = 404, description = "No books in genre")
    )
)]
pub async fn get_by_genre(
    State(state): State<crate::AppState>,
    Path(genre): Path<String>,
) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.catalog.get_by_genre(&genre).await?;
    Ok(Json(books))
}

/// List books by the given author
#[utoipa::path(
    get,
    path = "/book/get-by-author/{author}",
    tag = "books",
    params(
        ("author" = String, Path, description = "Author name")
    ),
    responses(
        (status = 200, description = "Books by author", body = Vec<Book>),
        (status = 404, description = "No books by author")
    )
)]
pub async fn get_by_author(
    State(state): State<crate::AppState>,
    Path(author): Path<String>,
) -> AppResult<Json<Vec<Book>>> {
    let books = state.services.catalog.get_by_author(&author).await?;
    Ok(Json(books))
}

/// Create a new book
#[utoipa::path(
    post,
    path = "/book/create",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin role required"),
        (status = 409, description = "Duplicate book")
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    ctx: RequestContext,
    Json(book): Json<CreateBook>,
) -> AppResult<(StatusCode, Json<Book>)> {
    let created = state.services.catalog.create(&ctx, book).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update an existing book
#[utoipa::path(
    put,
    path = "/book/update/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Duplicate book or price frozen by carts")
    )
)]
pub async fn update_book(
    State(state): State<crate::AppState>,
    ctx: RequestContext,
    Path(id): Path<i32>,
    Json(book): Json<UpdateBook>,
) -> AppResult<Json<Book>> {
    let updated = state.services.catalog.update(&ctx, id, book).await?;
    Ok(Json(updated))
}

/// Delete a book
#[utoipa::path(
    delete,
    path = "/book/delete/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    ctx: RequestContext,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.catalog.delete(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
