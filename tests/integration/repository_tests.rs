//! Postgres store tests
//!
//! Each test gets a fresh database with the migrations applied; `DATABASE_URL`
//! must point at a Postgres server the tests may create databases on.

use std::time::Duration;

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use bookstore_api::{
    models::{user::NewUser, Book, LineChange, NewBook, SearchCriteria},
    repository::{
        books::BooksRepository, carts::CartsRepository, users::UsersRepository, BookStore, CartStore, UserStore,
    },
    AppError,
};

async fn reader(pool: &PgPool) -> Uuid {
    let user = NewUser {
        username: "reader".to_string(),
        email: format!("reader-{}@example.com", Uuid::new_v4().simple()),
        password_hash: "not-a-real-hash".to_string(),
    };
    UsersRepository::new(pool.clone())
        .create(&user, "NormalUser")
        .await
        .expect("Failed to create user")
        .id
}

async fn add_book(pool: &PgPool, title: &str, authors: &str, genres: &str, cents: i64) -> Book {
    let book = NewBook {
        title: title.to_string(),
        authors: authors.to_string(),
        genres: genres.to_string(),
        year: None,
        publisher: None,
        price: Decimal::new(cents, 2),
    };
    BooksRepository::new(pool.clone())
        .create(&book)
        .await
        .expect("Failed to create book")
}

fn titles(books: &[Book]) -> Vec<&str> {
    books.iter().map(|b| b.title.as_str()).collect()
}

#[sqlx::test(migrations = "./migrations")]
async fn test_add_merges_into_one_line(pool: PgPool) {
    let user = reader(&pool).await;
    let book = add_book(&pool, "The Great Gatsby", "F. Scott Fitzgerald", "Classics", 1250).await;
    let carts = CartsRepository::new(pool.clone());

    let first = carts.add_line(user, book.id, 3).await.unwrap();
    let merged = carts.add_line(user, book.id, 2).await.unwrap();

    assert_eq!(merged.id, first.id);
    assert_eq!(merged.quantity, 5);
    assert_eq!(merged.version, first.version + 1);

    let lines = carts.lines(user).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].quantity, 5);
    assert_eq!(lines[0].subtotal, Decimal::new(6250, 2));
    assert_eq!(lines[0].title, "The Great Gatsby");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_partial_removal_decrements(pool: PgPool) {
    let user = reader(&pool).await;
    let book = add_book(&pool, "The Great Gatsby", "F. Scott Fitzgerald", "Classics", 1250).await;
    let carts = CartsRepository::new(pool.clone());

    carts.add_line(user, book.id, 5).await.unwrap();
    let changes = carts.remove_quantity(user, book.id, 2).await.unwrap();

    assert!(matches!(changes.as_slice(), [LineChange::Decrement { remaining: 3, .. }]));
    assert_eq!(carts.lines(user).await.unwrap()[0].quantity, 3);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_removing_at_least_the_quantity_deletes(pool: PgPool) {
    let user = reader(&pool).await;
    let gatsby = add_book(&pool, "The Great Gatsby", "F. Scott Fitzgerald", "Classics", 1250).await;
    let hobbit = add_book(&pool, "The Hobbit", "J. R. R. Tolkien", "Fantasy", 899).await;
    let carts = CartsRepository::new(pool.clone());

    carts.add_line(user, gatsby.id, 3).await.unwrap();
    carts.add_line(user, hobbit.id, 2).await.unwrap();

    let changes = carts.remove_quantity(user, gatsby.id, 5).await.unwrap();
    assert!(matches!(changes.as_slice(), [LineChange::Delete { .. }]));
    carts.remove_quantity(user, hobbit.id, 2).await.unwrap();

    assert!(carts.lines(user).await.unwrap().is_empty());
    assert!(matches!(
        carts.remove_quantity(user, gatsby.id, 1).await,
        Err(AppError::NotFound(_))
    ));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_lines_are_per_user(pool: PgPool) {
    let alice = reader(&pool).await;
    let bob = reader(&pool).await;
    let book = add_book(&pool, "The Great Gatsby", "F. Scott Fitzgerald", "Classics", 1250).await;
    let carts = CartsRepository::new(pool.clone());

    carts.add_line(alice, book.id, 1).await.unwrap();

    assert!(carts.lines(bob).await.unwrap().is_empty());
    assert!(matches!(carts.remove_quantity(bob, book.id, 1).await, Err(AppError::NotFound(_))));
    assert_eq!(carts.lines(alice).await.unwrap().len(), 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_concurrent_write_during_removal_conflicts(pool: PgPool) {
    let user = reader(&pool).await;
    let book = add_book(&pool, "The Great Gatsby", "F. Scott Fitzgerald", "Classics", 1250).await;
    let carts = CartsRepository::new(pool.clone());
    carts.add_line(user, book.id, 5).await.unwrap();

    // Hold the row lock with an uncommitted write that bumps the version
    let mut competing = pool.begin().await.unwrap();
    sqlx::query(
        "UPDATE cart_items SET quantity = quantity + 1, version = version + 1 WHERE user_id = $1 AND book_id = $2",
    )
    .bind(user)
    .bind(book.id)
    .execute(&mut *competing)
    .await
    .unwrap();

    let removal = {
        let carts = carts.clone();
        tokio::spawn(async move { carts.remove_quantity(user, book.id, 2).await })
    };
    tokio::time::sleep(Duration::from_millis(300)).await;
    competing.commit().await.unwrap();

    let result = removal.await.unwrap();
    assert!(matches!(result, Err(AppError::Conflict(_))), "{result:?}");
    assert_eq!(carts.lines(user).await.unwrap()[0].quantity, 6);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_quantity_overflow_is_invalid(pool: PgPool) {
    let user = reader(&pool).await;
    let book = add_book(&pool, "The Great Gatsby", "F. Scott Fitzgerald", "Classics", 1250).await;
    let carts = CartsRepository::new(pool.clone());

    carts.add_line(user, book.id, i32::MAX).await.unwrap();
    assert!(matches!(
        carts.add_line(user, book.id, 1).await,
        Err(AppError::InvalidQuantity(1))
    ));
    assert_eq!(carts.lines(user).await.unwrap()[0].quantity, i32::MAX);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_adding_missing_book_is_not_found(pool: PgPool) {
    let user = reader(&pool).await;
    let carts = CartsRepository::new(pool.clone());

    assert!(matches!(carts.add_line(user, 4242, 1).await, Err(AppError::NotFound(_))));
}

#[sqlx::test(migrations = "./migrations")]
async fn test_deleting_book_empties_carts(pool: PgPool) {
    let user = reader(&pool).await;
    let book = add_book(&pool, "The Great Gatsby", "F. Scott Fitzgerald", "Classics", 1250).await;
    let books = BooksRepository::new(pool.clone());
    let carts = CartsRepository::new(pool.clone());

    carts.add_line(user, book.id, 2).await.unwrap();
    assert!(books.in_any_cart(book.id).await.unwrap());

    assert!(books.delete(book.id).await.unwrap());
    assert!(carts.lines(user).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_title_search_requires_every_keyword(pool: PgPool) {
    add_book(&pool, "The Great Gatsby", "F. Scott Fitzgerald", "Classics", 1250).await;
    add_book(&pool, "Great Expectations", "Charles Dickens", "Classics", 999).await;
    add_book(&pool, "The Hobbit", "J. R. R. Tolkien", "Fantasy", 899).await;
    let books = BooksRepository::new(pool.clone());

    let found = books
        .search(&SearchCriteria::TitleKeywords(vec!["the".to_string(), "GREAT".to_string()]))
        .await
        .unwrap();
    assert_eq!(titles(&found), vec!["The Great Gatsby"]);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_search_wildcards_match_literally(pool: PgPool) {
    add_book(&pool, "100% Pure Love", "Jane Roe", "Romance", 500).await;
    add_book(&pool, "1000 Pure Recipe Cards", "John Doe", "Cooking", 700).await;
    add_book(&pool, "Snake_case Pure Style", "Ann Lee", "Computing", 700).await;
    let books = BooksRepository::new(pool.clone());

    let found = books
        .search(&SearchCriteria::TitleKeywords(vec!["100%".to_string(), "pure".to_string()]))
        .await
        .unwrap();
    assert_eq!(titles(&found), vec!["100% Pure Love"]);

    let found = books
        .search(&SearchCriteria::TitleKeywords(vec!["e_c".to_string(), "pure".to_string()]))
        .await
        .unwrap();
    assert_eq!(titles(&found), vec!["Snake_case Pure Style"]);

    let found = books.search(&SearchCriteria::AuthorContains("doe".to_string())).await.unwrap();
    assert_eq!(titles(&found), vec!["1000 Pure Recipe Cards"]);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_genre_and_author_match_whole_entries(pool: PgPool) {
    add_book(&pool, "Dune", "Frank Herbert", "Science Fiction, Classics", 999).await;
    add_book(&pool, "Good Omens", "Terry Pratchett, Neil Gaiman", "Fiction", 1099).await;
    let books = BooksRepository::new(pool.clone());

    assert_eq!(titles(&books.with_genre("fiction").await.unwrap()), vec!["Good Omens"]);
    assert_eq!(titles(&books.with_genre("CLASSICS").await.unwrap()), vec!["Dune"]);
    assert!(books.with_genre("Science").await.unwrap().is_empty());

    assert_eq!(titles(&books.with_author("neil gaiman").await.unwrap()), vec!["Good Omens"]);
    assert!(books.with_author("Gaiman").await.unwrap().is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_duplicate_titles_conflict(pool: PgPool) {
    let dune = add_book(&pool, "Dune", "Frank Herbert", "Science Fiction", 999).await;
    let books = BooksRepository::new(pool.clone());

    assert!(books.duplicate_exists("DUNE", "frank herbert", None).await.unwrap());
    assert!(!books.duplicate_exists("Dune", "Frank Herbert", Some(dune.id)).await.unwrap());

    let again = NewBook {
        title: "dune".to_string(),
        authors: "FRANK HERBERT".to_string(),
        genres: String::new(),
        year: None,
        publisher: None,
        price: Decimal::new(100, 2),
    };
    assert!(matches!(books.create(&again).await, Err(AppError::Conflict(_))));
}
