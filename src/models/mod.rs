//! Data models for the bookstore

pub mod book;
pub mod cart;
pub mod user;

// Re-export commonly used types
pub use book::{Book, BookChanges, NewBook, SearchCriteria};
pub use cart::{CartLine, CartLineView, CartView, LineChange};
pub use user::{Claim, Identity, RequestContext, Role, User};

/// Flatten `validator` failures into their messages, sorted for stable output
pub(crate) fn validation_messages(result: Result<(), validator::ValidationErrors>) -> Vec<String> {
    let Err(errors) = result else {
        return Vec::new();
    };

    let mut messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field))
            })
        })
        .collect();
    messages.sort();
    messages
}
