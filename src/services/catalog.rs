//! Catalog management service

use std::sync::Arc;

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{book::MAX_AMOUNT, Actor, Book, NewBook},
    repository::CirculationStore,
};

/// Fine rates are stored with cents precision
const FINE_RATE_SCALE: u32 = 2;

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn CirculationStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn CirculationStore>) -> Self {
        Self { store }
    }

    pub async fn get_book(&self, id: i32) -> AppResult<Book> {
        self.store.get_book(id).await
    }

    /// Look a book up by ISBN, with or without separators
    pub async fn find_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>> {
        self.store.find_book_by_isbn(&NewBook::normalize_isbn(isbn)).await
    }

    /// Create a book (admin only). A duplicate ISBN is a `Conflict`.
    pub async fn add_book(&self, actor: &Actor, book: NewBook) -> AppResult<Book> {
        actor.require_admin()?;
        let book = prepare_book(book)?;
        let created = self.store.insert_book(&book).await?;
        tracing::info!("Book {} '{}' added with {} copies", created.id, created.title, created.quantity);
        Ok(created)
    }
}

/// Normalize and validate a book before insertion
pub(crate) fn prepare_book(mut book: NewBook) -> AppResult<NewBook> {
    book.isbn = NewBook::normalize_isbn(&book.isbn);
    book.title = book.title.trim().to_string();
    book.author = book.author.trim().to_string();
    book.validate()?;

    if book.fine_rate.is_sign_negative() && !book.fine_rate.is_zero() {
        return Err(AppError::Validation("Fine rate cannot be negative".to_string()));
    }
    if book.fine_rate > MAX_AMOUNT {
        return Err(AppError::Validation(format!(
            "Fine rate cannot exceed {}",
            MAX_AMOUNT
        )));
    }
    if book.fine_rate.normalize().scale() > FINE_RATE_SCALE {
        return Err(AppError::Validation(
            "Fine rate cannot have more than two decimal places".to_string(),
        ));
    }
    Ok(book)
}
