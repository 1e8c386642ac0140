//! Books repository for database operations

use sqlx::{Pool, Postgres};

use super::conflict_on_unique;
use crate::{
    error::{AppError, AppResult},
    models::book::{Book, NewBook},
};

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get book by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    pub async fn find_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE isbn = $1")
            .bind(NewBook::normalize_isbn(isbn))
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    /// Create a book; the ISBN is stored normalized
    pub async fn create(&self, book: &NewBook) -> AppResult<Book> {
        let isbn = NewBook::normalize_isbn(&book.isbn);
        sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author, isbn, quantity, fine_rate)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&isbn)
        .bind(book.quantity)
        .bind(book.fine_rate)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, || format!("A book with ISBN {} already exists", isbn)))
    }
}
