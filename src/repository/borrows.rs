//! Borrow records repository for database operations

use sqlx::{Pool, Postgres};

use super::conflict_on_unique;
use crate::{
    circulation::{Effect, StockChange},
    error::{AppError, AppResult},
    models::{
        book::Book,
        borrow::{BorrowRecord, NewBorrow},
        enums::BorrowStatus,
    },
};

#[derive(Clone)]
pub struct BorrowsRepository {
    pool: Pool<Postgres>,
}

impl BorrowsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get borrow record by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<BorrowRecord> {
        sqlx::query_as::<_, BorrowRecord>("SELECT * FROM borrows WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Borrow record with id {} not found", id)))
    }

    /// All records of a student, most recent first
    pub async fn for_student(&self, student_id: i32) -> AppResult<Vec<BorrowRecord>> {
        let records = sqlx::query_as::<_, BorrowRecord>(
            "SELECT * FROM borrows WHERE student_id = $1 ORDER BY borrow_date DESC, id DESC",
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    /// Requests awaiting a staff decision, oldest first
    pub async fn pending(&self) -> AppResult<Vec<BorrowRecord>> {
        let records = sqlx::query_as::<_, BorrowRecord>(
            "SELECT * FROM borrows WHERE status = $1 ORDER BY borrow_date, id",
        )
        .bind(BorrowStatus::Pending)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    /// Insert a pending record. The partial unique index on
    /// (student_id, book_id) for active statuses rejects a concurrent duplicate.
    pub async fn create(&self, borrow: &NewBorrow) -> AppResult<BorrowRecord> {
        sqlx::query_as::<_, BorrowRecord>(
            r#"
            INSERT INTO borrows (student_id, book_id, status, borrow_date, expected_return_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(borrow.student_id)
        .bind(borrow.book_id)
        .bind(BorrowStatus::Pending)
        .bind(borrow.borrow_date)
        .bind(borrow.expected_return_date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            conflict_on_unique(e, || {
                "You already have a borrow request or have borrowed this book".to_string()
            })
        })
    }

    /// Apply a lifecycle effect in one transaction: status-guarded record
    /// update, then guarded stock update. Any failed guard rolls both back.
    ///
    /// The record row is locked first so that a concurrent duplicate of the
    /// same transition waits here and then loses the status guard.
    pub async fn commit(&self, effect: &Effect) -> AppResult<Book> {
        let record = &effect.record;
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE borrows
            SET status = $1,
                approved_at = $2,
                return_date = $3,
                is_returned = $4,
                rejection_reason = $5,
                fine_amount = $6,
                message = $7
            WHERE id = $8 AND status = $9
            "#,
        )
        .bind(record.status)
        .bind(record.approved_at)
        .bind(record.return_date)
        .bind(record.is_returned)
        .bind(&record.rejection_reason)
        .bind(record.fine_amount)
        .bind(&record.message)
        .bind(record.id)
        .bind(effect.expected_status)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::Conflict(format!(
                "Borrow record {} is no longer {}",
                record.id, effect.expected_status
            )));
        }

        // A failed stock guard returns early; dropping the transaction rolls
        // the record update back
        let book = match effect.stock {
            StockChange::Decrement => sqlx::query_as::<_, Book>(
                "UPDATE books SET quantity = quantity - 1 WHERE id = $1 AND quantity > 0 RETURNING *",
            )
            .bind(record.book_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::OutOfStock(format!("Book {} is out of stock", record.book_id)))?,
            StockChange::Increment => sqlx::query_as::<_, Book>(
                "UPDATE books SET quantity = quantity + 1 WHERE id = $1 RETURNING *",
            )
            .bind(record.book_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", record.book_id)))?,
            StockChange::None => sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
                .bind(record.book_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", record.book_id)))?,
        };

        tx.commit().await?;
        Ok(book)
    }
}
