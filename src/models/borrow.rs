//! Borrow record model and related types

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::enums::BorrowStatus;

/// One student's request for, and loan of, one copy of a book
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct BorrowRecord {
    pub id: i32,
    pub student_id: i32,
    pub book_id: i32,
    pub status: BorrowStatus,
    pub borrow_date: NaiveDate,
    pub expected_return_date: Option<NaiveDate>,
    pub approved_at: Option<DateTime<Utc>>,
    pub return_date: Option<DateTime<Utc>>,
    pub is_returned: bool,
    pub rejection_reason: Option<String>,
    pub fine_amount: Decimal,
    /// Notification shown to the student after approval or rejection
    pub message: Option<String>,
}

/// A borrow request that has passed the lifecycle guards but has no id yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBorrow {
    pub student_id: i32,
    pub book_id: i32,
    pub borrow_date: NaiveDate,
    pub expected_return_date: Option<NaiveDate>,
}

impl NewBorrow {
    /// Materialize the pending record once the store has assigned an id
    pub fn into_record(self, id: i32) -> BorrowRecord {
        BorrowRecord {
            id,
            student_id: self.student_id,
            book_id: self.book_id,
            status: BorrowStatus::Pending,
            borrow_date: self.borrow_date,
            expected_return_date: self.expected_return_date,
            approved_at: None,
            return_date: None,
            is_returned: false,
            rejection_reason: None,
            fine_amount: Decimal::ZERO,
            message: None,
        }
    }
}

/// Borrow request as submitted by the application layer
#[derive(Debug, Clone, Deserialize)]
pub struct BorrowRequest {
    pub book_id: i32,
    pub expected_return_date: Option<NaiveDate>,
}
