use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::{
    error::{AppError, AppResult},
    models::{book::MAX_AMOUNT, Book, BorrowRecord},
};

/// Overdue fine owed on `record` as of `today`.
///
/// Zero when there is no expected-return date, when the record is already
/// returned, or when `today` is on or before the expected date. Must be
/// called before the record is marked returned.
///
/// Fails with `Validation` when the fine exceeds [`MAX_AMOUNT`].
pub fn compute_fine(record: &BorrowRecord, book: &Book, today: NaiveDate) -> AppResult<Decimal> {
    let Some(expected) = record.expected_return_date else {
        return Ok(Decimal::ZERO);
    };
    if record.is_returned {
        return Ok(Decimal::ZERO);
    }

    let overdue_days = (today - expected).num_days().max(0);
    Decimal::from(overdue_days)
        .checked_mul(book.fine_rate)
        .filter(|fine| *fine <= MAX_AMOUNT)
        .ok_or_else(|| {
            AppError::Validation(format!(
                "Fine on borrow {} ({} days at {}) exceeds {}",
                record.id, overdue_days, book.fine_rate, MAX_AMOUNT
            ))
        })
}
