use chrono::{DateTime, NaiveDate, Utc};

use super::{compute_fine, Effect, NoOpReason, Outcome, StockChange};
use crate::{
    error::{AppError, AppResult},
    models::{Book, BorrowRecord, BorrowStatus, NewBorrow, Student},
};

/// Open a new pending request for `book` on behalf of `student`.
///
/// `existing` is the student's borrow history; any pending or approved record
/// for the same book blocks the request.
pub fn request_borrow(
    student: &Student,
    book: &Book,
    existing: &[BorrowRecord],
    expected_return_date: Option<NaiveDate>,
    today: NaiveDate,
) -> AppResult<NewBorrow> {
    if !student.can_transact() {
        return Err(AppError::Authorization(format!(
            "Student account is {}",
            student.status
        )));
    }

    let duplicate = existing
        .iter()
        .any(|r| r.student_id == student.id && r.book_id == book.id && r.status.is_active());
    if duplicate {
        return Err(AppError::Conflict(
            "You already have a borrow request or have borrowed this book".to_string(),
        ));
    }

    if let Some(expected) = expected_return_date {
        if expected < today {
            return Err(AppError::Validation(
                "Expected return date cannot be in the past".to_string(),
            ));
        }
    }

    Ok(NewBorrow {
        student_id: student.id,
        book_id: book.id,
        borrow_date: today,
        expected_return_date,
    })
}

/// Approve a pending request, taking one copy off the shelf
pub fn approve(record: &BorrowRecord, book: &Book, now: DateTime<Utc>) -> AppResult<Outcome> {
    ensure_same_book(record, book)?;

    match record.status {
        BorrowStatus::Approved => Ok(Outcome::NoOp {
            reason: NoOpReason::AlreadyApproved,
        }),
        BorrowStatus::Pending => {
            if book.quantity <= 0 {
                return Err(AppError::OutOfStock(format!("'{}' is out of stock", book.title)));
            }

            let mut updated = record.clone();
            updated.status = BorrowStatus::Approved;
            updated.approved_at = Some(now);
            updated.message = Some(format!(
                "Your borrow request for '{}' has been approved",
                book.title
            ));

            Ok(Outcome::Applied(Effect {
                record: updated,
                expected_status: BorrowStatus::Pending,
                stock: StockChange::Decrement,
            }))
        }
        other => Err(AppError::InvalidTransition(format!(
            "Cannot approve a {} request",
            other
        ))),
    }
}

/// Reject a pending request. A non-blank reason is mandatory.
pub fn reject(record: &BorrowRecord, reason: &str) -> AppResult<Outcome> {
    match record.status {
        BorrowStatus::Rejected => Ok(Outcome::NoOp {
            reason: NoOpReason::AlreadyRejected,
        }),
        BorrowStatus::Pending => {
            let reason = reason.trim();
            if reason.is_empty() {
                return Err(AppError::Validation(
                    "A reason is required to reject a request".to_string(),
                ));
            }

            let mut updated = record.clone();
            updated.status = BorrowStatus::Rejected;
            updated.rejection_reason = Some(reason.to_string());
            updated.message = Some(format!("Your borrow request has been rejected: {}", reason));

            Ok(Outcome::Applied(Effect {
                record: updated,
                expected_status: BorrowStatus::Pending,
                stock: StockChange::None,
            }))
        }
        other => Err(AppError::InvalidTransition(format!(
            "Cannot reject a {} request",
            other
        ))),
    }
}

/// Return an approved loan: freeze the fine, then mark returned and put the
/// copy back on the shelf.
pub fn return_book(record: &BorrowRecord, book: &Book, now: DateTime<Utc>) -> AppResult<Outcome> {
    ensure_same_book(record, book)?;

    if record.is_returned || record.status == BorrowStatus::Returned {
        return Ok(Outcome::NoOp {
            reason: NoOpReason::AlreadyReturned,
        });
    }
    if record.status != BorrowStatus::Approved {
        return Err(AppError::InvalidTransition(
            "Only approved requests can be returned".to_string(),
        ));
    }

    let mut updated = record.clone();
    // Fine first: compute_fine reads is_returned
    updated.fine_amount = compute_fine(record, book, now.date_naive())?;
    updated.is_returned = true;
    updated.return_date = Some(now);
    updated.status = BorrowStatus::Returned;

    Ok(Outcome::Applied(Effect {
        record: updated,
        expected_status: BorrowStatus::Approved,
        stock: StockChange::Increment,
    }))
}

fn ensure_same_book(record: &BorrowRecord, book: &Book) -> AppResult<()> {
    if record.book_id != book.id {
        return Err(AppError::Validation(format!(
            "Borrow {} refers to book {}, not {}",
            record.id, record.book_id, book.id
        )));
    }
    Ok(())
}
