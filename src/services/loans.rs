//! Loan management service
//!
//! Loads snapshots from the store, asks the borrow lifecycle what to do, and
//! commits the resulting effect. A lost compare-and-swap (another request
//! settled the record first) is retried against a fresh snapshot, which
//! turns a concurrent duplicate approval into an "already approved" no-op.

use std::sync::Arc;

use chrono::Duration;

use crate::{
    circulation::{self, Outcome},
    clock::SharedClock,
    error::{AppError, AppResult},
    models::{Actor, Book, BorrowRecord, BorrowRequest},
    repository::CirculationStore,
};

const MAX_COMMIT_ATTEMPTS: usize = 3;

#[derive(Clone)]
pub struct LoansService {
    store: Arc<dyn CirculationStore>,
    clock: SharedClock,
    default_loan_days: i64,
}

enum Action<'a> {
    Approve,
    Reject(&'a str),
    Return,
}

impl LoansService {
    pub fn new(store: Arc<dyn CirculationStore>, clock: SharedClock, default_loan_days: i64) -> Self {
        Self {
            store,
            clock,
            default_loan_days,
        }
    }

    /// Open a pending request. Students request for themselves; staff may
    /// request on a student's behalf.
    pub async fn request_borrow(
        &self,
        actor: &Actor,
        student_id: i32,
        request: &BorrowRequest,
    ) -> AppResult<BorrowRecord> {
        actor.require_self_or_staff(student_id)?;

        let student = self.store.get_student(student_id).await?;
        let book = self.store.get_book(request.book_id).await?;
        let existing = self.store.student_borrows(student_id).await?;

        let today = self.clock.today();
        let expected = request
            .expected_return_date
            .unwrap_or_else(|| today + Duration::days(self.default_loan_days));

        let new_borrow = circulation::request_borrow(&student, &book, &existing, Some(expected), today)?;
        let record = self.store.create_borrow(&new_borrow).await?;

        tracing::info!(
            "Borrow request {} created: student={} book={} due={}",
            record.id, student_id, book.id, expected
        );
        Ok(record)
    }

    pub async fn approve(&self, actor: &Actor, borrow_id: i32) -> AppResult<Outcome> {
        actor.require_staff()?;
        self.transition(borrow_id, Action::Approve).await
    }

    pub async fn reject(&self, actor: &Actor, borrow_id: i32, reason: &str) -> AppResult<Outcome> {
        actor.require_staff()?;
        self.transition(borrow_id, Action::Reject(reason)).await
    }

    /// Students return their own loans; staff can mark any loan returned
    pub async fn return_book(&self, actor: &Actor, borrow_id: i32) -> AppResult<Outcome> {
        let record = self.store.get_borrow(borrow_id).await?;
        actor.require_self_or_staff(record.student_id)?;
        self.transition(borrow_id, Action::Return).await
    }

    pub async fn student_borrows(&self, actor: &Actor, student_id: i32) -> AppResult<Vec<BorrowRecord>> {
        actor.require_self_or_staff(student_id)?;
        self.store.get_student(student_id).await?;
        self.store.student_borrows(student_id).await
    }

    pub async fn pending_requests(&self, actor: &Actor) -> AppResult<Vec<BorrowRecord>> {
        actor.require_staff()?;
        self.store.pending_borrows().await
    }

    async fn transition(&self, borrow_id: i32, action: Action<'_>) -> AppResult<Outcome> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let record = self.store.get_borrow(borrow_id).await?;
            let book = self.store.get_book(record.book_id).await?;
            let now = self.clock.now();

            let outcome = match action {
                Action::Approve => circulation::approve(&record, &book, now)?,
                Action::Reject(reason) => circulation::reject(&record, reason)?,
                Action::Return => circulation::return_book(&record, &book, now)?,
            };

            let effect = match &outcome {
                Outcome::Applied(effect) => effect,
                Outcome::NoOp { reason } => {
                    tracing::debug!("Borrow {}: {}", borrow_id, reason);
                    return Ok(outcome);
                }
            };

            let committed = self.store.commit(effect).await;
            match committed {
                Ok(book) => {
                    log_applied(&effect.record, &book);
                    return Ok(outcome);
                }
                Err(AppError::Conflict(msg)) if attempt < MAX_COMMIT_ATTEMPTS => {
                    tracing::debug!("Borrow {}: retrying after lost update ({})", borrow_id, msg);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn log_applied(record: &BorrowRecord, book: &Book) {
    tracing::info!(
        "Borrow {} is now {} (book {} '{}' quantity={}, fine={})",
        record.id, record.status, book.id, book.title, book.quantity, record.fine_amount
    );
}
