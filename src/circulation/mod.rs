//! Borrow lifecycle
//!
//! Pure decision functions over snapshots of a [`BorrowRecord`] and its
//! [`Book`](crate::models::Book). Nothing here touches storage: every
//! successful transition returns an [`Effect`] describing the updated record
//! and the inventory change, and the caller commits it atomically.
//!
//! ```text
//!            approve            return
//! pending ───────────► approved ───────► returned
//!    │
//!    │ reject
//!    ▼
//! rejected
//! ```

mod fine;
mod lifecycle;

pub use fine::compute_fine;
pub use lifecycle::{approve, reject, request_borrow, return_book};

use serde::Serialize;

use crate::models::{BorrowRecord, BorrowStatus};

/// Inventory side effect of a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StockChange {
    None,
    Decrement,
    Increment,
}

impl StockChange {
    pub fn delta(&self) -> i32 {
        match self {
            StockChange::None => 0,
            StockChange::Decrement => -1,
            StockChange::Increment => 1,
        }
    }

    /// New quantity, or `None` if applying the change would go negative
    pub fn apply_to(&self, quantity: i32) -> Option<i32> {
        let next = quantity.checked_add(self.delta())?;
        (next >= 0).then_some(next)
    }
}

/// Mutations to persist for one applied transition.
///
/// `expected_status` is the status the stored record must still have when the
/// effect is committed; a store uses it as a compare-and-swap guard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Effect {
    pub record: BorrowRecord,
    pub expected_status: BorrowStatus,
    pub stock: StockChange,
}

/// Why a transition was skipped. These are informational, not failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoOpReason {
    AlreadyApproved,
    AlreadyRejected,
    AlreadyReturned,
}

impl NoOpReason {
    pub fn message(&self) -> &'static str {
        match self {
            NoOpReason::AlreadyApproved => "This request is already approved.",
            NoOpReason::AlreadyRejected => "This request has already been rejected.",
            NoOpReason::AlreadyReturned => "This book has already been returned.",
        }
    }
}

impl std::fmt::Display for NoOpReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Result of a transition that passed its guards
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Applied(Effect),
    NoOp { reason: NoOpReason },
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Outcome::Applied(_))
    }

    pub fn effect(&self) -> Option<&Effect> {
        match self {
            Outcome::Applied(effect) => Some(effect),
            Outcome::NoOp { .. } => None,
        }
    }

    pub fn no_op_reason(&self) -> Option<NoOpReason> {
        match self {
            Outcome::Applied(_) => None,
            Outcome::NoOp { reason } => Some(*reason),
        }
    }
}
