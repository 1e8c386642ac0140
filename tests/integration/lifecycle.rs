use rust_decimal::Decimal;

use lms_core::{
    circulation::NoOpReason,
    models::{Actor, BorrowRequest, BorrowStatus, StudentStatus},
    repository::CirculationStore,
    AppError,
};

use crate::common::{day, student, Fixture, BOOK_ID};

fn request() -> BorrowRequest {
    BorrowRequest {
        book_id: BOOK_ID,
        expected_return_date: None,
    }
}

#[tokio::test]
async fn test_borrow_approve_late_return() {
    let fx = Fixture::new(2, 1).await;
    let loans = &fx.services.loans;

    let record = loans
        .request_borrow(&Actor::Student(1), 1, &request())
        .await
        .unwrap();
    assert_eq!(record.status, BorrowStatus::Pending);
    assert_eq!(record.expected_return_date, Some(day(2024, 1, 15)));
    assert_eq!(fx.quantity().await, 2);

    let outcome = loans.approve(&Actor::Librarian, record.id).await.unwrap();
    assert!(outcome.is_applied());
    assert_eq!(fx.quantity().await, 1);

    fx.clock.set(day(2024, 1, 18));
    let outcome = loans.return_book(&Actor::Student(1), record.id).await.unwrap();
    let returned = &outcome.effect().unwrap().record;
    assert_eq!(returned.status, BorrowStatus::Returned);
    assert!(returned.is_returned);
    assert_eq!(returned.fine_amount, Decimal::new(600, 2));
    assert_eq!(fx.quantity().await, 2);

    let stored = fx.store.get_borrow(record.id).await.unwrap();
    assert_eq!(stored, *returned);
}

#[tokio::test]
async fn test_approve_without_stock_changes_nothing() {
    let fx = Fixture::new(0, 1).await;
    let loans = &fx.services.loans;
    let record = loans
        .request_borrow(&Actor::Student(1), 1, &request())
        .await
        .unwrap();

    let err = loans.approve(&Actor::Admin, record.id).await.unwrap_err();
    assert!(matches!(err, AppError::OutOfStock(_)));
    assert_eq!(fx.quantity().await, 0);
    assert_eq!(
        fx.store.get_borrow(record.id).await.unwrap().status,
        BorrowStatus::Pending
    );
}

#[tokio::test]
async fn test_reject_needs_reason_and_is_idempotent() {
    let fx = Fixture::new(1, 1).await;
    let loans = &fx.services.loans;
    let record = loans
        .request_borrow(&Actor::Student(1), 1, &request())
        .await
        .unwrap();

    let err = loans.reject(&Actor::Librarian, record.id, "   ").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let outcome = loans
        .reject(&Actor::Librarian, record.id, "Reserved for exam week")
        .await
        .unwrap();
    assert!(outcome.is_applied());

    let again = loans
        .reject(&Actor::Librarian, record.id, "Reserved for exam week")
        .await
        .unwrap();
    assert_eq!(again.no_op_reason(), Some(NoOpReason::AlreadyRejected));

    let stored = fx.store.get_borrow(record.id).await.unwrap();
    assert_eq!(stored.rejection_reason.as_deref(), Some("Reserved for exam week"));
    assert_eq!(fx.quantity().await, 1);

    // A rejected request frees the slot for a new one
    loans
        .request_borrow(&Actor::Student(1), 1, &request())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_double_return_is_noop() {
    let fx = Fixture::new(1, 1).await;
    let loans = &fx.services.loans;
    let record = loans
        .request_borrow(&Actor::Student(1), 1, &request())
        .await
        .unwrap();
    loans.approve(&Actor::Librarian, record.id).await.unwrap();

    fx.clock.set(day(2024, 1, 20));
    let first = loans.return_book(&Actor::Admin, record.id).await.unwrap();
    let fine = first.effect().unwrap().record.fine_amount;
    assert_eq!(fine, Decimal::new(1000, 2));

    fx.clock.set(day(2024, 2, 20));
    let second = loans.return_book(&Actor::Admin, record.id).await.unwrap();
    assert_eq!(second.no_op_reason(), Some(NoOpReason::AlreadyReturned));
    assert_eq!(fx.quantity().await, 1);
    assert_eq!(fx.store.get_borrow(record.id).await.unwrap().fine_amount, fine);
}

#[tokio::test]
async fn test_request_rules() {
    let fx = Fixture::new(1, 1).await;
    fx.store.put_student(student(2, StudentStatus::Pending)).await;
    let loans = &fx.services.loans;

    loans
        .request_borrow(&Actor::Student(1), 1, &request())
        .await
        .unwrap();
    let err = loans
        .request_borrow(&Actor::Student(1), 1, &request())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let err = loans
        .request_borrow(&Actor::Student(2), 2, &request())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Authorization(_)));

    let err = loans
        .request_borrow(&Actor::Student(2), 1, &request())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Authorization(_)));

    let past = BorrowRequest {
        book_id: BOOK_ID,
        expected_return_date: Some(day(2023, 12, 31)),
    };
    fx.store.put_student(student(3, StudentStatus::Approved)).await;
    let err = loans.request_borrow(&Actor::Student(3), 3, &past).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn test_pending_queue_and_history() {
    let fx = Fixture::new(3, 2).await;
    let loans = &fx.services.loans;
    let first = loans
        .request_borrow(&Actor::Student(1), 1, &request())
        .await
        .unwrap();
    let second = loans
        .request_borrow(&Actor::Librarian, 2, &request())
        .await
        .unwrap();
    loans.approve(&Actor::Librarian, first.id).await.unwrap();

    let pending = loans.pending_requests(&Actor::Librarian).await.unwrap();
    assert_eq!(pending.iter().map(|r| r.id).collect::<Vec<_>>(), vec![second.id]);
    assert!(loans.pending_requests(&Actor::Student(1)).await.is_err());

    let history = loans.student_borrows(&Actor::Student(1), 1).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, BorrowStatus::Approved);
    assert!(loans.student_borrows(&Actor::Student(1), 2).await.is_err());
}

#[tokio::test]
async fn test_concurrent_approvals_for_last_copy() {
    let fx = Fixture::new(1, 2).await;
    let loans = &fx.services.loans;
    let a = loans
        .request_borrow(&Actor::Student(1), 1, &request())
        .await
        .unwrap();
    let b = loans
        .request_borrow(&Actor::Student(2), 2, &request())
        .await
        .unwrap();

    let (ra, rb) = tokio::join!(
        loans.approve(&Actor::Librarian, a.id),
        loans.approve(&Actor::Admin, b.id)
    );
    let results = [ra, rb];
    let applied = results.iter().filter(|r| matches!(r, Ok(o) if o.is_applied())).count();
    let out_of_stock = results
        .iter()
        .filter(|r| matches!(r, Err(AppError::OutOfStock(_))))
        .count();
    assert_eq!(applied, 1);
    assert_eq!(out_of_stock, 1);
    assert_eq!(fx.quantity().await, 0);
}

#[tokio::test]
async fn test_duplicate_approvals_decrement_once() {
    let fx = Fixture::new(2, 1).await;
    let loans = &fx.services.loans;
    let record = loans
        .request_borrow(&Actor::Student(1), 1, &request())
        .await
        .unwrap();

    let (first, second) = tokio::join!(
        loans.approve(&Actor::Librarian, record.id),
        loans.approve(&Actor::Librarian, record.id)
    );
    let outcomes = [first.unwrap(), second.unwrap()];
    assert_eq!(outcomes.iter().filter(|o| o.is_applied()).count(), 1);
    assert!(outcomes
        .iter()
        .any(|o| o.no_op_reason() == Some(NoOpReason::AlreadyApproved)));
    assert_eq!(fx.quantity().await, 1);
}
