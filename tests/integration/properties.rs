use std::collections::HashMap;

use proptest::prelude::*;
use tokio::task::JoinSet;

use lms_core::{
    models::{Actor, BorrowRequest, BorrowStatus},
    repository::CirculationStore,
};

use crate::common::{day, Fixture, BOOK_ID};

const STUDENTS: i32 = 4;

#[derive(Debug, Clone)]
enum Op {
    Request(i32),
    Approve(i32),
    Reject(i32),
    Return(i32),
    Wait(i64),
}

fn op() -> impl Strategy<Value = Op> {
    let student = 1..=STUDENTS;
    prop_oneof![
        student.clone().prop_map(Op::Request),
        student.clone().prop_map(Op::Approve),
        student.clone().prop_map(Op::Reject),
        student.prop_map(Op::Return),
        (1i64..30).prop_map(Op::Wait),
    ]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .unwrap()
}

async fn approved_count(fx: &Fixture) -> i32 {
    let mut approved = 0;
    for student_id in 1..=STUDENTS {
        approved += fx
            .store
            .student_borrows(student_id)
            .await
            .unwrap()
            .iter()
            .filter(|r| r.status == BorrowStatus::Approved)
            .count() as i32;
    }
    approved
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Copies on the shelf plus copies on loan always equal the stock we started with
    #[test]
    fn prop_quantity_is_conserved(initial in 0i32..3, ops in prop::collection::vec(op(), 1..40)) {
        runtime().block_on(async {
            let fx = Fixture::new(initial, STUDENTS).await;
            let loans = &fx.services.loans;
            let mut latest: HashMap<i32, i32> = HashMap::new();
            let mut today = day(2024, 1, 1);

            for op in ops {
                match op {
                    Op::Request(s) => {
                        let request = BorrowRequest { book_id: BOOK_ID, expected_return_date: None };
                        if let Ok(record) = loans.request_borrow(&Actor::Student(s), s, &request).await {
                            latest.insert(s, record.id);
                        }
                    }
                    Op::Approve(s) => {
                        if let Some(id) = latest.get(&s) {
                            let _ = loans.approve(&Actor::Librarian, *id).await;
                        }
                    }
                    Op::Reject(s) => {
                        if let Some(id) = latest.get(&s) {
                            let _ = loans.reject(&Actor::Librarian, *id, "Not available").await;
                        }
                    }
                    Op::Return(s) => {
                        if let Some(id) = latest.get(&s) {
                            let _ = loans.return_book(&Actor::Student(s), *id).await;
                        }
                    }
                    Op::Wait(days) => {
                        today += chrono::Duration::days(days);
                        fx.clock.set(today);
                    }
                }

                let quantity = fx.quantity().await;
                assert!(quantity >= 0);
                assert_eq!(quantity + approved_count(&fx).await, initial);
            }

            for id in latest.values() {
                let record = fx.store.get_borrow(*id).await.unwrap();
                assert!(record.fine_amount >= rust_decimal::Decimal::ZERO);
                assert_eq!(record.is_returned, record.status == BorrowStatus::Returned);
            }
        });
    }

    /// Approving every request at once hands out exactly min(requests, copies)
    #[test]
    fn prop_concurrent_approvals_never_oversell(copies in 0i32..4, requests in 1i32..=STUDENTS) {
        runtime().block_on(async {
            let fx = Fixture::new(copies, STUDENTS).await;
            let mut ids = Vec::new();
            for s in 1..=requests {
                let request = BorrowRequest { book_id: BOOK_ID, expected_return_date: None };
                ids.push(fx.services.loans.request_borrow(&Actor::Student(s), s, &request).await.unwrap().id);
            }

            let mut tasks = JoinSet::new();
            for id in ids {
                let loans = fx.services.loans.clone();
                tasks.spawn(async move { loans.approve(&Actor::Librarian, id).await });
            }
            let mut applied = 0;
            while let Some(result) = tasks.join_next().await {
                if matches!(result.unwrap(), Ok(ref o) if o.is_applied()) {
                    applied += 1;
                }
            }

            let expected = copies.min(requests);
            assert_eq!(applied, expected);
            assert_eq!(fx.quantity().await, copies - expected);
            assert_eq!(approved_count(&fx).await, expected);
        });
    }
}
