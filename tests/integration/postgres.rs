//! Postgres store tests. Run with: cargo test -- --ignored

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;

use lms_core::{
    clock::SystemClock,
    config::AppConfig,
    models::{Actor, BorrowRequest, NewBook, NewStudent, StudentStatus},
    repository::{CirculationStore, FeedStore, Repository},
    services::Services,
    AppError,
};

async fn repository() -> Arc<Repository> {
    dotenvy::dotenv().ok();
    let config = AppConfig::load().expect("Failed to load configuration");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database.url)
        .await
        .expect("Failed to connect to database");
    let repository = Repository::new(pool);
    repository.migrate().await.expect("Failed to run migrations");
    Arc::new(repository)
}

/// 13 digits unique per test run
fn unique_isbn() -> String {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    format!("{:013}", nanos.rem_euclid(10_000_000_000_000))
}

async fn approved_student(repository: &Repository, roll_no: String) -> i32 {
    let student = repository
        .insert_student(
            &NewStudent {
                roll_no,
                branch: "Test".into(),
                name: None,
                phone_number: None,
                email: None,
            },
            StudentStatus::Approved,
            Utc::now(),
        )
        .await
        .unwrap();
    assert_eq!(student.status, StudentStatus::Approved);
    student.id
}

#[tokio::test]
#[ignore]
async fn test_last_copy_goes_to_one_request() {
    let repository = repository().await;
    let services = Services::new(repository.clone(), Arc::new(SystemClock), &Default::default());

    let isbn = unique_isbn();
    let book = repository
        .insert_book(&NewBook {
            title: "Concurrency in Practice".into(),
            author: "Goetz".into(),
            isbn: isbn.clone(),
            quantity: 1,
            fine_rate: Decimal::ONE,
        })
        .await
        .unwrap();

    let mut ids = Vec::new();
    for n in 0..3 {
        let student_id = approved_student(&repository, format!("T{}-{}", &isbn[7..], n)).await;
        let request = BorrowRequest {
            book_id: book.id,
            expected_return_date: None,
        };
        let record = services
            .loans
            .request_borrow(&Actor::Student(student_id), student_id, &request)
            .await
            .unwrap();
        ids.push(record.id);
    }

    let mut tasks = tokio::task::JoinSet::new();
    for id in ids {
        let loans = services.loans.clone();
        tasks.spawn(async move { loans.approve(&Actor::Librarian, id).await });
    }
    let mut applied = 0;
    let mut out_of_stock = 0;
    while let Some(result) = tasks.join_next().await {
        match result.unwrap() {
            Ok(outcome) if outcome.is_applied() => applied += 1,
            Err(AppError::OutOfStock(_)) => out_of_stock += 1,
            other => panic!("unexpected result: {:?}", other),
        }
    }

    assert_eq!(applied, 1);
    assert_eq!(out_of_stock, 2);
    assert_eq!(repository.get_book(book.id).await.unwrap().quantity, 0);
}

#[tokio::test]
#[ignore]
async fn test_duplicate_isbn_and_request() {
    let repository = repository().await;
    let isbn = unique_isbn();
    let new_book = NewBook {
        title: "Designing Data-Intensive Applications".into(),
        author: "Kleppmann".into(),
        isbn,
        quantity: 2,
        fine_rate: Decimal::ZERO,
    };
    let book = repository.insert_book(&new_book).await.unwrap();
    let err = repository.insert_book(&new_book).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let student_id = approved_student(&repository, format!("D{}", &book.isbn[5..])).await;
    let services = Services::new(repository.clone(), Arc::new(SystemClock), &Default::default());
    let request = BorrowRequest {
        book_id: book.id,
        expected_return_date: None,
    };
    let actor = Actor::Student(student_id);
    services.loans.request_borrow(&actor, student_id, &request).await.unwrap();
    let err = services
        .loans
        .request_borrow(&actor, student_id, &request)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
#[ignore]
async fn test_likes_are_distinct() {
    let repository = repository().await;
    let author = approved_student(&repository, format!("L{}", &unique_isbn()[4..])).await;
    let post = repository
        .insert_post(
            author,
            &lms_core::models::NewPost {
                body: "New arrivals shelf is up".into(),
                image: None,
            },
            Utc::now(),
        )
        .await
        .unwrap();

    assert!(repository.toggle_like(post.id, author).await.unwrap());
    assert!(!repository.toggle_like(post.id, author).await.unwrap());
    assert!(repository.toggle_like(post.id, author).await.unwrap());
    assert_eq!(repository.get_post(post.id).await.unwrap().likes, vec![author]);
}
