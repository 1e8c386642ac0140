use std::sync::{Arc, Mutex};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;

use lms_core::{
    clock::Clock,
    config::CirculationConfig,
    models::{Book, Student, StudentStatus},
    repository::memory::MemoryStore,
    services::Services,
};

pub const BOOK_ID: i32 = 100;

/// Clock the test can move forward
#[derive(Debug)]
pub struct TestClock(Mutex<DateTime<Utc>>);

impl TestClock {
    pub fn on(date: NaiveDate) -> Self {
        Self(Mutex::new(midnight(date)))
    }

    pub fn set(&self, date: NaiveDate) {
        *self.0.lock().unwrap() = midnight(date);
    }
}

impl Clock for TestClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub clock: Arc<TestClock>,
    pub services: Services,
}

impl Fixture {
    /// One book with `quantity` copies and `students` approved students with
    /// ids 1..=students, on 2024-01-01
    pub async fn new(quantity: i32, students: i32) -> Self {
        let store = Arc::new(MemoryStore::new());
        store
            .put_book(Book {
                id: BOOK_ID,
                title: "Introduction to Algorithms".into(),
                author: "Cormen et al.".into(),
                isbn: "9780262046305".into(),
                quantity,
                fine_rate: Decimal::new(200, 2),
            })
            .await;
        for id in 1..=students {
            store.put_student(student(id, StudentStatus::Approved)).await;
        }

        let clock = Arc::new(TestClock::on(day(2024, 1, 1)));
        let services = Services::new(store.clone(), clock.clone(), &CirculationConfig::default());
        Self {
            store,
            clock,
            services,
        }
    }

    pub async fn quantity(&self) -> i32 {
        use lms_core::repository::CirculationStore;
        self.store.get_book(BOOK_ID).await.unwrap().quantity
    }
}

pub fn student(id: i32, status: StudentStatus) -> Student {
    Student {
        id,
        roll_no: format!("CS-{:03}", id),
        branch: "Computer Science".into(),
        name: None,
        phone_number: None,
        email: None,
        status,
        created_at: Utc::now(),
    }
}
