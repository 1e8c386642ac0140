//! Persistence layer
//!
//! The services talk to storage through [`CirculationStore`] and
//! [`FeedStore`]. [`Repository`] implements both on Postgres;
//! [`memory::MemoryStore`] implements both in process.
//!
//! Both implementations must apply [`CirculationStore::commit`] as one atomic
//! unit per book: the stock guard (`quantity > 0` before a decrement) and the
//! record's status guard are checked and applied together or not at all.

pub mod books;
pub mod borrows;
pub mod memory;
pub mod posts;
pub mod students;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    circulation::Effect,
    error::{AppError, AppResult},
    models::{
        Book, BorrowRecord, Comment, NewBook, NewBorrow, NewPost, NewStudent, Post, Student,
        StudentStatus, UpdateProfile,
    },
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CirculationStore: Send + Sync {
    async fn get_book(&self, id: i32) -> AppResult<Book>;
    async fn find_book_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>>;
    /// Fails with `Conflict` on a duplicate ISBN
    async fn insert_book(&self, book: &NewBook) -> AppResult<Book>;

    async fn get_student(&self, id: i32) -> AppResult<Student>;
    /// Create a student already in `status`. Fails with `Conflict` on a
    /// duplicate roll number.
    async fn insert_student(
        &self,
        student: &NewStudent,
        status: StudentStatus,
        at: DateTime<Utc>,
    ) -> AppResult<Student>;
    async fn update_student_status(&self, id: i32, status: StudentStatus) -> AppResult<Student>;
    async fn update_student_profile(&self, id: i32, profile: &UpdateProfile) -> AppResult<Student>;

    async fn get_borrow(&self, id: i32) -> AppResult<BorrowRecord>;
    async fn student_borrows(&self, student_id: i32) -> AppResult<Vec<BorrowRecord>>;
    async fn pending_borrows(&self) -> AppResult<Vec<BorrowRecord>>;
    /// Fails with `Conflict` if the student already has an active record for the book
    async fn create_borrow(&self, borrow: &NewBorrow) -> AppResult<BorrowRecord>;

    /// Atomically persist a transition and its stock change. Returns the book
    /// as it stands afterwards.
    ///
    /// Fails with `Conflict` if the stored record no longer has
    /// `effect.expected_status` (checked first), and with `OutOfStock` if a
    /// decrement finds no copy left.
    async fn commit(&self, effect: &Effect) -> AppResult<Book>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FeedStore: Send + Sync {
    async fn insert_post(&self, author_id: i32, post: &NewPost, at: DateTime<Utc>) -> AppResult<Post>;
    async fn get_post(&self, id: i32) -> AppResult<Post>;
    /// Newest first
    async fn list_posts(&self, limit: i64, offset: i64) -> AppResult<Vec<Post>>;
    async fn delete_post(&self, id: i32) -> AppResult<()>;
    async fn insert_comment(
        &self,
        post_id: i32,
        author_id: i32,
        body: &str,
        at: DateTime<Utc>,
    ) -> AppResult<Comment>;
    /// Oldest first
    async fn post_comments(&self, post_id: i32) -> AppResult<Vec<Comment>>;
    /// Flip `student_id`'s like on a post; returns whether it is now liked
    async fn toggle_like(&self, post_id: i32, student_id: i32) -> AppResult<bool>;
}

/// Postgres-backed store
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub books: books::BooksRepository,
    pub students: students::StudentsRepository,
    pub borrows: borrows::BorrowsRepository,
    pub posts: posts::PostsRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: books::BooksRepository::new(pool.clone()),
            students: students::StudentsRepository::new(pool.clone()),
            borrows: borrows::BorrowsRepository::new(pool.clone()),
            posts: posts::PostsRepository::new(pool.clone()),
            pool,
        }
    }

    /// Apply pending schema migrations
    pub async fn migrate(&self) -> AppResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("Migration failed: {}", e)))
    }
}

/// Map a unique-constraint violation to `Conflict`, pass everything else through
pub(crate) fn conflict_on_unique(e: sqlx::Error, message: impl FnOnce() -> String) -> AppError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return AppError::Conflict(message());
        }
    }
    AppError::Database(e)
}

/// Map a foreign-key violation to `NotFound`, pass everything else through
pub(crate) fn not_found_on_foreign_key(e: sqlx::Error, message: impl FnOnce() -> String) -> AppError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_foreign_key_violation() {
            return AppError::NotFound(message());
        }
    }
    AppError::Database(e)
}

#[async_trait]
impl CirculationStore for Repository {
    async fn get_book(&self, id: i32) -> AppResult<Book> {
        self.books.get_by_id(id).await
    }

    async fn find_book_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>> {
        self.books.find_by_isbn(isbn).await
    }

    async fn insert_book(&self, book: &NewBook) -> AppResult<Book> {
        self.books.create(book).await
    }

    async fn get_student(&self, id: i32) -> AppResult<Student> {
        self.students.get_by_id(id).await
    }

    async fn insert_student(
        &self,
        student: &NewStudent,
        status: StudentStatus,
        at: DateTime<Utc>,
    ) -> AppResult<Student> {
        self.students.create(student, status, at).await
    }

    async fn update_student_status(&self, id: i32, status: StudentStatus) -> AppResult<Student> {
        self.students.update_status(id, status).await
    }

    async fn update_student_profile(&self, id: i32, profile: &UpdateProfile) -> AppResult<Student> {
        self.students.update_profile(id, profile).await
    }

    async fn get_borrow(&self, id: i32) -> AppResult<BorrowRecord> {
        self.borrows.get_by_id(id).await
    }

    async fn student_borrows(&self, student_id: i32) -> AppResult<Vec<BorrowRecord>> {
        self.borrows.for_student(student_id).await
    }

    async fn pending_borrows(&self) -> AppResult<Vec<BorrowRecord>> {
        self.borrows.pending().await
    }

    async fn create_borrow(&self, borrow: &NewBorrow) -> AppResult<BorrowRecord> {
        self.borrows.create(borrow).await
    }

    async fn commit(&self, effect: &Effect) -> AppResult<Book> {
        self.borrows.commit(effect).await
    }
}

#[async_trait]
impl FeedStore for Repository {
    async fn insert_post(&self, author_id: i32, post: &NewPost, at: DateTime<Utc>) -> AppResult<Post> {
        self.posts.create(author_id, post, at).await
    }

    async fn get_post(&self, id: i32) -> AppResult<Post> {
        self.posts.get_by_id(id).await
    }

    async fn list_posts(&self, limit: i64, offset: i64) -> AppResult<Vec<Post>> {
        self.posts.list(limit, offset).await
    }

    async fn delete_post(&self, id: i32) -> AppResult<()> {
        self.posts.delete(id).await
    }

    async fn insert_comment(
        &self,
        post_id: i32,
        author_id: i32,
        body: &str,
        at: DateTime<Utc>,
    ) -> AppResult<Comment> {
        self.posts.create_comment(post_id, author_id, body, at).await
    }

    async fn post_comments(&self, post_id: i32) -> AppResult<Vec<Comment>> {
        self.posts.comments(post_id).await
    }

    async fn toggle_like(&self, post_id: i32, student_id: i32) -> AppResult<bool> {
        self.posts.toggle_like(post_id, student_id).await
    }
}
