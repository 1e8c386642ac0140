//! In-process store
//!
//! Everything lives behind one mutex, so each trait call is atomic with
//! respect to every other call. Used by tests and by embedders that don't
//! need durability.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::{CirculationStore, FeedStore};
use crate::{
    circulation::{Effect, StockChange},
    error::{AppError, AppResult},
    models::{
        Book, BorrowRecord, BorrowStatus, Comment, NewBook, NewBorrow, NewPost, NewStudent, Post,
        Student, StudentStatus, UpdateProfile,
    },
};

#[derive(Debug, Default)]
struct State {
    books: BTreeMap<i32, Book>,
    students: BTreeMap<i32, Student>,
    borrows: BTreeMap<i32, BorrowRecord>,
    posts: BTreeMap<i32, Post>,
    comments: BTreeMap<i32, Comment>,
    last_id: i32,
}

impl State {
    fn next_id(&mut self) -> i32 {
        self.last_id += 1;
        self.last_id
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a book as-is, keeping its id. Handy for fixtures.
    pub async fn put_book(&self, book: Book) {
        let mut state = self.state.lock().await;
        state.last_id = state.last_id.max(book.id);
        state.books.insert(book.id, book);
    }

    /// Insert a student as-is, keeping its id
    pub async fn put_student(&self, student: Student) {
        let mut state = self.state.lock().await;
        state.last_id = state.last_id.max(student.id);
        state.students.insert(student.id, student);
    }
}

fn book_not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Book with id {} not found", id))
}

fn student_not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Student with id {} not found", id))
}

fn post_not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Post with id {} not found", id))
}

#[async_trait]
impl CirculationStore for MemoryStore {
    async fn get_book(&self, id: i32) -> AppResult<Book> {
        let state = self.state.lock().await;
        state.books.get(&id).cloned().ok_or_else(|| book_not_found(id))
    }

    async fn find_book_by_isbn(&self, isbn: &str) -> AppResult<Option<Book>> {
        let isbn = NewBook::normalize_isbn(isbn);
        let state = self.state.lock().await;
        Ok(state.books.values().find(|b| b.isbn == isbn).cloned())
    }

    async fn insert_book(&self, book: &NewBook) -> AppResult<Book> {
        let isbn = NewBook::normalize_isbn(&book.isbn);
        let mut state = self.state.lock().await;
        if state.books.values().any(|b| b.isbn == isbn) {
            return Err(AppError::Conflict(format!(
                "A book with ISBN {} already exists",
                isbn
            )));
        }

        let id = state.next_id();
        let created = Book {
            id,
            title: book.title.clone(),
            author: book.author.clone(),
            isbn,
            quantity: book.quantity,
            fine_rate: book.fine_rate,
        };
        state.books.insert(id, created.clone());
        Ok(created)
    }

    async fn get_student(&self, id: i32) -> AppResult<Student> {
        let state = self.state.lock().await;
        state.students.get(&id).cloned().ok_or_else(|| student_not_found(id))
    }

    async fn insert_student(
        &self,
        student: &NewStudent,
        status: StudentStatus,
        at: DateTime<Utc>,
    ) -> AppResult<Student> {
        let mut state = self.state.lock().await;
        if state.students.values().any(|s| s.roll_no == student.roll_no) {
            return Err(AppError::Conflict(format!(
                "Roll number {} is already registered",
                student.roll_no
            )));
        }

        let id = state.next_id();
        let created = Student {
            id,
            roll_no: student.roll_no.clone(),
            branch: student.branch.clone(),
            name: student.name.clone(),
            phone_number: student.phone_number.clone(),
            email: student.email.clone(),
            status,
            created_at: at,
        };
        state.students.insert(id, created.clone());
        Ok(created)
    }

    async fn update_student_status(&self, id: i32, status: StudentStatus) -> AppResult<Student> {
        let mut state = self.state.lock().await;
        let student = state.students.get_mut(&id).ok_or_else(|| student_not_found(id))?;
        student.status = status;
        Ok(student.clone())
    }

    async fn update_student_profile(&self, id: i32, profile: &UpdateProfile) -> AppResult<Student> {
        let mut state = self.state.lock().await;
        let student = state.students.get_mut(&id).ok_or_else(|| student_not_found(id))?;
        if let Some(name) = &profile.name {
            student.name = Some(name.clone());
        }
        if let Some(phone) = &profile.phone_number {
            student.phone_number = Some(phone.clone());
        }
        Ok(student.clone())
    }

    async fn get_borrow(&self, id: i32) -> AppResult<BorrowRecord> {
        let state = self.state.lock().await;
        state
            .borrows
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Borrow record with id {} not found", id)))
    }

    async fn student_borrows(&self, student_id: i32) -> AppResult<Vec<BorrowRecord>> {
        let state = self.state.lock().await;
        let mut records: Vec<BorrowRecord> = state
            .borrows
            .values()
            .filter(|r| r.student_id == student_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.borrow_date.cmp(&a.borrow_date).then(b.id.cmp(&a.id)));
        Ok(records)
    }

    async fn pending_borrows(&self) -> AppResult<Vec<BorrowRecord>> {
        let state = self.state.lock().await;
        let mut records: Vec<BorrowRecord> = state
            .borrows
            .values()
            .filter(|r| r.status == BorrowStatus::Pending)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.borrow_date.cmp(&b.borrow_date).then(a.id.cmp(&b.id)));
        Ok(records)
    }

    async fn create_borrow(&self, borrow: &NewBorrow) -> AppResult<BorrowRecord> {
        let mut state = self.state.lock().await;
        if !state.students.contains_key(&borrow.student_id) {
            return Err(student_not_found(borrow.student_id));
        }
        if !state.books.contains_key(&borrow.book_id) {
            return Err(book_not_found(borrow.book_id));
        }
        let duplicate = state.borrows.values().any(|r| {
            r.student_id == borrow.student_id && r.book_id == borrow.book_id && r.status.is_active()
        });
        if duplicate {
            return Err(AppError::Conflict(
                "You already have a borrow request or have borrowed this book".to_string(),
            ));
        }

        let id = state.next_id();
        let record = borrow.clone().into_record(id);
        state.borrows.insert(id, record.clone());
        Ok(record)
    }

    async fn commit(&self, effect: &Effect) -> AppResult<Book> {
        let record = &effect.record;
        let mut state = self.state.lock().await;

        let stored_status = state
            .borrows
            .get(&record.id)
            .map(|r| r.status)
            .ok_or_else(|| AppError::NotFound(format!("Borrow record with id {} not found", record.id)))?;
        let quantity = state
            .books
            .get(&record.book_id)
            .map(|b| b.quantity)
            .ok_or_else(|| book_not_found(record.book_id))?;

        // Check every guard before touching anything; status first, as in Postgres
        if stored_status != effect.expected_status {
            return Err(AppError::Conflict(format!(
                "Borrow record {} is no longer {}",
                record.id, effect.expected_status
            )));
        }
        let new_quantity = effect.stock.apply_to(quantity).ok_or_else(|| match effect.stock {
            StockChange::Decrement => {
                AppError::OutOfStock(format!("Book {} is out of stock", record.book_id))
            }
            _ => AppError::Internal(format!("Quantity overflow on book {}", record.book_id)),
        })?;

        state.borrows.insert(record.id, record.clone());
        let book = state
            .books
            .get_mut(&record.book_id)
            .ok_or_else(|| book_not_found(record.book_id))?;
        book.quantity = new_quantity;
        Ok(book.clone())
    }
}

#[async_trait]
impl FeedStore for MemoryStore {
    async fn insert_post(&self, author_id: i32, post: &NewPost, at: DateTime<Utc>) -> AppResult<Post> {
        let mut state = self.state.lock().await;
        let id = state.next_id();
        let created = Post {
            id,
            author_id,
            body: post.body.clone(),
            image: post.image.clone(),
            created_at: at,
            likes: Vec::new(),
        };
        state.posts.insert(id, created.clone());
        Ok(created)
    }

    async fn get_post(&self, id: i32) -> AppResult<Post> {
        let state = self.state.lock().await;
        state.posts.get(&id).cloned().ok_or_else(|| post_not_found(id))
    }

    async fn list_posts(&self, limit: i64, offset: i64) -> AppResult<Vec<Post>> {
        let state = self.state.lock().await;
        let mut posts: Vec<Post> = state.posts.values().cloned().collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(posts
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(0))
            .take(usize::try_from(limit).unwrap_or(0))
            .collect())
    }

    async fn delete_post(&self, id: i32) -> AppResult<()> {
        let mut state = self.state.lock().await;
        state.posts.remove(&id).ok_or_else(|| post_not_found(id))?;
        state.comments.retain(|_, c| c.post_id != id);
        Ok(())
    }

    async fn insert_comment(
        &self,
        post_id: i32,
        author_id: i32,
        body: &str,
        at: DateTime<Utc>,
    ) -> AppResult<Comment> {
        let mut state = self.state.lock().await;
        if !state.posts.contains_key(&post_id) {
            return Err(post_not_found(post_id));
        }
        let id = state.next_id();
        let comment = Comment {
            id,
            post_id,
            author_id,
            body: body.to_string(),
            created_at: at,
        };
        state.comments.insert(id, comment.clone());
        Ok(comment)
    }

    async fn post_comments(&self, post_id: i32) -> AppResult<Vec<Comment>> {
        let state = self.state.lock().await;
        let mut comments: Vec<Comment> = state
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(comments)
    }

    async fn toggle_like(&self, post_id: i32, student_id: i32) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        let post = state.posts.get_mut(&post_id).ok_or_else(|| post_not_found(post_id))?;
        match post.likes.binary_search(&student_id) {
            Ok(pos) => {
                post.likes.remove(pos);
                Ok(false)
            }
            Err(pos) => {
                post.likes.insert(pos, student_id);
                Ok(true)
            }
        }
    }
}
