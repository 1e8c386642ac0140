//! Data models

pub mod actor;
pub mod book;
pub mod borrow;
pub mod enums;
pub mod import_report;
pub mod post;
pub mod student;

// Re-export commonly used types
pub use actor::Actor;
pub use book::{Book, NewBook};
pub use borrow::{BorrowRecord, BorrowRequest, NewBorrow};
pub use enums::{BorrowStatus, StudentStatus};
pub use import_report::{ImportReport, RowFailure};
pub use post::{Comment, NewPost, Post};
pub use student::{NewStudent, Student, UpdateProfile};
