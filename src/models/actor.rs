//! Acting identity supplied by the caller on every service call

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Who is performing an operation. The core never looks up a session;
/// the application layer resolves one and passes it in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", content = "student_id", rename_all = "lowercase")]
pub enum Actor {
    Student(i32),
    /// Circulation desk and wall moderation
    Librarian,
    /// Librarian rights plus catalog, student accounts and imports
    Admin,
}

impl Actor {
    pub fn is_staff(&self) -> bool {
        matches!(self, Actor::Librarian | Actor::Admin)
    }

    pub fn student_id(&self) -> Option<i32> {
        match self {
            Actor::Student(id) => Some(*id),
            _ => None,
        }
    }

    pub fn require_staff(&self) -> Result<(), AppError> {
        if self.is_staff() {
            Ok(())
        } else {
            Err(AppError::Authorization("Staff role required".to_string()))
        }
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if *self == Actor::Admin {
            Ok(())
        } else {
            Err(AppError::Authorization("Admin role required".to_string()))
        }
    }

    /// Staff, or the student the resource belongs to
    pub fn require_self_or_staff(&self, student_id: i32) -> Result<(), AppError> {
        match self {
            Actor::Student(id) if *id == student_id => Ok(()),
            a if a.is_staff() => Ok(()),
            _ => Err(AppError::Authorization(
                "Students may only act on their own records".to_string(),
            )),
        }
    }

    /// The acting student, for operations only students perform
    pub fn require_student(&self) -> Result<i32, AppError> {
        self.student_id()
            .ok_or_else(|| AppError::Authorization("Only students may do this".to_string()))
    }
}
