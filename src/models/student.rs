//! Student model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::enums::StudentStatus;

/// Borrower identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Student {
    pub id: i32,
    pub roll_no: String,
    pub branch: String,
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub status: StudentStatus,
    pub created_at: DateTime<Utc>,
}

impl Student {
    /// Only approved students may transact
    pub fn can_transact(&self) -> bool {
        self.status == StudentStatus::Approved
    }
}

/// Student registration request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewStudent {
    #[validate(length(min = 1, max = 20, message = "Roll number is required (max 20 characters)"))]
    pub roll_no: String,
    #[validate(length(min = 1, max = 50, message = "Branch is required (max 50 characters)"))]
    pub branch: String,
    #[validate(length(max = 100, message = "Name is limited to 100 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 15, message = "Phone number is limited to 15 characters"))]
    pub phone_number: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

/// Update own profile request
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProfile {
    #[validate(length(max = 100, message = "Name is limited to 100 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 15, message = "Phone number is limited to 15 characters"))]
    pub phone_number: Option<String>,
}
