//! Shared domain enums, persisted as lowercase text

use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, Postgres};

// ---------------------------------------------------------------------------
// BorrowStatus
// ---------------------------------------------------------------------------

/// Lifecycle status of a borrow record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorrowStatus {
    Pending,
    Approved,
    Rejected,
    Returned,
}

impl BorrowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BorrowStatus::Pending => "pending",
            BorrowStatus::Approved => "approved",
            BorrowStatus::Rejected => "rejected",
            BorrowStatus::Returned => "returned",
        }
    }

    /// No transition leaves a terminal status
    pub fn is_terminal(&self) -> bool {
        matches!(self, BorrowStatus::Rejected | BorrowStatus::Returned)
    }

    /// Pending and approved records block a second request for the same book
    pub fn is_active(&self) -> bool {
        matches!(self, BorrowStatus::Pending | BorrowStatus::Approved)
    }
}

impl std::fmt::Display for BorrowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BorrowStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(BorrowStatus::Pending),
            "approved" => Ok(BorrowStatus::Approved),
            "rejected" => Ok(BorrowStatus::Rejected),
            "returned" => Ok(BorrowStatus::Returned),
            _ => Err(format!("Invalid borrow status: {}", s)),
        }
    }
}

impl sqlx::Type<Postgres> for BorrowStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for BorrowStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for BorrowStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

// ---------------------------------------------------------------------------
// StudentStatus
// ---------------------------------------------------------------------------

/// Account approval status of a student, independent of any single borrow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StudentStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Disabled,
}

impl StudentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StudentStatus::Pending => "pending",
            StudentStatus::Approved => "approved",
            StudentStatus::Rejected => "rejected",
            StudentStatus::Disabled => "disabled",
        }
    }
}

impl std::fmt::Display for StudentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for StudentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(StudentStatus::Pending),
            "approved" => Ok(StudentStatus::Approved),
            "rejected" => Ok(StudentStatus::Rejected),
            "disabled" => Ok(StudentStatus::Disabled),
            _ => Err(format!("Invalid student status: {}", s)),
        }
    }
}

impl sqlx::Type<Postgres> for StudentStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for StudentStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for StudentStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}
