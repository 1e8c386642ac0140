//! Students repository for database operations

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use super::conflict_on_unique;
use crate::{
    error::{AppError, AppResult},
    models::{
        enums::StudentStatus,
        student::{NewStudent, Student, UpdateProfile},
    },
};

#[derive(Clone)]
pub struct StudentsRepository {
    pool: Pool<Postgres>,
}

impl StudentsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get student by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Student> {
        sqlx::query_as::<_, Student>("SELECT * FROM students WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Student with id {} not found", id)))
    }

    /// Insert a student with its initial status in one statement
    pub async fn create(
        &self,
        student: &NewStudent,
        status: StudentStatus,
        created_at: DateTime<Utc>,
    ) -> AppResult<Student> {
        sqlx::query_as::<_, Student>(
            r#"
            INSERT INTO students (roll_no, branch, name, phone_number, email, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&student.roll_no)
        .bind(&student.branch)
        .bind(&student.name)
        .bind(&student.phone_number)
        .bind(&student.email)
        .bind(status)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            conflict_on_unique(e, || {
                format!("Roll number {} is already registered", student.roll_no)
            })
        })
    }

    pub async fn update_status(&self, id: i32, status: StudentStatus) -> AppResult<Student> {
        sqlx::query_as::<_, Student>("UPDATE students SET status = $1 WHERE id = $2 RETURNING *")
            .bind(status)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Student with id {} not found", id)))
    }

    /// Only the fields present in `profile` are changed
    pub async fn update_profile(&self, id: i32, profile: &UpdateProfile) -> AppResult<Student> {
        sqlx::query_as::<_, Student>(
            r#"
            UPDATE students
            SET name = COALESCE($1, name),
                phone_number = COALESCE($2, phone_number)
            WHERE id = $3
            RETURNING *
            "#,
        )
        .bind(&profile.name)
        .bind(&profile.phone_number)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Student with id {} not found", id)))
    }
}
