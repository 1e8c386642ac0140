//! Student accounts service

use std::sync::Arc;

use validator::Validate;

use crate::{
    clock::SharedClock,
    error::AppResult,
    models::{Actor, NewStudent, Student, StudentStatus, UpdateProfile},
    repository::CirculationStore,
};

#[derive(Clone)]
pub struct StudentsService {
    store: Arc<dyn CirculationStore>,
    clock: SharedClock,
}

impl StudentsService {
    pub fn new(store: Arc<dyn CirculationStore>, clock: SharedClock) -> Self {
        Self { store, clock }
    }

    /// Self-registration. New accounts wait for an admin in `Pending`.
    pub async fn register(&self, student: NewStudent) -> AppResult<Student> {
        let student = prepare_student(student)?;
        let created = self
            .store
            .insert_student(&student, StudentStatus::Pending, self.clock.now())
            .await?;
        tracing::info!("Student {} registered with roll number {}", created.id, created.roll_no);
        Ok(created)
    }

    pub async fn get(&self, actor: &Actor, id: i32) -> AppResult<Student> {
        actor.require_self_or_staff(id)?;
        self.store.get_student(id).await
    }

    /// Approve, reject or disable an account (admin only)
    pub async fn set_status(&self, actor: &Actor, id: i32, status: StudentStatus) -> AppResult<Student> {
        actor.require_admin()?;
        let student = self.store.update_student_status(id, status).await?;
        tracing::info!("Student {} status set to {}", id, status);
        Ok(student)
    }

    pub async fn update_profile(
        &self,
        actor: &Actor,
        id: i32,
        profile: &UpdateProfile,
    ) -> AppResult<Student> {
        actor.require_self_or_staff(id)?;
        profile.validate()?;
        self.store.update_student_profile(id, profile).await
    }
}

/// Trim fields, turn blank optionals into `None`, then validate
pub(crate) fn prepare_student(mut student: NewStudent) -> AppResult<NewStudent> {
    student.roll_no = student.roll_no.trim().to_string();
    student.branch = student.branch.trim().to_string();
    student.name = non_blank(student.name);
    student.phone_number = non_blank(student.phone_number);
    student.email = non_blank(student.email);
    student.validate()?;
    Ok(student)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
