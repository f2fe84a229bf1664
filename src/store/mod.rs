// src/store/mod.rs

//! Persistence interface for exams, students and results.
//!
//! [`ExamStore`] is the narrow surface the submission workflow depends on.
//! [`SchoolStore`] extends it with the record keeping the HTTP layer needs.
//! Both backends enforce one result per (student, exam) at the storage level.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::models::{
    admin::Admin,
    exam::{Exam, NewExam},
    exam_result::{ExamResult, NewExamResult},
    student::{NewStudent, Student, StudentChanges, UpdateStudentStatusRequest},
};

pub use memory::MemoryStore;
pub use postgres::PgExamStore;

/// Errors raised by a store backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The (student, exam) uniqueness constraint rejected an insert.
    #[error("a result already exists for student {student_id} and exam {exam_id}")]
    DuplicateResult { student_id: i64, exam_id: i64 },

    #[error("email '{0}' is already registered")]
    DuplicateEmail(String),

    /// A write targeted a row that does not exist.
    #[error("{entity} {id} not found")]
    Missing { entity: &'static str, id: i64 },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Read side used by the eligibility guard, plus the transactional writer.
#[async_trait]
pub trait ExamStore: Send + Sync {
    async fn find_student(&self, id: i64) -> Result<Option<Student>, StoreError>;

    /// Loads the exam together with its ordered questions.
    async fn find_exam(&self, id: i64) -> Result<Option<Exam>, StoreError>;

    async fn find_result(
        &self,
        student_id: i64,
        exam_id: i64,
    ) -> Result<Option<ExamResult>, StoreError>;

    /// Opens a unit of work for writing a result. Dropping it without
    /// calling [`SubmissionTx::commit`] discards every staged write.
    async fn begin_submission<'a>(&'a self) -> Result<Box<dyn SubmissionTx + 'a>, StoreError>;
}

/// Writes belonging to one submission. All or nothing.
#[async_trait]
pub trait SubmissionTx: Send {
    /// Re-reads the student and holds it until the transaction ends, so a
    /// concurrent status change cannot slip in between check and write.
    async fn lock_student(&mut self, student_id: i64) -> Result<Option<Student>, StoreError>;

    /// Fails with [`StoreError::DuplicateResult`] if the pair already has a result.
    async fn create_result(&mut self, record: NewExamResult) -> Result<ExamResult, StoreError>;

    /// Appends to the student's own `exam_results` list.
    async fn append_exam_result(&mut self, student_id: i64, result_id: i64)
    -> Result<(), StoreError>;

    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}

/// Everything the web layer persists.
#[async_trait]
pub trait SchoolStore: ExamStore {
    async fn find_student_by_email(&self, email: &str) -> Result<Option<Student>, StoreError>;

    async fn create_student(&self, student: NewStudent) -> Result<Student, StoreError>;

    /// All students, by id.
    async fn list_students(&self) -> Result<Vec<Student>, StoreError>;

    /// Applies name/email/password changes. Returns `None` if the student
    /// does not exist and [`StoreError::DuplicateEmail`] if another student
    /// already uses the new email.
    async fn update_student(
        &self,
        id: i64,
        changes: StudentChanges,
    ) -> Result<Option<Student>, StoreError>;

    /// Returns `None` if the student does not exist.
    async fn update_student_status(
        &self,
        id: i64,
        update: &UpdateStudentStatusRequest,
    ) -> Result<Option<Student>, StoreError>;

    async fn find_admin_by_email(&self, email: &str) -> Result<Option<Admin>, StoreError>;

    async fn create_admin(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<Admin, StoreError>;

    async fn create_exam(&self, exam: NewExam) -> Result<Exam, StoreError>;

    /// Results for one student, oldest first.
    async fn list_results_for_student(&self, student_id: i64)
    -> Result<Vec<ExamResult>, StoreError>;
}
