// src/store/memory.rs

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use tokio::sync::{Mutex, MutexGuard};

use super::{ExamStore, SchoolStore, StoreError, SubmissionTx};
use crate::models::{
    admin::Admin,
    exam::{Exam, NewExam, Question},
    exam_result::{ExamResult, NewExamResult},
    student::{NewStudent, Student, StudentChanges, UpdateStudentStatusRequest},
};

#[derive(Debug, Default)]
struct Tables {
    students: BTreeMap<i64, Student>,
    admins: BTreeMap<i64, Admin>,
    exams: BTreeMap<i64, Exam>,
    results: BTreeMap<i64, ExamResult>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn has_result(&self, student_id: i64, exam_id: i64) -> bool {
        self.results
            .values()
            .any(|r| r.student_id == student_id && r.exam_id == exam_id)
    }
}

/// In-process store with the same guarantees as the Postgres one.
///
/// A submission holds the table lock from `begin_submission` until it is
/// committed or dropped, so writers are serialized.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExamStore for MemoryStore {
    async fn find_student(&self, id: i64) -> Result<Option<Student>, StoreError> {
        Ok(self.tables.lock().await.students.get(&id).cloned())
    }

    async fn find_exam(&self, id: i64) -> Result<Option<Exam>, StoreError> {
        Ok(self.tables.lock().await.exams.get(&id).cloned())
    }

    async fn find_result(
        &self,
        student_id: i64,
        exam_id: i64,
    ) -> Result<Option<ExamResult>, StoreError> {
        let tables = self.tables.lock().await;
        let result = tables
            .results
            .values()
            .find(|r| r.student_id == student_id && r.exam_id == exam_id)
            .cloned();
        Ok(result)
    }

    async fn begin_submission<'a>(&'a self) -> Result<Box<dyn SubmissionTx + 'a>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(Box::new(MemorySubmissionTx {
            tables,
            results: Vec::new(),
            appends: Vec::new(),
        }))
    }
}

/// Staged writes. Nothing reaches the tables until `commit`.
struct MemorySubmissionTx<'a> {
    tables: MutexGuard<'a, Tables>,
    results: Vec<ExamResult>,
    appends: Vec<(i64, i64)>,
}

#[async_trait]
impl<'a> SubmissionTx for MemorySubmissionTx<'a> {
    async fn lock_student(&mut self, student_id: i64) -> Result<Option<Student>, StoreError> {
        Ok(self.tables.students.get(&student_id).cloned())
    }

    async fn create_result(&mut self, record: NewExamResult) -> Result<ExamResult, StoreError> {
        let (student_id, exam_id) = (record.student_id, record.exam_id);

        let staged = self
            .results
            .iter()
            .any(|r| r.student_id == student_id && r.exam_id == exam_id);
        if staged || self.tables.has_result(student_id, exam_id) {
            return Err(StoreError::DuplicateResult {
                student_id,
                exam_id,
            });
        }

        let result = ExamResult {
            id: self.tables.next_id(),
            student_id,
            exam_id,
            teacher_id: record.teacher_id,
            score: record.score,
            grade: record.grade,
            pass_mark: record.pass_mark,
            status: record.status,
            remarks: record.remarks,
            answered_questions: Json(record.answered_questions),
            class_level_id: record.class_level_id,
            academic_term_id: record.academic_term_id,
            academic_year_id: record.academic_year_id,
            created_at: Some(Utc::now()),
        };
        self.results.push(result.clone());

        Ok(result)
    }

    async fn append_exam_result(
        &mut self,
        student_id: i64,
        result_id: i64,
    ) -> Result<(), StoreError> {
        if !self.tables.students.contains_key(&student_id) {
            return Err(StoreError::Missing {
                entity: "student",
                id: student_id,
            });
        }
        self.appends.push((student_id, result_id));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemorySubmissionTx {
            mut tables,
            results,
            appends,
        } = *self;

        for result in results {
            tables.results.insert(result.id, result);
        }
        for (student_id, result_id) in appends {
            if let Some(student) = tables.students.get_mut(&student_id) {
                student.exam_results.push(result_id);
            }
        }

        Ok(())
    }
}

#[async_trait]
impl SchoolStore for MemoryStore {
    async fn find_student_by_email(&self, email: &str) -> Result<Option<Student>, StoreError> {
        let email = email.to_lowercase();
        let tables = self.tables.lock().await;
        Ok(tables.students.values().find(|s| s.email == email).cloned())
    }

    async fn create_student(&self, student: NewStudent) -> Result<Student, StoreError> {
        let email = student.email.to_lowercase();
        let mut tables = self.tables.lock().await;

        if tables.students.values().any(|s| s.email == email) {
            return Err(StoreError::DuplicateEmail(email));
        }

        let created = Student {
            id: tables.next_id(),
            name: student.name.trim().to_string(),
            email,
            password: student.password_hash,
            is_suspended: false,
            is_withdrawn: false,
            exam_results: Vec::new(),
            created_at: Some(Utc::now()),
        };
        tables.students.insert(created.id, created.clone());

        Ok(created)
    }

    async fn list_students(&self) -> Result<Vec<Student>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.students.values().cloned().collect())
    }

    async fn update_student(
        &self,
        id: i64,
        changes: StudentChanges,
    ) -> Result<Option<Student>, StoreError> {
        let mut tables = self.tables.lock().await;
        if !tables.students.contains_key(&id) {
            return Ok(None);
        }

        let email = changes.email.map(|e| e.to_lowercase());
        if let Some(email) = &email {
            if tables.students.values().any(|s| s.id != id && &s.email == email) {
                return Err(StoreError::DuplicateEmail(email.clone()));
            }
        }

        let Some(student) = tables.students.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            student.name = name.trim().to_string();
        }
        if let Some(email) = email {
            student.email = email;
        }
        if let Some(password_hash) = changes.password_hash {
            student.password = password_hash;
        }

        Ok(Some(student.clone()))
    }

    async fn update_student_status(
        &self,
        id: i64,
        update: &UpdateStudentStatusRequest,
    ) -> Result<Option<Student>, StoreError> {
        let mut tables = self.tables.lock().await;
        let Some(student) = tables.students.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(suspended) = update.is_suspended {
            student.is_suspended = suspended;
        }
        if let Some(withdrawn) = update.is_withdrawn {
            student.is_withdrawn = withdrawn;
        }

        Ok(Some(student.clone()))
    }

    async fn find_admin_by_email(&self, email: &str) -> Result<Option<Admin>, StoreError> {
        let email = email.to_lowercase();
        let tables = self.tables.lock().await;
        Ok(tables.admins.values().find(|a| a.email == email).cloned())
    }

    async fn create_admin(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<Admin, StoreError> {
        let email = email.to_lowercase();
        let mut tables = self.tables.lock().await;

        if tables.admins.values().any(|a| a.email == email) {
            return Err(StoreError::DuplicateEmail(email));
        }

        let admin = Admin {
            id: tables.next_id(),
            name: name.to_string(),
            email,
            password: password_hash.to_string(),
            created_at: Some(Utc::now()),
        };
        tables.admins.insert(admin.id, admin.clone());

        Ok(admin)
    }

    async fn create_exam(&self, new_exam: NewExam) -> Result<Exam, StoreError> {
        let mut tables = self.tables.lock().await;

        let exam_id = tables.next_id();
        let mut questions = Vec::with_capacity(new_exam.questions.len());
        for q in new_exam.questions {
            questions.push(Question {
                id: tables.next_id(),
                content: q.content,
                options: Json(q.options),
                correct_answer: q.correct_answer,
            });
        }

        let exam = Exam {
            id: exam_id,
            name: new_exam.name,
            description: new_exam.description,
            pass_mark: new_exam.pass_mark,
            total_mark: new_exam.total_mark,
            class_level_id: new_exam.class_level_id,
            academic_term_id: new_exam.academic_term_id,
            academic_year_id: new_exam.academic_year_id,
            created_by: new_exam.created_by,
            created_at: Some(Utc::now()),
            questions,
        };
        tables.exams.insert(exam.id, exam.clone());

        Ok(exam)
    }

    async fn list_results_for_student(
        &self,
        student_id: i64,
    ) -> Result<Vec<ExamResult>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .results
            .values()
            .filter(|r| r.student_id == student_id)
            .cloned()
            .collect())
    }
}
