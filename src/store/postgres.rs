// src/store/postgres.rs

use std::time::Duration;

use async_trait::async_trait;
use sqlx::{
    PgPool, Postgres, Transaction,
    postgres::{PgConnectOptions, PgPoolOptions},
    types::Json,
};

use super::{ExamStore, SchoolStore, StoreError, SubmissionTx};
use crate::{
    config::Config,
    models::{
        admin::Admin,
        exam::{Exam, NewExam, Question},
        exam_result::{ExamResult, NewExamResult},
        student::{NewStudent, Student, StudentChanges, UpdateStudentStatusRequest},
    },
};

const STUDENT_COLUMNS: &str =
    "id, name, email, password, is_suspended, is_withdrawn, exam_results, created_at";

const EXAM_COLUMNS: &str = "id, name, description, pass_mark, total_mark, class_level_id, \
     academic_term_id, academic_year_id, created_by, created_at";

const RESULT_COLUMNS: &str = "id, student_id, exam_id, teacher_id, score, grade, pass_mark, \
     status, remarks, answered_questions, class_level_id, academic_term_id, academic_year_id, \
     created_at";

/// Builds the connection pool.
/// Every connection carries a `statement_timeout` so no store call blocks forever.
pub async fn connect_pool(config: &Config) -> Result<PgPool, sqlx::Error> {
    let database_url = config.database_url.as_deref().unwrap_or_default();
    let statement_timeout = config.db_statement_timeout_ms.to_string();

    let options: PgConnectOptions = database_url
        .parse::<PgConnectOptions>()?
        .options([("statement_timeout", statement_timeout.as_str())]);

    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_acquire_timeout_secs))
        .connect_with(options)
        .await
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|db_err| db_err.is_unique_violation())
}

/// Postgres-backed store.
#[derive(Clone)]
pub struct PgExamStore {
    pool: PgPool,
}

impl PgExamStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn load_questions(&self, exam_id: i64) -> Result<Vec<Question>, StoreError> {
        let questions = sqlx::query_as::<_, Question>(
            r#"
            SELECT id, content, options, correct_answer
            FROM exam_questions
            WHERE exam_id = $1
            ORDER BY position
            "#,
        )
        .bind(exam_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(questions)
    }
}

#[async_trait]
impl ExamStore for PgExamStore {
    async fn find_student(&self, id: i64) -> Result<Option<Student>, StoreError> {
        let student = sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(student)
    }

    async fn find_exam(&self, id: i64) -> Result<Option<Exam>, StoreError> {
        let exam = sqlx::query_as::<_, Exam>(&format!(
            "SELECT {EXAM_COLUMNS} FROM exams WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(mut exam) = exam else {
            return Ok(None);
        };
        exam.questions = self.load_questions(exam.id).await?;

        Ok(Some(exam))
    }

    async fn find_result(
        &self,
        student_id: i64,
        exam_id: i64,
    ) -> Result<Option<ExamResult>, StoreError> {
        let result = sqlx::query_as::<_, ExamResult>(&format!(
            "SELECT {RESULT_COLUMNS} FROM exam_results WHERE student_id = $1 AND exam_id = $2"
        ))
        .bind(student_id)
        .bind(exam_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(result)
    }

    async fn begin_submission<'a>(&'a self) -> Result<Box<dyn SubmissionTx + 'a>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgSubmissionTx { tx }))
    }
}

/// A submission inside a Postgres transaction. Rolled back on drop.
struct PgSubmissionTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl SubmissionTx for PgSubmissionTx {
    async fn lock_student(&mut self, student_id: i64) -> Result<Option<Student>, StoreError> {
        let student = sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE id = $1 FOR UPDATE"
        ))
        .bind(student_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(student)
    }

    async fn create_result(&mut self, record: NewExamResult) -> Result<ExamResult, StoreError> {
        let (student_id, exam_id) = (record.student_id, record.exam_id);

        sqlx::query_as::<_, ExamResult>(&format!(
            r#"
            INSERT INTO exam_results (
                student_id, exam_id, teacher_id, score, grade, pass_mark, status, remarks,
                answered_questions, class_level_id, academic_term_id, academic_year_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {RESULT_COLUMNS}
            "#
        ))
        .bind(record.student_id)
        .bind(record.exam_id)
        .bind(record.teacher_id)
        .bind(record.score)
        .bind(record.grade)
        .bind(record.pass_mark)
        .bind(record.status)
        .bind(record.remarks)
        .bind(Json(record.answered_questions))
        .bind(record.class_level_id)
        .bind(record.academic_term_id)
        .bind(record.academic_year_id)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::DuplicateResult {
                    student_id,
                    exam_id,
                }
            } else {
                tracing::error!("Failed to insert exam result: {:?}", e);
                StoreError::Database(e)
            }
        })
    }

    async fn append_exam_result(
        &mut self,
        student_id: i64,
        result_id: i64,
    ) -> Result<(), StoreError> {
        let updated = sqlx::query(
            "UPDATE students SET exam_results = array_append(exam_results, $2) WHERE id = $1",
        )
        .bind(student_id)
        .bind(result_id)
        .execute(&mut *self.tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::Missing {
                entity: "student",
                id: student_id,
            });
        }

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl SchoolStore for PgExamStore {
    async fn find_student_by_email(&self, email: &str) -> Result<Option<Student>, StoreError> {
        let student = sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE email = $1"
        ))
        .bind(email.to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        Ok(student)
    }

    async fn create_student(&self, student: NewStudent) -> Result<Student, StoreError> {
        let email = student.email.to_lowercase();

        sqlx::query_as::<_, Student>(&format!(
            r#"
            INSERT INTO students (name, email, password)
            VALUES ($1, $2, $3)
            RETURNING {STUDENT_COLUMNS}
            "#
        ))
        .bind(student.name.trim())
        .bind(&email)
        .bind(student.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::DuplicateEmail(email)
            } else {
                tracing::error!("Failed to create student: {:?}", e);
                StoreError::Database(e)
            }
        })
    }

    async fn list_students(&self) -> Result<Vec<Student>, StoreError> {
        let students = sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(students)
    }

    async fn update_student(
        &self,
        id: i64,
        changes: StudentChanges,
    ) -> Result<Option<Student>, StoreError> {
        let email = changes.email.map(|e| e.to_lowercase());

        sqlx::query_as::<_, Student>(&format!(
            r#"
            UPDATE students
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                password = COALESCE($4, password)
            WHERE id = $1
            RETURNING {STUDENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(changes.name.as_deref().map(str::trim))
        .bind(&email)
        .bind(changes.password_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::DuplicateEmail(email.clone().unwrap_or_default())
            } else {
                tracing::error!("Failed to update student: {:?}", e);
                StoreError::Database(e)
            }
        })
    }

    async fn update_student_status(
        &self,
        id: i64,
        update: &UpdateStudentStatusRequest,
    ) -> Result<Option<Student>, StoreError> {
        let student = sqlx::query_as::<_, Student>(&format!(
            r#"
            UPDATE students
            SET is_suspended = COALESCE($2, is_suspended),
                is_withdrawn = COALESCE($3, is_withdrawn)
            WHERE id = $1
            RETURNING {STUDENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(update.is_suspended)
        .bind(update.is_withdrawn)
        .fetch_optional(&self.pool)
        .await?;

        Ok(student)
    }

    async fn find_admin_by_email(&self, email: &str) -> Result<Option<Admin>, StoreError> {
        let admin = sqlx::query_as::<_, Admin>(
            "SELECT id, name, email, password, created_at FROM admins WHERE email = $1",
        )
        .bind(email.to_lowercase())
        .fetch_optional(&self.pool)
        .await?;

        Ok(admin)
    }

    async fn create_admin(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<Admin, StoreError> {
        let email = email.to_lowercase();

        sqlx::query_as::<_, Admin>(
            r#"
            INSERT INTO admins (name, email, password)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, password, created_at
            "#,
        )
        .bind(name)
        .bind(&email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::DuplicateEmail(email)
            } else {
                StoreError::Database(e)
            }
        })
    }

    async fn create_exam(&self, new_exam: NewExam) -> Result<Exam, StoreError> {
        let mut tx = self.pool.begin().await?;

        let mut exam = sqlx::query_as::<_, Exam>(&format!(
            r#"
            INSERT INTO exams (
                name, description, pass_mark, total_mark, class_level_id,
                academic_term_id, academic_year_id, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {EXAM_COLUMNS}
            "#
        ))
        .bind(&new_exam.name)
        .bind(&new_exam.description)
        .bind(new_exam.pass_mark)
        .bind(new_exam.total_mark)
        .bind(new_exam.class_level_id)
        .bind(new_exam.academic_term_id)
        .bind(new_exam.academic_year_id)
        .bind(new_exam.created_by)
        .fetch_one(&mut *tx)
        .await?;

        for (position, q) in new_exam.questions.into_iter().enumerate() {
            let question = sqlx::query_as::<_, Question>(
                r#"
                INSERT INTO exam_questions (exam_id, position, content, options, correct_answer)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, content, options, correct_answer
                "#,
            )
            .bind(exam.id)
            .bind(position as i32)
            .bind(q.content)
            .bind(Json(q.options))
            .bind(q.correct_answer)
            .fetch_one(&mut *tx)
            .await?;

            exam.questions.push(question);
        }

        tx.commit().await?;
        Ok(exam)
    }

    async fn list_results_for_student(
        &self,
        student_id: i64,
    ) -> Result<Vec<ExamResult>, StoreError> {
        let results = sqlx::query_as::<_, ExamResult>(&format!(
            "SELECT {RESULT_COLUMNS} FROM exam_results WHERE student_id = $1 ORDER BY created_at, id"
        ))
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(results)
    }
}
