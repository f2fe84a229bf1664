// src/models/exam_result.rs

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, types::Json};
use validator::Validate;

/// Pass/fail outcome of a graded exam.
/// Stored as the Postgres enum `result_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "result_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Pass,
    Fail,
}

/// Per-question detail recorded on a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnsweredQuestion {
    pub question_id: i64,
    pub submitted_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
}

/// Represents the 'exam_results' table in the database.
/// One row per (student, exam); never updated after insertion.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ExamResult {
    pub id: i64,
    pub student_id: i64,
    pub exam_id: i64,

    /// Copied from `exams.created_by` at submission time.
    pub teacher_id: i64,

    pub score: f64,
    pub grade: String,
    pub pass_mark: f64,
    pub status: ResultStatus,
    pub remarks: String,
    pub answered_questions: Json<Vec<AnsweredQuestion>>,

    pub class_level_id: i64,
    pub academic_term_id: i64,
    pub academic_year_id: i64,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Insert payload for a result. The store assigns `id` and `created_at`.
#[derive(Debug, Clone)]
pub struct NewExamResult {
    pub student_id: i64,
    pub exam_id: i64,
    pub teacher_id: i64,
    pub score: f64,
    pub grade: String,
    pub pass_mark: f64,
    pub status: ResultStatus,
    pub remarks: String,
    pub answered_questions: Vec<AnsweredQuestion>,
    pub class_level_id: i64,
    pub academic_term_id: i64,
    pub academic_year_id: i64,
}

/// A single answer as sent by the student.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmittedAnswer {
    pub question_id: i64,
    pub chosen_answer: String,
}

/// DTO for submitting an exam attempt.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitExamRequest {
    /// Answers in the order the student gave them.
    #[validate(length(max = 200))]
    pub answers: Vec<SubmittedAnswer>,
}

/// Confirmation returned once a submission has been graded and stored.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionReceipt {
    pub result_id: i64,
    pub exam_id: i64,
    pub submitted_at: Option<chrono::DateTime<chrono::Utc>>,
}
