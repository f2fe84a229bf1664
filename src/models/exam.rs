// src/models/exam.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

/// Represents the 'exam_questions' table in the database.
/// Questions are owned by a single exam and ordered by their position.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    /// The text content of the question.
    pub content: String,

    /// List of options (e.g., ["A", "B", "C", "D"]).
    /// Stored as a JSON array in the database.
    pub options: Json<Vec<String>>,

    /// The authoritative answer. Submissions are compared to it with exact equality.
    pub correct_answer: String,
}

/// Represents the 'exams' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Exam {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,

    /// Minimum score, inclusive, for a pass. Same scale as `total_mark`.
    pub pass_mark: f64,

    /// Score awarded for a fully correct paper.
    pub total_mark: f64,

    pub class_level_id: i64,
    pub academic_term_id: i64,
    pub academic_year_id: i64,

    /// Teacher or admin who set the exam.
    pub created_by: i64,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,

    /// Loaded separately from 'exam_questions'.
    #[sqlx(skip)]
    pub questions: Vec<Question>,
}

/// DTO for sending a question to a student (excludes the answer).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub content: String,
    pub options: Json<Vec<String>>,
}

impl From<Question> for PublicQuestion {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            content: q.content,
            options: q.options,
        }
    }
}

/// DTO for the exam paper a student sees before submitting.
#[derive(Debug, Serialize)]
pub struct ExamPaper {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub pass_mark: f64,
    pub total_mark: f64,
    pub questions: Vec<PublicQuestion>,
}

impl From<Exam> for ExamPaper {
    fn from(exam: Exam) -> Self {
        Self {
            id: exam.id,
            name: exam.name,
            description: exam.description,
            pass_mark: exam.pass_mark,
            total_mark: exam.total_mark,
            questions: exam.questions.into_iter().map(PublicQuestion::from).collect(),
        }
    }
}

/// DTO for creating a question as part of an exam.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = validate_answer_in_options))]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 1000))]
    pub content: String,
    #[validate(custom(function = validate_options))]
    pub options: Vec<String>,
    #[validate(length(min = 1, max = 500))]
    pub correct_answer: String,
}

fn default_total_mark() -> f64 {
    100.0
}

/// DTO for creating a new exam.
#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = validate_marks))]
pub struct CreateExamRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub pass_mark: f64,
    #[serde(default = "default_total_mark")]
    pub total_mark: f64,
    pub class_level_id: i64,
    pub academic_term_id: i64,
    pub academic_year_id: i64,
    #[validate(length(min = 1, max = 200), nested)]
    pub questions: Vec<CreateQuestionRequest>,
}

/// Insert payload handed to the store once the creator is known.
#[derive(Debug, Clone)]
pub struct NewExam {
    pub name: String,
    pub description: Option<String>,
    pub pass_mark: f64,
    pub total_mark: f64,
    pub class_level_id: i64,
    pub academic_term_id: i64,
    pub academic_year_id: i64,
    pub created_by: i64,
    pub questions: Vec<CreateQuestionRequest>,
}

impl NewExam {
    pub fn from_request(req: CreateExamRequest, created_by: i64) -> Self {
        Self {
            name: req.name,
            description: req.description,
            pass_mark: req.pass_mark,
            total_mark: req.total_mark,
            class_level_id: req.class_level_id,
            academic_term_id: req.academic_term_id,
            academic_year_id: req.academic_year_id,
            created_by,
            questions: req.questions,
        }
    }
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    if options.len() < 2 {
        return Err(validator::ValidationError::new("options_need_at_least_two"));
    }
    for opt in options {
        if opt.is_empty() || opt.len() > 500 {
            return Err(validator::ValidationError::new("option_length"));
        }
    }
    Ok(())
}

/// A question whose key is not among its options can never be answered correctly.
fn validate_answer_in_options(q: &CreateQuestionRequest) -> Result<(), validator::ValidationError> {
    if !q.options.contains(&q.correct_answer) {
        return Err(validator::ValidationError::new("correct_answer_not_an_option"));
    }
    Ok(())
}

/// The pass mark must lie on the exam's own scale.
fn validate_marks(req: &CreateExamRequest) -> Result<(), validator::ValidationError> {
    if !req.total_mark.is_finite() || req.total_mark <= 0.0 {
        return Err(validator::ValidationError::new("total_mark_must_be_positive"));
    }
    if !req.pass_mark.is_finite() || req.pass_mark < 0.0 || req.pass_mark > req.total_mark {
        return Err(validator::ValidationError::new("pass_mark_out_of_range"));
    }
    Ok(())
}
