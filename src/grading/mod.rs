// src/grading/mod.rs

//! Exam submission and automatic grading.
//!
//! [`submit_exam`] is the entry point. [`match_answers`] and
//! [`score::calculate`] are pure; only the eligibility guard and the final
//! writes touch the store.

pub mod eligibility;
pub mod matcher;
pub mod score;
pub mod submission;

pub use eligibility::check_eligibility;
pub use matcher::{MatchError, MatchOutcome, match_answers};
pub use score::{Grade, ScoreCard};
pub use submission::submit_exam;

use crate::store::StoreError;

/// Ways a submission can be refused, plus unexpected store failures.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    /// The named record ("Student" or "Exam") does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Exam has already been submitted")]
    AlreadySubmitted,

    /// The student is suspended or withdrawn.
    #[error("Student is not eligible to sit this exam")]
    Ineligible,

    #[error("Expected {expected} answers but received {submitted}")]
    IncompleteAnswers { expected: usize, submitted: usize },

    #[error("Answer for question {question_id} does not match a unique exam question")]
    InvalidAnswer { question_id: i64 },

    #[error("store failure: {0}")]
    Store(StoreError),
}

impl From<MatchError> for SubmissionError {
    fn from(err: MatchError) -> Self {
        match err {
            MatchError::IncompleteAnswers {
                expected,
                submitted,
            } => SubmissionError::IncompleteAnswers {
                expected,
                submitted,
            },
            MatchError::InvalidAnswer { question_id } => {
                SubmissionError::InvalidAnswer { question_id }
            }
        }
    }
}

/// A unique violation on insert means a concurrent submission won the race.
impl From<StoreError> for SubmissionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateResult { .. } => SubmissionError::AlreadySubmitted,
            other => SubmissionError::Store(other),
        }
    }
}
