// src/grading/eligibility.rs

use super::SubmissionError;
use crate::{
    models::{exam::Exam, student::Student},
    store::ExamStore,
};

/// Checks that `student_id` may sit `exam_id` now and returns both records.
///
/// The order of the checks decides which error wins: missing student, missing
/// exam, existing result, then suspension or withdrawal. Read-only.
pub async fn check_eligibility<S>(
    store: &S,
    student_id: i64,
    exam_id: i64,
) -> Result<(Student, Exam), SubmissionError>
where
    S: ExamStore + ?Sized,
{
    let student = store
        .find_student(student_id)
        .await?
        .ok_or(SubmissionError::NotFound("Student"))?;

    let exam = store
        .find_exam(exam_id)
        .await?
        .ok_or(SubmissionError::NotFound("Exam"))?;

    // Fast path only. The store's unique constraint is what actually
    // prevents a second result.
    if store.find_result(student.id, exam.id).await?.is_some() {
        return Err(SubmissionError::AlreadySubmitted);
    }

    if !student.is_eligible() {
        return Err(SubmissionError::Ineligible);
    }

    Ok((student, exam))
}
