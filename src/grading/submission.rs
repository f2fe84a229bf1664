// src/grading/submission.rs

use super::{SubmissionError, check_eligibility, match_answers, score};
use crate::{
    models::exam_result::{NewExamResult, SubmissionReceipt, SubmittedAnswer},
    store::ExamStore,
};

/// Grades a student's exam attempt and records the result.
///
/// * Runs the eligibility guard.
/// * Matches the answers against the exam's questions.
/// * Derives score, grade, status and remarks.
/// * Inserts the result and appends its id to the student in one transaction.
///
/// Either both writes happen or neither does.
pub async fn submit_exam<S>(
    store: &S,
    student_id: i64,
    exam_id: i64,
    answers: &[SubmittedAnswer],
) -> Result<SubmissionReceipt, SubmissionError>
where
    S: ExamStore + ?Sized,
{
    let result = grade_and_record(store, student_id, exam_id, answers).await;

    match &result {
        Ok(receipt) => tracing::info!(
            student_id,
            exam_id,
            result_id = receipt.result_id,
            "Exam submission recorded"
        ),
        Err(SubmissionError::Store(e)) => {
            tracing::error!(student_id, exam_id, "Exam submission failed: {:?}", e)
        }
        Err(e) => tracing::warn!(student_id, exam_id, "Exam submission rejected: {}", e),
    }

    result
}

async fn grade_and_record<S>(
    store: &S,
    student_id: i64,
    exam_id: i64,
    answers: &[SubmittedAnswer],
) -> Result<SubmissionReceipt, SubmissionError>
where
    S: ExamStore + ?Sized,
{
    // 1. Eligibility
    let (student, exam) = check_eligibility(store, student_id, exam_id).await?;

    // 2-3. Match against the exam's own question order
    let outcome = match_answers(&exam.questions, answers)?;

    // 4. Score
    let card = score::calculate(
        outcome.correct_count,
        outcome.total(),
        exam.pass_mark,
        exam.total_mark,
    );

    // 5-6. Persist. Contextual fields are snapshotted from the exam.
    let record = NewExamResult {
        student_id: student.id,
        exam_id: exam.id,
        teacher_id: exam.created_by,
        score: card.score,
        grade: card.grade.to_string(),
        pass_mark: exam.pass_mark,
        status: card.status,
        remarks: card.remarks.to_string(),
        answered_questions: outcome.answered,
        class_level_id: exam.class_level_id,
        academic_term_id: exam.academic_term_id,
        academic_year_id: exam.academic_year_id,
    };

    let mut tx = store.begin_submission().await?;

    // Flags may have changed since the guard ran.
    let locked = tx
        .lock_student(student.id)
        .await?
        .ok_or(SubmissionError::NotFound("Student"))?;
    if !locked.is_eligible() {
        return Err(SubmissionError::Ineligible);
    }

    let created = tx.create_result(record).await?;
    tx.append_exam_result(student.id, created.id).await?;
    tx.commit().await?;

    Ok(SubmissionReceipt {
        result_id: created.id,
        exam_id: created.exam_id,
        submitted_at: created.created_at,
    })
}
