// src/handlers/exam.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    grading,
    models::{exam::ExamPaper, exam_result::SubmitExamRequest},
    state::DynStore,
    utils::jwt::AuthStudent,
};

/// Returns the exam paper without the answer key.
pub async fn get_exam_paper(
    State(store): State<DynStore>,
    _student: AuthStudent,
    Path(exam_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let exam = store
        .find_exam(exam_id)
        .await?
        .ok_or(AppError::NotFound("Exam not found".to_string()))?;

    Ok(Json(ExamPaper::from(exam)))
}

/// Submits a student's answers for grading.
///
/// The score is stored but not echoed back; students read it from their results.
pub async fn submit_exam(
    State(store): State<DynStore>,
    student: AuthStudent,
    Path(exam_id): Path<i64>,
    Json(req): Json<SubmitExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let receipt = grading::submit_exam(&*store, student.id, exam_id, &req.answers).await?;

    Ok(Json(serde_json::json!({
        "message": "Answer submitted",
        "result_id": receipt.result_id,
        "exam_id": receipt.exam_id,
        "submitted_at": receipt.submitted_at
    })))
}
