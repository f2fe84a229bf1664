// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        exam::{CreateExamRequest, NewExam},
        student::{
            AdminUpdateStudentRequest, CreateStudentRequest, NewStudent, StudentChanges,
            UpdateStudentStatusRequest,
        },
    },
    state::DynStore,
    utils::{hash::hash_password, jwt::AuthAdmin},
};

/// Registers a new student.
/// Admin only. Returns 409 if the email is taken.
pub async fn create_student(
    State(store): State<DynStore>,
    admin: AuthAdmin,
    Json(payload): Json<CreateStudentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let password_hash = hash_password(&payload.password)?;

    let student = store
        .create_student(NewStudent {
            name: payload.name,
            email: payload.email,
            password_hash,
        })
        .await?;

    tracing::info!(admin_id = admin.id, student_id = student.id, "Student registered");

    Ok((StatusCode::CREATED, Json(student)))
}

/// Lists every registered student.
/// Admin only.
pub async fn list_students(State(store): State<DynStore>) -> Result<impl IntoResponse, AppError> {
    let students = store.list_students().await?;

    Ok(Json(students))
}

/// Retrieves a single student by ID.
/// Admin only.
pub async fn get_student(
    State(store): State<DynStore>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let student = store
        .find_student(id)
        .await?
        .ok_or(AppError::NotFound("Student not found".to_string()))?;

    Ok(Json(student))
}

/// Corrects a student's name or email.
/// Admin only. Returns 409 if the new email belongs to another student.
pub async fn update_student(
    State(store): State<DynStore>,
    admin: AuthAdmin,
    Path(id): Path<i64>,
    Json(payload): Json<AdminUpdateStudentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let changes = StudentChanges {
        name: payload.name,
        email: payload.email,
        password_hash: None,
    };
    if changes.is_empty() {
        return Err(AppError::BadRequest("Nothing to update".to_string()));
    }

    let student = store
        .update_student(id, changes)
        .await?
        .ok_or(AppError::NotFound("Student not found".to_string()))?;

    tracing::info!(admin_id = admin.id, student_id = id, "Student record updated");

    Ok(Json(student))
}

/// Sets or clears the suspended/withdrawn flags.
/// Admin only.
pub async fn update_student_status(
    State(store): State<DynStore>,
    admin: AuthAdmin,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateStudentStatusRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.is_suspended.is_none() && payload.is_withdrawn.is_none() {
        return Err(AppError::BadRequest("Nothing to update".to_string()));
    }

    let student = store
        .update_student_status(id, &payload)
        .await?
        .ok_or(AppError::NotFound("Student not found".to_string()))?;

    tracing::info!(
        admin_id = admin.id,
        student_id = id,
        is_suspended = student.is_suspended,
        is_withdrawn = student.is_withdrawn,
        "Student status updated"
    );

    Ok(Json(student))
}

/// Lists every result recorded for a student.
/// Admin only.
pub async fn list_student_results(
    State(store): State<DynStore>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    store
        .find_student(id)
        .await?
        .ok_or(AppError::NotFound("Student not found".to_string()))?;

    let results = store.list_results_for_student(id).await?;

    Ok(Json(results))
}

/// Creates an exam with its questions. The calling admin is recorded as the setter.
/// Admin only.
pub async fn create_exam(
    State(store): State<DynStore>,
    admin: AuthAdmin,
    Json(payload): Json<CreateExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let exam = store
        .create_exam(NewExam::from_request(payload, admin.id))
        .await?;

    tracing::info!(
        admin_id = admin.id,
        exam_id = exam.id,
        questions = exam.questions.len(),
        "Exam created"
    );

    Ok((StatusCode::CREATED, Json(exam)))
}

/// Retrieves an exam including its answer key.
/// Admin only.
pub async fn get_exam(
    State(store): State<DynStore>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let exam = store
        .find_exam(id)
        .await?
        .ok_or(AppError::NotFound("Exam not found".to_string()))?;

    Ok(Json(exam))
}
