// src/handlers/student.rs

use axum::{Json, extract::State, response::IntoResponse};
use validator::Validate;

use crate::{
    error::AppError,
    models::student::{StudentChanges, UpdateProfileRequest},
    state::DynStore,
    utils::{hash::hash_password, jwt::AuthStudent},
};

/// Get the current student's profile.
pub async fn get_profile(
    State(store): State<DynStore>,
    student: AuthStudent,
) -> Result<impl IntoResponse, AppError> {
    let profile = store
        .find_student(student.id)
        .await?
        .ok_or(AppError::NotFound("Student not found".to_string()))?;

    Ok(Json(profile))
}

/// Change the current student's email and/or password.
///
/// A new password is re-hashed. Returns 409 if the email is already taken.
pub async fn update_profile(
    State(store): State<DynStore>,
    student: AuthStudent,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let password_hash = match payload.password {
        Some(password) => Some(hash_password(&password)?),
        None => None,
    };
    let changes = StudentChanges {
        name: None,
        email: payload.email,
        password_hash,
    };
    if changes.is_empty() {
        return Err(AppError::BadRequest("Nothing to update".to_string()));
    }

    let profile = store
        .update_student(student.id, changes)
        .await?
        .ok_or(AppError::NotFound("Student not found".to_string()))?;

    tracing::info!(student_id = student.id, "Profile updated");

    Ok(Json(profile))
}

/// List the current student's exam results, oldest first.
pub async fn list_my_results(
    State(store): State<DynStore>,
    student: AuthStudent,
) -> Result<impl IntoResponse, AppError> {
    let results = store.list_results_for_student(student.id).await?;

    Ok(Json(results))
}
