// src/handlers/auth.rs

use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::admin::LoginRequest,
    state::DynStore,
    utils::{
        hash::verify_password,
        jwt::{ROLE_ADMIN, ROLE_STUDENT, sign_jwt},
    },
};

const INVALID_CREDENTIALS: &str = "Invalid login credentials";

/// Authenticates an admin and returns a JWT token.
pub async fn admin_login(
    State(store): State<DynStore>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let admin = store
        .find_admin_by_email(&payload.email)
        .await?
        .ok_or(AppError::AuthError(INVALID_CREDENTIALS.to_string()))?;

    if !verify_password(&payload.password, &admin.password)? {
        return Err(AppError::AuthError(INVALID_CREDENTIALS.to_string()));
    }

    let token = sign_jwt(admin.id, ROLE_ADMIN, &config.jwt_secret, config.jwt_expiration)?;

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "admin": admin
    })))
}

/// Authenticates a student and returns a JWT token.
///
/// Suspended or withdrawn students can still log in; the flags only matter
/// when they try to sit an exam.
pub async fn student_login(
    State(store): State<DynStore>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let student = store
        .find_student_by_email(&payload.email)
        .await?
        .ok_or(AppError::AuthError(INVALID_CREDENTIALS.to_string()))?;

    if !verify_password(&payload.password, &student.password)? {
        return Err(AppError::AuthError(INVALID_CREDENTIALS.to_string()));
    }

    let token = sign_jwt(
        student.id,
        ROLE_STUDENT,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "student": student
    })))
}
