// src/models/admin.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'admins' table in the database.
/// Admins set exams and manage student records.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Admin {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip)]
    pub password: String,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for login, shared by admins and students.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 254))]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}
