// src/models/student.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'students' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,

    pub name: String,

    /// Unique, stored lowercase.
    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    /// Set by administrators. A suspended student may not sit exams.
    pub is_suspended: bool,

    /// Set by administrators. A withdrawn student may not sit exams.
    pub is_withdrawn: bool,

    /// Ids of this student's exam results, in submission order.
    pub exam_results: Vec<i64>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Student {
    pub fn is_eligible(&self) -> bool {
        !self.is_suspended && !self.is_withdrawn
    }
}

/// DTO for an admin registering a new student.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateStudentRequest {
    #[validate(length(min = 1, max = 100, message = "Name length must be between 1 and 100 characters."))]
    pub name: String,
    #[validate(email(message = "Email address is not valid."))]
    pub email: String,
    #[validate(length(
        min = 8,
        max = 128,
        message = "Password length must be between 8 and 128 characters."
    ))]
    pub password: String,
}

/// Insert payload with the password already hashed.
#[derive(Debug, Clone)]
pub struct NewStudent {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// DTO for toggling the administrative flags. Omitted fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateStudentStatusRequest {
    pub is_suspended: Option<bool>,
    pub is_withdrawn: Option<bool>,
}

/// DTO for a student changing their own login details.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(email(message = "Email address is not valid."))]
    pub email: Option<String>,
    #[validate(length(
        min = 8,
        max = 128,
        message = "Password length must be between 8 and 128 characters."
    ))]
    pub password: Option<String>,
}

/// DTO for an admin correcting a student's record.
#[derive(Debug, Deserialize, Validate)]
pub struct AdminUpdateStudentRequest {
    #[validate(length(min = 1, max = 100, message = "Name length must be between 1 and 100 characters."))]
    pub name: Option<String>,
    #[validate(email(message = "Email address is not valid."))]
    pub email: Option<String>,
}

/// Field changes handed to the store. `None` leaves the column as is.
#[derive(Debug, Clone, Default)]
pub struct StudentChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

impl StudentChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.password_hash.is_none()
    }
}
