use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::SanitizedUser;
use crate::policy::Role;

#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    #[validate(length(min = 1, max = 120, message = "Name must be 1-120 characters"))]
    pub name: String,

    /// Defaults to `INTERN`.
    pub role: Option<Role>,

    /// Required for company roles, rejected otherwise.
    pub company_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SigninRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SigninResponse {
    pub token: String,
    pub expires_in: i64,
    pub user: SanitizedUser,
}
