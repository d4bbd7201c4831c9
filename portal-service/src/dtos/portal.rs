use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::InternshipStatus;
use crate::policy::Role;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCompanyRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserStatusRequest {
    pub is_active: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRoleRequest {
    pub role: Role,
    pub company_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInternshipRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(max = 10000, message = "Description is too long"))]
    #[serde(default)]
    pub description: String,

    /// Defaults to the caller when the caller is a mentor.
    pub mentor_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateInternshipRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 10000, message = "Description is too long"))]
    pub description: Option<String>,

    pub status: Option<InternshipStatus>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateApplicationRequest {
    #[validate(length(max = 5000, message = "Cover letter is too long"))]
    pub cover_letter: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationDecision {
    Accept,
    Reject,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReviewApplicationRequest {
    pub decision: ApplicationDecision,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    pub assignee_id: Uuid,

    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[validate(range(min = 0, max = 1000, message = "Credits must be between 0 and 1000"))]
    pub credits: i32,

    pub due_utc: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,

    pub description: Option<String>,

    #[validate(range(min = 0, max = 1000, message = "Credits must be between 0 and 1000"))]
    pub credits: Option<i32>,

    pub due_utc: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSubmissionRequest {
    #[validate(length(min = 1, max = 20000, message = "Content must be 1-20000 characters"))]
    pub content: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReviewSubmissionRequest {
    pub approved: bool,

    #[validate(length(max = 5000, message = "Feedback is too long"))]
    pub feedback: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SendMessageRequest {
    pub recipient_id: Uuid,

    #[validate(length(min = 1, max = 5000, message = "Message must be 1-5000 characters"))]
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}
