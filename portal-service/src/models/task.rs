use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::policy::{ResourceDescriptor, ResourceKind};

/// `Assigned -> Submitted -> Completed`, with `Submitted -> Assigned` when a
/// submission is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Assigned,
    Submitted,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Assigned => "ASSIGNED",
            TaskStatus::Submitted => "SUBMITTED",
            TaskStatus::Completed => "COMPLETED",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "SUBMITTED" => TaskStatus::Submitted,
            "COMPLETED" => TaskStatus::Completed,
            _ => TaskStatus::Assigned,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: Uuid,
    pub internship_id: Uuid,
    pub company_id: Uuid,
    pub mentor_id: Uuid,
    pub assignee_id: Uuid,
    pub title: String,
    pub description: String,
    pub credits: i32,
    pub status: String,
    pub due_utc: Option<DateTime<Utc>>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl Task {
    pub fn status(&self) -> TaskStatus {
        TaskStatus::from_string(&self.status)
    }

    pub fn descriptor(&self) -> ResourceDescriptor {
        ResourceDescriptor::new(ResourceKind::Task)
            .owned_by(self.mentor_id)
            .assigned_to(self.assignee_id)
            .in_company(Some(self.company_id))
    }

    /// Descriptor for submissions against this task, existing or new.
    pub fn submission_descriptor(&self) -> ResourceDescriptor {
        ResourceDescriptor::new(ResourceKind::Submission)
            .owned_by(self.mentor_id)
            .assigned_to(self.assignee_id)
            .in_company(Some(self.company_id))
    }
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub internship_id: Uuid,
    pub company_id: Uuid,
    pub mentor_id: Uuid,
    pub assignee_id: Uuid,
    pub title: String,
    pub description: String,
    pub credits: i32,
    pub due_utc: Option<DateTime<Utc>>,
}

/// Editable task fields. Status only moves through submissions and reviews.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub credits: Option<i32>,
    pub due_utc: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionStatus {
    Pending,
    Approved,
    Rejected,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "PENDING",
            SubmissionStatus::Approved => "APPROVED",
            SubmissionStatus::Rejected => "REJECTED",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "APPROVED" => SubmissionStatus::Approved,
            "REJECTED" => SubmissionStatus::Rejected,
            _ => SubmissionStatus::Pending,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Submission {
    pub id: Uuid,
    pub task_id: Uuid,
    pub company_id: Uuid,
    pub mentor_id: Uuid,
    pub intern_id: Uuid,
    pub content: String,
    pub status: String,
    pub feedback: Option<String>,
    pub created_utc: DateTime<Utc>,
    pub reviewed_utc: Option<DateTime<Utc>>,
}

impl Submission {
    pub fn status(&self) -> SubmissionStatus {
        SubmissionStatus::from_string(&self.status)
    }

    pub fn descriptor(&self) -> ResourceDescriptor {
        ResourceDescriptor::new(ResourceKind::Submission)
            .owned_by(self.mentor_id)
            .assigned_to(self.intern_id)
            .in_company(Some(self.company_id))
    }
}

#[derive(Debug, Clone)]
pub struct NewSubmission {
    pub task_id: Uuid,
    pub intern_id: Uuid,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    pub approved: bool,
    pub feedback: Option<String>,
}
