//! Persistence seam. Handlers talk to `dyn Store`; the binary picks
//! PostgreSQL or the in-memory store at startup.

use async_trait::async_trait;
use service_core::error::AppError;
use uuid::Uuid;

use crate::models::{
    Application, Company, Internship, InternshipUpdate, Message, NewApplication, NewInternship,
    NewMessage, NewSubmission, NewTask, NewUser, ReviewOutcome, Submission, Task, TaskUpdate,
    User,
};
use crate::policy::{AccessError, Role};

/// Lookups return `Ok(None)` for a missing record; mutations of a missing
/// record return `AppError::NotFound`. Lifecycle violations are
/// `AppError::Conflict`.
#[async_trait]
pub trait Store: Send + Sync {
    async fn health_check(&self) -> Result<(), AppError>;

    // Users
    async fn create_user(&self, input: NewUser) -> Result<User, AppError>;
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, AppError>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn list_users(&self) -> Result<Vec<User>, AppError>;
    async fn set_user_active(&self, id: Uuid, is_active: bool) -> Result<User, AppError>;
    async fn set_user_role(
        &self,
        id: Uuid,
        role: Role,
        company_id: Option<Uuid>,
    ) -> Result<User, AppError>;

    // Companies
    async fn create_company(&self, name: &str) -> Result<Company, AppError>;
    async fn get_company(&self, id: Uuid) -> Result<Option<Company>, AppError>;

    // Internships
    async fn create_internship(&self, input: NewInternship) -> Result<Internship, AppError>;
    async fn get_internship(&self, id: Uuid) -> Result<Option<Internship>, AppError>;
    async fn list_internships_for_company(
        &self,
        company_id: Uuid,
    ) -> Result<Vec<Internship>, AppError>;
    async fn list_internships_for_mentor(
        &self,
        mentor_id: Uuid,
    ) -> Result<Vec<Internship>, AppError>;
    async fn list_open_internships(&self) -> Result<Vec<Internship>, AppError>;
    async fn update_internship(
        &self,
        id: Uuid,
        update: InternshipUpdate,
    ) -> Result<Internship, AppError>;

    // Applications
    /// Conflict when the intern already applied to the internship.
    async fn create_application(&self, input: NewApplication) -> Result<Application, AppError>;
    async fn get_application(&self, id: Uuid) -> Result<Option<Application>, AppError>;
    async fn list_applications_for_internship(
        &self,
        internship_id: Uuid,
    ) -> Result<Vec<Application>, AppError>;
    /// Marks a pending application accepted and enrols the intern into the
    /// internship's company, atomically.
    async fn accept_application(&self, id: Uuid) -> Result<Application, AppError>;
    async fn reject_application(&self, id: Uuid) -> Result<Application, AppError>;

    // Tasks
    async fn create_task(&self, input: NewTask) -> Result<Task, AppError>;
    async fn get_task(&self, id: Uuid) -> Result<Option<Task>, AppError>;
    async fn list_tasks_for_assignee(&self, assignee_id: Uuid) -> Result<Vec<Task>, AppError>;
    async fn list_tasks_for_mentor(&self, mentor_id: Uuid) -> Result<Vec<Task>, AppError>;
    async fn list_tasks_for_company(&self, company_id: Uuid) -> Result<Vec<Task>, AppError>;
    async fn update_task(&self, id: Uuid, update: TaskUpdate) -> Result<Task, AppError>;
    async fn delete_task(&self, id: Uuid) -> Result<(), AppError>;

    // Submissions
    /// Only an `ASSIGNED` task accepts a submission; the task moves to
    /// `SUBMITTED` in the same transaction.
    async fn create_submission(&self, input: NewSubmission) -> Result<Submission, AppError>;
    async fn get_submission(&self, id: Uuid) -> Result<Option<Submission>, AppError>;
    async fn list_submissions_for_task(&self, task_id: Uuid)
        -> Result<Vec<Submission>, AppError>;
    async fn list_pending_submissions_for_mentor(
        &self,
        mentor_id: Uuid,
    ) -> Result<Vec<Submission>, AppError>;
    /// Review a pending submission. Approval completes the task and credits
    /// the intern once; rejection returns the task to `ASSIGNED`.
    async fn record_review(
        &self,
        submission_id: Uuid,
        outcome: ReviewOutcome,
    ) -> Result<Submission, AppError>;

    // Messages
    async fn create_message(&self, input: NewMessage) -> Result<Message, AppError>;
    async fn list_messages_for_user(&self, user_id: Uuid) -> Result<Vec<Message>, AppError>;
}

/// Missing records answer exactly like records hidden by tenant scoping.
pub(crate) fn not_found(what: &str, id: Uuid) -> AppError {
    tracing::debug!(record = what, id = %id, "Record not found");
    AccessError::NotFound.into()
}
