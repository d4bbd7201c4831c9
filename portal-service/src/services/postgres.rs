//! PostgreSQL store.

use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

use super::store::{not_found, Store};
use crate::models::{
    Application, ApplicationStatus, Company, Internship, InternshipStatus, InternshipUpdate,
    Message, NewApplication, NewInternship, NewMessage, NewSubmission, NewTask, NewUser,
    ReviewOutcome, Submission, SubmissionStatus, Task, TaskStatus, TaskUpdate, User,
};
use crate::policy::Role;

const USER_COLUMNS: &str =
    "id, email, name, password_hash, role, company_id, is_active, credits, created_utc";
const INTERNSHIP_COLUMNS: &str =
    "id, company_id, mentor_id, title, description, status, created_utc";
const APPLICATION_COLUMNS: &str = "id, internship_id, intern_id, company_id, mentor_id, cover_letter, status, created_utc, reviewed_utc";
const TASK_COLUMNS: &str = "id, internship_id, company_id, mentor_id, assignee_id, title, description, credits, status, due_utc, created_utc, updated_utc";
const SUBMISSION_COLUMNS: &str = "id, task_id, company_id, mentor_id, intern_id, content, status, feedback, created_utc, reviewed_utc";

fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| AppError::DatabaseError(anyhow::anyhow!("{}: {}", context, e))
}

/// SQLSTATE 22003, numeric_value_out_of_range.
fn is_numeric_overflow(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .and_then(|d| d.code())
        .is_some_and(|code| code == "22003")
}

fn conflict(message: &str) -> AppError {
    AppError::Conflict(anyhow::anyhow!(message.to_string()))
}

/// Connection pool wrapper implementing [`Store`].
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[instrument(skip(database_url), fields(service = "portal-service"))]
    pub async fn connect(
        database_url: &Secret<String>,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url.expose_secret())
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(db_error("Health check failed"))?;
        Ok(())
    }

    #[instrument(skip(self, input), fields(role = %input.role))]
    async fn create_user(&self, input: NewUser) -> Result<User, AppError> {
        let sql = format!(
            "INSERT INTO users (id, email, name, password_hash, role, company_id, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(&input.email)
            .bind(&input.name)
            .bind(input.password_hash.as_str())
            .bind(input.role.as_str())
            .bind(input.company_id)
            .bind(input.is_active)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                    conflict("Email already registered")
                }
                _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create user: {}", e)),
            })?;

        info!(user_id = %user.id, "User created");
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to get user"))
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)");
        sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to get user by email"))
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_utc");
        sqlx::query_as::<_, User>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list users"))
    }

    #[instrument(skip(self))]
    async fn set_user_active(&self, id: Uuid, is_active: bool) -> Result<User, AppError> {
        let sql = format!("UPDATE users SET is_active = $2 WHERE id = $1 RETURNING {USER_COLUMNS}");
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(is_active)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to update user status"))?
            .ok_or_else(|| not_found("User", id))
    }

    #[instrument(skip(self))]
    async fn set_user_role(
        &self,
        id: Uuid,
        role: Role,
        company_id: Option<Uuid>,
    ) -> Result<User, AppError> {
        let sql = format!(
            "UPDATE users SET role = $2, company_id = $3 WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(role.as_str())
            .bind(company_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to update user role"))?
            .ok_or_else(|| not_found("User", id))
    }

    #[instrument(skip(self))]
    async fn create_company(&self, name: &str) -> Result<Company, AppError> {
        sqlx::query_as::<_, Company>(
            "INSERT INTO companies (id, name) VALUES ($1, $2) RETURNING id, name, created_utc",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to create company"))
    }

    async fn get_company(&self, id: Uuid) -> Result<Option<Company>, AppError> {
        sqlx::query_as::<_, Company>("SELECT id, name, created_utc FROM companies WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to get company"))
    }

    #[instrument(skip(self, input), fields(company_id = %input.company_id))]
    async fn create_internship(&self, input: NewInternship) -> Result<Internship, AppError> {
        let sql = format!(
            "INSERT INTO internships (id, company_id, mentor_id, title, description, status) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {INTERNSHIP_COLUMNS}"
        );
        sqlx::query_as::<_, Internship>(&sql)
            .bind(Uuid::new_v4())
            .bind(input.company_id)
            .bind(input.mentor_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(InternshipStatus::Open.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("Failed to create internship"))
    }

    async fn get_internship(&self, id: Uuid) -> Result<Option<Internship>, AppError> {
        let sql = format!("SELECT {INTERNSHIP_COLUMNS} FROM internships WHERE id = $1");
        sqlx::query_as::<_, Internship>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to get internship"))
    }

    async fn list_internships_for_company(
        &self,
        company_id: Uuid,
    ) -> Result<Vec<Internship>, AppError> {
        let sql = format!(
            "SELECT {INTERNSHIP_COLUMNS} FROM internships WHERE company_id = $1 ORDER BY created_utc"
        );
        sqlx::query_as::<_, Internship>(&sql)
            .bind(company_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list internships"))
    }

    async fn list_internships_for_mentor(
        &self,
        mentor_id: Uuid,
    ) -> Result<Vec<Internship>, AppError> {
        let sql = format!(
            "SELECT {INTERNSHIP_COLUMNS} FROM internships WHERE mentor_id = $1 ORDER BY created_utc"
        );
        sqlx::query_as::<_, Internship>(&sql)
            .bind(mentor_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list internships"))
    }

    async fn list_open_internships(&self) -> Result<Vec<Internship>, AppError> {
        let sql = format!(
            "SELECT {INTERNSHIP_COLUMNS} FROM internships WHERE status = $1 ORDER BY created_utc"
        );
        sqlx::query_as::<_, Internship>(&sql)
            .bind(InternshipStatus::Open.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list internships"))
    }

    #[instrument(skip(self, update))]
    async fn update_internship(
        &self,
        id: Uuid,
        update: InternshipUpdate,
    ) -> Result<Internship, AppError> {
        let sql = format!(
            "UPDATE internships SET \
                title = COALESCE($2, title), \
                description = COALESCE($3, description), \
                status = COALESCE($4, status) \
             WHERE id = $1 RETURNING {INTERNSHIP_COLUMNS}"
        );
        sqlx::query_as::<_, Internship>(&sql)
            .bind(id)
            .bind(update.title)
            .bind(update.description)
            .bind(update.status.map(|s| s.as_str()))
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to update internship"))?
            .ok_or_else(|| not_found("Internship", id))
    }

    #[instrument(skip(self, input), fields(internship_id = %input.internship_id))]
    async fn create_application(&self, input: NewApplication) -> Result<Application, AppError> {
        let sql = format!(
            "INSERT INTO applications (id, internship_id, intern_id, company_id, mentor_id, cover_letter, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {APPLICATION_COLUMNS}"
        );
        sqlx::query_as::<_, Application>(&sql)
            .bind(Uuid::new_v4())
            .bind(input.internship_id)
            .bind(input.intern_id)
            .bind(input.company_id)
            .bind(input.mentor_id)
            .bind(&input.cover_letter)
            .bind(ApplicationStatus::Pending.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                    conflict("Already applied to this internship")
                }
                _ => AppError::DatabaseError(anyhow::anyhow!(
                    "Failed to create application: {}",
                    e
                )),
            })
    }

    async fn get_application(&self, id: Uuid) -> Result<Option<Application>, AppError> {
        let sql = format!("SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = $1");
        sqlx::query_as::<_, Application>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to get application"))
    }

    async fn list_applications_for_internship(
        &self,
        internship_id: Uuid,
    ) -> Result<Vec<Application>, AppError> {
        let sql = format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE internship_id = $1 ORDER BY created_utc"
        );
        sqlx::query_as::<_, Application>(&sql)
            .bind(internship_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list applications"))
    }

    #[instrument(skip(self))]
    async fn accept_application(&self, id: Uuid) -> Result<Application, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        let select =
            format!("SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = $1 FOR UPDATE");
        let application = sqlx::query_as::<_, Application>(&select)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error("Failed to lock application"))?
            .ok_or_else(|| not_found("Application", id))?;
        if application.status() != ApplicationStatus::Pending {
            return Err(conflict("Application has already been reviewed"));
        }

        let current: Option<Option<Uuid>> =
            sqlx::query_scalar("SELECT company_id FROM users WHERE id = $1 FOR UPDATE")
                .bind(application.intern_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_error("Failed to lock intern"))?;
        match current {
            None => return Err(not_found("User", application.intern_id)),
            Some(Some(company)) if company != application.company_id => {
                return Err(conflict("Intern is already enrolled with another company"));
            }
            Some(_) => {}
        }

        sqlx::query("UPDATE users SET company_id = $2 WHERE id = $1")
            .bind(application.intern_id)
            .bind(application.company_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to enrol intern"))?;

        let update = format!(
            "UPDATE applications SET status = $2, reviewed_utc = NOW() WHERE id = $1 RETURNING {APPLICATION_COLUMNS}"
        );
        let accepted = sqlx::query_as::<_, Application>(&update)
            .bind(id)
            .bind(ApplicationStatus::Accepted.as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error("Failed to accept application"))?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit transaction"))?;

        info!(application_id = %id, intern_id = %accepted.intern_id, "Application accepted");
        Ok(accepted)
    }

    #[instrument(skip(self))]
    async fn reject_application(&self, id: Uuid) -> Result<Application, AppError> {
        let sql = format!(
            "UPDATE applications SET status = $2, reviewed_utc = NOW() \
             WHERE id = $1 AND status = $3 RETURNING {APPLICATION_COLUMNS}"
        );
        let rejected = sqlx::query_as::<_, Application>(&sql)
            .bind(id)
            .bind(ApplicationStatus::Rejected.as_str())
            .bind(ApplicationStatus::Pending.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to reject application"))?;

        match rejected {
            Some(application) => Ok(application),
            None if self.get_application(id).await?.is_some() => {
                Err(conflict("Application has already been reviewed"))
            }
            None => Err(not_found("Application", id)),
        }
    }

    #[instrument(skip(self, input), fields(internship_id = %input.internship_id))]
    async fn create_task(&self, input: NewTask) -> Result<Task, AppError> {
        let sql = format!(
            "INSERT INTO tasks (id, internship_id, company_id, mentor_id, assignee_id, title, description, credits, status, due_utc) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {TASK_COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&sql)
            .bind(Uuid::new_v4())
            .bind(input.internship_id)
            .bind(input.company_id)
            .bind(input.mentor_id)
            .bind(input.assignee_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(input.credits)
            .bind(TaskStatus::Assigned.as_str())
            .bind(input.due_utc)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("Failed to create task"))
    }

    async fn get_task(&self, id: Uuid) -> Result<Option<Task>, AppError> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1");
        sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to get task"))
    }

    async fn list_tasks_for_assignee(&self, assignee_id: Uuid) -> Result<Vec<Task>, AppError> {
        let sql =
            format!("SELECT {TASK_COLUMNS} FROM tasks WHERE assignee_id = $1 ORDER BY created_utc");
        sqlx::query_as::<_, Task>(&sql)
            .bind(assignee_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list tasks"))
    }

    async fn list_tasks_for_mentor(&self, mentor_id: Uuid) -> Result<Vec<Task>, AppError> {
        let sql =
            format!("SELECT {TASK_COLUMNS} FROM tasks WHERE mentor_id = $1 ORDER BY created_utc");
        sqlx::query_as::<_, Task>(&sql)
            .bind(mentor_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list tasks"))
    }

    async fn list_tasks_for_company(&self, company_id: Uuid) -> Result<Vec<Task>, AppError> {
        let sql =
            format!("SELECT {TASK_COLUMNS} FROM tasks WHERE company_id = $1 ORDER BY created_utc");
        sqlx::query_as::<_, Task>(&sql)
            .bind(company_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list tasks"))
    }

    #[instrument(skip(self, update))]
    async fn update_task(&self, id: Uuid, update: TaskUpdate) -> Result<Task, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        let status: Option<String> =
            sqlx::query_scalar("SELECT status FROM tasks WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_error("Failed to lock task"))?;
        let status = status.ok_or_else(|| not_found("Task", id))?;
        if update.credits.is_some() && TaskStatus::from_string(&status) == TaskStatus::Completed {
            return Err(conflict("Credits of a completed task cannot change"));
        }

        let sql = format!(
            "UPDATE tasks SET \
                title = COALESCE($2, title), \
                description = COALESCE($3, description), \
                credits = COALESCE($4, credits), \
                due_utc = COALESCE($5, due_utc), \
                updated_utc = NOW() \
             WHERE id = $1 RETURNING {TASK_COLUMNS}"
        );
        let task = sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .bind(update.title)
            .bind(update.description)
            .bind(update.credits)
            .bind(update.due_utc)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error("Failed to update task"))?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit transaction"))?;
        Ok(task)
    }

    #[instrument(skip(self))]
    async fn delete_task(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to delete task"))?;
        if result.rows_affected() == 0 {
            return Err(not_found("Task", id));
        }
        Ok(())
    }

    #[instrument(skip(self, input), fields(task_id = %input.task_id))]
    async fn create_submission(&self, input: NewSubmission) -> Result<Submission, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        let select = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 FOR UPDATE");
        let task = sqlx::query_as::<_, Task>(&select)
            .bind(input.task_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error("Failed to lock task"))?
            .ok_or_else(|| not_found("Task", input.task_id))?;
        match task.status() {
            TaskStatus::Assigned => {}
            TaskStatus::Submitted => return Err(conflict("Task already has a pending submission")),
            TaskStatus::Completed => return Err(conflict("Task is already completed")),
        }

        sqlx::query("UPDATE tasks SET status = $2, updated_utc = NOW() WHERE id = $1")
            .bind(task.id)
            .bind(TaskStatus::Submitted.as_str())
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to update task status"))?;

        let insert = format!(
            "INSERT INTO submissions (id, task_id, company_id, mentor_id, intern_id, content, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {SUBMISSION_COLUMNS}"
        );
        let submission = sqlx::query_as::<_, Submission>(&insert)
            .bind(Uuid::new_v4())
            .bind(task.id)
            .bind(task.company_id)
            .bind(task.mentor_id)
            .bind(input.intern_id)
            .bind(&input.content)
            .bind(SubmissionStatus::Pending.as_str())
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error("Failed to create submission"))?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit transaction"))?;
        Ok(submission)
    }

    async fn get_submission(&self, id: Uuid) -> Result<Option<Submission>, AppError> {
        let sql = format!("SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE id = $1");
        sqlx::query_as::<_, Submission>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to get submission"))
    }

    async fn list_submissions_for_task(
        &self,
        task_id: Uuid,
    ) -> Result<Vec<Submission>, AppError> {
        let sql = format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE task_id = $1 ORDER BY created_utc"
        );
        sqlx::query_as::<_, Submission>(&sql)
            .bind(task_id)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list submissions"))
    }

    async fn list_pending_submissions_for_mentor(
        &self,
        mentor_id: Uuid,
    ) -> Result<Vec<Submission>, AppError> {
        let sql = format!(
            "SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE mentor_id = $1 AND status = $2 ORDER BY created_utc"
        );
        sqlx::query_as::<_, Submission>(&sql)
            .bind(mentor_id)
            .bind(SubmissionStatus::Pending.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to list submissions"))
    }

    #[instrument(skip(self, outcome), fields(approved = outcome.approved))]
    async fn record_review(
        &self,
        submission_id: Uuid,
        outcome: ReviewOutcome,
    ) -> Result<Submission, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        let select =
            format!("SELECT {SUBMISSION_COLUMNS} FROM submissions WHERE id = $1 FOR UPDATE");
        let submission = sqlx::query_as::<_, Submission>(&select)
            .bind(submission_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error("Failed to lock submission"))?
            .ok_or_else(|| not_found("Submission", submission_id))?;
        if submission.status() != SubmissionStatus::Pending {
            return Err(conflict("Submission has already been reviewed"));
        }

        let select = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 FOR UPDATE");
        let task = sqlx::query_as::<_, Task>(&select)
            .bind(submission.task_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_error("Failed to lock task"))?
            .ok_or_else(|| not_found("Task", submission.task_id))?;
        if task.status() == TaskStatus::Completed {
            return Err(conflict("Credits for this task were already awarded"));
        }

        let (task_status, submission_status) = if outcome.approved {
            sqlx::query("UPDATE users SET credits = credits + $2 WHERE id = $1")
                .bind(submission.intern_id)
                .bind(task.credits)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    if is_numeric_overflow(&e) {
                        conflict("Credit balance would overflow")
                    } else {
                        db_error("Failed to award credits")(e)
                    }
                })?;
            (TaskStatus::Completed, SubmissionStatus::Approved)
        } else {
            (TaskStatus::Assigned, SubmissionStatus::Rejected)
        };

        sqlx::query("UPDATE tasks SET status = $2, updated_utc = NOW() WHERE id = $1")
            .bind(task.id)
            .bind(task_status.as_str())
            .execute(&mut *tx)
            .await
            .map_err(db_error("Failed to update task status"))?;

        let update = format!(
            "UPDATE submissions SET status = $2, feedback = $3, reviewed_utc = NOW() \
             WHERE id = $1 RETURNING {SUBMISSION_COLUMNS}"
        );
        let reviewed = sqlx::query_as::<_, Submission>(&update)
            .bind(submission_id)
            .bind(submission_status.as_str())
            .bind(&outcome.feedback)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error("Failed to record review"))?;

        tx.commit()
            .await
            .map_err(db_error("Failed to commit transaction"))?;

        info!(
            submission_id = %submission_id,
            task_id = %task.id,
            status = submission_status.as_str(),
            "Submission reviewed"
        );
        Ok(reviewed)
    }

    async fn create_message(&self, input: NewMessage) -> Result<Message, AppError> {
        sqlx::query_as::<_, Message>(
            "INSERT INTO messages (id, sender_id, recipient_id, body) VALUES ($1, $2, $3, $4) \
             RETURNING id, sender_id, recipient_id, body, created_utc",
        )
        .bind(Uuid::new_v4())
        .bind(input.sender_id)
        .bind(input.recipient_id)
        .bind(&input.body)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to create message"))
    }

    async fn list_messages_for_user(&self, user_id: Uuid) -> Result<Vec<Message>, AppError> {
        sqlx::query_as::<_, Message>(
            "SELECT id, sender_id, recipient_id, body, created_utc FROM messages \
             WHERE sender_id = $1 OR recipient_id = $1 ORDER BY created_utc",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list messages"))
    }
}
