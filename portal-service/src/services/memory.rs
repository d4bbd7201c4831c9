use async_trait::async_trait;
use chrono::Utc;
use service_core::error::AppError;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::store::{not_found, Store};
use crate::models::{
    Application, ApplicationStatus, Company, Internship, InternshipStatus, InternshipUpdate,
    Message, NewApplication, NewInternship, NewMessage, NewSubmission, NewTask, NewUser,
    ReviewOutcome, Submission, SubmissionStatus, Task, TaskStatus, TaskUpdate, User,
};
use crate::policy::Role;

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    companies: Vec<Company>,
    internships: Vec<Internship>,
    applications: Vec<Application>,
    tasks: Vec<Task>,
    submissions: Vec<Submission>,
    messages: Vec<Message>,
}

/// In-process store. A single lock covers every table, so each method is
/// atomic the way a database transaction would be.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, AppError> {
        self.tables.lock().map_err(|e| {
            AppError::InternalError(anyhow::anyhow!("Memory store mutex poisoned: {}", e))
        })
    }
}

fn conflict(message: &str) -> AppError {
    AppError::Conflict(anyhow::anyhow!(message.to_string()))
}

#[async_trait]
impl Store for MemoryStore {
    async fn health_check(&self) -> Result<(), AppError> {
        self.lock().map(|_| ())
    }

    async fn create_user(&self, input: NewUser) -> Result<User, AppError> {
        let mut tables = self.lock()?;
        if tables
            .users
            .iter()
            .any(|u| u.email.eq_ignore_ascii_case(&input.email))
        {
            return Err(conflict("Email already registered"));
        }

        let user = User {
            id: Uuid::new_v4(),
            email: input.email,
            name: input.name,
            password_hash: input.password_hash.into_string(),
            role: input.role.as_str().to_string(),
            company_id: input.company_id,
            is_active: input.is_active,
            credits: 0,
            created_utc: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.lock()?.users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .lock()?
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        Ok(self.lock()?.users.clone())
    }

    async fn set_user_active(&self, id: Uuid, is_active: bool) -> Result<User, AppError> {
        let mut tables = self.lock()?;
        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| not_found("User", id))?;
        user.is_active = is_active;
        Ok(user.clone())
    }

    async fn set_user_role(
        &self,
        id: Uuid,
        role: Role,
        company_id: Option<Uuid>,
    ) -> Result<User, AppError> {
        let mut tables = self.lock()?;
        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| not_found("User", id))?;
        user.role = role.as_str().to_string();
        user.company_id = company_id;
        Ok(user.clone())
    }

    async fn create_company(&self, name: &str) -> Result<Company, AppError> {
        let company = Company {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_utc: Utc::now(),
        };
        self.lock()?.companies.push(company.clone());
        Ok(company)
    }

    async fn get_company(&self, id: Uuid) -> Result<Option<Company>, AppError> {
        Ok(self.lock()?.companies.iter().find(|c| c.id == id).cloned())
    }

    async fn create_internship(&self, input: NewInternship) -> Result<Internship, AppError> {
        let internship = Internship {
            id: Uuid::new_v4(),
            company_id: input.company_id,
            mentor_id: input.mentor_id,
            title: input.title,
            description: input.description,
            status: InternshipStatus::Open.as_str().to_string(),
            created_utc: Utc::now(),
        };
        self.lock()?.internships.push(internship.clone());
        Ok(internship)
    }

    async fn get_internship(&self, id: Uuid) -> Result<Option<Internship>, AppError> {
        Ok(self.lock()?.internships.iter().find(|i| i.id == id).cloned())
    }

    async fn list_internships_for_company(
        &self,
        company_id: Uuid,
    ) -> Result<Vec<Internship>, AppError> {
        Ok(self
            .lock()?
            .internships
            .iter()
            .filter(|i| i.company_id == company_id)
            .cloned()
            .collect())
    }

    async fn list_internships_for_mentor(
        &self,
        mentor_id: Uuid,
    ) -> Result<Vec<Internship>, AppError> {
        Ok(self
            .lock()?
            .internships
            .iter()
            .filter(|i| i.mentor_id == mentor_id)
            .cloned()
            .collect())
    }

    async fn list_open_internships(&self) -> Result<Vec<Internship>, AppError> {
        Ok(self
            .lock()?
            .internships
            .iter()
            .filter(|i| i.status() == InternshipStatus::Open)
            .cloned()
            .collect())
    }

    async fn update_internship(
        &self,
        id: Uuid,
        update: InternshipUpdate,
    ) -> Result<Internship, AppError> {
        let mut tables = self.lock()?;
        let internship = tables
            .internships
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| not_found("Internship", id))?;
        if let Some(title) = update.title {
            internship.title = title;
        }
        if let Some(description) = update.description {
            internship.description = description;
        }
        if let Some(status) = update.status {
            internship.status = status.as_str().to_string();
        }
        Ok(internship.clone())
    }

    async fn create_application(&self, input: NewApplication) -> Result<Application, AppError> {
        let mut tables = self.lock()?;
        if tables
            .applications
            .iter()
            .any(|a| a.internship_id == input.internship_id && a.intern_id == input.intern_id)
        {
            return Err(conflict("Already applied to this internship"));
        }

        let application = Application {
            id: Uuid::new_v4(),
            internship_id: input.internship_id,
            intern_id: input.intern_id,
            company_id: input.company_id,
            mentor_id: input.mentor_id,
            cover_letter: input.cover_letter,
            status: ApplicationStatus::Pending.as_str().to_string(),
            created_utc: Utc::now(),
            reviewed_utc: None,
        };
        tables.applications.push(application.clone());
        Ok(application)
    }

    async fn get_application(&self, id: Uuid) -> Result<Option<Application>, AppError> {
        Ok(self.lock()?.applications.iter().find(|a| a.id == id).cloned())
    }

    async fn list_applications_for_internship(
        &self,
        internship_id: Uuid,
    ) -> Result<Vec<Application>, AppError> {
        Ok(self
            .lock()?
            .applications
            .iter()
            .filter(|a| a.internship_id == internship_id)
            .cloned()
            .collect())
    }

    async fn accept_application(&self, id: Uuid) -> Result<Application, AppError> {
        let mut tables = self.lock()?;
        let Tables {
            users,
            applications,
            ..
        } = &mut *tables;

        let application = applications
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| not_found("Application", id))?;
        if application.status() != ApplicationStatus::Pending {
            return Err(conflict("Application has already been reviewed"));
        }

        let intern = users
            .iter_mut()
            .find(|u| u.id == application.intern_id)
            .ok_or_else(|| not_found("User", application.intern_id))?;
        if matches!(intern.company_id, Some(current) if current != application.company_id) {
            return Err(conflict("Intern is already enrolled with another company"));
        }

        intern.company_id = Some(application.company_id);
        application.status = ApplicationStatus::Accepted.as_str().to_string();
        application.reviewed_utc = Some(Utc::now());
        Ok(application.clone())
    }

    async fn reject_application(&self, id: Uuid) -> Result<Application, AppError> {
        let mut tables = self.lock()?;
        let application = tables
            .applications
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| not_found("Application", id))?;
        if application.status() != ApplicationStatus::Pending {
            return Err(conflict("Application has already been reviewed"));
        }
        application.status = ApplicationStatus::Rejected.as_str().to_string();
        application.reviewed_utc = Some(Utc::now());
        Ok(application.clone())
    }

    async fn create_task(&self, input: NewTask) -> Result<Task, AppError> {
        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            internship_id: input.internship_id,
            company_id: input.company_id,
            mentor_id: input.mentor_id,
            assignee_id: input.assignee_id,
            title: input.title,
            description: input.description,
            credits: input.credits,
            status: TaskStatus::Assigned.as_str().to_string(),
            due_utc: input.due_utc,
            created_utc: now,
            updated_utc: now,
        };
        self.lock()?.tasks.push(task.clone());
        Ok(task)
    }

    async fn get_task(&self, id: Uuid) -> Result<Option<Task>, AppError> {
        Ok(self.lock()?.tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn list_tasks_for_assignee(&self, assignee_id: Uuid) -> Result<Vec<Task>, AppError> {
        Ok(self
            .lock()?
            .tasks
            .iter()
            .filter(|t| t.assignee_id == assignee_id)
            .cloned()
            .collect())
    }

    async fn list_tasks_for_company(&self, company_id: Uuid) -> Result<Vec<Task>, AppError> {
        Ok(self
            .lock()?
            .tasks
            .iter()
            .filter(|t| t.company_id == company_id)
            .cloned()
            .collect())
    }

    async fn list_tasks_for_mentor(&self, mentor_id: Uuid) -> Result<Vec<Task>, AppError> {
        Ok(self
            .lock()?
            .tasks
            .iter()
            .filter(|t| t.mentor_id == mentor_id)
            .cloned()
            .collect())
    }

    async fn update_task(&self, id: Uuid, update: TaskUpdate) -> Result<Task, AppError> {
        let mut tables = self.lock()?;
        let task = tables
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| not_found("Task", id))?;
        if let Some(title) = update.title {
            task.title = title;
        }
        if let Some(description) = update.description {
            task.description = description;
        }
        if let Some(credits) = update.credits {
            if task.status() == TaskStatus::Completed {
                return Err(conflict("Credits of a completed task cannot change"));
            }
            task.credits = credits;
        }
        if let Some(due) = update.due_utc {
            task.due_utc = Some(due);
        }
        task.updated_utc = Utc::now();
        Ok(task.clone())
    }

    async fn delete_task(&self, id: Uuid) -> Result<(), AppError> {
        let mut tables = self.lock()?;
        let before = tables.tasks.len();
        tables.tasks.retain(|t| t.id != id);
        if tables.tasks.len() == before {
            return Err(not_found("Task", id));
        }
        tables.submissions.retain(|s| s.task_id != id);
        Ok(())
    }

    async fn create_submission(&self, input: NewSubmission) -> Result<Submission, AppError> {
        let mut tables = self.lock()?;
        let task = tables
            .tasks
            .iter_mut()
            .find(|t| t.id == input.task_id)
            .ok_or_else(|| not_found("Task", input.task_id))?;
        match task.status() {
            TaskStatus::Assigned => {}
            TaskStatus::Submitted => return Err(conflict("Task already has a pending submission")),
            TaskStatus::Completed => return Err(conflict("Task is already completed")),
        }

        let now = Utc::now();
        task.status = TaskStatus::Submitted.as_str().to_string();
        task.updated_utc = now;

        let submission = Submission {
            id: Uuid::new_v4(),
            task_id: task.id,
            company_id: task.company_id,
            mentor_id: task.mentor_id,
            intern_id: input.intern_id,
            content: input.content,
            status: SubmissionStatus::Pending.as_str().to_string(),
            feedback: None,
            created_utc: now,
            reviewed_utc: None,
        };
        tables.submissions.push(submission.clone());
        Ok(submission)
    }

    async fn get_submission(&self, id: Uuid) -> Result<Option<Submission>, AppError> {
        Ok(self.lock()?.submissions.iter().find(|s| s.id == id).cloned())
    }

    async fn list_submissions_for_task(
        &self,
        task_id: Uuid,
    ) -> Result<Vec<Submission>, AppError> {
        Ok(self
            .lock()?
            .submissions
            .iter()
            .filter(|s| s.task_id == task_id)
            .cloned()
            .collect())
    }

    async fn list_pending_submissions_for_mentor(
        &self,
        mentor_id: Uuid,
    ) -> Result<Vec<Submission>, AppError> {
        Ok(self
            .lock()?
            .submissions
            .iter()
            .filter(|s| s.mentor_id == mentor_id && s.status() == SubmissionStatus::Pending)
            .cloned()
            .collect())
    }

    async fn record_review(
        &self,
        submission_id: Uuid,
        outcome: ReviewOutcome,
    ) -> Result<Submission, AppError> {
        let mut tables = self.lock()?;
        let Tables {
            users,
            tasks,
            submissions,
            ..
        } = &mut *tables;

        let submission = submissions
            .iter_mut()
            .find(|s| s.id == submission_id)
            .ok_or_else(|| not_found("Submission", submission_id))?;
        if submission.status() != SubmissionStatus::Pending {
            return Err(conflict("Submission has already been reviewed"));
        }

        let task = tasks
            .iter_mut()
            .find(|t| t.id == submission.task_id)
            .ok_or_else(|| not_found("Task", submission.task_id))?;
        if task.status() == TaskStatus::Completed {
            return Err(conflict("Credits for this task were already awarded"));
        }

        let now = Utc::now();
        if outcome.approved {
            let intern = users
                .iter_mut()
                .find(|u| u.id == submission.intern_id)
                .ok_or_else(|| not_found("User", submission.intern_id))?;
            intern.credits = intern
                .credits
                .checked_add(task.credits)
                .ok_or_else(|| conflict("Credit balance would overflow"))?;
            task.status = TaskStatus::Completed.as_str().to_string();
            submission.status = SubmissionStatus::Approved.as_str().to_string();
        } else {
            task.status = TaskStatus::Assigned.as_str().to_string();
            submission.status = SubmissionStatus::Rejected.as_str().to_string();
        }
        task.updated_utc = now;
        submission.feedback = outcome.feedback;
        submission.reviewed_utc = Some(now);
        Ok(submission.clone())
    }

    async fn create_message(&self, input: NewMessage) -> Result<Message, AppError> {
        let message = Message {
            id: Uuid::new_v4(),
            sender_id: input.sender_id,
            recipient_id: input.recipient_id,
            body: input.body,
            created_utc: Utc::now(),
        };
        self.lock()?.messages.push(message.clone());
        Ok(message)
    }

    async fn list_messages_for_user(&self, user_id: Uuid) -> Result<Vec<Message>, AppError> {
        Ok(self
            .lock()?
            .messages
            .iter()
            .filter(|m| m.sender_id == user_id || m.recipient_id == user_id)
            .cloned()
            .collect())
    }
}
