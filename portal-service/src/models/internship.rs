use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::policy::{ResourceDescriptor, ResourceKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InternshipStatus {
    Open,
    Closed,
}

impl InternshipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InternshipStatus::Open => "OPEN",
            InternshipStatus::Closed => "CLOSED",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "OPEN" => InternshipStatus::Open,
            _ => InternshipStatus::Closed,
        }
    }
}

/// An internship posted by a company. `mentor_id` is its owner.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Internship {
    pub id: Uuid,
    pub company_id: Uuid,
    pub mentor_id: Uuid,
    pub title: String,
    pub description: String,
    pub status: String,
    pub created_utc: DateTime<Utc>,
}

impl Internship {
    pub fn status(&self) -> InternshipStatus {
        InternshipStatus::from_string(&self.status)
    }

    pub fn descriptor(&self) -> ResourceDescriptor {
        ResourceDescriptor::new(ResourceKind::Internship)
            .owned_by(self.mentor_id)
            .in_company(Some(self.company_id))
    }

    /// Descriptor for an application against this internship before it exists.
    pub fn application_descriptor(&self) -> ResourceDescriptor {
        ResourceDescriptor::new(ResourceKind::Application)
            .owned_by(self.mentor_id)
            .in_company(Some(self.company_id))
    }

    /// Descriptor for a task under this internship before it exists.
    pub fn task_descriptor(&self) -> ResourceDescriptor {
        ResourceDescriptor::new(ResourceKind::Task)
            .owned_by(self.mentor_id)
            .in_company(Some(self.company_id))
    }
}

#[derive(Debug, Clone)]
pub struct NewInternship {
    pub company_id: Uuid,
    pub mentor_id: Uuid,
    pub title: String,
    pub description: String,
}

/// Partial update. The mentor is fixed at creation since applications and
/// tasks carry a copy of it.
#[derive(Debug, Clone, Default)]
pub struct InternshipUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<InternshipStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "PENDING",
            ApplicationStatus::Accepted => "ACCEPTED",
            ApplicationStatus::Rejected => "REJECTED",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "ACCEPTED" => ApplicationStatus::Accepted,
            "REJECTED" => ApplicationStatus::Rejected,
            _ => ApplicationStatus::Pending,
        }
    }
}

/// An intern's application. Company and mentor are copied from the
/// internship so the guard needs a single lookup.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Application {
    pub id: Uuid,
    pub internship_id: Uuid,
    pub intern_id: Uuid,
    pub company_id: Uuid,
    pub mentor_id: Uuid,
    pub cover_letter: Option<String>,
    pub status: String,
    pub created_utc: DateTime<Utc>,
    pub reviewed_utc: Option<DateTime<Utc>>,
}

impl Application {
    pub fn status(&self) -> ApplicationStatus {
        ApplicationStatus::from_string(&self.status)
    }

    pub fn descriptor(&self) -> ResourceDescriptor {
        ResourceDescriptor::new(ResourceKind::Application)
            .owned_by(self.mentor_id)
            .assigned_to(self.intern_id)
            .in_company(Some(self.company_id))
    }
}

#[derive(Debug, Clone)]
pub struct NewApplication {
    pub internship_id: Uuid,
    pub intern_id: Uuid,
    pub company_id: Uuid,
    pub mentor_id: Uuid,
    pub cover_letter: Option<String>,
}
