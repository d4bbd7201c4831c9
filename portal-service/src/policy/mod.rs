//! Role-based access decisions.
//!
//! Two entry points share the same facts about the caller and the same rule
//! tables in [`table`]:
//!
//! * [`navigation::decide`] gates page routes (allow or redirect),
//! * [`endpoint::authorize`] guards API routes (allow or a typed error).
//!
//! Both are pure functions of their inputs. Nothing here touches the store or
//! caches a decision.

pub mod endpoint;
pub mod navigation;
pub mod table;

use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use std::{fmt, str::FromStr};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Intern,
    Mentor,
    Admin,
    CompanyAdmin,
    CompanyManager,
    HrManager,
    CompanyCoordinator,
}

impl Role {
    pub const ALL: [Role; 7] = [
        Role::Intern,
        Role::Mentor,
        Role::Admin,
        Role::CompanyAdmin,
        Role::CompanyManager,
        Role::HrManager,
        Role::CompanyCoordinator,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Intern => "INTERN",
            Role::Mentor => "MENTOR",
            Role::Admin => "ADMIN",
            Role::CompanyAdmin => "COMPANY_ADMIN",
            Role::CompanyManager => "COMPANY_MANAGER",
            Role::HrManager => "HR_MANAGER",
            Role::CompanyCoordinator => "COMPANY_COORDINATOR",
        }
    }

    /// Roles that only make sense with a company attached.
    pub fn requires_company(&self) -> bool {
        matches!(
            self,
            Role::Mentor
                | Role::CompanyAdmin
                | Role::CompanyManager
                | Role::HrManager
                | Role::CompanyCoordinator
        )
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| format!("unknown role '{}'", s))
    }
}

/// The authenticated actor making a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub id: Uuid,
    pub role: Role,
    pub company_id: Option<Uuid>,
    pub is_active: bool,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    User,
    Company,
    Internship,
    Application,
    Task,
    Submission,
    Message,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    View,
    Create,
    Update,
    Delete,
    Review,
}

/// How far a rule reaches once the role matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Any record of the kind.
    Any,
    /// Records of the caller's company.
    Tenant,
    /// Records the caller owns (mentor, creator, sender, self).
    Owner,
    /// Records assigned to the caller (intern, applicant, recipient).
    Assignee,
    /// Records of the caller's company that the caller also owns.
    TenantOwner,
    /// Records where the caller is either owner or assignee.
    Participant,
}

/// Ownership and tenancy facts about the target of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceDescriptor {
    pub kind: ResourceKind,
    pub owner_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
    pub company_id: Option<Uuid>,
}

impl ResourceDescriptor {
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            owner_id: None,
            assignee_id: None,
            company_id: None,
        }
    }

    pub fn owned_by(mut self, owner_id: Uuid) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    pub fn assigned_to(mut self, assignee_id: Uuid) -> Self {
        self.assignee_id = Some(assignee_id);
        self
    }

    pub fn in_company(mut self, company_id: Option<Uuid>) -> Self {
        self.company_id = company_id;
        self
    }
}

/// Why a request was turned away. Several reasons collapse onto the same
/// [`AccessError`] on the wire; the detail is kept for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    NoSession,
    Inactive,
    NoRule,
    TenantMismatch,
    /// Read of another company's record: its existence is not revealed.
    Concealed,
    NotOwner,
    NotAssignee,
    NotParticipant,
    MessagingNotAllowed,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DenyReason::NoSession => "no_session",
            DenyReason::Inactive => "inactive",
            DenyReason::NoRule => "no_rule",
            DenyReason::TenantMismatch => "tenant_mismatch",
            DenyReason::Concealed => "concealed",
            DenyReason::NotOwner => "not_owner",
            DenyReason::NotAssignee => "not_assignee",
            DenyReason::NotParticipant => "not_participant",
            DenyReason::MessagingNotAllowed => "messaging_not_allowed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
    Redirect(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("Authentication required")]
    Unauthenticated,
    #[error("You do not have access to this resource")]
    Forbidden,
    #[error("Resource not found")]
    NotFound,
}

impl From<DenyReason> for AccessError {
    fn from(reason: DenyReason) -> Self {
        match reason {
            DenyReason::NoSession | DenyReason::Inactive => AccessError::Unauthenticated,
            DenyReason::Concealed => AccessError::NotFound,
            DenyReason::NoRule
            | DenyReason::TenantMismatch
            | DenyReason::NotOwner
            | DenyReason::NotAssignee
            | DenyReason::NotParticipant
            | DenyReason::MessagingNotAllowed => AccessError::Forbidden,
        }
    }
}

impl From<AccessError> for AppError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::Unauthenticated => AppError::Unauthorized(anyhow::anyhow!(err)),
            AccessError::Forbidden => AppError::Forbidden(anyhow::anyhow!(err)),
            AccessError::NotFound => AppError::NotFound(anyhow::anyhow!(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_its_wire_name() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>(), Ok(role));
            assert_eq!(
                serde_json::to_value(role).unwrap(),
                serde_json::json!(role.as_str())
            );
        }
        assert!("SUPERUSER".parse::<Role>().is_err());
    }

    #[test]
    fn deny_reasons_map_onto_three_errors() {
        assert_eq!(
            AccessError::from(DenyReason::Inactive),
            AccessError::Unauthenticated
        );
        assert_eq!(
            AccessError::from(DenyReason::Concealed),
            AccessError::NotFound
        );
        assert_eq!(
            AccessError::from(DenyReason::TenantMismatch),
            AccessError::Forbidden
        );
    }

    #[test]
    fn access_errors_keep_their_status() {
        use axum::http::StatusCode;
        assert_eq!(
            AppError::from(AccessError::Unauthenticated).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::from(AccessError::Forbidden).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::from(AccessError::NotFound).status_code(),
            StatusCode::NOT_FOUND
        );
    }
}
