use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::policy::{Principal, ResourceDescriptor, ResourceKind, Role};
use crate::utils::PasswordHashString;

/// User record. `role` holds the wire name of a [`Role`].
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub role: String,
    pub company_id: Option<Uuid>,
    pub is_active: bool,
    pub credits: i32,
    pub created_utc: DateTime<Utc>,
}

/// User without credentials, safe to return to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SanitizedUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub company_id: Option<Uuid>,
    pub is_active: bool,
    pub credits: i32,
    pub created_utc: DateTime<Utc>,
}

impl User {
    /// Unknown role strings fall back to the least privileged role.
    pub fn role(&self) -> Role {
        self.role.parse().unwrap_or(Role::Intern)
    }

    pub fn principal(&self) -> Principal {
        Principal {
            id: self.id,
            role: self.role(),
            company_id: self.company_id,
            is_active: self.is_active,
        }
    }

    pub fn descriptor(&self) -> ResourceDescriptor {
        ResourceDescriptor::new(ResourceKind::User)
            .owned_by(self.id)
            .in_company(self.company_id)
    }

    pub fn password_hash(&self) -> PasswordHashString {
        PasswordHashString::new(self.password_hash.clone())
    }

    pub fn sanitized(&self) -> SanitizedUser {
        SanitizedUser {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role(),
            company_id: self.company_id,
            is_active: self.is_active,
            credits: self.credits,
            created_utc: self.created_utc,
        }
    }
}

/// Input for creating a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: PasswordHashString,
    pub role: Role,
    pub company_id: Option<Uuid>,
    pub is_active: bool,
}
