use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::policy::{ResourceDescriptor, ResourceKind};

/// A tenant.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    pub created_utc: DateTime<Utc>,
}

impl Company {
    pub fn descriptor(&self) -> ResourceDescriptor {
        ResourceDescriptor::new(ResourceKind::Company).in_company(Some(self.id))
    }
}
