use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::policy::{ResourceDescriptor, ResourceKind};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Message {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub body: String,
    pub created_utc: DateTime<Utc>,
}

impl Message {
    pub fn descriptor(&self) -> ResourceDescriptor {
        ResourceDescriptor::new(ResourceKind::Message)
            .owned_by(self.sender_id)
            .assigned_to(self.recipient_id)
    }
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub sender_id: Uuid,
    pub recipient_id: Uuid,
    pub body: String,
}
