//! Upstream event shapes.
//!
//! One JSON object per line, discriminated by its `event` field.

use serde::{Deserialize, Serialize};

use crate::storage::{GroupSnapshot, GroupUpsert, NewMessage};

/// Group identity carried by events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRef {
    pub id: String,
    pub name: String,
}

impl From<&GroupRef> for GroupUpsert {
    fn from(group: &GroupRef) -> Self {
        GroupUpsert::new(group.id.clone(), group.name.clone())
    }
}

/// Inbound message on a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEvent {
    pub group: GroupRef,
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default, rename = "type")]
    pub message_type: Option<String>,
    pub timestamp: i64,
    /// Free-form event context, stored as an opaque blob.
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl MessageEvent {
    /// Build the row to store, serializing `metadata` into the blob.
    pub fn to_new_message(&self) -> Result<NewMessage, serde_json::Error> {
        let metadata_blob = self
            .metadata
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        Ok(NewMessage {
            id: self.id.clone(),
            group_id: self.group.id.clone(),
            user_id: self.user_id.clone(),
            body: self.body.clone(),
            message_type: self.message_type.clone(),
            timestamp: self.timestamp,
            metadata_blob,
        })
    }
}

/// Fresh view of a group's metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMetadataEvent {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub users_count: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
}

impl GroupMetadataEvent {
    pub fn to_snapshot(&self) -> GroupSnapshot {
        GroupSnapshot {
            group_id: self.id.clone(),
            name: self.name.clone(),
            users_count: self.users_count,
            description: self.description.clone(),
        }
    }

    /// Group identity, when the event carries a non-empty name.
    pub fn to_upsert(&self) -> Option<GroupUpsert> {
        self.name
            .as_ref()
            .filter(|name| !name.is_empty())
            .map(|name| GroupUpsert::new(self.id.clone(), name.clone()))
    }
}

/// Event delivered by the messaging client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum IngestEvent {
    GroupSeen(GroupRef),
    Message(MessageEvent),
    GroupMetadata(GroupMetadataEvent),
}

impl IngestEvent {
    pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }

    /// Name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            IngestEvent::GroupSeen(_) => "group_seen",
            IngestEvent::Message(_) => "message",
            IngestEvent::GroupMetadata(_) => "group_metadata",
        }
    }
}
