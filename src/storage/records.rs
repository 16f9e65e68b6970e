//! Row types written to and read from the store.
//!
//! Input types (`GroupUpsert`, `NewMessage`, `GroupSnapshot`) carry what the
//! ingestion layer knows about an event; record types mirror stored rows.

/// Treat empty optional text as absent.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Group identity as seen on an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupUpsert {
    pub id: String,
    pub name: String,
}

impl GroupUpsert {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Inbound message to be stored once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewMessage {
    pub id: String,
    pub group_id: String,
    pub user_id: Option<String>,
    pub body: Option<String>,
    pub message_type: Option<String>,
    pub timestamp: i64,
    /// Opaque serialized event context.
    pub metadata_blob: Option<String>,
}

impl NewMessage {
    pub fn new(id: impl Into<String>, group_id: impl Into<String>, timestamp: i64) -> Self {
        Self {
            id: id.into(),
            group_id: group_id.into(),
            timestamp,
            ..Default::default()
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_type(mut self, message_type: impl Into<String>) -> Self {
        self.message_type = Some(message_type.into());
        self
    }

    pub fn with_metadata(mut self, blob: impl Into<String>) -> Self {
        self.metadata_blob = Some(blob.into());
        self
    }

    /// Empty optional strings are stored as NULL.
    pub fn normalized(mut self) -> Self {
        self.user_id = non_empty(self.user_id);
        self.body = non_empty(self.body);
        self.message_type = non_empty(self.message_type);
        self.metadata_blob = non_empty(self.metadata_blob);
        self
    }
}

/// Point-in-time capture of a group's mutable attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupSnapshot {
    pub group_id: String,
    pub name: Option<String>,
    pub users_count: Option<i64>,
    pub description: Option<String>,
}

impl GroupSnapshot {
    pub fn new(group_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_users_count(mut self, users_count: i64) -> Self {
        self.users_count = Some(users_count);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Empty name or description count as absent.
    pub fn normalized(mut self) -> Self {
        self.name = non_empty(self.name);
        self.description = non_empty(self.description);
        self
    }
}

/// Stored `groups` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRecord {
    pub id: String,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
}

/// Stored `messages` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRecord {
    pub id: String,
    pub group_id: String,
    pub user_id: Option<String>,
    pub body: Option<String>,
    pub message_type: Option<String>,
    /// Nullable for rows written by older deployments.
    pub timestamp: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
    pub metadata_blob: Option<String>,
}

/// Stored `history` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRecord {
    pub id: i64,
    pub group_id: String,
    pub name: Option<String>,
    pub users_count: Option<i64>,
    pub description: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub deleted_at: Option<String>,
}

impl SnapshotRecord {
    /// Whether this row carries the same tracked attributes as `snapshot`.
    pub fn matches(&self, snapshot: &GroupSnapshot) -> bool {
        self.name == snapshot.name
            && self.users_count == snapshot.users_count
            && self.description == snapshot.description
    }
}
