use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Post entity - a single portfolio post.
///
/// Posts are created through the `post.create` procedure and are never
/// updated or deleted through any exposed operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub name: String,
    /// Owning user. Many posts belong to one user.
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Create a new post owned by `created_by`.
    ///
    /// The caller is responsible for rejecting empty names at the request
    /// boundary; this constructor does not re-validate.
    pub fn new(name: String, created_by: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }
}
