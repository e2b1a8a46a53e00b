use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A post row as stored in the `posts` table
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Attributes for a post that does not exist yet
#[derive(Debug, Clone, Deserialize)]
pub struct NewPost {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Full replacement of the writable attributes of an existing post.
///
/// Update is not a patch: a missing `description` clears the column.
#[derive(Debug, Clone, Deserialize)]
pub struct PostChanges {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Post {
    pub(crate) fn apply(&mut self, changes: PostChanges, now: DateTime<Utc>) {
        self.title = changes.title;
        self.description = changes.description;
        self.updated_at = now;
    }
}
