use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedRepo {
    pub id: String,
    pub name: String,
    pub owner: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub is_private: bool,
    pub default_branch: String,
    pub subdirectory: Option<String>,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl TrackedRepo {
    /// `owner/name`, the human-facing key of a record.
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryFile {
    pub repository_id: String,
    pub path: String,
    pub sha: String,
    pub size: Option<i64>,
}

/// A single saved form field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DraftValue {
    Flag(bool),
    Text(String),
}

impl DraftValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            DraftValue::Text(s) => Some(s),
            DraftValue::Flag(_) => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            DraftValue::Flag(b) => Some(*b),
            DraftValue::Text(_) => None,
        }
    }
}

pub type Draft = BTreeMap<String, DraftValue>;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Already exists: {0}")]
    AlreadyExists(String),
    #[error("Corrupt draft value for {0}: {1}")]
    Draft(String, serde_json::Error),
}

pub type DbResult<T> = Result<T, DbError>;
