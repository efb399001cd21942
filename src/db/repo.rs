use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::model::*;

#[async_trait]
pub trait RepositoryStore: Send + Sync {
    async fn list_repositories(&self) -> DbResult<Vec<TrackedRepo>>;
    async fn get_repository(&self, id: &str) -> DbResult<TrackedRepo>;
    async fn get_repository_by_slug(&self, owner: &str, name: &str) -> DbResult<TrackedRepo>;
    async fn create_repository(&self, repo: &TrackedRepo) -> DbResult<()>;
    async fn update_repository(&self, repo: &TrackedRepo) -> DbResult<()>;
    async fn delete_repository(&self, id: &str) -> DbResult<()>;
    async fn mark_synced(&self, id: &str, at: DateTime<Utc>) -> DbResult<()>;
}

#[async_trait]
pub trait RepositoryFileStore: Send + Sync {
    async fn replace_repository_files(&self, repository_id: &str, files: &[RepositoryFile]) -> DbResult<()>;
    async fn list_repository_files(&self, repository_id: &str) -> DbResult<Vec<RepositoryFile>>;
}

#[async_trait]
pub trait DraftStore: Send + Sync {
    async fn load_draft(&self, form: &str) -> DbResult<Draft>;
    async fn save_draft_field(&self, form: &str, field: &str, value: &DraftValue) -> DbResult<()>;
    async fn clear_draft(&self, form: &str) -> DbResult<()>;
}

#[async_trait]
pub trait Store: RepositoryStore + RepositoryFileStore + DraftStore + Send + Sync {
    /// Waits for open connections to finish and closes the pool.
    async fn close(&self);
}
