//! Fetching the file list of a tracked repository.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::db::{RepositoryFile, TrackedRepo};

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{0} returned status {1}")]
    Status(String, u16),
}

#[async_trait]
pub trait SyncBackend: Send + Sync {
    async fn fetch_files(&self, repo: &TrackedRepo) -> Result<Vec<RepositoryFile>, SyncError>;
}

#[derive(Debug, Deserialize)]
struct TreeResponse {
    #[serde(default)]
    tree: Vec<TreeEntry>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct TreeEntry {
    path: String,
    #[serde(rename = "type")]
    entry_type: String,
    sha: String,
    #[serde(default)]
    size: Option<i64>,
}

/// Reads repository trees through the GitHub REST API.
pub struct GitHubBackend {
    client: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

impl GitHubBackend {
    pub fn new(api_url: &str, token: Option<String>) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("toolshed/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn tree_url(&self, repo: &TrackedRepo) -> String {
        format!(
            "{}/repos/{}/{}/git/trees/{}?recursive=1",
            self.api_url,
            urlencoding::encode(&repo.owner),
            urlencoding::encode(&repo.name),
            urlencoding::encode(&repo.default_branch),
        )
    }
}

#[async_trait]
impl SyncBackend for GitHubBackend {
    async fn fetch_files(&self, repo: &TrackedRepo) -> Result<Vec<RepositoryFile>, SyncError> {
        let url = self.tree_url(repo);
        debug!("Fetching tree {}", url);

        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        } else if repo.is_private {
            warn!("Repository {} is private but no token is configured", repo.slug());
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Status(repo.slug(), status.as_u16()));
        }

        let tree: TreeResponse = response.json().await?;
        if tree.truncated {
            warn!("Tree for {} was truncated by the server, file list is incomplete", repo.slug());
        }

        Ok(filter_tree(repo, tree.tree))
    }
}

/// Keeps blobs under the repository's subdirectory, with paths relative to it.
fn filter_tree(repo: &TrackedRepo, entries: Vec<TreeEntry>) -> Vec<RepositoryFile> {
    let prefix = repo
        .subdirectory
        .as_deref()
        .map(|s| format!("{}/", s.trim_matches('/')));

    entries
        .into_iter()
        .filter(|e| e.entry_type == "blob")
        .filter_map(|e| {
            let path = match &prefix {
                Some(prefix) => e.path.strip_prefix(prefix.as_str())?.to_string(),
                None => e.path,
            };
            Some(RepositoryFile {
                repository_id: repo.id.clone(),
                path,
                sha: e.sha,
                size: e.size,
            })
        })
        .collect()
}
