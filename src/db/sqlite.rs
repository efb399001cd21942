use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use super::model::*;
use super::repo::*;

type RepoRow = (
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    bool,
    String,
    Option<String>,
    Option<String>,
    String,
);

const REPO_COLUMNS: &str =
    "id, name, owner, description, url, private, defaultbranch, subdirectory, lastsynced, created";

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub async fn new(db_path: &str) -> DbResult<Self> {
        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let repo = Self { pool };

        repo.init_schema().await?;

        info!("Database initialized at {}", db_path);

        Ok(repo)
    }

    async fn init_schema(&self) -> DbResult<()> {
        let schema = include_str!("schema.sql");
        for statement in schema.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }
}

fn parse_timestamp(s: Option<String>) -> Option<DateTime<Utc>> {
    s.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    })
}

fn repo_from_row(r: RepoRow) -> TrackedRepo {
    TrackedRepo {
        id: r.0,
        name: r.1,
        owner: r.2,
        description: r.3,
        url: r.4,
        is_private: r.5,
        default_branch: r.6,
        subdirectory: r.7,
        last_synced_at: parse_timestamp(r.8),
        created_at: parse_timestamp(Some(r.9)).unwrap_or_else(Utc::now),
    }
}

fn map_write_error(e: sqlx::Error, repo: &TrackedRepo) -> DbError {
    match e {
        sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
            DbError::AlreadyExists(format!("Repository already exists: {}", repo.slug()))
        }
        _ => DbError::Sqlx(e),
    }
}

#[async_trait]
impl RepositoryStore for SqliteRepository {
    async fn list_repositories(&self) -> DbResult<Vec<TrackedRepo>> {
        let query = format!(
            "SELECT {} FROM repositories ORDER BY owner COLLATE NOCASE, name COLLATE NOCASE",
            REPO_COLUMNS
        );
        let results = sqlx::query_as::<_, RepoRow>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(results.into_iter().map(repo_from_row).collect())
    }

    async fn get_repository(&self, id: &str) -> DbResult<TrackedRepo> {
        let query = format!("SELECT {} FROM repositories WHERE id = ?", REPO_COLUMNS);
        sqlx::query_as::<_, RepoRow>(&query)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map(repo_from_row)
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => DbError::NotFound(format!("Repository not found: {}", id)),
                _ => DbError::Sqlx(e),
            })
    }

    async fn get_repository_by_slug(&self, owner: &str, name: &str) -> DbResult<TrackedRepo> {
        let query = format!(
            "SELECT {} FROM repositories WHERE owner = ? AND name = ?",
            REPO_COLUMNS
        );
        sqlx::query_as::<_, RepoRow>(&query)
            .bind(owner)
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map(repo_from_row)
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => {
                    DbError::NotFound(format!("Repository not found: {}/{}", owner, name))
                }
                _ => DbError::Sqlx(e),
            })
    }

    async fn create_repository(&self, repo: &TrackedRepo) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO repositories
            (id, name, owner, description, url, private, defaultbranch, subdirectory, lastsynced, created)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&repo.id)
        .bind(&repo.name)
        .bind(&repo.owner)
        .bind(&repo.description)
        .bind(&repo.url)
        .bind(repo.is_private)
        .bind(&repo.default_branch)
        .bind(&repo.subdirectory)
        .bind(repo.last_synced_at.as_ref().map(|dt| dt.to_rfc3339()))
        .bind(repo.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, repo))?;
        Ok(())
    }

    async fn update_repository(&self, repo: &TrackedRepo) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE repositories SET
            name = ?, owner = ?, description = ?, url = ?, private = ?,
            defaultbranch = ?, subdirectory = ?, lastsynced = ?
            WHERE id = ?",
        )
        .bind(&repo.name)
        .bind(&repo.owner)
        .bind(&repo.description)
        .bind(&repo.url)
        .bind(repo.is_private)
        .bind(&repo.default_branch)
        .bind(&repo.subdirectory)
        .bind(repo.last_synced_at.as_ref().map(|dt| dt.to_rfc3339()))
        .bind(&repo.id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, repo))?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("Repository not found: {}", repo.id)));
        }
        Ok(())
    }

    async fn delete_repository(&self, id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM repository_files WHERE repositoryid = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM repositories WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("Repository not found: {}", id)));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn mark_synced(&self, id: &str, at: DateTime<Utc>) -> DbResult<()> {
        let result = sqlx::query("UPDATE repositories SET lastsynced = ? WHERE id = ?")
            .bind(at.to_rfc3339())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound(format!("Repository not found: {}", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl RepositoryFileStore for SqliteRepository {
    async fn replace_repository_files(&self, repository_id: &str, files: &[RepositoryFile]) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM repository_files WHERE repositoryid = ?")
            .bind(repository_id)
            .execute(&mut *tx)
            .await?;

        for file in files {
            sqlx::query("INSERT INTO repository_files (repositoryid, path, sha, size) VALUES (?, ?, ?, ?)")
                .bind(repository_id)
                .bind(&file.path)
                .bind(&file.sha)
                .bind(file.size)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        debug!("Stored {} files for repository {}", files.len(), repository_id);
        Ok(())
    }

    async fn list_repository_files(&self, repository_id: &str) -> DbResult<Vec<RepositoryFile>> {
        let results = sqlx::query_as::<_, (String, String, String, Option<i64>)>(
            "SELECT repositoryid, path, sha, size FROM repository_files
             WHERE repositoryid = ? ORDER BY path",
        )
        .bind(repository_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(results
            .into_iter()
            .map(|r| RepositoryFile {
                repository_id: r.0,
                path: r.1,
                sha: r.2,
                size: r.3,
            })
            .collect())
    }
}

#[async_trait]
impl DraftStore for SqliteRepository {
    async fn load_draft(&self, form: &str) -> DbResult<Draft> {
        let results = sqlx::query_as::<_, (String, String)>(
            "SELECT field, value FROM drafts WHERE form = ?",
        )
        .bind(form)
        .fetch_all(&self.pool)
        .await?;

        let mut draft = Draft::new();
        for (field, value) in results {
            let value: DraftValue = serde_json::from_str(&value)
                .map_err(|e| DbError::Draft(format!("{}.{}", form, field), e))?;
            draft.insert(field, value);
        }
        Ok(draft)
    }

    async fn save_draft_field(&self, form: &str, field: &str, value: &DraftValue) -> DbResult<()> {
        let encoded = serde_json::to_string(value)
            .map_err(|e| DbError::Draft(format!("{}.{}", form, field), e))?;

        sqlx::query("INSERT OR REPLACE INTO drafts (form, field, value, updated) VALUES (?, ?, ?, ?)")
            .bind(form)
            .bind(field)
            .bind(encoded)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn clear_draft(&self, form: &str) -> DbResult<()> {
        sqlx::query("DELETE FROM drafts WHERE form = ?")
            .bind(form)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl Store for SqliteRepository {
    async fn close(&self) {
        self.pool.close().await;
        debug!("Database closed");
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::TempDir;

    pub(crate) async fn open_temp() -> (TempDir, SqliteRepository) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.db");
        let db = SqliteRepository::new(path.to_str().unwrap()).await.unwrap();
        (dir, db)
    }

    pub(crate) fn sample_repo(owner: &str, name: &str) -> TrackedRepo {
        TrackedRepo {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            owner: owner.to_string(),
            description: Some("A test repository".to_string()),
            url: Some(format!("https://github.com/{}/{}", owner, name)),
            is_private: false,
            default_branch: "main".to_string(),
            subdirectory: None,
            last_synced_at: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (_dir, db) = open_temp().await;
        let repo = sample_repo("rust-lang", "cargo");
        db.create_repository(&repo).await.unwrap();

        let fetched = db.get_repository(&repo.id).await.unwrap();
        assert_eq!(fetched.name, "cargo");
        assert_eq!(fetched.owner, "rust-lang");
        assert_eq!(fetched.description, repo.description);
        assert!(!fetched.is_private);

        let by_slug = db.get_repository_by_slug("rust-lang", "cargo").await.unwrap();
        assert_eq!(by_slug.id, repo.id);
    }

    #[tokio::test]
    async fn test_duplicate_slug_rejected() {
        let (_dir, db) = open_temp().await;
        db.create_repository(&sample_repo("tokio-rs", "tokio")).await.unwrap();

        let err = db
            .create_repository(&sample_repo("tokio-rs", "tokio"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_list_is_ordered() {
        let (_dir, db) = open_temp().await;
        db.create_repository(&sample_repo("zed", "a")).await.unwrap();
        db.create_repository(&sample_repo("alpha", "b")).await.unwrap();
        db.create_repository(&sample_repo("alpha", "a")).await.unwrap();

        let slugs: Vec<String> = db
            .list_repositories()
            .await
            .unwrap()
            .iter()
            .map(|r| r.slug())
            .collect();
        assert_eq!(slugs, vec!["alpha/a", "alpha/b", "zed/a"]);
    }

    #[tokio::test]
    async fn test_update_and_missing() {
        let (_dir, db) = open_temp().await;
        let mut repo = sample_repo("serde-rs", "serde");
        db.create_repository(&repo).await.unwrap();

        repo.default_branch = "master".to_string();
        repo.is_private = true;
        db.update_repository(&repo).await.unwrap();
        let fetched = db.get_repository(&repo.id).await.unwrap();
        assert_eq!(fetched.default_branch, "master");
        assert!(fetched.is_private);

        let ghost = sample_repo("nobody", "nothing");
        assert!(matches!(
            db.update_repository(&ghost).await.unwrap_err(),
            DbError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_delete_removes_files() {
        let (_dir, db) = open_temp().await;
        let repo = sample_repo("clap-rs", "clap");
        db.create_repository(&repo).await.unwrap();
        db.replace_repository_files(
            &repo.id,
            &[RepositoryFile {
                repository_id: repo.id.clone(),
                path: "README.md".to_string(),
                sha: "abc".to_string(),
                size: Some(10),
            }],
        )
        .await
        .unwrap();

        db.delete_repository(&repo.id).await.unwrap();
        assert!(matches!(
            db.get_repository(&repo.id).await.unwrap_err(),
            DbError::NotFound(_)
        ));
        assert!(db.list_repository_files(&repo.id).await.unwrap().is_empty());
        assert!(matches!(
            db.delete_repository(&repo.id).await.unwrap_err(),
            DbError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_replace_files_and_mark_synced() {
        let (_dir, db) = open_temp().await;
        let repo = sample_repo("rust-lang", "regex");
        db.create_repository(&repo).await.unwrap();

        let file = |path: &str| RepositoryFile {
            repository_id: repo.id.clone(),
            path: path.to_string(),
            sha: format!("sha-{}", path),
            size: None,
        };
        db.replace_repository_files(&repo.id, &[file("b.rs"), file("a.rs")])
            .await
            .unwrap();
        db.replace_repository_files(&repo.id, &[file("c.rs"), file("a.rs")])
            .await
            .unwrap();

        let paths: Vec<String> = db
            .list_repository_files(&repo.id)
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.path)
            .collect();
        assert_eq!(paths, vec!["a.rs", "c.rs"]);

        let now = Utc::now();
        db.mark_synced(&repo.id, now).await.unwrap();
        let fetched = db.get_repository(&repo.id).await.unwrap();
        assert_eq!(
            fetched.last_synced_at.map(|t| t.timestamp()),
            Some(now.timestamp())
        );
    }

    #[tokio::test]
    async fn test_drafts() {
        let (_dir, db) = open_temp().await;
        db.save_draft_field("add", "name", &DraftValue::Text("tokio".to_string()))
            .await
            .unwrap();
        db.save_draft_field("add", "is_private", &DraftValue::Flag(true))
            .await
            .unwrap();
        db.save_draft_field("add", "name", &DraftValue::Text("axum".to_string()))
            .await
            .unwrap();
        db.save_draft_field("edit:x", "name", &DraftValue::Text("other".to_string()))
            .await
            .unwrap();

        let draft = db.load_draft("add").await.unwrap();
        assert_eq!(draft.len(), 2);
        assert_eq!(draft["name"], DraftValue::Text("axum".to_string()));
        assert_eq!(draft["is_private"], DraftValue::Flag(true));

        db.clear_draft("add").await.unwrap();
        assert!(db.load_draft("add").await.unwrap().is_empty());
        assert_eq!(db.load_draft("edit:x").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_close_shuts_the_pool() {
        let (_dir, db) = open_temp().await;
        db.create_repository(&sample_repo("tokio-rs", "mio")).await.unwrap();

        db.close().await;
        assert!(db.pool.is_closed());
        assert!(db.list_repositories().await.is_err());
    }
}
