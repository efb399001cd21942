use chrono::Utc;
use std::io;
use tracing::{debug, info};

use super::form::*;
use super::prompt::Prompt;
use super::sync::{SyncBackend, SyncError};
use crate::db::{DbError, DraftValue, Store, TrackedRepo};

pub const ADD_DRAFT: &str = "add";

const FORM_FIELDS: &[(&str, &str)] = &[
    (FIELD_OWNER, "Owner"),
    (FIELD_NAME, "Name"),
    (FIELD_DESCRIPTION, "Description"),
    (FIELD_URL, "URL"),
    (FIELD_PRIVATE, "Private repository"),
    (FIELD_BRANCH, "Default branch"),
    (FIELD_SUBDIRECTORY, "Subdirectory"),
];

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("{0}")]
    Db(#[from] DbError),
    #[error("Invalid repository: {0}")]
    Invalid(FormErrors),
    #[error("Input error: {0}")]
    Prompt(#[from] io::Error),
    #[error("Sync failed: {0}")]
    Sync(#[from] SyncError),
    #[error("Repository not found: {0}")]
    NotFound(String),
}

#[derive(Debug)]
pub enum DeleteOutcome {
    Deleted(TrackedRepo),
    Cancelled,
}

#[derive(Debug)]
pub struct SyncSummary {
    pub repo: TrackedRepo,
    pub files: usize,
}

pub fn edit_draft_key(id: &str) -> String {
    format!("edit:{}", id)
}

/// Looks a record up by id, or by `owner/name`.
pub async fn find_repository(store: &dyn Store, key: &str) -> Result<TrackedRepo, RepoError> {
    let result = match key.split_once('/') {
        Some((owner, name)) => store.get_repository_by_slug(owner, name).await,
        None => store.get_repository(key).await,
    };
    result.map_err(|e| match e {
        DbError::NotFound(_) => RepoError::NotFound(key.to_string()),
        e => RepoError::Db(e),
    })
}

/// Prompts for every field the patch left open, saving each answer to the draft.
async fn fill_form(
    store: &dyn Store,
    draft_key: &str,
    form: &mut RepoForm,
    patch: &FormPatch,
    prompt: &mut dyn Prompt,
) -> Result<(), RepoError> {
    for (field, label) in FORM_FIELDS {
        if patch.sets(field) {
            continue;
        }

        let value = if *field == FIELD_PRIVATE {
            form.is_private = prompt.flag(label, form.is_private)?;
            DraftValue::Flag(form.is_private)
        } else {
            let current = form.text(field).unwrap_or_default().to_string();
            let answer = prompt.text(label, Some(&current))?;
            form.set_text(field, answer.clone());
            DraftValue::Text(answer)
        };

        store.save_draft_field(draft_key, field, &value).await?;
    }
    Ok(())
}

async fn save_draft(store: &dyn Store, draft_key: &str, form: &RepoForm) -> Result<(), RepoError> {
    for (field, value) in form.to_draft() {
        store.save_draft_field(draft_key, field, &value).await?;
    }
    Ok(())
}

async fn complete_form(
    store: &dyn Store,
    draft_key: &str,
    mut form: RepoForm,
    patch: &FormPatch,
    prompt: Option<&mut dyn Prompt>,
) -> Result<RepoInput, RepoError> {
    if let Some(prompt) = prompt {
        fill_form(store, draft_key, &mut form, patch, prompt).await?;
    }
    save_draft(store, draft_key, &form).await?;

    form.validate().map_err(|errors| {
        debug!("Form {} kept as draft after validation failure", draft_key);
        RepoError::Invalid(errors)
    })
}

pub async fn add_repository(
    store: &dyn Store,
    prompt: Option<&mut dyn Prompt>,
    patch: &FormPatch,
) -> Result<TrackedRepo, RepoError> {
    let draft = store.load_draft(ADD_DRAFT).await?;
    if !draft.is_empty() {
        info!("Restoring unsaved repository draft");
    }
    let form = RepoForm::default().with_draft(&draft).apply_patch(patch);

    let input = complete_form(store, ADD_DRAFT, form, patch, prompt).await?;
    let repo = input.into_new_repo();
    store.create_repository(&repo).await?;
    store.clear_draft(ADD_DRAFT).await?;

    info!("Added repository {} ({})", repo.slug(), repo.id);
    Ok(repo)
}

pub async fn edit_repository(
    store: &dyn Store,
    key: &str,
    prompt: Option<&mut dyn Prompt>,
    patch: &FormPatch,
) -> Result<TrackedRepo, RepoError> {
    let mut repo = find_repository(store, key).await?;
    let draft_key = edit_draft_key(&repo.id);

    let draft = store.load_draft(&draft_key).await?;
    let form = RepoForm::from_repo(&repo).with_draft(&draft).apply_patch(patch);

    let input = complete_form(store, &draft_key, form, patch, prompt).await?;
    input.apply_to(&mut repo);
    store.update_repository(&repo).await?;
    store.clear_draft(&draft_key).await?;

    info!("Updated repository {} ({})", repo.slug(), repo.id);
    Ok(repo)
}

/// Removes a record once the user confirms, or immediately with `force`.
/// Without a prompt and without `force` nothing is removed.
pub async fn delete_repository(
    store: &dyn Store,
    key: &str,
    prompt: Option<&mut dyn Prompt>,
    force: bool,
) -> Result<DeleteOutcome, RepoError> {
    let repo = find_repository(store, key).await?;

    if !force {
        let confirmed = match prompt {
            Some(prompt) => prompt.confirm(&format!("Delete repository {}?", repo.slug()))?,
            None => false,
        };
        if !confirmed {
            return Ok(DeleteOutcome::Cancelled);
        }
    }

    store.delete_repository(&repo.id).await?;
    store.clear_draft(&edit_draft_key(&repo.id)).await?;

    info!("Deleted repository {} ({})", repo.slug(), repo.id);
    Ok(DeleteOutcome::Deleted(repo))
}

pub async fn sync_repository(
    store: &dyn Store,
    backend: &dyn SyncBackend,
    key: &str,
) -> Result<SyncSummary, RepoError> {
    let mut repo = find_repository(store, key).await?;
    info!("Syncing files for {}", repo.slug());

    let files = backend.fetch_files(&repo).await?;
    store.replace_repository_files(&repo.id, &files).await?;

    let now = Utc::now();
    store.mark_synced(&repo.id, now).await?;
    repo.last_synced_at = Some(now);

    info!("Synced {} files for {}", files.len(), repo.slug());
    Ok(SyncSummary {
        repo,
        files: files.len(),
    })
}

/// Drops the saved draft of the add form, or of the edit form for `key`.
pub async fn discard_draft(store: &dyn Store, key: Option<&str>) -> Result<(), RepoError> {
    let draft_key = match key {
        Some(key) => edit_draft_key(&find_repository(store, key).await?.id),
        None => ADD_DRAFT.to_string(),
    };
    store.clear_draft(&draft_key).await?;
    Ok(())
}
