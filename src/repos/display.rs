//! Text rendering of the repository list and details views.

use chrono::{DateTime, Utc};
use std::fmt::Write;

use crate::db::{RepositoryFile, TrackedRepo};

const FILE_PREVIEW: usize = 20;

pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn format_synced(at: &Option<DateTime<Utc>>) -> String {
    match at {
        Some(at) => at.format("%Y-%m-%d %H:%M").to_string(),
        None => "never".to_string(),
    }
}

fn visibility(repo: &TrackedRepo) -> &'static str {
    if repo.is_private {
        "private"
    } else {
        "public"
    }
}

pub fn format_repository_list(repos: &[TrackedRepo]) -> String {
    if repos.is_empty() {
        return "No repositories tracked yet. Add one with `toolshed repo add`.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<36}  {:<40}  {:<16}  {:<10}  {}",
        "ID", "REPOSITORY", "BRANCH", "VISIBILITY", "LAST SYNC"
    );
    for repo in repos {
        let _ = writeln!(
            out,
            "{:<36}  {:<40}  {:<16}  {:<10}  {}",
            repo.id,
            truncate_string(&repo.slug(), 40),
            truncate_string(&repo.default_branch, 16),
            visibility(repo),
            format_synced(&repo.last_synced_at),
        );
    }
    out
}

pub fn format_repository_details(repo: &TrackedRepo, files: &[RepositoryFile]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", repo.slug());
    let _ = writeln!(out, "  ID:             {}", repo.id);
    if let Some(description) = &repo.description {
        let _ = writeln!(out, "  Description:    {}", description);
    }
    if let Some(url) = &repo.url {
        let _ = writeln!(out, "  URL:            {}", url);
    }
    let _ = writeln!(out, "  Visibility:     {}", visibility(repo));
    let _ = writeln!(out, "  Default branch: {}", repo.default_branch);
    if let Some(subdirectory) = &repo.subdirectory {
        let _ = writeln!(out, "  Subdirectory:   {}", subdirectory);
    }
    let _ = writeln!(out, "  Added:          {}", repo.created_at.format("%Y-%m-%d %H:%M"));
    let _ = writeln!(out, "  Last sync:      {}", format_synced(&repo.last_synced_at));

    if !files.is_empty() {
        let _ = writeln!(out, "  Files ({}):", files.len());
        for file in files.iter().take(FILE_PREVIEW) {
            let _ = writeln!(out, "    {}", file.path);
        }
        if files.len() > FILE_PREVIEW {
            let _ = writeln!(out, "    ... and {} more", files.len() - FILE_PREVIEW);
        }
    }
    out
}
