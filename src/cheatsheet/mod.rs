pub mod classify;
pub mod frontmatter;
pub mod icons;
pub mod index;
pub mod scanner;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use classify::{derive_title, detect_tech, extract_version, is_outdated, outdated_match};
pub use frontmatter::{parse_front_matter, render, split_front_matter, FrontMatter};
pub use icons::{list_icons, reconcile, resolve_icon, IconReport};
pub use index::{read_index, write_index};
pub use scanner::{maintain, CheatsheetLayout, MaintainOptions, MaintainReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Active,
    Archived,
}

impl Status {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "active" | "current" => Some(Status::Active),
            "archived" | "outdated" | "retired" => Some(Status::Archived),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Active => "active",
            Status::Archived => "archived",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheatsheetMeta {
    pub path: String,
    pub title: String,
    pub tech: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub status: Status,
    pub last_reviewed: NaiveDate,
}

#[derive(Debug, thiserror::Error)]
pub enum CheatsheetError {
    #[error("Directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),
    #[error("IO error on {}: {}", .0.display(), .1)]
    Io(PathBuf, std::io::Error),
    #[error("Index not found at {}, run `toolshed cheatsheets maintain` first", .0.display())]
    IndexNotFound(PathBuf),
    #[error("Invalid index {}: {}", .0.display(), .1)]
    Json(PathBuf, serde_json::Error),
    #[error("Invalid front-matter in {}: {}", .0.display(), .1)]
    FrontMatter(PathBuf, serde_yaml::Error),
    #[error("{} already exists, not overwriting it", .0.display())]
    ArchiveExists(PathBuf),
}
