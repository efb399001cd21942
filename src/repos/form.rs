//! Add/edit form state for tracked repositories.
//!
//! A [`RepoForm`] holds raw field values as the user typed them. It can be
//! seeded from an existing record, a saved draft, or command-line flags, and
//! [`RepoForm::validate`] turns it into a [`RepoInput`] ready to store.

use chrono::Utc;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

use crate::db::{Draft, DraftValue, TrackedRepo};

pub const DEFAULT_BRANCH: &str = "main";

pub const FIELD_NAME: &str = "name";
pub const FIELD_OWNER: &str = "owner";
pub const FIELD_DESCRIPTION: &str = "description";
pub const FIELD_URL: &str = "url";
pub const FIELD_PRIVATE: &str = "is_private";
pub const FIELD_BRANCH: &str = "default_branch";
pub const FIELD_SUBDIRECTORY: &str = "subdirectory";

#[derive(Debug, Clone, PartialEq)]
pub struct RepoForm {
    pub name: String,
    pub owner: String,
    pub description: String,
    pub url: String,
    pub is_private: bool,
    pub default_branch: String,
    pub subdirectory: String,
}

impl Default for RepoForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            owner: String::new(),
            description: String::new(),
            url: String::new(),
            is_private: false,
            default_branch: DEFAULT_BRANCH.to_string(),
            subdirectory: String::new(),
        }
    }
}

/// Field values supplied on the command line. `None` leaves the form alone.
#[derive(Debug, Clone, Default)]
pub struct FormPatch {
    pub name: Option<String>,
    pub owner: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub is_private: Option<bool>,
    pub default_branch: Option<String>,
    pub subdirectory: Option<String>,
}

impl FormPatch {
    /// Whether the patch sets the given field.
    pub fn sets(&self, field: &str) -> bool {
        match field {
            FIELD_NAME => self.name.is_some(),
            FIELD_OWNER => self.owner.is_some(),
            FIELD_DESCRIPTION => self.description.is_some(),
            FIELD_URL => self.url.is_some(),
            FIELD_PRIVATE => self.is_private.is_some(),
            FIELD_BRANCH => self.default_branch.is_some(),
            FIELD_SUBDIRECTORY => self.subdirectory.is_some(),
            _ => false,
        }
    }
}

/// A validated form, with blank optional fields collapsed to `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct RepoInput {
    pub name: String,
    pub owner: String,
    pub description: Option<String>,
    pub url: Option<String>,
    pub is_private: bool,
    pub default_branch: String,
    pub subdirectory: Option<String>,
}

impl RepoInput {
    pub fn into_new_repo(self) -> TrackedRepo {
        TrackedRepo {
            id: uuid::Uuid::new_v4().to_string(),
            name: self.name,
            owner: self.owner,
            description: self.description,
            url: self.url,
            is_private: self.is_private,
            default_branch: self.default_branch,
            subdirectory: self.subdirectory,
            last_synced_at: None,
            created_at: Utc::now(),
        }
    }

    /// Overwrites the editable fields of `repo`, keeping its identity and sync state.
    pub fn apply_to(self, repo: &mut TrackedRepo) {
        repo.name = self.name;
        repo.owner = self.owner;
        repo.description = self.description;
        repo.url = self.url;
        repo.is_private = self.is_private;
        repo.default_branch = self.default_branch;
        repo.subdirectory = self.subdirectory;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FormErrors(pub Vec<FieldError>);

impl FormErrors {
    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.push(FieldError {
            field,
            message: message.into(),
        });
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

static SLUG_PATTERN: OnceLock<Regex> = OnceLock::new();
static URL_PATTERN: OnceLock<Regex> = OnceLock::new();

fn slug_pattern() -> &'static Regex {
    SLUG_PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9._-]+$").unwrap())
}

fn url_pattern() -> &'static Regex {
    URL_PATTERN.get_or_init(|| Regex::new(r"(?i)^https?://[^\s/?#]+[^\s]*$").unwrap())
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

impl RepoForm {
    /// Form pre-populated from an existing record, for editing.
    pub fn from_repo(repo: &TrackedRepo) -> Self {
        Self {
            name: repo.name.clone(),
            owner: repo.owner.clone(),
            description: repo.description.clone().unwrap_or_default(),
            url: repo.url.clone().unwrap_or_default(),
            is_private: repo.is_private,
            default_branch: repo.default_branch.clone(),
            subdirectory: repo.subdirectory.clone().unwrap_or_default(),
        }
    }

    /// Overlays saved draft values. Entries of the wrong type are ignored.
    pub fn with_draft(mut self, draft: &Draft) -> Self {
        for (field, value) in draft {
            match value {
                DraftValue::Text(text) => {
                    self.set_text(field, text.clone());
                }
                DraftValue::Flag(flag) if field == FIELD_PRIVATE => self.is_private = *flag,
                DraftValue::Flag(_) => {}
            }
        }
        self
    }

    pub fn apply_patch(mut self, patch: &FormPatch) -> Self {
        if let Some(v) = &patch.name {
            self.name = v.clone();
        }
        if let Some(v) = &patch.owner {
            self.owner = v.clone();
        }
        if let Some(v) = &patch.description {
            self.description = v.clone();
        }
        if let Some(v) = &patch.url {
            self.url = v.clone();
        }
        if let Some(v) = patch.is_private {
            self.is_private = v;
        }
        if let Some(v) = &patch.default_branch {
            self.default_branch = v.clone();
        }
        if let Some(v) = &patch.subdirectory {
            self.subdirectory = v.clone();
        }
        self
    }

    /// Sets a text field by name. Returns false for unknown or boolean fields.
    pub fn set_text(&mut self, field: &str, value: String) -> bool {
        let slot = match field {
            FIELD_NAME => &mut self.name,
            FIELD_OWNER => &mut self.owner,
            FIELD_DESCRIPTION => &mut self.description,
            FIELD_URL => &mut self.url,
            FIELD_BRANCH => &mut self.default_branch,
            FIELD_SUBDIRECTORY => &mut self.subdirectory,
            _ => return false,
        };
        *slot = value;
        true
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        match field {
            FIELD_NAME => Some(&self.name),
            FIELD_OWNER => Some(&self.owner),
            FIELD_DESCRIPTION => Some(&self.description),
            FIELD_URL => Some(&self.url),
            FIELD_BRANCH => Some(&self.default_branch),
            FIELD_SUBDIRECTORY => Some(&self.subdirectory),
            _ => None,
        }
    }

    pub fn to_draft(&self) -> Vec<(&'static str, DraftValue)> {
        vec![
            (FIELD_NAME, DraftValue::Text(self.name.clone())),
            (FIELD_OWNER, DraftValue::Text(self.owner.clone())),
            (FIELD_DESCRIPTION, DraftValue::Text(self.description.clone())),
            (FIELD_URL, DraftValue::Text(self.url.clone())),
            (FIELD_PRIVATE, DraftValue::Flag(self.is_private)),
            (FIELD_BRANCH, DraftValue::Text(self.default_branch.clone())),
            (FIELD_SUBDIRECTORY, DraftValue::Text(self.subdirectory.clone())),
        ]
    }

    pub fn validate(&self) -> Result<RepoInput, FormErrors> {
        let mut errors = FormErrors::default();

        let name = non_empty(&self.name);
        match &name {
            None => errors.push(FIELD_NAME, "Name is required"),
            Some(n) if !slug_pattern().is_match(n) => errors.push(
                FIELD_NAME,
                "Name may only contain letters, digits, '.', '_' and '-'",
            ),
            _ => {}
        }

        let owner = non_empty(&self.owner);
        match &owner {
            None => errors.push(FIELD_OWNER, "Owner is required"),
            Some(o) if !slug_pattern().is_match(o) => errors.push(
                FIELD_OWNER,
                "Owner may only contain letters, digits, '.', '_' and '-'",
            ),
            _ => {}
        }

        let default_branch = non_empty(&self.default_branch);
        match &default_branch {
            None => errors.push(FIELD_BRANCH, "Default branch is required"),
            Some(b) if b.chars().any(char::is_whitespace) => {
                errors.push(FIELD_BRANCH, "Default branch must not contain whitespace")
            }
            _ => {}
        }

        let url = non_empty(&self.url);
        if let Some(u) = &url {
            if !url_pattern().is_match(u) {
                errors.push(FIELD_URL, "URL must start with http:// or https://");
            }
        }

        let subdirectory = non_empty(&self.subdirectory)
            .map(|s| s.trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty());
        if let Some(dir) = &subdirectory {
            if dir.starts_with('/') || dir.starts_with('\\') {
                errors.push(FIELD_SUBDIRECTORY, "Subdirectory must be a relative path");
            } else if dir.split(['/', '\\']).any(|part| part == "..") {
                errors.push(FIELD_SUBDIRECTORY, "Subdirectory must not contain '..'");
            }
        }

        match (name, owner, default_branch) {
            (Some(name), Some(owner), Some(default_branch)) if errors.is_empty() => Ok(RepoInput {
                name,
                owner,
                description: non_empty(&self.description),
                url,
                is_private: self.is_private,
                default_branch,
                subdirectory,
            }),
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> RepoForm {
        RepoForm {
            name: "ripgrep".to_string(),
            owner: "BurntSushi".to_string(),
            description: "  ".to_string(),
            url: "https://github.com/BurntSushi/ripgrep".to_string(),
            is_private: false,
            default_branch: "master".to_string(),
            subdirectory: "crates/core/".to_string(),
        }
    }

    #[test]
    fn test_valid_form() {
        let input = filled().validate().unwrap();
        assert_eq!(input.name, "ripgrep");
        assert_eq!(input.description, None);
        assert_eq!(input.subdirectory, Some("crates/core".to_string()));
        assert_eq!(input.default_branch, "master");
    }

    #[test]
    fn test_empty_required_fields_rejected() {
        let form = RepoForm {
            name: "".to_string(),
            owner: "   ".to_string(),
            default_branch: "".to_string(),
            ..RepoForm::default()
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.has(FIELD_NAME));
        assert!(errors.has(FIELD_OWNER));
        assert!(errors.has(FIELD_BRANCH));
        assert_eq!(errors.0.len(), 3);
    }

    #[test]
    fn test_single_missing_field_rejected() {
        let mut form = filled();
        form.owner.clear();
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.0.len(), 1);
        assert!(errors.has(FIELD_OWNER));
    }

    #[test]
    fn test_bad_optional_fields() {
        let mut form = filled();
        form.url = "ftp://example.com".to_string();
        form.subdirectory = "../etc".to_string();
        let errors = form.validate().unwrap_err();
        assert!(errors.has(FIELD_URL));
        assert!(errors.has(FIELD_SUBDIRECTORY));

        form.subdirectory = "/abs".to_string();
        assert!(form.validate().unwrap_err().has(FIELD_SUBDIRECTORY));
    }

    #[test]
    fn test_name_charset() {
        let mut form = filled();
        form.name = "rip grep".to_string();
        assert!(form.validate().unwrap_err().has(FIELD_NAME));
    }

    #[test]
    fn test_from_repo_prepopulates() {
        let repo = filled().validate().unwrap().into_new_repo();
        let form = RepoForm::from_repo(&repo);
        assert_eq!(form.name, "ripgrep");
        assert_eq!(form.owner, "BurntSushi");
        assert_eq!(form.url, "https://github.com/BurntSushi/ripgrep");
        assert_eq!(form.description, "");
        assert_eq!(form.default_branch, "master");
        assert_eq!(form.subdirectory, "crates/core");
    }

    #[test]
    fn test_draft_then_patch() {
        let mut draft = Draft::new();
        draft.insert(FIELD_NAME.to_string(), DraftValue::Text("from-draft".to_string()));
        draft.insert(FIELD_OWNER.to_string(), DraftValue::Text("someone".to_string()));
        draft.insert(FIELD_PRIVATE.to_string(), DraftValue::Flag(true));
        draft.insert(FIELD_BRANCH.to_string(), DraftValue::Flag(true));

        let patch = FormPatch {
            name: Some("from-flag".to_string()),
            ..FormPatch::default()
        };
        let form = RepoForm::default().with_draft(&draft).apply_patch(&patch);
        assert_eq!(form.name, "from-flag");
        assert_eq!(form.owner, "someone");
        assert!(form.is_private);
        assert_eq!(form.default_branch, DEFAULT_BRANCH);
        assert!(patch.sets(FIELD_NAME));
        assert!(!patch.sets(FIELD_OWNER));
    }

    #[test]
    fn test_apply_keeps_identity() {
        let mut repo = filled().validate().unwrap().into_new_repo();
        let id = repo.id.clone();
        let created = repo.created_at;
        let mut form = RepoForm::from_repo(&repo);
        form.description = "Fast grep".to_string();
        form.validate().unwrap().apply_to(&mut repo);
        assert_eq!(repo.id, id);
        assert_eq!(repo.created_at, created);
        assert_eq!(repo.description, Some("Fast grep".to_string()));
    }
}
