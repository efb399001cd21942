pub mod actions;
pub mod display;
pub mod form;
pub mod prompt;
pub mod sync;

pub use actions::{
    add_repository, delete_repository, discard_draft, edit_repository, find_repository,
    sync_repository, DeleteOutcome, RepoError, SyncSummary,
};
pub use form::{FormPatch, RepoForm, RepoInput};
pub use prompt::{Prompt, Terminal};
pub use sync::{GitHubBackend, SyncBackend, SyncError};
