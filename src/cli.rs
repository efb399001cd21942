use clap::{Args, Parser, Subcommand};

use crate::repos::FormPatch;

#[derive(Parser, Debug)]
#[command(name = "toolshed")]
#[command(about = "Track code repositories and maintain a cheatsheet collection", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Configuration file (default: toolshed.yaml when present)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// SQLite database file, overrides the configuration
    #[arg(long, global = true)]
    pub db: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage tracked repositories
    #[command(subcommand)]
    Repo(RepoCommand),
    /// Maintain the cheatsheet directory
    #[command(subcommand)]
    Cheatsheets(CheatsheetCommand),
}

#[derive(Subcommand, Debug)]
pub enum RepoCommand {
    /// List tracked repositories
    List,
    /// Show a repository and its synced files
    Show {
        /// Repository id or owner/name
        key: String,
    },
    /// Add a repository
    Add {
        #[command(flatten)]
        fields: RepoFields,
        /// Do not prompt, use the flags and any saved draft only
        #[arg(long)]
        no_input: bool,
    },
    /// Edit a repository
    Edit {
        /// Repository id or owner/name
        key: String,
        #[command(flatten)]
        fields: RepoFields,
        #[arg(long)]
        no_input: bool,
    },
    /// Delete a repository after confirmation
    Delete {
        key: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Fetch the file list of a repository
    Sync { key: String },
    /// Drop the saved add form draft, or the edit draft of a repository
    DiscardDraft { key: Option<String> },
}

#[derive(Args, Debug, Default)]
pub struct RepoFields {
    #[arg(long)]
    pub owner: Option<String>,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub url: Option<String>,
    #[arg(long, conflicts_with = "public")]
    pub private: bool,
    #[arg(long)]
    pub public: bool,
    #[arg(long)]
    pub branch: Option<String>,
    #[arg(long)]
    pub subdirectory: Option<String>,
}

impl RepoFields {
    pub fn to_patch(&self) -> FormPatch {
        let is_private = match (self.private, self.public) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };
        FormPatch {
            name: self.name.clone(),
            owner: self.owner.clone(),
            description: self.description.clone(),
            url: self.url.clone(),
            is_private,
            default_branch: self.branch.clone(),
            subdirectory: self.subdirectory.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum CheatsheetCommand {
    /// Classify cheatsheets, rewrite front-matter, archive outdated ones and write the index
    Maintain {
        /// Cheatsheet directory, overrides the configuration
        #[arg(long)]
        dir: Option<String>,
        /// Report what would change without writing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Match index technologies against the icon directory
    Icons {
        #[arg(long)]
        dir: Option<String>,
        /// Icon directory, overrides the configuration
        #[arg(long)]
        icons_dir: Option<String>,
        #[arg(long)]
        dry_run: bool,
    },
}
