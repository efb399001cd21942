pub mod cheatsheet;
pub mod cli;
pub mod config;
pub mod db;
pub mod repos;

use chrono::Local;
use tracing::{debug, error, info};

use cheatsheet::{CheatsheetLayout, MaintainOptions};
use cli::{CheatsheetCommand, Cli, Command, RepoCommand};
use db::{SqliteRepository, Store};
use repos::{DeleteOutcome, GitHubBackend, Prompt, Terminal};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Database error: {0}")]
    Database(#[from] db::DbError),
    #[error("{0}")]
    Repo(#[from] repos::RepoError),
    #[error("{0}")]
    Cheatsheet(#[from] cheatsheet::CheatsheetError),
    #[error("{0} cheatsheet(s) could not be processed")]
    Failed(usize),
}

pub async fn run(cli: Cli) -> Result<(), AppError> {
    let mut config = config::Config::load(cli.config.as_deref())?;
    config.debug_logs = cli.debug;
    if config.debug_logs {
        debug!("Debug logging enabled");
    }
    if let Some(db) = &cli.db {
        config.database.sqlite = Some(config::SqliteConfig { filename: db.clone() });
    }

    match cli.command {
        Command::Repo(command) => {
            let db_path = config.database_path();
            debug!("Opening database at {}", db_path);
            let db = SqliteRepository::new(&db_path).await?;
            let result = run_repo(&config, &db, command).await;
            db.close().await;
            result
        }
        Command::Cheatsheets(command) => run_cheatsheets(config, command),
    }
}

fn terminal(no_input: bool, terminal: &mut Terminal) -> Option<&mut dyn Prompt> {
    if no_input {
        None
    } else {
        Some(terminal as &mut dyn Prompt)
    }
}

async fn run_repo(config: &config::Config, db: &dyn Store, command: RepoCommand) -> Result<(), AppError> {
    let mut term = Terminal;

    match command {
        RepoCommand::List => {
            let list = db.list_repositories().await?;
            print!("{}", repos::display::format_repository_list(&list));
        }
        RepoCommand::Show { key } => {
            let repo = repos::find_repository(db, &key).await?;
            let files = db.list_repository_files(&repo.id).await?;
            print!("{}", repos::display::format_repository_details(&repo, &files));
        }
        RepoCommand::Add { fields, no_input } => {
            let patch = fields.to_patch();
            let repo = repos::add_repository(db, terminal(no_input, &mut term), &patch).await?;
            println!("Added {} ({})", repo.slug(), repo.id);
        }
        RepoCommand::Edit { key, fields, no_input } => {
            let patch = fields.to_patch();
            let repo = repos::edit_repository(db, &key, terminal(no_input, &mut term), &patch).await?;
            println!("Updated {}", repo.slug());
        }
        RepoCommand::Delete { key, yes } => {
            match repos::delete_repository(db, &key, Some(&mut term as &mut dyn Prompt), yes).await? {
                DeleteOutcome::Deleted(repo) => println!("Deleted {}", repo.slug()),
                DeleteOutcome::Cancelled => println!("Cancelled, nothing was deleted"),
            }
        }
        RepoCommand::Sync { key } => {
            let backend = GitHubBackend::new(&config.sync.api_url, config.sync_token())
                .map_err(repos::RepoError::from)?;
            let summary = repos::sync_repository(db, &backend, &key).await?;
            println!("Synced {} files for {}", summary.files, summary.repo.slug());
        }
        RepoCommand::DiscardDraft { key } => {
            repos::discard_draft(db, key.as_deref()).await?;
            println!("Draft discarded");
        }
    }
    Ok(())
}

fn run_cheatsheets(mut config: config::Config, command: CheatsheetCommand) -> Result<(), AppError> {
    match command {
        CheatsheetCommand::Maintain { dir, dry_run } => {
            if let Some(dir) = dir {
                config.cheatsheets.directory = dir;
            }
            let layout = CheatsheetLayout::from_config(&config);
            let options = MaintainOptions {
                dry_run,
                today: Local::now().date_naive(),
            };
            let report = cheatsheet::maintain(&layout, &options)?;

            println!(
                "{} cheatsheets, {} rewritten, {} archived, {} indexed",
                report.records.len(),
                report.rewritten,
                report.archived.len(),
                report.indexed
            );
            for (path, reason) in &report.failed {
                error!("{}: {}", path.display(), reason);
            }
            if !report.failed.is_empty() {
                return Err(AppError::Failed(report.failed.len()));
            }
        }
        CheatsheetCommand::Icons { dir, icons_dir, dry_run } => {
            if let Some(dir) = dir {
                config.cheatsheets.directory = dir;
            }
            if let Some(icons_dir) = icons_dir {
                config.icons.directory = icons_dir;
            }
            let report = cheatsheet::reconcile(
                &config.index_path(),
                &config.icons_dir(),
                &config.missing_icons_path(),
                dry_run,
            )?;

            println!(
                "{} technologies matched, {} missing icons",
                report.matched.len(),
                report.missing.len()
            );
            for name in &report.missing {
                info!("Missing icon: {}", name);
            }
        }
    }
    Ok(())
}
