use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use super::classify::{derive_title, detect_tech, extract_version, outdated_match};
use super::frontmatter::{parse_front_matter, render, split_front_matter, FrontMatter};
use super::index::write_index;
use super::{CheatsheetError, CheatsheetMeta, Status};
use crate::config::Config;

const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown"];
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone)]
pub struct CheatsheetLayout {
    pub directory: PathBuf,
    pub archive_dir: String,
    pub index_file: String,
}

impl CheatsheetLayout {
    pub fn from_config(config: &Config) -> Self {
        Self {
            directory: config.cheatsheets_dir(),
            archive_dir: config.cheatsheets.archive_dir.clone(),
            index_file: config.cheatsheets.index_file.clone(),
        }
    }

    pub fn archive_path(&self) -> PathBuf {
        self.directory.join(&self.archive_dir)
    }

    pub fn index_path(&self) -> PathBuf {
        self.directory.join(&self.index_file)
    }
}

#[derive(Debug, Clone)]
pub struct MaintainOptions {
    pub dry_run: bool,
    /// Date stamped on cheatsheets that have no valid `lastReviewed`.
    pub today: NaiveDate,
}

#[derive(Debug, Default)]
pub struct MaintainReport {
    pub records: Vec<CheatsheetMeta>,
    pub rewritten: usize,
    pub archived: Vec<String>,
    pub indexed: usize,
    pub failed: Vec<(PathBuf, String)>,
}

struct FileOutcome {
    meta: CheatsheetMeta,
    rewritten: bool,
}

/// Classifies every cheatsheet, rewrites its front-matter, moves outdated
/// ones into the archive directory and regenerates the index.
pub fn maintain(layout: &CheatsheetLayout, options: &MaintainOptions) -> Result<MaintainReport, CheatsheetError> {
    let files = list_cheatsheets(layout)?;
    info!("Found {} cheatsheets in {}", files.len(), layout.directory.display());

    let mut report = MaintainReport::default();
    for path in files {
        match process_file(layout, &path, options) {
            Ok(outcome) => {
                if outcome.rewritten {
                    report.rewritten += 1;
                }
                if outcome.meta.status == Status::Archived {
                    report.archived.push(outcome.meta.path.clone());
                }
                report.records.push(outcome.meta);
            }
            Err(e) => {
                error!("Failed to process {}: {}", path.display(), e);
                report.failed.push((path, e.to_string()));
            }
        }
    }

    report.indexed = report
        .records
        .iter()
        .filter(|r| r.status != Status::Archived)
        .count();

    if options.dry_run {
        info!("Dry run: index {} not written", layout.index_path().display());
    } else {
        write_index(&layout.index_path(), &report.records)?;
        info!(
            "Indexed {} cheatsheets, archived {}",
            report.indexed,
            report.archived.len()
        );
    }

    Ok(report)
}

fn list_cheatsheets(layout: &CheatsheetLayout) -> Result<Vec<PathBuf>, CheatsheetError> {
    let dir = &layout.directory;
    if !dir.is_dir() {
        return Err(CheatsheetError::DirectoryNotFound(dir.clone()));
    }

    let mut files = Vec::new();
    let entries = fs::read_dir(dir).map_err(|e| CheatsheetError::Io(dir.clone(), e))?;
    for entry in entries {
        let entry = entry.map_err(|e| CheatsheetError::Io(dir.clone(), e))?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        if !MARKDOWN_EXTENSIONS.contains(&extension.as_str()) {
            continue;
        }
        if filename.starts_with('_') || filename.eq_ignore_ascii_case("readme.md") {
            debug!("Skipping {}", filename);
            continue;
        }

        files.push(path);
    }

    files.sort();
    Ok(files)
}

fn process_file(
    layout: &CheatsheetLayout,
    path: &Path,
    options: &MaintainOptions,
) -> Result<FileOutcome, CheatsheetError> {
    let io_err = |e| CheatsheetError::Io(path.to_path_buf(), e);
    let yaml_err = |e| CheatsheetError::FrontMatter(path.to_path_buf(), e);

    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();

    let content = fs::read_to_string(path).map_err(io_err)?;
    let (block, body) = split_front_matter(&content);
    let front = match block {
        Some(block) => parse_front_matter(block).map_err(yaml_err)?,
        None => FrontMatter::default(),
    };

    let matched = outdated_match(&filename, &content);
    if let Some(pattern) = matched {
        info!("{} is outdated (matches {})", filename, pattern);
    }
    let manually_archived = front.status.as_deref().and_then(Status::from_str) == Some(Status::Archived);
    let status = if matched.is_some() || manually_archived {
        Status::Archived
    } else {
        Status::Active
    };

    let last_reviewed = match front.last_reviewed.as_deref() {
        Some(s) => NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap_or_else(|_| {
            warn!("{}: invalid lastReviewed '{}', resetting", filename, s);
            options.today
        }),
        None => options.today,
    };

    let meta = CheatsheetMeta {
        path: match status {
            Status::Archived => format!("{}/{}", layout.archive_dir, filename),
            Status::Active => filename.clone(),
        },
        title: front.title.clone().unwrap_or_else(|| derive_title(&stem)),
        tech: front
            .tech
            .as_deref()
            .map(str::to_lowercase)
            .unwrap_or_else(|| detect_tech(&stem)),
        version: front.version.clone().or_else(|| extract_version(&stem)),
        status,
        last_reviewed,
    };

    let updated = FrontMatter {
        title: Some(meta.title.clone()),
        tech: Some(meta.tech.clone()),
        version: meta.version.clone(),
        status: Some(status.as_str().to_string()),
        last_reviewed: Some(last_reviewed.format(DATE_FORMAT).to_string()),
        extra: front.extra,
    };
    let rendered = render(&updated, body).map_err(yaml_err)?;
    let rewritten = rendered != content;

    let archive = layout.archive_path();
    let target = archive.join(&filename);
    if status == Status::Archived && target.exists() {
        return Err(CheatsheetError::ArchiveExists(target));
    }

    if !options.dry_run {
        if rewritten {
            fs::write(path, &rendered).map_err(io_err)?;
            debug!("Rewrote front-matter of {}", filename);
        }

        if status == Status::Archived {
            fs::create_dir_all(&archive).map_err(|e| CheatsheetError::Io(archive.clone(), e))?;
            fs::rename(path, &target).map_err(io_err)?;
            info!("Moved {} to {}", filename, archive.display());
        }
    }

    Ok(FileOutcome { meta, rewritten })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cheatsheet::index::read_index;
    use tempfile::TempDir;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn layout(dir: &TempDir) -> CheatsheetLayout {
        CheatsheetLayout {
            directory: dir.path().to_path_buf(),
            archive_dir: "_archive".to_string(),
            index_file: "index.json".to_string(),
        }
    }

    fn options(dry_run: bool) -> MaintainOptions {
        MaintainOptions {
            dry_run,
            today: today(),
        }
    }

    fn write(dir: &TempDir, name: &str, content: &str) {
        fs::write(dir.path().join(name), content).unwrap();
    }

    fn sample_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        write(&dir, "react-hooks.md", "# Hooks\n\nuseState, useEffect\n");
        write(
            &dir,
            "git-rebase.md",
            "---\ntitle: Rebasing\nlastReviewed: 2023-11-02\nauthor: sam\n---\n# Rebase\n",
        );
        write(&dir, "angularjs-directives.md", "# Directives\n");
        write(&dir, "frontend-build.md", "Run `bower install` first.\n");
        write(&dir, "python-3.10.md", "---\nstatus: archived\n---\nmatch statements\n");
        write(&dir, "README.md", "# Cheatsheets\n");
        write(&dir, "notes.txt", "not markdown");
        fs::create_dir(dir.path().join("_archive")).unwrap();
        write(&dir, "_archive/bower.md", "# old\n");
        dir
    }

    #[test]
    fn test_maintain() {
        let dir = sample_dir();
        let layout = layout(&dir);
        let report = maintain(&layout, &options(false)).unwrap();

        assert!(report.failed.is_empty());
        assert_eq!(report.records.len(), 5);
        assert_eq!(report.indexed, 2);
        assert_eq!(
            report.archived,
            vec![
                "_archive/angularjs-directives.md",
                "_archive/frontend-build.md",
                "_archive/python-3.10.md",
            ]
        );

        // Archived files were moved.
        assert!(!dir.path().join("angularjs-directives.md").exists());
        assert!(dir.path().join("_archive/angularjs-directives.md").exists());
        assert!(dir.path().join("_archive/frontend-build.md").exists());
        assert!(dir.path().join("react-hooks.md").exists());

        let moved = fs::read_to_string(dir.path().join("_archive/angularjs-directives.md")).unwrap();
        assert!(moved.contains("status: archived\n"));

        // The index holds exactly the active records.
        let index = read_index(&layout.index_path()).unwrap();
        let paths: Vec<&str> = index.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["git-rebase.md", "react-hooks.md"]);

        let git = &index[0];
        assert_eq!(git.title, "Rebasing");
        assert_eq!(git.tech, "git");
        assert_eq!(git.last_reviewed, NaiveDate::from_ymd_opt(2023, 11, 2).unwrap());

        let react = &index[1];
        assert_eq!(react.title, "React Hooks");
        assert_eq!(react.tech, "react");
        assert_eq!(react.version, None);
        assert_eq!(react.last_reviewed, today());

        let git_content = fs::read_to_string(dir.path().join("git-rebase.md")).unwrap();
        assert_eq!(
            git_content,
            "---\ntitle: Rebasing\ntech: git\nstatus: active\nlastReviewed: 2023-11-02\nauthor: sam\n---\n# Rebase\n"
        );
    }

    #[test]
    fn test_maintain_is_idempotent() {
        let dir = sample_dir();
        let layout = layout(&dir);
        maintain(&layout, &options(false)).unwrap();
        let before = fs::read_to_string(layout.index_path()).unwrap();

        let report = maintain(&layout, &options(false)).unwrap();
        assert_eq!(report.rewritten, 0);
        assert!(report.archived.is_empty());
        assert_eq!(fs::read_to_string(layout.index_path()).unwrap(), before);
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let dir = sample_dir();
        let layout = layout(&dir);
        let report = maintain(&layout, &options(true)).unwrap();

        assert_eq!(report.indexed, 2);
        assert_eq!(report.archived.len(), 3);
        assert!(!layout.index_path().exists());
        assert!(dir.path().join("angularjs-directives.md").exists());
        assert_eq!(
            fs::read_to_string(dir.path().join("react-hooks.md")).unwrap(),
            "# Hooks\n\nuseState, useEffect\n"
        );
    }

    #[test]
    fn test_version_from_filename() {
        let dir = TempDir::new().unwrap();
        write(&dir, "python-3.12.md", "# Python\n");
        let report = maintain(&layout(&dir), &options(false)).unwrap();
        assert_eq!(report.records[0].version.as_deref(), Some("3.12"));
        assert_eq!(report.records[0].tech, "python");

        let content = fs::read_to_string(dir.path().join("python-3.12.md")).unwrap();
        assert!(content.contains("version: '3.12'\n"));
        assert!(content.ends_with("---\n# Python\n"));
    }

    #[test]
    fn test_missing_directory() {
        let dir = TempDir::new().unwrap();
        let layout = CheatsheetLayout {
            directory: dir.path().join("nope"),
            archive_dir: "_archive".to_string(),
            index_file: "index.json".to_string(),
        };
        assert!(matches!(
            maintain(&layout, &options(false)).unwrap_err(),
            CheatsheetError::DirectoryNotFound(_)
        ));
    }

    #[test]
    fn test_unreadable_file_is_reported() {
        let dir = TempDir::new().unwrap();
        write(&dir, "git.md", "# Git\n");
        // Invalid UTF-8 cannot be read as a string.
        fs::write(dir.path().join("broken.md"), [0xff, 0xfe, 0x00]).unwrap();

        let report = maintain(&layout(&dir), &options(false)).unwrap();
        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].0.ends_with("broken.md"));
        assert_eq!(report.indexed, 1);
    }

    #[test]
    fn test_archive_never_overwrites() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("_archive")).unwrap();
        write(&dir, "_archive/bower.md", "OLD ARCHIVED NOTES\n");
        write(&dir, "bower.md", "new bower notes\n");
        write(&dir, "git.md", "# Git\n");

        let report = maintain(&layout(&dir), &options(false)).unwrap();
        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].0.ends_with("bower.md"));
        assert!(report.failed[0].1.contains("already exists"));
        assert_eq!(report.indexed, 1);

        assert_eq!(
            fs::read_to_string(dir.path().join("_archive/bower.md")).unwrap(),
            "OLD ARCHIVED NOTES\n"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("bower.md")).unwrap(),
            "new bower notes\n"
        );
    }

    #[test]
    fn test_rewrite_keeps_yaml_metadata() {
        let dir = TempDir::new().unwrap();
        write(
            &dir,
            "compose.md",
            "---\ntitle: >\n  Docker Compose\n  networking\ntech:\n  - docker\n  - compose\nversion: 3.10\n---\nbody\n",
        );

        let report = maintain(&layout(&dir), &options(false)).unwrap();
        assert!(report.failed.is_empty());
        let record = &report.records[0];
        assert_eq!(record.title, "Docker Compose networking");
        assert_eq!(record.tech, "docker");
        assert_eq!(record.version.as_deref(), Some("3.10"));

        let content = fs::read_to_string(dir.path().join("compose.md")).unwrap();
        let (block, body) = split_front_matter(&content);
        assert_eq!(body, "body\n");
        let front = parse_front_matter(block.unwrap()).unwrap();
        assert_eq!(front.title.as_deref(), Some("Docker Compose networking"));
        assert_eq!(front.version.as_deref(), Some("3.10"));
        assert!(matches!(
            front.extra.get("tech"),
            Some(serde_yaml::Value::Sequence(items)) if items.len() == 2
        ));
    }

    #[test]
    fn test_invalid_front_matter_is_left_alone() {
        let dir = TempDir::new().unwrap();
        let broken = "---\ntitle: [unclosed\n---\nbody\n";
        write(&dir, "broken.md", broken);

        let report = maintain(&layout(&dir), &options(false)).unwrap();
        assert_eq!(report.failed.len(), 1);
        assert_eq!(fs::read_to_string(dir.path().join("broken.md")).unwrap(), broken);
    }
}
