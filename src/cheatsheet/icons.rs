//! Matching technology tags from the index against a directory of SVG icons.

use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, info};

use super::index::read_index;
use super::CheatsheetError;

static ICON_ALIASES: OnceLock<Vec<(Regex, &'static [&'static str])>> = OnceLock::new();

/// Tech tags whose icon is published under another name.
fn icon_aliases() -> &'static Vec<(Regex, &'static [&'static str])> {
    ICON_ALIASES.get_or_init(|| {
        let table: [(&str, &'static [&'static str]); 16] = [
            (r"^(node|nodejs|npm)$", &["nodejs", "node", "npm"]),
            (r"^(js|javascript)$", &["javascript", "js"]),
            (r"^(ts|typescript)$", &["typescript", "ts"]),
            (r"^(k8s|kubernetes)$", &["kubernetes", "k8s"]),
            (r"^(go|golang)$", &["go", "golang"]),
            (r"^(bash|shell|sh|zsh)$", &["bash", "shell", "terminal"]),
            (r"^(postgres|postgresql|psql)$", &["postgresql", "postgres"]),
            (r"^(css|scss|sass|less)$", &["css3", "css", "sass"]),
            (r"^html5?$", &["html5", "html"]),
            (r"^(angularjs|angular)$", &["angularjs", "angular"]),
            (r"^react(-native)?$", &["react"]),
            (r"^(vim|neovim|nvim)$", &["vim", "neovim"]),
            (r"^(python|py)$", &["python"]),
            (r"^(mysql|mariadb)$", &["mysql", "mariadb"]),
            (r"^(github|git)$", &["git", "github"]),
            (r"^coffee-?script$", &["coffeescript"]),
        ];
        table
            .into_iter()
            .map(|(pattern, candidates)| (Regex::new(pattern).unwrap(), candidates))
            .collect()
    })
}

#[derive(Debug, Default)]
pub struct IconReport {
    pub matched: BTreeMap<String, String>,
    pub missing: Vec<String>,
    pub unused: Vec<String>,
}

/// Sorted file names of the SVG icons in `dir`.
pub fn list_icons(dir: &Path) -> Result<Vec<String>, CheatsheetError> {
    if !dir.is_dir() {
        return Err(CheatsheetError::DirectoryNotFound(dir.to_path_buf()));
    }

    let mut icons = Vec::new();
    let entries = fs::read_dir(dir).map_err(|e| CheatsheetError::Io(dir.to_path_buf(), e))?;
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let is_svg = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("svg"))
            .unwrap_or(false);
        if let (true, Some(name)) = (is_svg, path.file_name().and_then(|n| n.to_str())) {
            icons.push(name.to_string());
        }
    }

    icons.sort();
    Ok(icons)
}

fn stem(icon: &str) -> String {
    let lower = icon.to_lowercase();
    match lower.strip_suffix(".svg") {
        Some(s) => s.to_string(),
        None => lower,
    }
}

/// Picks the icon for `tech` out of `icons`, which must be sorted.
///
/// An exact `<tech>.svg` wins. Then the alias table is tried, accepting an
/// icon named after a candidate or starting with `<candidate>-` (as in
/// `react-original.svg`). Then any icon that has the tech as a whole
/// `-`, `_` or `.` separated segment of its name.
pub fn resolve_icon<'a>(tech: &str, icons: &'a [String]) -> Option<&'a str> {
    let tech = tech.trim().to_lowercase();
    if tech.is_empty() {
        return None;
    }

    if let Some(icon) = icons.iter().find(|i| stem(i) == tech) {
        return Some(icon.as_str());
    }

    for (pattern, candidates) in icon_aliases() {
        if !pattern.is_match(&tech) {
            continue;
        }
        for candidate in candidates.iter() {
            if let Some(icon) = icons.iter().find(|i| stem(i) == *candidate) {
                return Some(icon.as_str());
            }
            if let Some(icon) = icons
                .iter()
                .find(|i| stem(i).split('-').next() == Some(*candidate))
            {
                return Some(icon.as_str());
            }
        }
    }

    icons
        .iter()
        .find(|i| stem(i).split(['-', '_', '.']).any(|segment| segment == tech))
        .map(String::as_str)
}

/// Resolves an icon for every tech in the index and writes the names of the
/// missing ones to `missing_path`, one per line.
pub fn reconcile(
    index_path: &Path,
    icons_dir: &Path,
    missing_path: &Path,
    dry_run: bool,
) -> Result<IconReport, CheatsheetError> {
    let records = read_index(index_path)?;
    let icons = list_icons(icons_dir)?;
    let techs: BTreeSet<String> = records.iter().map(|r| r.tech.to_lowercase()).collect();

    info!(
        "Reconciling {} technologies against {} icons",
        techs.len(),
        icons.len()
    );

    let mut report = IconReport::default();
    for tech in techs {
        match resolve_icon(&tech, &icons) {
            Some(icon) => {
                debug!("{} -> {}", tech, icon);
                report.matched.insert(tech, icon.to_string());
            }
            None => report.missing.push(format!("{}.svg", tech)),
        }
    }

    let used: BTreeSet<&str> = report.matched.values().map(String::as_str).collect();
    report.unused = icons
        .iter()
        .filter(|i| !used.contains(i.as_str()))
        .cloned()
        .collect();
    if !report.unused.is_empty() {
        info!("Icons not used by any cheatsheet: {}", report.unused.join(", "));
    }

    if dry_run {
        info!("Dry run: {} not written", missing_path.display());
    } else {
        let mut content = report.missing.join("\n");
        if !content.is_empty() {
            content.push('\n');
        }
        fs::write(missing_path, content)
            .map_err(|e| CheatsheetError::Io(missing_path.to_path_buf(), e))?;
    }

    info!(
        "{} technologies have icons, {} are missing",
        report.matched.len(),
        report.missing.len()
    );
    Ok(report)
}
