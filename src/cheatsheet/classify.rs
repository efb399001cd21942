use regex::Regex;
use std::sync::OnceLock;

static OUTDATED_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
static OUTDATED_NAME_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
static TECH_PATTERNS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
static VERSION_PATTERN: OnceLock<Regex> = OnceLock::new();

/// Technologies that are retired or superseded by a major version.
fn outdated_patterns() -> &'static Vec<Regex> {
    OUTDATED_PATTERNS.get_or_init(|| {
        vec![
            Regex::new(r"(?i)\bangular[-_ ]?js\b").unwrap(),
            Regex::new(r"(?i)\bangular[-_ ]?1(\.\d+)*\b").unwrap(),
            Regex::new(r"(?i)\bbower\b").unwrap(),
            Regex::new(r"(?i)\bgrunt(js|file|-cli)\b").unwrap(),
            Regex::new(r"(?i)\bcoffee-?script\b").unwrap(),
            Regex::new(r"(?i)\bpython[-_ ]?2(\.\d+)*\b").unwrap(),
            Regex::new(r"(?i)\bjquery[-_ ]?1(\.\d+)*\b").unwrap(),
            Regex::new(r"(?i)\bbackbone\.?js\b").unwrap(),
            Regex::new(r"(?i)\bvue[-_ ]?1(\.\d+)*\b").unwrap(),
            Regex::new(r"(?i)\breact[-_ ]?(0\.\d+|1[0-5])(\.\d+)*\b").unwrap(),
            Regex::new(r"(?i)\bphp[-_ ]?5(\.\d+)*\b").unwrap(),
            Regex::new(r"(?i)\bwebpack[-_ ]?[1-3](\.\d+)*\b").unwrap(),
            Regex::new(r"(?i)\b(flash[-_ ]player|actionscript)\b").unwrap(),
        ]
    })
}

/// Bare names that are ordinary words in prose, so only file names count.
fn outdated_name_patterns() -> &'static Vec<Regex> {
    OUTDATED_NAME_PATTERNS.get_or_init(|| {
        vec![
            Regex::new(r"(?i)^grunt\b").unwrap(),
            Regex::new(r"(?i)^backbone\b").unwrap(),
        ]
    })
}

fn tech_patterns() -> &'static Vec<(Regex, &'static str)> {
    TECH_PATTERNS.get_or_init(|| {
        [
            (r"^(angularjs|angular-js)", "angularjs"),
            (r"^angular", "angular"),
            (r"^react-native", "react-native"),
            (r"^(react|jsx)", "react"),
            (r"^vue", "vue"),
            (r"^svelte", "svelte"),
            (r"^(node|nodejs|npm)\b", "nodejs"),
            (r"^(typescript|ts)\b", "typescript"),
            (r"^(javascript|js|es\d+)\b", "javascript"),
            (r"^(python|py)\d*\b", "python"),
            (r"^(golang|go)\b", "go"),
            (r"^rust", "rust"),
            (r"^(docker|dockerfile)", "docker"),
            (r"^(kubernetes|k8s|kubectl)", "kubernetes"),
            (r"^github", "github"),
            (r"^git\b", "git"),
            (r"^(bash|shell|sh|zsh)\b", "bash"),
            (r"^(postgres|postgresql|psql)", "postgresql"),
            (r"^(mysql|mariadb)", "mysql"),
            (r"^sql\b", "sql"),
            (r"^(css|scss|sass|less)\b", "css"),
            (r"^html", "html"),
            (r"^jquery", "jquery"),
            (r"^(vim|neovim|nvim)\b", "vim"),
            (r"^coffee-?script", "coffeescript"),
            (r"^bower", "bower"),
            (r"^grunt", "grunt"),
        ]
        .into_iter()
        .map(|(pattern, tech)| (Regex::new(pattern).unwrap(), tech))
        .collect()
    })
}

fn version_pattern() -> &'static Regex {
    VERSION_PATTERN.get_or_init(|| Regex::new(r"(?i)[-_ ]v?(\d+(?:\.\d+)*)$").unwrap())
}

/// First outdated pattern found in the file name or the file content.
pub fn outdated_match(filename: &str, content: &str) -> Option<&'static str> {
    let by_name = outdated_name_patterns().iter().find(|p| p.is_match(filename));
    by_name
        .or_else(|| {
            outdated_patterns()
                .iter()
                .find(|p| p.is_match(filename) || p.is_match(content))
        })
        .map(|p| p.as_str())
}

pub fn is_outdated(filename: &str, content: &str) -> bool {
    outdated_match(filename, content).is_some()
}

fn split_words(stem: &str) -> impl Iterator<Item = &str> {
    stem.split(['-', '_', ' ']).filter(|w| !w.is_empty())
}

/// Technology tag for a file stem such as `react-hooks` or `k8s_networking`.
pub fn detect_tech(stem: &str) -> String {
    let lower = stem.trim().to_lowercase().replace('_', "-");

    for (pattern, tech) in tech_patterns() {
        if pattern.is_match(&lower) {
            return tech.to_string();
        }
    }

    let first = split_words(&lower).next().map(str::to_string);
    first.unwrap_or_else(|| "general".to_string())
}

/// Trailing version in a file stem: `python-3.12` gives `3.12`, `react-v18` gives `18`.
pub fn extract_version(stem: &str) -> Option<String> {
    version_pattern()
        .captures(stem.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

const ACRONYMS: &[&str] = &[
    "api", "aws", "cli", "css", "gcp", "html", "http", "json", "jsx", "k8s", "npm", "scss", "sql",
    "ssh", "tls", "ui", "url", "xml", "yaml",
];

pub fn derive_title(stem: &str) -> String {
    split_words(stem)
        .map(|word| {
            let lower = word.to_lowercase();
            if ACRONYMS.contains(&lower.as_str()) {
                return lower.to_uppercase();
            }
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outdated_by_filename() {
        assert!(is_outdated("angularjs-directives.md", ""));
        assert!(is_outdated("python-2.7.md", ""));
        assert!(is_outdated("bower.md", ""));
        assert!(is_outdated("react-15-lifecycle.md", ""));
        assert!(is_outdated("jquery-1.12.md", ""));
    }

    #[test]
    fn test_outdated_by_content() {
        assert!(is_outdated("frontend.md", "Install deps with `bower install`."));
        assert!(is_outdated("build.md", "Our Gruntfile runs the tasks."));
        assert!(is_outdated("notes.md", "Targets Python 2.7 only."));
    }

    #[test]
    fn test_current_files() {
        assert!(!is_outdated("angular-17.md", "Standalone components in Angular 17."));
        assert!(!is_outdated("python-3.12.md", "Pattern matching in Python 3.12."));
        assert!(!is_outdated("react-18.md", "Hooks and React 18 concurrent rendering."));
        assert!(!is_outdated("webpack-5.md", "Module federation."));
        assert!(!is_outdated("vue-3.md", "Composition API"));
    }

    #[test]
    fn test_plain_words_in_content_are_not_outdated() {
        assert!(!is_outdated("networking.md", "BGP is the backbone of the internet."));
        assert!(!is_outdated("chores.md", "Automate the grunt work with make."));
        assert!(is_outdated("spa.md", "Models and views in Backbone.js"));
        assert!(is_outdated("build.md", "npm install -g grunt-cli"));
        assert!(is_outdated("grunt-tasks.md", ""));
        assert!(is_outdated("backbone-models.md", ""));
    }

    #[test]
    fn test_outdated_match_reports_pattern() {
        assert_eq!(outdated_match("bower.md", ""), Some(r"(?i)\bbower\b"));
        assert_eq!(outdated_match("rust.md", "cargo build"), None);
    }

    #[test]
    fn test_detect_tech() {
        assert_eq!(detect_tech("react-hooks"), "react");
        assert_eq!(detect_tech("react-native-navigation"), "react-native");
        assert_eq!(detect_tech("nodejs-streams"), "nodejs");
        assert_eq!(detect_tech("node-streams"), "nodejs");
        assert_eq!(detect_tech("Python3_basics"), "python");
        assert_eq!(detect_tech("k8s-networking"), "kubernetes");
        assert_eq!(detect_tech("github-actions"), "github");
        assert_eq!(detect_tech("git-rebase"), "git");
        assert_eq!(detect_tech("golang"), "go");
        assert_eq!(detect_tech("terraform-modules"), "terraform");
        assert_eq!(detect_tech("---"), "general");
    }

    #[test]
    fn test_extract_version() {
        assert_eq!(extract_version("python-3.10"), Some("3.10".to_string()));
        assert_eq!(extract_version("react-v18"), Some("18".to_string()));
        assert_eq!(extract_version("react-hooks"), None);
        assert_eq!(extract_version("es6"), None);
    }

    #[test]
    fn test_derive_title() {
        assert_eq!(derive_title("react-hooks"), "React Hooks");
        assert_eq!(derive_title("css_grid"), "CSS Grid");
        assert_eq!(derive_title("python-3.10"), "Python 3.10");
        assert_eq!(derive_title("k8s-networking"), "K8S Networking");
    }
}
