use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "toolshed.yaml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub cheatsheets: CheatsheetConfig,
    #[serde(default)]
    pub icons: IconConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(skip)]
    pub debug_logs: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub sqlite: Option<SqliteConfig>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            sqlite: Some(SqliteConfig {
                filename: default_db_filename(),
            }),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SqliteConfig {
    #[serde(default = "default_db_filename")]
    pub filename: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CheatsheetConfig {
    #[serde(default = "default_cheatsheet_dir")]
    pub directory: String,
    #[serde(alias = "archivedir", default = "default_archive_dir")]
    pub archive_dir: String,
    #[serde(alias = "indexfile", default = "default_index_file")]
    pub index_file: String,
}

impl Default for CheatsheetConfig {
    fn default() -> Self {
        Self {
            directory: default_cheatsheet_dir(),
            archive_dir: default_archive_dir(),
            index_file: default_index_file(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IconConfig {
    #[serde(default = "default_icon_dir")]
    pub directory: String,
    #[serde(alias = "missingfile", default = "default_missing_file")]
    pub missing_file: String,
}

impl Default for IconConfig {
    fn default() -> Self {
        Self {
            directory: default_icon_dir(),
            missing_file: default_missing_file(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncConfig {
    #[serde(alias = "apiurl", default = "default_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub token: Option<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            token: None,
        }
    }
}

fn default_db_filename() -> String {
    "toolshed.db".to_string()
}

fn default_cheatsheet_dir() -> String {
    "cheatsheets".to_string()
}

fn default_archive_dir() -> String {
    "_archive".to_string()
}

fn default_index_file() -> String {
    "index.json".to_string()
}

fn default_icon_dir() -> String {
    "icons".to_string()
}

fn default_missing_file() -> String {
    "missing-icons.txt".to_string()
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.to_string(), e))?;

        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(path.to_string(), e))?;

        Ok(config)
    }

    /// Loads an explicit config file, or `toolshed.yaml` from the working
    /// directory when present, or the built-in defaults.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }

    pub fn database_path(&self) -> String {
        self.database
            .sqlite
            .as_ref()
            .map(|sqlite| sqlite.filename.clone())
            .unwrap_or_else(default_db_filename)
    }

    pub fn cheatsheets_dir(&self) -> PathBuf {
        PathBuf::from(&self.cheatsheets.directory)
    }

    pub fn index_path(&self) -> PathBuf {
        self.cheatsheets_dir().join(&self.cheatsheets.index_file)
    }

    pub fn missing_icons_path(&self) -> PathBuf {
        self.cheatsheets_dir().join(&self.icons.missing_file)
    }

    pub fn icons_dir(&self) -> PathBuf {
        PathBuf::from(&self.icons.directory)
    }

    pub fn sync_token(&self) -> Option<String> {
        self.sync
            .token
            .clone()
            .filter(|t| !t.is_empty())
            .or_else(|| std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    ReadError(String, std::io::Error),
    #[error("Failed to parse config file {0}: {1}")]
    ParseError(String, serde_yaml::Error),
}
