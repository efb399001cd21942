use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

use super::{CheatsheetError, CheatsheetMeta, Status};

/// Writes the non-archived records, sorted by path. Returns how many were written.
pub fn write_index(path: &Path, records: &[CheatsheetMeta]) -> Result<usize, CheatsheetError> {
    let mut entries: Vec<&CheatsheetMeta> = records
        .iter()
        .filter(|r| r.status != Status::Archived)
        .collect();
    entries.sort_by(|a, b| a.path.cmp(&b.path));

    let mut json = serde_json::to_string_pretty(&entries)
        .map_err(|e| CheatsheetError::Json(path.to_path_buf(), e))?;
    json.push('\n');

    fs::write(path, json).map_err(|e| CheatsheetError::Io(path.to_path_buf(), e))?;
    debug!("Wrote {} entries to {}", entries.len(), path.display());
    Ok(entries.len())
}

pub fn read_index(path: &Path) -> Result<Vec<CheatsheetMeta>, CheatsheetError> {
    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => CheatsheetError::IndexNotFound(path.to_path_buf()),
        _ => CheatsheetError::Io(path.to_path_buf(), e),
    })?;

    serde_json::from_str(&content).map_err(|e| CheatsheetError::Json(path.to_path_buf(), e))
}
