use glob::glob;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::WgiError;

/// Spreadsheet tools leave lock files (`~$book.xlsx`) and macOS zips carry
/// resource forks under `__MACOSX/`; neither is a workbook.
fn is_artifact(path: &Path) -> bool {
    path.components()
        .any(|c| c.as_os_str() == "__MACOSX")
        || path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with("~$") || n.starts_with("._"))
            .unwrap_or(false)
}

/// All files under `dir` (recursively) whose name matches `pattern`,
/// sorted by path. Fails with `NoMatch` when nothing qualifies.
pub fn list_workbook_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, WgiError> {
    let no_match = || WgiError::NoMatch {
        dir: dir.to_path_buf(),
        pattern: pattern.to_string(),
    };

    let full = format!("{}/**/{}", dir.display(), pattern);
    let mut files: Vec<PathBuf> = glob(&full)
        .map_err(|_| no_match())?
        .filter_map(|entry| entry.ok())
        .filter(|p| p.is_file() && !is_artifact(p))
        .collect();
    files.sort();

    debug!(dir = %dir.display(), pattern, found = files.len(), "listed workbooks");
    if files.is_empty() {
        return Err(no_match());
    }
    Ok(files)
}
