// src/error.rs

use std::path::PathBuf;

/// Every failure the download and reshape pipeline can surface.
///
/// Any of these aborts the whole `load_indicator` / `load_all` call; no
/// partial table is returned.
#[derive(Debug, thiserror::Error)]
pub enum WgiError {
    #[error("fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("no files matching `{pattern}` under {}", .dir.display())]
    NoMatch { dir: PathBuf, pattern: String },

    #[error("cannot read sheet {sheet} from {}: {reason}", .path.display())]
    SheetRead {
        path: PathBuf,
        sheet: String,
        reason: String,
    },

    #[error("malformed header in sheet {sheet}: {reason}")]
    MalformedHeader { sheet: String, reason: String },

    #[error("invalid year token `{token}` in column {column}")]
    InvalidYear { column: String, token: String },

    #[error(
        "missing required column(s) [{}]; available columns: [{}]",
        .missing.join(", "),
        .available.join(", ")
    )]
    SchemaValidation {
        missing: Vec<String>,
        available: Vec<String>,
    },
}

impl WgiError {
    pub(crate) fn fetch(url: impl Into<String>, reason: impl ToString) -> Self {
        WgiError::Fetch {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn malformed(sheet: &str, reason: impl Into<String>) -> Self {
        WgiError::MalformedHeader {
            sheet: sheet.to_string(),
            reason: reason.into(),
        }
    }
}
