// src/fetch/mod.rs

pub mod files;
pub mod zips;

use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tracing::{info, instrument};

use crate::config::Config;
use crate::error::WgiError;
use crate::source::WorkbookSource;

pub use files::list_workbook_files;

/// Retry and deadline settings for the download.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_ms: u64,
    /// Per-request deadline, applied to the HTTP client.
    pub timeout: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_ms: 500,
            timeout: None,
        }
    }
}

impl From<&Config> for RetryPolicy {
    fn from(cfg: &Config) -> Self {
        Self {
            max_retries: cfg.max_retries,
            backoff_ms: cfg.backoff_ms,
            timeout: cfg.timeout_secs.map(Duration::from_secs),
        }
    }
}

pub fn build_client(retry: &RetryPolicy) -> Result<Client, WgiError> {
    let mut builder = Client::builder().user_agent(concat!("wgiscraper/", env!("CARGO_PKG_VERSION")));
    if let Some(t) = retry.timeout {
        builder = builder.timeout(t);
    }
    builder
        .build()
        .map_err(|e| WgiError::fetch("<client>", e))
}

/// Download `url` into `dest_dir` and unpack it there when it is a zip.
/// A bare workbook download is left as-is. Returns `dest_dir`.
#[instrument(level = "info", skip(client, dest_dir, retry))]
pub async fn fetch_archive(
    client: &Client,
    url: &str,
    dest_dir: &Path,
    retry: &RetryPolicy,
) -> Result<PathBuf, WgiError> {
    let saved = zips::download(client, url, dest_dir, retry).await?;
    if zips::is_zip_archive(&saved) {
        // unzip off the async worker threads
        let (zip, dest) = (saved.clone(), dest_dir.to_path_buf());
        tokio::task::spawn_blocking(move || zips::extract_zip(&zip, &dest))
            .await
            .map_err(|e| WgiError::fetch(url, e))??;
    }
    Ok(dest_dir.to_path_buf())
}

/// The extracted dataset, acquired once per run and read many times.
///
/// Downloads land in a temporary directory that is removed on drop.
#[derive(Debug)]
pub struct Archive {
    root: PathBuf,
    /// Set when the archive is a single workbook file rather than a tree.
    workbook: Option<PathBuf>,
    _scratch: Option<TempDir>,
}

impl Archive {
    /// Download and extract `url` into a fresh temporary directory.
    pub async fn acquire(client: &Client, url: &str, retry: &RetryPolicy) -> Result<Self, WgiError> {
        let scratch = TempDir::new().map_err(|e| WgiError::fetch(url, e))?;
        let root = fetch_archive(client, url, scratch.path(), retry).await?;
        info!(url, root = %root.display(), "archive ready");
        Ok(Self {
            root,
            workbook: None,
            _scratch: Some(scratch),
        })
    }

    /// Use an archive already on disk: a directory is used in place,
    /// a `.zip` is extracted into a temporary directory and any other file
    /// is taken to be the workbook itself.
    pub fn open_local(path: &Path) -> Result<Self, WgiError> {
        if path.is_dir() {
            return Ok(Self {
                root: path.to_path_buf(),
                workbook: None,
                _scratch: None,
            });
        }
        let origin = path.display().to_string();
        if !path.is_file() {
            return Err(WgiError::fetch(origin, "no such file or directory"));
        }
        if !zips::is_zip_archive(path) {
            let root = path.parent().unwrap_or(Path::new(".")).to_path_buf();
            return Ok(Self {
                root,
                workbook: Some(path.to_path_buf()),
                _scratch: None,
            });
        }
        let scratch = TempDir::new().map_err(|e| WgiError::fetch(&origin, e))?;
        zips::extract_zip(path, scratch.path())?;
        Ok(Self {
            root: scratch.path().to_path_buf(),
            workbook: None,
            _scratch: Some(scratch),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The first workbook matching `pattern`, or the workbook file this
    /// archive was opened from (`pattern` is then not consulted).
    pub fn workbook(&self, pattern: &str) -> Result<WorkbookSource, WgiError> {
        if let Some(path) = &self.workbook {
            info!(workbook = %path.display(), "using workbook file");
            return Ok(WorkbookSource::new(path.clone()));
        }
        let files = list_workbook_files(&self.root, pattern)?;
        info!(workbook = %files[0].display(), candidates = files.len(), "selected workbook");
        Ok(WorkbookSource::new(files[0].clone()))
    }
}
