// src/fetch/zips.rs

use reqwest::Client;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::{fs, time::sleep};
use tracing::{debug, error, info, instrument, warn};
use url::Url;
use zip::ZipArchive;

use super::RetryPolicy;
use crate::error::WgiError;

fn describe(err: &reqwest::Error, timeout: Option<Duration>) -> String {
    match timeout {
        Some(t) if err.is_timeout() => format!("timed out after {:?}: {}", t, err),
        _ => err.to_string(),
    }
}

async fn get_bytes_core(client: &Client, url: &Url) -> Result<Vec<u8>, reqwest::Error> {
    debug!("Fetching {}", url);
    let resp = client.get(url.clone()).send().await?.error_for_status()?;
    Ok(resp.bytes().await?.to_vec())
}

/// Upper bound on a single retry delay.
const MAX_BACKOFF_MS: u64 = 60_000;

/// Exponential delay before retry number `attempt` (1-based), capped at
/// `MAX_BACKOFF_MS`.
fn backoff_delay(backoff_ms: u64, attempt: u32) -> Duration {
    let factor = 2u64
        .checked_pow(attempt.saturating_sub(1))
        .unwrap_or(u64::MAX);
    Duration::from_millis(backoff_ms.saturating_mul(factor).min(MAX_BACKOFF_MS))
}

async fn get_bytes_with_retry(
    client: &Client,
    url: &Url,
    retry: &RetryPolicy,
) -> Result<Vec<u8>, WgiError> {
    let mut attempts = 0;
    loop {
        match get_bytes_core(client, url).await {
            Ok(b) => return Ok(b),
            Err(e) if attempts < retry.max_retries => {
                attempts += 1;
                let delay = backoff_delay(retry.backoff_ms, attempts);
                warn!(%url, attempt = attempts, ?delay, error = %e, "Retrying");
                sleep(delay).await;
            }
            Err(e) => {
                error!(%url, error = %e, "Exhausted retries");
                return Err(WgiError::fetch(url.as_str(), describe(&e, retry.timeout)));
            }
        }
    }
}

/// Download `url_str` into `dest_dir`, keeping the original filename.
/// Returns the full path of the saved file.
pub async fn download(
    client: &Client,
    url_str: &str,
    dest_dir: &Path,
    retry: &RetryPolicy,
) -> Result<PathBuf, WgiError> {
    let url = Url::parse(url_str).map_err(|e| WgiError::fetch(url_str, e))?;
    let filename = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .unwrap_or("download.zip")
        .to_string();
    let dest_path = dest_dir.join(filename);

    fs::create_dir_all(dest_dir)
        .await
        .map_err(|e| WgiError::fetch(url_str, e))?;

    let bytes = get_bytes_with_retry(client, &url, retry).await?;
    fs::write(&dest_path, &bytes)
        .await
        .map_err(|e| WgiError::fetch(url_str, e))?;

    info!(path = %dest_path.display(), bytes = bytes.len(), "downloaded");
    Ok(dest_path)
}

/// Unpack every entry of `zip_path` under `dest_dir`.
#[instrument(level = "info", skip(zip_path, dest_dir), fields(zip = %zip_path.display()))]
pub fn extract_zip(zip_path: &Path, dest_dir: &Path) -> Result<(), WgiError> {
    let origin = zip_path.display().to_string();
    let file = File::open(zip_path).map_err(|e| WgiError::fetch(&origin, e))?;
    let mut archive = ZipArchive::new(file).map_err(|e| WgiError::fetch(&origin, e))?;
    let entries = archive.len();
    archive
        .extract(dest_dir)
        .map_err(|e| WgiError::fetch(&origin, e))?;
    info!(entries, dest = %dest_dir.display(), "extracted archive");
    Ok(())
}

/// True when `path` looks like a plain zip archive rather than a workbook
/// (xlsx files are zip containers too, so the extension decides).
pub fn is_zip_archive(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("zip"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::io::{Cursor, Write};
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;
    use zip::CompressionMethod;

    #[test]
    fn extracts_nested_entries() -> Result<()> {
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
            let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
            zip.start_file("wgi/wgidataset.xlsx", options)?;
            zip.write_all(b"not really a workbook")?;
            zip.start_file("readme.txt", options)?;
            zip.write_all(b"hello")?;
            zip.finish()?;
        }

        let tmp = TempDir::new()?;
        let zip_path = tmp.path().join("wgidataset_excel.zip");
        std::fs::write(&zip_path, &buf)?;

        let out = tmp.path().join("out");
        extract_zip(&zip_path, &out)?;
        assert!(out.join("wgi").join("wgidataset.xlsx").is_file());
        assert!(out.join("readme.txt").is_file());
        Ok(())
    }

    #[test]
    fn corrupt_archive_is_fetch_error() -> Result<()> {
        let tmp = TempDir::new()?;
        let zip_path = tmp.path().join("broken.zip");
        std::fs::write(&zip_path, b"definitely not a zip")?;
        let err = extract_zip(&zip_path, tmp.path()).unwrap_err();
        assert!(matches!(err, WgiError::Fetch { .. }));
        Ok(())
    }

    #[test]
    fn backoff_doubles_and_saturates() {
        assert_eq!(backoff_delay(500, 1), Duration::from_millis(500));
        assert_eq!(backoff_delay(500, 3), Duration::from_millis(2_000));
        assert_eq!(backoff_delay(500, 200), Duration::from_millis(MAX_BACKOFF_MS));
        assert_eq!(backoff_delay(u64::MAX, 2), Duration::from_millis(MAX_BACKOFF_MS));
        assert_eq!(backoff_delay(0, 64), Duration::ZERO);
    }

    #[test]
    fn zip_detection_uses_extension() {
        assert!(is_zip_archive(Path::new("a/wgidataset_excel.ZIP")));
        assert!(!is_zip_archive(Path::new("a/wgidataset.xlsx")));
        assert!(!is_zip_archive(Path::new("a/noext")));
    }
}
