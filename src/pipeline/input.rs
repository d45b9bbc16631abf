//! Input resolution and staging.
//!
//! The Files API upload reads from a file on disk, so every input ends up as
//! a local path:
//!
//! * a local path is checked (exists, readable, `%PDF` magic) and used as-is;
//! * a URL is downloaded into a [`TempDir`];
//! * in-memory bytes are written to a [`NamedTempFile`].
//!
//! Temporary files live exactly as long as the value returned here. They are
//! removed when it is dropped, on success, on error, and on panic.

use crate::error::AnalystError;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::{NamedTempFile, TempDir};
use tracing::{debug, info};

/// Display name used when the input carries no file name.
const DEFAULT_DISPLAY_NAME: &str = "report.pdf";

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// A PDF on local disk, ready for upload.
#[derive(Debug)]
pub enum ResolvedInput {
    /// The caller's own file. Never deleted.
    Local(PathBuf),
    /// A downloaded report. Removed together with `_dir`.
    Downloaded { path: PathBuf, _dir: TempDir },
    /// Caller bytes written to a scoped temp file.
    Staged(NamedTempFile),
}

impl ResolvedInput {
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(path) | ResolvedInput::Downloaded { path, .. } => path,
            ResolvedInput::Staged(tmp) => tmp.path(),
        }
    }

    /// Name shown for the file on the remote side.
    pub fn display_name(&self) -> String {
        match self {
            ResolvedInput::Staged(_) => DEFAULT_DISPLAY_NAME.to_string(),
            _ => self
                .path()
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string()),
        }
    }
}

/// `true` for `http://` and `https://` inputs.
pub fn is_url(input: &str) -> bool {
    ["http://", "https://"].iter().any(|p| input.starts_with(p))
}

/// Turn a path or URL into a local PDF.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, AnalystError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(AnalystError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(Path::new(input))
    }
}

/// Write `bytes` to a scoped temporary `.pdf` file.
///
/// The bytes are not inspected: whatever the caller hands over is uploaded.
pub fn stage_bytes(bytes: &[u8]) -> Result<ResolvedInput, AnalystError> {
    use std::io::Write;

    let mut tmp = tempfile::Builder::new()
        .prefix("earnings-")
        .suffix(".pdf")
        .tempfile()
        .map_err(|source| AnalystError::StagingFailed { source })?;
    tmp.write_all(bytes)
        .and_then(|_| tmp.flush())
        .map_err(|source| AnalystError::StagingFailed { source })?;
    debug!("Staged {} bytes at {}", bytes.len(), tmp.path().display());
    Ok(ResolvedInput::Staged(tmp))
}

/// The leading bytes when they are not `%PDF`. Short inputs are padded with
/// zeros.
fn bad_magic(head: &[u8]) -> Option<[u8; 4]> {
    if head.starts_with(PDF_MAGIC) {
        return None;
    }
    let mut magic = [0u8; 4];
    let n = head.len().min(4);
    magic[..n].copy_from_slice(&head[..n]);
    Some(magic)
}

fn resolve_local(path: &Path) -> Result<ResolvedInput, AnalystError> {
    let path = path.to_path_buf();
    let mut file = match std::fs::File::open(&path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::PermissionDenied => {
            return Err(AnalystError::PermissionDenied { path });
        }
        Err(_) => return Err(AnalystError::FileNotFound { path }),
    };
    if file.metadata().is_ok_and(|m| m.is_dir()) {
        return Err(AnalystError::FileNotFound { path });
    }

    let mut head = Vec::with_capacity(4);
    Read::by_ref(&mut file)
        .take(4)
        .read_to_end(&mut head)
        .map_err(|_| AnalystError::PermissionDenied { path: path.clone() })?;
    if let Some(magic) = bad_magic(&head) {
        return Err(AnalystError::NotAPdf { path, magic });
    }

    debug!("Using local report {}", path.display());
    Ok(ResolvedInput::Local(path))
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, AnalystError> {
    info!("Fetching report from {}", url);
    let failed = |reason: String| AnalystError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            AnalystError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            failed(e.to_string())
        }
    })?;
    let status = response.status();
    if !status.is_success() {
        return Err(failed(format!("HTTP {status}")));
    }
    let body = response.bytes().await.map_err(|e| failed(e.to_string()))?;

    let dir = TempDir::new().map_err(|source| AnalystError::StagingFailed { source })?;
    let path = dir.path().join(filename_from_url(url));
    if let Some(magic) = bad_magic(&body) {
        return Err(AnalystError::NotAPdf { path, magic });
    }
    tokio::fs::write(&path, &body)
        .await
        .map_err(|source| AnalystError::StagingFailed { source })?;

    info!("Fetched {} bytes into {}", body.len(), path.display());
    Ok(ResolvedInput::Downloaded { path, _dir: dir })
}

/// Last path segment of the URL when it looks like a file name.
fn filename_from_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut s| s.next_back().map(str::to_string))
        })
        .filter(|last| last.contains('.'))
        .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string())
}
