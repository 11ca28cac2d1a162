//! Static file serving from an ordered list of root directories.
//!
//! The request path is looked up under each root in turn. Whatever it
//! resolves to after following symlinks and `..` segments must still lie
//! inside that root, otherwise the request is answered as if the file did
//! not exist.

use std::io;
use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use percent_encoding::percent_decode_str;
use thiserror::Error;
use tracing::{debug, warn};

use crate::http::headers::Headers;
use crate::http::response::Response;
use crate::http::status::StatusCode;

const CACHE_FOREVER: &str = "max-age=31556926, public";

/// Why a file could not be served.
#[derive(Debug, Error)]
pub enum FileError {
    /// No root holds the file, or the path escaped its root.
    #[error("Not Found")]
    NotFound,

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("Internal Server Error")]
    Internal(#[source] io::Error),
}

impl FileError {
    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            FileError::NotFound => StatusCode::NotFound,
            FileError::Forbidden(_) => StatusCode::Forbidden,
            FileError::Internal(_) => StatusCode::InternalServerError,
        }
    }
}

/// Resolves a percent-encoded request path to a file under one of `roots`.
///
/// Roots are tried in order and must be canonical. A query string is
/// ignored, and `/` is served as `/index.html`.
pub async fn resolve_file(escaped: &str, roots: &[PathBuf]) -> Result<PathBuf, FileError> {
    let escaped = escaped.split_once('?').map_or(escaped, |(path, _)| path);

    // Legacy alias
    let escaped = if escaped == "/" { "/index.html" } else { escaped };

    let unescaped: Vec<u8> = percent_decode_str(escaped).collect();
    if unescaped.contains(&0) {
        return Err(FileError::NotFound);
    }
    let relative = path_from_bytes(trim_leading_slashes(&unescaped));

    for root in roots {
        let built = root.join(&relative);

        let path = match tokio::fs::canonicalize(&built).await {
            Ok(path) => path,
            Err(err) => match classify_resolve_error(err) {
                None => {
                    debug!(path = %built.display(), "not under root, trying next");
                    continue;
                }
                Some(FileError::Internal(err)) => {
                    warn!(path = %escaped, error = %err, "resolving path failed");
                    return Err(FileError::Internal(err));
                }
                Some(err) => return Err(err),
            },
        };

        // canonicalize() never leaves parent segments behind
        if path.components().any(|c| c == Component::ParentDir) {
            warn!(path = %path.display(), "canonical path still has parent segments");
            return Err(FileError::Internal(io::Error::other("unresolved path")));
        }

        // Someone is trying to escape the root directory
        if !is_within(&path, root) {
            debug!(path = %path.display(), root = %root.display(), "path escapes root");
            return Err(FileError::NotFound);
        }

        let metadata = tokio::fs::metadata(&path).await.map_err(classify_open_error)?;
        if metadata.is_dir() {
            return Err(FileError::Forbidden("Directory Listing Denied"));
        }

        return Ok(path);
    }

    Err(FileError::NotFound)
}

/// True when `path` is `root` itself or lies below it. Compares whole path
/// components, so `/srv/www` does not contain `/srv/www2`.
pub fn is_within(path: &Path, root: &Path) -> bool {
    !root.as_os_str().is_empty() && path.starts_with(root)
}

fn trim_leading_slashes(path: &[u8]) -> &[u8] {
    let start = path.iter().position(|&b| b != b'/').unwrap_or(path.len());
    &path[start..]
}

#[cfg(unix)]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    use std::os::unix::ffi::OsStrExt;
    PathBuf::from(std::ffi::OsStr::from_bytes(bytes))
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(bytes).into_owned())
}

/// Maps a failure to canonicalize a candidate path. `None` means the file
/// isn't under that root and the next one should be tried.
fn classify_resolve_error(err: io::Error) -> Option<FileError> {
    if is_missing(&err) {
        return None;
    }
    match err.kind() {
        io::ErrorKind::PermissionDenied => Some(FileError::Forbidden("Access Denied")),
        _ => Some(FileError::Internal(err)),
    }
}

fn is_missing(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory | io::ErrorKind::InvalidFilename
    ) || is_symlink_loop(err)
}

#[cfg(unix)]
fn is_symlink_loop(err: &io::Error) -> bool {
    err.raw_os_error() == Some(libc::ELOOP)
}

#[cfg(not(unix))]
fn is_symlink_loop(_err: &io::Error) -> bool {
    false
}

fn classify_open_error(err: io::Error) -> FileError {
    match err.kind() {
        io::ErrorKind::PermissionDenied | io::ErrorKind::IsADirectory => {
            FileError::Forbidden("Access denied")
        }
        _ => FileError::Internal(err),
    }
}

impl Response {
    /// Serves a file from disk as the whole response.
    ///
    /// `escaped` is the percent-encoded request path, or `None` to use the
    /// response's own path. With `cache_forever` the file is sent with a
    /// long-lived `Cache-Control` header. Failures are answered with an
    /// error page.
    pub async fn serve_file(&self, escaped: Option<&str>, cache_forever: bool, roots: &[PathBuf]) {
        let Some(escaped) = escaped.or(self.path()).map(str::to_string) else {
            self.send_error(StatusCode::NotFound.as_u16(), &Headers::new(), None);
            return;
        };

        let body = match resolve_file(&escaped, roots).await {
            Ok(path) => match tokio::fs::read(&path).await {
                Ok(contents) => Ok(Bytes::from(contents)),
                Err(err) => {
                    if !matches!(err.kind(), io::ErrorKind::PermissionDenied) {
                        warn!(path = %path.display(), error = %err, "reading file failed");
                    }
                    Err(classify_open_error(err))
                }
            },
            Err(err) => Err(err),
        };

        let body = match body {
            Ok(body) => body,
            Err(err) => {
                let message = err.to_string();
                self.send_error(err.status_code().as_u16(), &Headers::new(), Some(&message));
                return;
            }
        };

        let headers = Headers::new().optional("Cache-Control", cache_forever.then_some(CACHE_FOREVER));
        self.send_headers(200, "OK", Some(body.len() as u64), &headers);

        if self.enqueue(body) {
            self.complete();
        }
    }
}
