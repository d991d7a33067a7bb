//! Resolve `/content-img/...` requests to files under the image root.

use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Images are addressed by file name and never rewritten in place
pub const CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("asset not found: {0}")]
    NotFound(String),
}

impl AssetError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, AssetError::NotFound(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    /// Canonical absolute path, always inside the image root
    pub path: PathBuf,
    pub content_type: &'static str,
}

#[derive(Debug, Clone)]
pub struct AssetResolver {
    root: PathBuf,
}

impl AssetResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a request path to an existing regular file under the root.
    ///
    /// Traversal segments are dropped before joining, and the joined path
    /// is canonicalised and checked again so a symlink cannot lead out.
    pub fn resolve(&self, requested: &str) -> Result<ResolvedAsset, AssetError> {
        let not_found = || AssetError::NotFound(requested.to_string());

        let relative = normalize(requested).ok_or_else(not_found)?;
        let root = self.root.canonicalize().map_err(|e| {
            tracing::debug!("Image root {} unavailable: {}", self.root.display(), e);
            not_found()
        })?;
        let path = root.join(&relative).canonicalize().map_err(|_| not_found())?;

        if !path.starts_with(&root) {
            tracing::warn!("Rejected asset path escaping the image root: {:?}", requested);
            return Err(not_found());
        }
        if !path.is_file() {
            return Err(not_found());
        }

        Ok(ResolvedAsset {
            content_type: content_type_for_path(&path),
            path,
        })
    }
}

/// Lexically normalise a request path. `..` pops a segment and is dropped
/// when there is nothing to pop. Returns `None` when nothing is left or a
/// segment is not a plain file name.
fn normalize(requested: &str) -> Option<PathBuf> {
    let mut segments: Vec<&str> = Vec::new();

    for segment in requested.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            name => {
                let mut components = Path::new(name).components();
                match (components.next(), components.next()) {
                    (Some(Component::Normal(_)), None) if !name.contains('\0') => {
                        segments.push(name)
                    }
                    _ => return None,
                }
            }
        }
    }

    if segments.is_empty() {
        None
    } else {
        Some(segments.iter().collect())
    }
}

/// Content type from the file extension
pub fn content_type_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        _ => FALLBACK_CONTENT_TYPE,
    }
}
