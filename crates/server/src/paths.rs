//! Library path validation.

use std::path::{Component, Path, PathBuf};

use crate::error::ApiError;

/// Resolve `requested` against `library_dir`, rejecting anything outside it.
///
/// Resolution is lexical: `.` and `..` segments are folded before the
/// containment check, so the target does not need to exist.
pub fn resolve_in_library(library_dir: &Path, requested: &str) -> Result<PathBuf, ApiError> {
    let base = normalize(&std::path::absolute(library_dir)?);
    let candidate = normalize(&base.join(requested.trim_start_matches('/')));

    if candidate == base || !candidate.starts_with(&base) {
        tracing::warn!(attempted = %requested, "path traversal attempt rejected");
        return Err(ApiError::InvalidPath);
    }

    Ok(candidate)
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
