// SPDX-License-Identifier: MIT

//! Input validation for identifiers and project-relative paths.
//!
//! These are the hard boundary checks from the external-interfaces
//! section: malformed ids and path traversal are rejected here, once,
//! so every downstream component can assume validated data.

use std::path::{Component, Path, PathBuf};

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("identifier {0:?} is empty")]
    EmptyId(String),
    #[error("identifier {0:?} exceeds 64 characters")]
    IdTooLong(String),
    #[error("identifier {0:?} does not match ^[A-Za-z0-9][A-Za-z0-9_-]*$")]
    InvalidId(String),
    #[error("path {0:?} is absolute; only project-relative paths are allowed")]
    AbsolutePath(String),
    #[error("path {0:?} contains a parent-directory (`..`) component")]
    PathTraversal(String),
    #[error("path {0:?} contains a null byte")]
    NullByte(String),
    #[error("path {0:?} is empty")]
    EmptyPath(String),
    #[error("path {0:?} escapes its declared base directory")]
    OutsideBase(String),
}

fn id_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        #[allow(clippy::unwrap_used)]
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]{0,63}$").unwrap()
    })
}

/// Validate a cell/worker/drone identifier: `^[A-Za-z0-9][A-Za-z0-9_-]{0,63}$`.
pub fn validate_id(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() {
        return Err(ValidationError::EmptyId(id.to_string()));
    }
    if id.len() > 64 {
        return Err(ValidationError::IdTooLong(id.to_string()));
    }
    if !id_pattern().is_match(id) {
        return Err(ValidationError::InvalidId(id.to_string()));
    }
    Ok(())
}

/// Validate a project-relative input/output path: no null bytes, not
/// absolute, no `..` components. A single trailing `*` glob segment
/// (as used by cell outputs) is permitted and is not itself resolved.
pub fn validate_relative_path(raw: &str) -> Result<PathBuf, ValidationError> {
    if raw.is_empty() {
        return Err(ValidationError::EmptyPath(raw.to_string()));
    }
    if raw.as_bytes().contains(&0) {
        return Err(ValidationError::NullByte(raw.to_string()));
    }
    let path = Path::new(raw);
    if path.is_absolute() {
        return Err(ValidationError::AbsolutePath(raw.to_string()));
    }
    for component in path.components() {
        match component {
            Component::ParentDir => return Err(ValidationError::PathTraversal(raw.to_string())),
            Component::Prefix(_) | Component::RootDir => {
                return Err(ValidationError::AbsolutePath(raw.to_string()))
            }
            _ => {}
        }
    }
    Ok(path.to_path_buf())
}

/// Resolve `relative` against `base` and confirm the result stays under
/// `base` lexically (no dependence on the filesystem, so this also
/// works for not-yet-created glob outputs).
pub fn resolve_under_base(base: &Path, relative: &Path) -> Result<PathBuf, ValidationError> {
    let joined = base.join(relative);
    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::ParentDir => {
                if !normalized.pop() {
                    return Err(ValidationError::OutsideBase(joined.display().to_string()));
                }
            }
            Component::CurDir => {}
            other => normalized.push(other),
        }
    }
    let mut base_normalized = PathBuf::new();
    for component in base.components() {
        base_normalized.push(component);
    }
    if !normalized.starts_with(&base_normalized) {
        return Err(ValidationError::OutsideBase(joined.display().to_string()));
    }
    Ok(normalized)
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
