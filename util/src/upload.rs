//! Upload name handling.
//!
//! Browsers report folder uploads as `root/sub/file.xml`, sometimes percent-encoded and sometimes
//! with Windows separators. These helpers turn such names into safe, `/`-separated
//! paths relative to a workspace directory.

use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use regex::Regex;
use thiserror::Error;

static PERCENT_ESCAPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"%[0-9A-Fa-f]{2}").unwrap());
static DRIVE_LETTER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z]:").unwrap());
static FORBIDDEN_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[\\/:*?"<>|]"#).unwrap());
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadPathError {
    #[error("relative path is empty")]
    Empty,
    #[error("invalid relative path: {0}")]
    Traversal(String),
}

fn trim_separators(value: &str) -> String {
    value.replace('\\', "/").trim_start_matches('/').trim().to_string()
}

/// Normalises a client-supplied upload name: `\` becomes `/`, leading slashes are dropped, and
/// `%XX` escapes are decoded when the decoded bytes are valid UTF-8.
pub fn normalize_upload_path(value: &str) -> String {
    let normalized = trim_separators(value);
    if !PERCENT_ESCAPE.is_match(&normalized) {
        return normalized;
    }
    match percent_decode_str(&normalized).decode_utf8() {
        Ok(decoded) => trim_separators(&decoded),
        Err(_) => normalized,
    }
}

/// Replaces characters that are unsafe in file names with `_` and collapses whitespace.
pub fn sanitize_file_name(name: &str) -> String {
    let replaced = FORBIDDEN_CHARS.replace_all(name, "_");
    WHITESPACE_RUN.replace_all(&replaced, " ").trim().to_string()
}

/// Turns an upload path into a normalised relative POSIX path.
///
/// # Errors
///
/// [`UploadPathError::Empty`] when nothing is left after normalisation and
/// [`UploadPathError::Traversal`] when the path would leave its base directory.
pub fn sanitize_relative_path(value: &str) -> Result<String, UploadPathError> {
    let replaced = value.replace('\\', "/");
    let replaced = replaced.trim();
    let without_drive = DRIVE_LETTER.replace(replaced, "");
    let stripped = without_drive.trim_start_matches('/');

    let mut segments: Vec<&str> = Vec::new();
    for segment in stripped.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(last) if *last != ".." => {
                    segments.pop();
                }
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        return Err(UploadPathError::Empty);
    }
    if segments.contains(&"..") {
        return Err(UploadPathError::Traversal(value.to_string()));
    }
    Ok(segments.join("/"))
}

/// The first directory shared by every path, when all of them live below one.
pub fn detect_shared_root_segment<S: AsRef<str>>(paths: &[S]) -> Option<String> {
    let first = paths.first()?.as_ref();
    if !paths.iter().all(|p| p.as_ref().contains('/')) {
        return None;
    }
    let root = first.split('/').next().filter(|s| !s.is_empty())?;
    let prefix = format!("{root}/");
    paths
        .iter()
        .all(|p| p.as_ref().starts_with(&prefix))
        .then(|| root.to_string())
}

/// Removes `root_segment/` from the front of `value`, if present.
pub fn strip_shared_root_segment(value: &str, root_segment: Option<&str>) -> String {
    match root_segment {
        Some(root) => value
            .strip_prefix(root)
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(value)
            .to_string(),
        None => value.to_string(),
    }
}

/// Last `/`-separated segment of a path.
pub fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
