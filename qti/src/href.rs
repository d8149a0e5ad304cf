//! # Href Resolution
//!
//! Resolves `href` attributes of item references against the location of the assessment test, and
//! locates the uploaded file that backs a resolved path.
//!
//! Resolution is two-tier:
//! 1. [`resolve_href`] joins the href onto the assessment test's directory and normalises `.` /
//!    `..` segments. Escaping above the package root is a hard [`QtiError::InvalidPath`]: hrefs come
//!    from uploaded content.
//! 2. [`PackageIndex::locate`] accepts the literal path when a file exists there and otherwise
//!    falls back to the unique uploaded file sharing the href's basename. Exports from some tools
//!    flatten or rename folders but keep item file names stable.

use crate::error::QtiError;
use std::collections::{BTreeMap, BTreeSet};

/// Resolves `href` relative to the directory of `base_path`.
///
/// Both arguments are package-relative POSIX paths (backslashes are accepted and converted).
///
/// # Errors
///
/// [`QtiError::InvalidPath`] when the href is absolute, empty, or its `..` segments climb above the
/// package root.
///
/// # Example
///
/// ```
/// use qti::href::resolve_href;
///
/// let p = resolve_href("qti/assessment-test.qti.xml", "items/./item-1.qti.xml").unwrap();
/// assert_eq!(p, "qti/items/item-1.qti.xml");
/// assert!(resolve_href("assessment-test.qti.xml", "../item.qti.xml").is_err());
/// ```
pub fn resolve_href(base_path: &str, href: &str) -> Result<String, QtiError> {
    let href = href.trim().replace('\\', "/");
    if href.is_empty() {
        return Err(QtiError::InvalidPath {
            path: href,
            reason: "empty href".into(),
        });
    }
    if href.starts_with('/') {
        return Err(QtiError::InvalidPath {
            path: href,
            reason: "absolute hrefs are not allowed".into(),
        });
    }

    let base = base_path.replace('\\', "/");
    let base_dir = match base.rsplit_once('/') {
        Some((dir, _)) => dir,
        None => "",
    };

    let mut segments: Vec<&str> = Vec::new();
    for segment in base_dir.split('/').chain(href.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.pop().is_none() {
                    return Err(QtiError::InvalidPath {
                        path: href.clone(),
                        reason: "path escapes the package root".into(),
                    });
                }
            }
            other => segments.push(other),
        }
    }

    if segments.is_empty() {
        return Err(QtiError::InvalidPath {
            path: href,
            reason: "href resolves to the package root".into(),
        });
    }
    Ok(segments.join("/"))
}

/// Last path segment of a POSIX path.
pub fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Index over the uploaded package files, keyed by full path and by basename.
#[derive(Debug, Default, Clone)]
pub struct PackageIndex {
    paths: BTreeSet<String>,
    by_basename: BTreeMap<String, Vec<String>>,
}

impl PackageIndex {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut index = PackageIndex::default();
        for path in paths {
            let path = path.into();
            let base = basename(&path).to_string();
            if base.is_empty() {
                continue;
            }
            if index.paths.insert(path.clone()) {
                index.by_basename.entry(base).or_default().push(path);
            }
        }
        index
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    /// Finds the uploaded file backing `resolved` (the output of [`resolve_href`]).
    ///
    /// `href` is the original attribute value, used for error messages.
    ///
    /// # Errors
    ///
    /// - [`QtiError::AmbiguousReference`] when the literal path is missing and two or more files
    ///   share its basename.
    /// - [`QtiError::UnresolvedReference`] when no file shares the basename.
    pub fn locate(&self, resolved: &str, href: &str) -> Result<String, QtiError> {
        if self.contains(resolved) {
            return Ok(resolved.to_string());
        }
        match self.by_basename.get(basename(resolved)).map(Vec::as_slice) {
            Some([single]) => Ok(single.clone()),
            Some(candidates) if candidates.len() > 1 => Err(QtiError::AmbiguousReference {
                href: href.to_string(),
                candidates: candidates.to_vec(),
            }),
            _ => Err(QtiError::UnresolvedReference {
                href: href.to_string(),
            }),
        }
    }
}
