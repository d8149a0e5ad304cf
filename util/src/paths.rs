use crate::config;
use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Create a directory (and all parents) if it doesn't exist, and return the path.
pub fn ensure_dir<P: AsRef<Path>>(path: P) -> io::Result<PathBuf> {
    let p = path.as_ref();
    fs::create_dir_all(p)?;
    Ok(p.to_path_buf())
}

/// Ensure the parent directory of a *file path* exists (no-op if none).
pub fn ensure_parent_dir<P: AsRef<Path>>(file_path: P) -> io::Result<()> {
    if let Some(parent) = file_path.as_ref().parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Global storage root (absolute), from `config::storage_root()`.
/// If relative in env, resolve against current_dir().
pub fn storage_root() -> PathBuf {
    let p = PathBuf::from(config::storage_root());
    if p.is_absolute() {
        p
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(p)
    }
}

// ─── Workspace layout ───────────────────────────────────────────────

/// {STORAGE_ROOT}/{workspace_id}
pub fn workspace_dir(workspace_id: &str) -> PathBuf {
    storage_root().join(workspace_id)
}

/// {STORAGE_ROOT}/{workspace_id}/workspace.json
pub fn workspace_meta_path(workspace_id: &str) -> PathBuf {
    workspace_dir(workspace_id).join("workspace.json")
}

/// {STORAGE_ROOT}/{workspace_id}/assessment
pub fn assessment_dir(workspace_id: &str) -> PathBuf {
    workspace_dir(workspace_id).join("assessment")
}

/// {STORAGE_ROOT}/{workspace_id}/results
pub fn results_dir(workspace_id: &str) -> PathBuf {
    workspace_dir(workspace_id).join("results")
}

/// Joins a sanitised, `/`-separated relative path onto `base`.
///
/// Returns [`io::ErrorKind::InvalidInput`] for `.` or `..` segments, so the result always stays
/// below `base`.
pub fn join_relative(base: &Path, relative: &str) -> io::Result<PathBuf> {
    let mut joined = base.to_path_buf();
    for segment in relative.split(['/', '\\']).filter(|s| !s.is_empty()) {
        if segment == "." || segment == ".." {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("path leaves its base directory: {relative}"),
            ));
        }
        joined.push(segment);
    }
    Ok(joined)
}

/// `/`-separated path of `path` relative to `base`, or `None` when it is not below `base`.
pub fn relative_posix(base: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(base).ok()?;
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}
