//! Workspace export and import as ZIP archives.
//!
//! An export stores every file of one workspace under `workspaces/<id>/` plus a
//! `workspace-export.json` manifest at the archive root. Imports accept the same layout and stage
//! the extracted files in a sibling of the storage root before moving them into place, so a
//! failed import never leaves a half-written workspace behind.

use crate::error::{ServiceError, ServiceResult};
use crate::storage::{is_scratch_file, stored_path};
use crate::workspace::{Workspace, base36_millis, random_base36, validate_workspace_id};
use chrono::{NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsString;
use std::io::{self, Cursor, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};
use util::config;
use util::paths::{relative_posix, storage_root, workspace_dir};
use util::upload::{sanitize_file_name, sanitize_relative_path};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub const EXPORT_ROOT: &str = "workspaces";
pub const EXPORT_MANIFEST: &str = "workspace-export.json";
pub const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportWorkspaceInfo {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportManifest {
    pub version: u32,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub workspace_count: usize,
    #[serde(default)]
    pub workspaces: Vec<ExportWorkspaceInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutcome {
    pub manifest: Option<ExportManifest>,
    pub workspace_ids: Vec<String>,
}

/// Files of one archive, grouped by workspace id.
#[derive(Debug, Default)]
struct ArchiveContents {
    manifest: Option<ExportManifest>,
    workspaces: BTreeMap<String, Vec<(String, Vec<u8>)>>,
    with_metadata: BTreeSet<String>,
}

pub struct TransferService;

impl TransferService {
    /// Packs one workspace into a ZIP archive.
    pub async fn export_zip(id: &str) -> ServiceResult<Vec<u8>> {
        validate_workspace_id(id)?;
        let dir = workspace_dir(id);
        if !fs::try_exists(&dir).await.unwrap_or(false) {
            return Err(ServiceError::NotFound(format!("workspace {id} not found")));
        }

        let manifest = build_manifest(id, &dir).await;
        let id = id.to_string();
        let bytes = tokio::task::spawn_blocking(move || write_archive(&id, &dir, &manifest))
            .await
            .map_err(io::Error::other)??;
        Ok(bytes)
    }

    /// Unpacks an exported archive into the storage root.
    ///
    /// Without `overwrite`, importing a workspace id that already exists is a
    /// [`ServiceError::Conflict`].
    pub async fn import_zip(bytes: Vec<u8>, overwrite: bool) -> ServiceResult<ImportOutcome> {
        let limit = config::max_upload_bytes().saturating_mul(8) as u64;
        let contents = tokio::task::spawn_blocking(move || read_archive(&bytes, limit))
            .await
            .map_err(io::Error::other)??;

        if contents.workspaces.is_empty() {
            return Err(ServiceError::BadRequest("archive contains no workspace".into()));
        }
        if contents.workspaces.len() > 1 {
            return Err(ServiceError::BadRequest(
                "importing several workspaces at once is not supported".into(),
            ));
        }
        if let Some(id) = contents
            .workspaces
            .keys()
            .find(|id| !contents.with_metadata.contains(*id))
        {
            return Err(ServiceError::BadRequest(format!(
                "workspace.json is missing for {id}"
            )));
        }

        let root = storage_root();
        if !overwrite {
            let mut conflicts = Vec::new();
            for id in contents.workspaces.keys() {
                if fs::try_exists(workspace_dir(id)).await.unwrap_or(false) {
                    conflicts.push(id.as_str());
                }
            }
            if !conflicts.is_empty() {
                return Err(ServiceError::Conflict(format!(
                    "workspace already exists: {}",
                    conflicts.join(", ")
                )));
            }
        }

        let staging = staging_dir(&root);
        let moved = stage_and_move(&root, &staging, &contents.workspaces, overwrite).await;
        if let Err(e) = fs::remove_dir_all(&staging).await {
            if e.kind() != ErrorKind::NotFound {
                warn!("Could not remove staging directory {}: {e}", staging.display());
            }
        }
        moved?;

        let workspace_ids: Vec<String> = contents.workspaces.into_keys().collect();
        info!("Imported workspace(s) {}", workspace_ids.join(", "));
        Ok(ImportOutcome {
            manifest: contents.manifest,
            workspace_ids,
        })
    }
}

/// `<sanitised name or "workspace">-<YYYYMMDD-HHMMSS>.zip`.
pub fn export_file_name(workspace_name: &str, at: NaiveDateTime) -> String {
    let safe = sanitize_file_name(workspace_name);
    let stem = if safe.is_empty() { "workspace" } else { safe.as_str() };
    format!("{stem}-{}.zip", at.format("%Y%m%d-%H%M%S"))
}

/// Manifest entry for `id`, filled from `workspace.json` when it is readable.
async fn build_manifest(id: &str, dir: &Path) -> ExportManifest {
    let mut info = ExportWorkspaceInfo {
        id: id.to_string(),
        name: None,
        updated_at: None,
    };
    if let Ok(content) = fs::read(dir.join("workspace.json")).await {
        if let Ok(meta) = serde_json::from_slice::<serde_json::Value>(&content) {
            let text = |key: &str| meta.get(key).and_then(|v| v.as_str()).map(String::from);
            info.id = text("id").unwrap_or(info.id);
            info.name = text("name");
            info.updated_at = text("updatedAt");
        }
    }
    ExportManifest {
        version: MANIFEST_VERSION,
        created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        workspace_count: 1,
        workspaces: vec![info],
    }
}

fn write_archive(id: &str, dir: &Path, manifest: &ExportManifest) -> ServiceResult<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    {
        let mut zip = ZipWriter::new(&mut buf);
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .unix_permissions(0o644);

        let walker = WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_scratch_file(&e.file_name().to_string_lossy()));
        for entry in walker {
            let entry = entry.map_err(io::Error::other)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(relative) = relative_posix(dir, entry.path()) else {
                continue;
            };
            zip.start_file(format!("{EXPORT_ROOT}/{id}/{relative}"), options)?;
            zip.write_all(&std::fs::read(entry.path())?)?;
        }

        zip.start_file(EXPORT_MANIFEST, options)?;
        zip.write_all(&serde_json::to_vec_pretty(manifest)?)?;
        zip.finish()?;
    }
    Ok(buf.into_inner())
}

fn parse_manifest(content: &[u8]) -> ServiceResult<ExportManifest> {
    let manifest: ExportManifest = serde_json::from_slice(content)
        .map_err(|_| ServiceError::BadRequest("could not read the export manifest".into()))?;
    if manifest.version != MANIFEST_VERSION {
        return Err(ServiceError::BadRequest(format!(
            "unsupported export format: v{}",
            manifest.version
        )));
    }
    Ok(manifest)
}

fn archive_path(value: &str, entry_name: &str) -> ServiceResult<String> {
    sanitize_relative_path(value)
        .map_err(|_| ServiceError::BadRequest(format!("invalid path in archive: {entry_name}")))
}

/// Reads at most `remaining` bytes of one entry. Entries whose header understates their size
/// are still cut off at the limit.
fn read_entry_bounded<R: Read>(reader: R, remaining: u64) -> ServiceResult<Vec<u8>> {
    let mut content = Vec::new();
    reader
        .take(remaining.saturating_add(1))
        .read_to_end(&mut content)?;
    if content.len() as u64 > remaining {
        return Err(oversized());
    }
    Ok(content)
}

fn oversized() -> ServiceError {
    ServiceError::BadRequest("archive exceeds the allowed uncompressed size".into())
}

/// Parses `workspace.json` of an imported workspace. Every stored path it lists must already be
/// in sanitised form.
fn check_metadata(content: &[u8], workspace_id: &str) -> ServiceResult<()> {
    let meta: Workspace = serde_json::from_slice(content).map_err(|_| {
        ServiceError::BadRequest(format!("could not parse workspace.json of {workspace_id}"))
    })?;
    if meta.id != workspace_id {
        return Err(ServiceError::BadRequest(format!(
            "workspace.json id does not match {workspace_id}"
        )));
    }

    let listed = std::iter::once(&meta.assessment_test_file)
        .chain(&meta.item_files)
        .chain(&meta.result_files);
    for path in listed {
        if sanitize_relative_path(path).ok().as_deref() != Some(path.as_str()) {
            return Err(ServiceError::BadRequest(format!(
                "workspace.json of {workspace_id} lists an invalid path: {path}"
            )));
        }
    }
    if let Some(name) = meta.result_files.iter().find(|name| name.contains('/')) {
        return Err(ServiceError::BadRequest(format!(
            "workspace.json of {workspace_id} lists a nested result file: {name}"
        )));
    }
    Ok(())
}

fn read_archive(bytes: &[u8], max_uncompressed: u64) -> ServiceResult<ArchiveContents> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut contents = ArchiveContents::default();
    let mut total_uncompressed = 0u64;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }
        let remaining = max_uncompressed.saturating_sub(total_uncompressed);
        if entry.size() > remaining {
            return Err(oversized());
        }

        let name = entry.name().replace('\\', "/");
        let content = read_entry_bounded(&mut entry, remaining)?;
        total_uncompressed = total_uncompressed.saturating_add(content.len() as u64);

        if name == EXPORT_MANIFEST {
            contents.manifest = Some(parse_manifest(&content)?);
            continue;
        }

        let Some(rest) = name.strip_prefix(&format!("{EXPORT_ROOT}/")) else {
            return Err(ServiceError::BadRequest(format!("unexpected archive entry: {name}")));
        };
        let normalized = archive_path(rest, &name)?;
        let Some((workspace_id, relative)) = normalized.split_once('/') else {
            return Err(ServiceError::BadRequest(format!(
                "entry is not inside a workspace: {name}"
            )));
        };
        validate_workspace_id(workspace_id)?;

        if relative == "workspace.json" {
            check_metadata(&content, workspace_id)?;
            contents.with_metadata.insert(workspace_id.to_string());
        }

        contents
            .workspaces
            .entry(workspace_id.to_string())
            .or_default()
            .push((relative.to_string(), content));
    }
    Ok(contents)
}

/// `<storage root>.import-<base36 millis>-<random>`, next to the storage root.
fn staging_dir(root: &Path) -> PathBuf {
    let mut name: OsString = root.as_os_str().to_owned();
    name.push(format!(".import-{}-{}", base36_millis(), random_base36(6)));
    PathBuf::from(name)
}

async fn stage_and_move(
    root: &Path,
    staging: &Path,
    workspaces: &BTreeMap<String, Vec<(String, Vec<u8>)>>,
    overwrite: bool,
) -> ServiceResult<()> {
    for (id, files) in workspaces {
        let staged = staging.join(id);
        for (relative, content) in files {
            let target = stored_path(&staged, relative)?;
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).await?;
            }
            fs::write(&target, content).await?;
        }
    }

    fs::create_dir_all(root).await?;
    for id in workspaces.keys() {
        let target = workspace_dir(id);
        if overwrite && fs::try_exists(&target).await.unwrap_or(false) {
            fs::remove_dir_all(&target).await?;
        }
        fs::rename(staging.join(id), &target).await?;
    }
    Ok(())
}
