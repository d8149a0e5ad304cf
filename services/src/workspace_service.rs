use crate::error::{ServiceError, ServiceResult};
use crate::storage::{atomic_write, atomic_write_json, lock_path, replace_file, stored_path};
use crate::workspace::{
    FileKind, NewWorkspace, ResultView, StoredFile, UpdateWorkspace, UploadedFile, Workspace,
    WorkspaceSummary, WorkspaceView, generate_workspace_id, validate_workspace_id,
};
use chrono::Utc;
use qti::parsers::assessment_test_parser::parse_assessment_test;
use qti::parsers::item_parser::parse_item;
use qti::parsers::result_parser::parse_result;
use qti::result_update::apply_result_update;
use qti::scorer::{item_score, total_max_score, total_score};
use qti::scoring_input::ResultUpdateRequest;
use qti::types::{AssessmentItemRef, QtiItem, QtiResult};
use qti::{PackageUpload, QtiError, RemapResult, ResultFile, ResultRemapper, validate};
use std::collections::{BTreeMap, BTreeSet};
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use tracing::{info, warn};
use util::paths::{
    assessment_dir, ensure_dir, results_dir, storage_root, workspace_dir, workspace_meta_path,
};
use util::upload::{
    base_name, detect_shared_root_segment, normalize_upload_path, sanitize_file_name,
    sanitize_relative_path, strip_shared_root_segment,
};

/// Basename every assessment package must contain exactly once.
pub const ASSESSMENT_TEST_FILE_NAME: &str = "assessment-test.qti.xml";

pub struct WorkspaceService;

impl WorkspaceService {
    /// Validates an upload and, when it is consistent, persists it as a new workspace.
    ///
    /// Nothing is written unless every check passes. Consistency problems come back together as
    /// [`ServiceError::Validation`].
    pub async fn create(params: NewWorkspace) -> ServiceResult<Workspace> {
        let name = params.name.trim();
        if name.is_empty() {
            return Err(ServiceError::BadRequest("workspace name is required".into()));
        }
        if params.assessment_files.is_empty() {
            return Err(ServiceError::BadRequest("assessment files are required".into()));
        }
        if params.result_files.is_empty() {
            return Err(ServiceError::BadRequest("result files are required".into()));
        }

        let assessment = prepare_assessment_files(&params.assessment_files)?;
        let assessment_test_file = locate_assessment_test(&assessment)?;
        let results = prepare_result_files(&params.result_files)?;

        let texts: BTreeMap<String, String> = assessment
            .iter()
            .map(|(path, bytes)| (path.clone(), String::from_utf8_lossy(bytes).into_owned()))
            .collect();
        let result_docs: Vec<ResultFile> = results
            .iter()
            .map(|(name, bytes)| ResultFile::new(name.clone(), String::from_utf8_lossy(bytes)))
            .collect();
        let assessment_test_xml = texts
            .get(&assessment_test_file)
            .map(String::as_str)
            .unwrap_or_default();

        let report = validate(&PackageUpload {
            assessment_test_path: &assessment_test_file,
            assessment_test_xml,
            assessment_files: &texts,
            result_files: &result_docs,
        });
        if !report.is_valid() {
            warn!(
                "Rejected upload '{}' with {} consistency error(s)",
                name,
                report.errors.len()
            );
            return Err(ServiceError::Validation(report.messages()));
        }
        let item_files: Vec<String> = report
            .item_refs
            .unwrap_or_default()
            .into_iter()
            .map(|r| r.resolved_href)
            .collect();

        let id = generate_workspace_id();
        let assessment_root = ensure_dir(assessment_dir(&id))?;
        let results_root = ensure_dir(results_dir(&id))?;
        for (path, bytes) in &assessment {
            atomic_write(&stored_path(&assessment_root, path)?, bytes).await?;
        }
        for (file_name, bytes) in &results {
            atomic_write(&stored_path(&results_root, file_name)?, bytes).await?;
        }

        let now = Utc::now();
        let description = params
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(String::from);
        let workspace = Workspace {
            id,
            name: name.to_string(),
            description,
            created_at: now,
            updated_at: now,
            item_count: item_files.len(),
            result_count: results.len(),
            item_files,
            assessment_test_file,
            result_files: results.iter().map(|(n, _)| n.clone()).collect(),
        };
        save(&workspace).await?;

        info!(
            "Created workspace {} ({} items, {} results)",
            workspace.id, workspace.item_count, workspace.result_count
        );
        Ok(workspace)
    }

    /// All readable workspaces, most recently updated first.
    pub async fn list() -> ServiceResult<Vec<WorkspaceSummary>> {
        let root = storage_root();
        let mut entries = match fs::read_dir(&root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut summaries = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let meta_path = entry.path().join("workspace.json");
            if !fs::try_exists(&meta_path).await.unwrap_or(false) {
                continue;
            }
            match read_meta(&meta_path).await {
                Ok(ws) => summaries.push(WorkspaceSummary::from(&ws)),
                Err(e) => warn!("Skipping unreadable {}: {e}", meta_path.display()),
            }
        }

        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }

    pub async fn get(id: &str) -> ServiceResult<Workspace> {
        validate_workspace_id(id)?;
        let meta_path = workspace_meta_path(id);
        match read_meta(&meta_path).await {
            Err(ServiceError::Io(e)) if e.kind() == ErrorKind::NotFound => Err(
                ServiceError::NotFound(format!("workspace {id} not found")),
            ),
            other => other,
        }
    }

    /// Renames a workspace. A blank description clears it.
    pub async fn update(id: &str, params: UpdateWorkspace) -> ServiceResult<Workspace> {
        let name = params.name.as_deref().map(str::trim).unwrap_or_default();
        if name.is_empty() {
            return Err(ServiceError::BadRequest("workspace name is required".into()));
        }

        let mut workspace = Self::get(id).await?;
        workspace.name = name.to_string();
        workspace.description = params
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(String::from);
        workspace.updated_at = Utc::now();
        save(&workspace).await?;
        Ok(workspace)
    }

    pub async fn delete(id: &str) -> ServiceResult<()> {
        validate_workspace_id(id)?;
        let dir = workspace_dir(id);
        if !fs::try_exists(&dir).await.unwrap_or(false) {
            return Err(ServiceError::NotFound(format!("workspace {id} not found")));
        }
        fs::remove_dir_all(&dir).await?;
        info!("Deleted workspace {id}");
        Ok(())
    }

    /// Reads one stored file. `name` is sanitised before it touches the filesystem.
    pub async fn read_file(id: &str, kind: FileKind, name: &str) -> ServiceResult<StoredFile> {
        validate_workspace_id(id)?;
        let relative_path =
            sanitize_relative_path(name).map_err(|e| ServiceError::BadRequest(e.to_string()))?;
        let path = stored_path(&workspace_dir(id).join(kind.dir_name()), &relative_path)?;

        match fs::read(&path).await {
            Ok(bytes) => Ok(StoredFile {
                relative_path,
                bytes,
            }),
            Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::IsADirectory) => {
                Err(ServiceError::NotFound(format!("file not found: {relative_path}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Loads items and remapped results for grading.
    ///
    /// Any result entry that maps to no item, and any item claimed by several entries, fails the
    /// whole load with one message per result file.
    pub async fn load_view(id: &str) -> ServiceResult<WorkspaceView> {
        let workspace = Self::get(id).await?;
        let (item_refs, items) = load_assessment(&workspace).await?;
        let remapper = ResultRemapper::new(&item_refs);
        let results_root = results_dir(id);

        let mut results = Vec::with_capacity(workspace.result_files.len());
        let mut problems = Vec::new();
        for file_name in &workspace.result_files {
            let xml = read_text(&stored_path(&results_root, file_name)?, file_name).await?;
            let parsed = parse_result(&xml, file_name)?;
            let remapped = remapper.remap(&parsed);

            if !remapped.missing_result_identifiers.is_empty() {
                problems.push(format!(
                    "{file_name}: result identifiers match no assessment item: {}",
                    remapped.missing_result_identifiers.join(", ")
                ));
            }
            if !remapped.duplicate_item_identifiers.is_empty() {
                problems.push(format!(
                    "{file_name}: several results map to the same item: {}",
                    remapped.duplicate_item_identifiers.join(", ")
                ));
            }
            results.push(result_view(parsed, remapped, &items));
        }
        if !problems.is_empty() {
            warn!("Workspace {id} failed to load: {}", problems.join("; "));
            return Err(ServiceError::Validation(problems));
        }

        Ok(WorkspaceView {
            max_score: total_max_score(&items),
            workspace,
            items,
            results,
        })
    }

    /// Writes grading edits into one result file and returns its recomputed view.
    pub async fn apply_result_update(
        id: &str,
        request: ResultUpdateRequest,
    ) -> ServiceResult<ResultView> {
        if request.result_file.trim().is_empty() || request.items.is_empty() {
            return Err(ServiceError::BadRequest(
                "resultFile and at least one item are required".into(),
            ));
        }

        let mut workspace = Self::get(id).await?;
        if !workspace.result_files.contains(&request.result_file) {
            return Err(ServiceError::NotFound(format!(
                "result file not found: {}",
                request.result_file
            )));
        }
        let (item_refs, items) = load_assessment(&workspace).await?;

        let path = stored_path(&results_dir(id), &request.result_file)?;
        let updated = {
            let _guard = lock_path(&path).await;
            let xml = read_text(&path, &request.result_file).await?;
            let updated = apply_result_update(&xml, &item_refs, &items, &request)?;
            replace_file(&path, updated.as_bytes()).await?;
            updated
        };

        workspace.updated_at = Utc::now();
        save(&workspace).await?;
        info!(
            "Updated {} item(s) in {} of workspace {id}",
            request.items.len(),
            request.result_file
        );

        let parsed = parse_result(&updated, &request.result_file)?;
        let remapped = ResultRemapper::new(&item_refs).remap(&parsed);
        Ok(result_view(parsed, remapped, &items))
    }
}

async fn read_meta(path: &Path) -> ServiceResult<Workspace> {
    let content = fs::read(path).await?;
    Ok(serde_json::from_slice(&content)?)
}

async fn save(workspace: &Workspace) -> ServiceResult<()> {
    atomic_write_json(&workspace_meta_path(&workspace.id), workspace).await?;
    Ok(())
}

async fn read_text(path: &Path, label: &str) -> ServiceResult<String> {
    match fs::read_to_string(path).await {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            Err(ServiceError::NotFound(format!("{label} is missing from the workspace")))
        }
        Err(e) => Err(e.into()),
    }
}

/// Normalises upload paths, strips a shared folder prefix and rejects duplicates.
fn prepare_assessment_files(files: &[UploadedFile]) -> ServiceResult<Vec<(String, &[u8])>> {
    let normalized: Vec<String> = files.iter().map(|f| normalize_upload_path(&f.name)).collect();
    let shared_root = detect_shared_root_segment(&normalized);

    let mut seen = BTreeSet::new();
    let mut prepared = Vec::with_capacity(files.len());
    for (file, name) in files.iter().zip(&normalized) {
        let stripped = strip_shared_root_segment(name, shared_root.as_deref());
        let safe = sanitize_relative_path(&stripped)
            .map_err(|e| ServiceError::BadRequest(e.to_string()))?;
        if !seen.insert(safe.clone()) {
            return Err(ServiceError::BadRequest(format!(
                "duplicate assessment file path: {safe}"
            )));
        }
        prepared.push((safe, file.bytes.as_slice()));
    }
    Ok(prepared)
}

fn locate_assessment_test(files: &[(String, &[u8])]) -> ServiceResult<String> {
    let candidates: Vec<&String> = files
        .iter()
        .map(|(path, _)| path)
        .filter(|path| base_name(path) == ASSESSMENT_TEST_FILE_NAME)
        .collect();
    match candidates.as_slice() {
        [only] => Ok((*only).clone()),
        [] => Err(ServiceError::BadRequest(format!(
            "{ASSESSMENT_TEST_FILE_NAME} is missing from the assessment files"
        ))),
        many => Err(ServiceError::BadRequest(format!(
            "multiple {ASSESSMENT_TEST_FILE_NAME} files: {}",
            many.iter().map(|p| p.as_str()).collect::<Vec<_>>().join(", ")
        ))),
    }
}

/// Result files are stored flat under their sanitised basenames.
fn prepare_result_files(files: &[UploadedFile]) -> ServiceResult<Vec<(String, &[u8])>> {
    let mut seen = BTreeSet::new();
    let mut prepared = Vec::with_capacity(files.len());
    for file in files {
        let normalized = normalize_upload_path(&file.name);
        let name = sanitize_file_name(base_name(&normalized));
        if name.is_empty() || name == "." || name == ".." {
            return Err(ServiceError::BadRequest(format!(
                "invalid result file name: {}",
                file.name
            )));
        }
        if !seen.insert(name.clone()) {
            return Err(ServiceError::BadRequest(format!("duplicate result file: {name}")));
        }
        prepared.push((name, file.bytes.as_slice()));
    }
    Ok(prepared)
}

/// Parses the assessment test and its items, checking them against the stored metadata.
async fn load_assessment(
    workspace: &Workspace,
) -> ServiceResult<(Vec<AssessmentItemRef>, Vec<QtiItem>)> {
    if workspace.assessment_test_file.trim().is_empty() {
        return Err(ServiceError::BadRequest("workspace has no assessment test".into()));
    }
    let root = assessment_dir(&workspace.id);
    let test_xml = read_text(
        &stored_path(&root, &workspace.assessment_test_file)?,
        &workspace.assessment_test_file,
    )
    .await?;
    let item_refs = parse_assessment_test(&test_xml)?;
    if item_refs.len() != workspace.item_files.len() {
        return Err(ServiceError::Validation(vec![format!(
            "assessment test references {} items but the workspace lists {} item files",
            item_refs.len(),
            workspace.item_files.len()
        )]));
    }

    let mut items = Vec::with_capacity(item_refs.len());
    for (item_ref, file) in item_refs.iter().zip(&workspace.item_files) {
        let xml = read_text(&stored_path(&root, file)?, file).await?;
        let item = parse_item(&xml)?;
        if item.identifier != item_ref.identifier {
            return Err(QtiError::IdentifierMismatch {
                expected: item_ref.identifier.clone(),
                found: item.identifier,
            }
            .into());
        }
        items.push(item);
    }
    Ok((item_refs, items))
}

fn result_view(parsed: QtiResult, remapped: RemapResult, items: &[QtiItem]) -> ResultView {
    let item_scores = items
        .iter()
        .map(|item| {
            let entry = remapped.mapped_item_results.get(&item.identifier);
            (item.identifier.clone(), item_score(item, entry))
        })
        .collect();
    ResultView {
        total_score: total_score(items, &remapped.mapped_item_results),
        file_name: parsed.file_name,
        sourced_id: parsed.sourced_id,
        candidate_name: parsed.candidate_name,
        item_results: remapped.mapped_item_results,
        resolved_by: remapped.resolved_by,
        item_scores,
    }
}
