use crate::error::{ServiceError, ServiceResult};
use chrono::{DateTime, Utc};
use qti::RemapTier;
use qti::types::{QtiItem, QtiItemResult};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Metadata persisted as `workspace.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Resolved item paths below `assessment/`, in assessment order.
    pub item_files: Vec<String>,
    /// Path of the assessment test below `assessment/`.
    pub assessment_test_file: String,
    /// File names below `results/`.
    pub result_files: Vec<String>,
    pub item_count: usize,
    pub result_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceSummary {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub item_count: usize,
    pub result_count: usize,
}

impl From<&Workspace> for WorkspaceSummary {
    fn from(ws: &Workspace) -> Self {
        Self {
            id: ws.id.clone(),
            name: ws.name.clone(),
            description: ws.description.clone(),
            created_at: ws.created_at,
            updated_at: ws.updated_at,
            item_count: ws.item_count,
            result_count: ws.result_count,
        }
    }
}

/// A file as received from a client, before any name sanitising.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewWorkspace {
    pub name: String,
    pub description: Option<String>,
    /// The assessment package: assessment test, items and their assets.
    pub assessment_files: Vec<UploadedFile>,
    pub result_files: Vec<UploadedFile>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateWorkspace {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Which workspace sub-directory a file lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Assessment,
    Results,
}

impl FileKind {
    pub fn dir_name(self) -> &'static str {
        match self {
            FileKind::Assessment => "assessment",
            FileKind::Results => "results",
        }
    }
}

impl FromStr for FileKind {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "assessment" => Ok(FileKind::Assessment),
            "results" => Ok(FileKind::Results),
            other => Err(ServiceError::BadRequest(format!("unknown file kind '{other}'"))),
        }
    }
}

/// Raw content of a stored file.
#[derive(Debug, Clone)]
pub struct StoredFile {
    /// Sanitised path relative to its kind directory.
    pub relative_path: String,
    pub bytes: Vec<u8>,
}

/// One result file after remapping onto the assessment items.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultView {
    pub file_name: String,
    pub sourced_id: String,
    pub candidate_name: String,
    /// Keyed by canonical item identifier.
    pub item_results: BTreeMap<String, QtiItemResult>,
    pub resolved_by: BTreeMap<String, RemapTier>,
    pub item_scores: BTreeMap<String, Option<f64>>,
    pub total_score: f64,
}

/// Everything a grader needs to display a workspace.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceView {
    pub workspace: Workspace,
    pub items: Vec<QtiItem>,
    pub results: Vec<ResultView>,
    pub max_score: f64,
}

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(ID_ALPHABET[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

pub(crate) fn random_base36(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| char::from(ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())]))
        .collect()
}

pub(crate) fn base36_millis() -> String {
    to_base36(u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default())
}

/// `ws_<base36 millis>_<6 random base36 chars>`.
pub fn generate_workspace_id() -> String {
    format!("ws_{}_{}", base36_millis(), random_base36(6))
}

/// Workspace ids are used as directory names and must match `^[A-Za-z0-9_-]+$`.
pub fn validate_workspace_id(id: &str) -> ServiceResult<()> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(ServiceError::BadRequest(format!("invalid workspace id: {id}")))
    }
}
