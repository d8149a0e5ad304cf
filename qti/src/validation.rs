//! # Consistency Validation
//!
//! Cross-checks an uploaded assessment package against its result files before a workspace is
//! created. Every check runs and every violation is collected into a [`ValidationReport`], so an
//! uploader sees the complete list of problems in one pass.
//!
//! ## Checks
//!
//! 1. The assessment test parses and every referenced item parses.
//! 2. Item reference identifiers are unique.
//! 3. Each href resolves to exactly one uploaded file (literal path, else unique basename).
//! 4. Each resolved item declares the identifier its reference expects.
//! 5. Every result entry carries a `sequenceIndex` in `1..=item_count`.
//! 6. No two entries of one result file share a `sequenceIndex`.
//! 7. Every slot `1..=item_count` is covered by each result file.
//!
//! Resolved item references are only handed out when the report is clean.

use crate::error::QtiError;
use crate::href::{PackageIndex, resolve_href};
use crate::parsers::assessment_test_parser::parse_assessment_test;
use crate::parsers::item_parser::{parse_item, read_item_identifier};
use crate::parsers::result_parser::parse_result_item_refs;
use crate::types::{AssessmentItemRef, ResolvedItemRef, ResultItemRef, SequenceIndexAttr};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// A result file as uploaded: its (sanitised) name and XML text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultFile {
    pub name: String,
    pub xml: String,
}

impl ResultFile {
    pub fn new(name: impl Into<String>, xml: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            xml: xml.into(),
        }
    }
}

/// Everything the validator needs to see of an upload.
#[derive(Debug, Clone, Copy)]
pub struct PackageUpload<'a> {
    /// Package-relative path of the assessment test.
    pub assessment_test_path: &'a str,
    pub assessment_test_xml: &'a str,
    /// Every uploaded assessment-side file, keyed by package-relative path.
    pub assessment_files: &'a BTreeMap<String, String>,
    pub result_files: &'a [ResultFile],
}

/// Outcome of [`validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    pub errors: Vec<QtiError>,
    /// Present only when `errors` is empty.
    pub item_refs: Option<Vec<ResolvedItemRef>>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Human-readable messages, one per error, in detection order.
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

/// Runs every consistency check over an upload.
///
/// Never fails: data-quality problems, including href traversal attempts, become entries of
/// [`ValidationReport::errors`].
pub fn validate(upload: &PackageUpload<'_>) -> ValidationReport {
    let mut errors = Vec::new();

    let refs = match parse_assessment_test(upload.assessment_test_xml) {
        Ok(refs) => refs,
        Err(err) => {
            errors.push(err);
            Vec::new()
        }
    };

    let duplicates = duplicate_identifiers(&refs);
    if !duplicates.is_empty() {
        errors.push(QtiError::DuplicateIdentifier {
            identifiers: duplicates,
        });
    }

    let index = PackageIndex::new(upload.assessment_files.keys().cloned());
    let mut resolved = Vec::with_capacity(refs.len());
    for item_ref in &refs {
        match resolve_item_ref(upload, &index, item_ref) {
            Ok(r) => resolved.push(r),
            Err(err) => errors.push(err),
        }
    }

    let item_count = refs.len();
    for result in upload.result_files {
        let (result_refs, parse_errors) = parse_result_item_refs(&result.xml, &result.name);
        errors.extend(parse_errors);
        if result_refs.is_empty() || item_count == 0 {
            continue;
        }
        errors.extend(check_sequence_indexes(&result.name, &result_refs, item_count));
    }

    if !errors.is_empty() {
        debug!(
            assessment_test = upload.assessment_test_path,
            error_count = errors.len(),
            "package failed consistency validation"
        );
    }

    let item_refs = errors.is_empty().then_some(resolved);
    ValidationReport { errors, item_refs }
}

fn duplicate_identifiers(refs: &[AssessmentItemRef]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut duplicates: Vec<String> = Vec::new();
    for r in refs {
        if !seen.insert(r.identifier.as_str()) && !duplicates.contains(&r.identifier) {
            duplicates.push(r.identifier.clone());
        }
    }
    duplicates
}

fn resolve_item_ref(
    upload: &PackageUpload<'_>,
    index: &PackageIndex,
    item_ref: &AssessmentItemRef,
) -> Result<ResolvedItemRef, QtiError> {
    let literal = resolve_href(upload.assessment_test_path, &item_ref.href)?;
    let path = index.locate(&literal, &item_ref.href)?;
    let xml = upload
        .assessment_files
        .get(&path)
        .ok_or_else(|| QtiError::UnresolvedReference {
            href: item_ref.href.clone(),
        })?;

    parse_item(xml)?;
    let identifier = read_item_identifier(xml, &item_ref.href)?;
    if identifier != item_ref.identifier {
        return Err(QtiError::IdentifierMismatch {
            expected: item_ref.identifier.clone(),
            found: identifier,
        });
    }

    Ok(ResolvedItemRef {
        identifier: item_ref.identifier.clone(),
        href: item_ref.href.clone(),
        resolved_href: path,
    })
}

/// Sequence checks for one result file, in entry order: presence, range, uniqueness. Slot
/// coverage is checked afterwards. Malformed values were already reported by the parser and only
/// leave their slot uncovered.
fn check_sequence_indexes(
    result_file: &str,
    refs: &[ResultItemRef],
    item_count: usize,
) -> Vec<QtiError> {
    let mut errors = Vec::new();
    let mut seen = BTreeSet::new();

    for r in refs {
        let n = match &r.sequence_index {
            SequenceIndexAttr::Valid(n) => *n,
            SequenceIndexAttr::Invalid(_) => continue,
            SequenceIndexAttr::Absent => {
                errors.push(QtiError::MissingAttribute {
                    element: "itemResult".into(),
                    attribute: "sequenceIndex".into(),
                    context: format!("{result_file} ({})", r.identifier),
                });
                continue;
            }
        };
        if n > item_count {
            errors.push(QtiError::SequenceOutOfRange {
                result_file: result_file.to_string(),
                identifier: r.identifier.clone(),
                sequence_index: n,
                item_count,
            });
            continue;
        }
        if !seen.insert(n) {
            errors.push(QtiError::DuplicateSequenceIndex {
                result_file: result_file.to_string(),
                sequence_index: n,
            });
        }
    }

    for slot in 1..=item_count {
        if !seen.contains(&slot) {
            errors.push(QtiError::MissingSequenceSlot {
                result_file: result_file.to_string(),
                sequence_index: slot,
            });
        }
    }
    errors
}
