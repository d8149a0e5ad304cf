//! QTI Error Types
//!
//! This module defines the [`QtiError`] enum, which covers every failure the QTI core can report
//! while parsing assessment packages, cross-validating them against result files, remapping result
//! identifiers and applying grading updates.
//!
//! # Usage
//!
//! Parsers return `Result<_, QtiError>` and fail fast. The consistency validator never returns an
//! error directly: it collects [`QtiError`] values into a report so an uploader sees every problem at
//! once. Use [`QtiError::kind`] to branch on the class of failure without matching on messages.
//!
//! # Example
//!
//! ```rust
//! use qti::error::{ErrorKind, QtiError};
//!
//! let err = QtiError::UnresolvedReference { href: "items/item-9.qti.xml".into() };
//! assert_eq!(err.kind(), ErrorKind::UnresolvedReference);
//! assert!(err.to_string().contains("items/item-9.qti.xml"));
//! ```

use thiserror::Error;

/// Represents all error types that can occur in the QTI core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QtiError {
    /// XML does not parse, or lacks the expected root / structural element.
    #[error("Malformed {document}: {reason}")]
    MalformedDocument { document: String, reason: String },

    /// A required attribute (identifier, href, sequenceIndex) is absent.
    #[error("{element} is missing required attribute '{attribute}' ({context})")]
    MissingAttribute {
        element: String,
        attribute: String,
        context: String,
    },

    /// The assessment test declares no item references.
    #[error("assessmentTest contains no qti-assessment-item-ref elements")]
    EmptyAssessment,

    /// Two or more item references share an identifier.
    #[error("assessmentTest has duplicate item identifiers: {}", identifiers.join(", "))]
    DuplicateIdentifier { identifiers: Vec<String> },

    /// No uploaded file matches the href, neither literally nor by basename.
    #[error("Item referenced by assessmentTest not found: {href}")]
    UnresolvedReference { href: String },

    /// The href's basename matches more than one uploaded file.
    #[error(
        "Item referenced by assessmentTest cannot be resolved uniquely: {href} (candidates: {})",
        candidates.join(", ")
    )]
    AmbiguousReference { href: String, candidates: Vec<String> },

    /// The resolved item file declares a different identifier than its reference.
    #[error("assessmentTest identifier does not match item identifier: {expected} != {found}")]
    IdentifierMismatch { expected: String, found: String },

    /// A `sequenceIndex` attribute is present but is not a positive integer.
    #[error("Invalid sequenceIndex '{raw}' in {result_file} ({identifier})")]
    InvalidSequenceIndex {
        result_file: String,
        identifier: String,
        raw: String,
    },

    /// A `sequenceIndex` exceeds the number of items in the assessment.
    #[error(
        "sequenceIndex {sequence_index} exceeds the assessmentTest item count {item_count}: {result_file} ({identifier})"
    )]
    SequenceOutOfRange {
        result_file: String,
        identifier: String,
        sequence_index: usize,
        item_count: usize,
    },

    /// Two item entries in one result file claim the same slot.
    #[error("Duplicate sequenceIndex {sequence_index} in {result_file}")]
    DuplicateSequenceIndex {
        result_file: String,
        sequence_index: usize,
    },

    /// An assessment slot has no item entry in a result file.
    #[error("{result_file} has no itemResult with sequenceIndex={sequence_index}")]
    MissingSequenceSlot {
        result_file: String,
        sequence_index: usize,
    },

    /// A path would escape the package root.
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// The legacy mapping CSV is empty or has the wrong header.
    #[error("Invalid mapping CSV: {0}")]
    InvalidMapping(String),

    /// A criteria-update request violates the update contract.
    #[error("Invalid result update: {0}")]
    InvalidUpdate(String),
}

/// Coarse classification of a [`QtiError`], independent of its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MalformedDocument,
    MissingAttribute,
    EmptyAssessment,
    DuplicateIdentifier,
    UnresolvedReference,
    AmbiguousReference,
    IdentifierMismatch,
    InvalidSequenceIndex,
    SequenceOutOfRange,
    DuplicateSequenceIndex,
    MissingSequenceSlot,
    InvalidPath,
    InvalidMapping,
    InvalidUpdate,
}

impl QtiError {
    /// Returns the [`ErrorKind`] of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            QtiError::MalformedDocument { .. } => ErrorKind::MalformedDocument,
            QtiError::MissingAttribute { .. } => ErrorKind::MissingAttribute,
            QtiError::EmptyAssessment => ErrorKind::EmptyAssessment,
            QtiError::DuplicateIdentifier { .. } => ErrorKind::DuplicateIdentifier,
            QtiError::UnresolvedReference { .. } => ErrorKind::UnresolvedReference,
            QtiError::AmbiguousReference { .. } => ErrorKind::AmbiguousReference,
            QtiError::IdentifierMismatch { .. } => ErrorKind::IdentifierMismatch,
            QtiError::InvalidSequenceIndex { .. } => ErrorKind::InvalidSequenceIndex,
            QtiError::SequenceOutOfRange { .. } => ErrorKind::SequenceOutOfRange,
            QtiError::DuplicateSequenceIndex { .. } => ErrorKind::DuplicateSequenceIndex,
            QtiError::MissingSequenceSlot { .. } => ErrorKind::MissingSequenceSlot,
            QtiError::InvalidPath { .. } => ErrorKind::InvalidPath,
            QtiError::InvalidMapping(_) => ErrorKind::InvalidMapping,
            QtiError::InvalidUpdate(_) => ErrorKind::InvalidUpdate,
        }
    }

    pub(crate) fn malformed(document: impl Into<String>, reason: impl Into<String>) -> Self {
        QtiError::MalformedDocument {
            document: document.into(),
            reason: reason.into(),
        }
    }
}
