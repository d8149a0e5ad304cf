//! # Types Module
//!
//! This module defines the core data structures shared by the QTI parsers, validator, remapper and
//! scoring engine. All types are plain data: they are derived fresh from files on every load and
//! never mutated in place by the core.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One `qti-assessment-item-ref` of an assessment test, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentItemRef {
    pub identifier: String,
    pub href: String,
}

/// An item reference whose href was resolved to an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedItemRef {
    pub identifier: String,
    pub href: String,
    /// Package-relative path of the file that backs this reference.
    pub resolved_href: String,
}

impl ResolvedItemRef {
    pub fn as_item_ref(&self) -> AssessmentItemRef {
        AssessmentItemRef {
            identifier: self.identifier.clone(),
            href: self.href.clone(),
        }
    }
}

/// Item kind, inferred from the interactions present in the item body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QtiItemType {
    Descriptive,
    Choice,
    Cloze,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QtiChoice {
    pub identifier: String,
    pub text: String,
}

/// A scorer-view rubric line `[<points>] <text>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubricCriterion {
    /// 1-based ordinal, assigned in parse order.
    pub index: u32,
    pub points: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QtiItem {
    pub identifier: String,
    pub title: String,
    #[serde(rename = "type")]
    pub item_type: QtiItemType,
    pub choices: Vec<QtiChoice>,
    pub rubric: Vec<RubricCriterion>,
    pub candidate_explanation: Option<String>,
}

/// A candidate response: one value, or an ordered / multiple list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseValue {
    Single(String),
    Multiple(Vec<String>),
}

/// One raw `itemResult` entry, before remapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QtiItemResult {
    pub result_identifier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence_index: Option<usize>,
    pub response: Option<ResponseValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Criterion ordinal -> met. Not every criterion has to be present.
    pub rubric_outcomes: BTreeMap<u32, bool>,
}

impl QtiItemResult {
    /// An empty entry for `result_identifier`.
    pub fn empty(result_identifier: impl Into<String>) -> Self {
        Self {
            result_identifier: result_identifier.into(),
            sequence_index: None,
            response: None,
            score: None,
            comment: None,
            rubric_outcomes: BTreeMap::new(),
        }
    }
}

/// One parsed result file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QtiResult {
    pub file_name: String,
    pub sourced_id: String,
    pub candidate_name: String,
    /// Entries in document order; `result_identifier` is unique.
    pub item_results: Vec<QtiItemResult>,
}

impl QtiResult {
    pub fn item_result(&self, result_identifier: &str) -> Option<&QtiItemResult> {
        self.item_results
            .iter()
            .find(|r| r.result_identifier == result_identifier)
    }
}

/// The `sequenceIndex` attribute as found on a raw entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceIndexAttr {
    Absent,
    Invalid(String),
    Valid(usize),
}

/// Validation-grade view of one `itemResult`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultItemRef {
    pub identifier: String,
    pub sequence_index: SequenceIndexAttr,
}
