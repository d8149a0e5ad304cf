//! # Scoring Input
//!
//! Builds and checks the criteria-update payloads that a grader submits for one result file.
//!
//! A payload always carries the **complete** criteria vector of every rubric item it touches,
//! one [`CriterionUpdate`] per criterion in ordinal order. Sending only the toggled criterion
//! would make the receiving side forget the `met` state of every other criterion.
//!
//! # Wire format
//!
//! ```json
//! {
//!   "resultFile": "ada.xml",
//!   "items": [
//!     {
//!       "identifier": "item-1",
//!       "criteria": [
//!         { "index": 1, "met": true, "criterionText": "Mentions moves" },
//!         { "index": 2, "met": false }
//!       ],
//!       "comment": "Good start"
//!     }
//!   ],
//!   "preserveMet": false
//! }
//! ```

use crate::error::QtiError;
use crate::types::{QtiItem, QtiItemResult, RubricCriterion};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One rubric criterion's new state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriterionUpdate {
    /// 1-based ordinal. Optional on input, where the array position implies it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    pub met: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criterion_text: Option<String>,
}

/// The update for one item of a result file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringItem {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criteria: Option<Vec<CriterionUpdate>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Body of `PUT /api/workspaces/{id}/results`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultUpdateRequest {
    pub result_file: String,
    pub items: Vec<ScoringItem>,
    /// Keep criteria that are already recorded as met.
    #[serde(default)]
    pub preserve_met: bool,
}

/// A pending edit of one item, applied on top of the recorded outcomes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoringOverride {
    pub item_id: String,
    pub rubric_outcomes: Option<BTreeMap<u32, bool>>,
    pub comment: Option<String>,
}

/// Complete criteria vector after toggling criterion `toggled_index` to `met`.
///
/// Every other criterion keeps its current outcome; unset outcomes become `false`.
pub fn build_criteria_update(
    rubric: &[RubricCriterion],
    current_outcomes: &BTreeMap<u32, bool>,
    toggled_index: u32,
    met: bool,
) -> Vec<CriterionUpdate> {
    rubric
        .iter()
        .map(|criterion| CriterionUpdate {
            index: Some(criterion.index),
            met: if criterion.index == toggled_index {
                met
            } else {
                current_outcomes.get(&criterion.index).copied().unwrap_or(false)
            },
            criterion_text: Some(criterion.text.clone()),
        })
        .collect()
}

fn criteria_from_outcomes(
    rubric: &[RubricCriterion],
    outcomes: &BTreeMap<u32, bool>,
) -> Vec<CriterionUpdate> {
    rubric
        .iter()
        .map(|criterion| CriterionUpdate {
            index: Some(criterion.index),
            met: outcomes.get(&criterion.index).copied().unwrap_or(false),
            criterion_text: Some(criterion.text.clone()),
        })
        .collect()
}

/// Scoring items for a whole result file (remapped, keyed by canonical item identifier).
///
/// Rubric items always carry their full criteria vector, taken from `override_` for the target
/// item and from the recorded outcomes otherwise. Rubric-less items are only included when the
/// override sets a non-blank comment on them.
pub fn build_scoring_items(
    items: &[QtiItem],
    results: Option<&BTreeMap<String, QtiItemResult>>,
    override_: Option<&ScoringOverride>,
) -> Vec<ScoringItem> {
    let Some(results) = results else {
        return Vec::new();
    };
    let empty = BTreeMap::new();

    let mut scoring = Vec::new();
    for item in items {
        let target = override_.filter(|o| o.item_id == item.identifier);
        let comment = target
            .and_then(|o| o.comment.clone())
            .filter(|c| !c.trim().is_empty());

        if item.rubric.is_empty() {
            if let Some(comment) = comment {
                scoring.push(ScoringItem {
                    identifier: item.identifier.clone(),
                    criteria: None,
                    comment: Some(comment),
                });
            }
            continue;
        }

        let recorded = results
            .get(&item.identifier)
            .map(|r| &r.rubric_outcomes)
            .unwrap_or(&empty);
        let outcomes = target
            .and_then(|o| o.rubric_outcomes.as_ref())
            .unwrap_or(recorded);
        scoring.push(ScoringItem {
            identifier: item.identifier.clone(),
            criteria: Some(criteria_from_outcomes(&item.rubric, outcomes)),
            comment,
        });
    }
    scoring
}

impl ResultUpdateRequest {
    /// Checks the request against the parsed items of the assessment.
    ///
    /// # Errors
    ///
    /// [`QtiError::InvalidUpdate`] for a blank result file, no items, an unknown item identifier,
    /// criteria on a rubric-less item, a criteria array whose length differs from the rubric, or an
    /// explicit criterion index that disagrees with its position.
    pub fn validate_against(&self, items: &[QtiItem]) -> Result<(), QtiError> {
        if self.result_file.trim().is_empty() {
            return Err(QtiError::InvalidUpdate("resultFile is required".into()));
        }
        if self.items.is_empty() {
            return Err(QtiError::InvalidUpdate("items must not be empty".into()));
        }

        for update in &self.items {
            let item = items
                .iter()
                .find(|i| i.identifier == update.identifier)
                .ok_or_else(|| {
                    QtiError::InvalidUpdate(format!("unknown item '{}'", update.identifier))
                })?;
            let Some(criteria) = &update.criteria else {
                continue;
            };
            if item.rubric.is_empty() {
                return Err(QtiError::InvalidUpdate(format!(
                    "item '{}' has no rubric but criteria were sent",
                    item.identifier
                )));
            }
            if criteria.len() != item.rubric.len() {
                return Err(QtiError::InvalidUpdate(format!(
                    "item '{}' expects {} criteria, got {}",
                    item.identifier,
                    item.rubric.len(),
                    criteria.len()
                )));
            }
            for (position, criterion) in criteria.iter().enumerate() {
                let expected = position as u32 + 1;
                if criterion.index.is_some_and(|i| i != expected) {
                    return Err(QtiError::InvalidUpdate(format!(
                        "item '{}' criterion #{expected} carries index {}",
                        item.identifier,
                        criterion.index.unwrap_or_default()
                    )));
                }
            }
        }
        Ok(())
    }
}
