//! # Scorer Module
//!
//! Pure scoring functions over parsed items and remapped results.
//!
//! Rubric criteria are authoritative: for an item with at least one criterion, the score is always
//! the sum of the met criteria, even when a result file still carries an older explicit `SCORE`.
//! Editing a single criterion therefore updates the displayed total without waiting for the
//! persisted `SCORE` to be recomputed. Only rubric-less items fall back to the explicit `SCORE`.

use crate::types::{QtiItem, QtiItemResult, RubricCriterion};
use std::collections::BTreeMap;

fn points(criterion: &RubricCriterion) -> f64 {
    if criterion.points.is_finite() {
        criterion.points
    } else {
        0.0
    }
}

/// Sum of all criterion points. Non-finite points count as 0.
///
/// # Example
///
/// ```
/// use qti::scorer::max_score;
/// use qti::types::{QtiItem, QtiItemType, RubricCriterion};
///
/// let item = QtiItem {
///     identifier: "item-1".into(),
///     title: "Essay".into(),
///     item_type: QtiItemType::Descriptive,
///     choices: vec![],
///     rubric: vec![
///         RubricCriterion { index: 1, points: 2.0, text: "a".into() },
///         RubricCriterion { index: 2, points: f64::NAN, text: "b".into() },
///     ],
///     candidate_explanation: None,
/// };
/// assert_eq!(max_score(&item), 2.0);
/// ```
pub fn max_score(item: &QtiItem) -> f64 {
    item.rubric.iter().map(points).sum()
}

/// Sum of points of the criteria whose ordinal is recorded as met.
///
/// Unset and `false` outcomes contribute nothing, and keys that match no criterion are ignored.
pub fn rubric_score(item: &QtiItem, outcomes: &BTreeMap<u32, bool>) -> f64 {
    item.rubric
        .iter()
        .filter(|c| outcomes.get(&c.index).copied().unwrap_or(false))
        .map(points)
        .sum()
}

/// Score of one item for one candidate.
///
/// - With a rubric: the rubric score of the recorded outcomes (0 when there is no result).
/// - Without a rubric: the explicit `SCORE` of the result, if any.
///
/// Returns `None` when neither source exists.
pub fn item_score(item: &QtiItem, result: Option<&QtiItemResult>) -> Option<f64> {
    if !item.rubric.is_empty() {
        let empty = BTreeMap::new();
        let outcomes = result.map(|r| &r.rubric_outcomes).unwrap_or(&empty);
        return Some(rubric_score(item, outcomes));
    }
    result.and_then(|r| r.score)
}

pub fn total_max_score(items: &[QtiItem]) -> f64 {
    items.iter().map(max_score).sum()
}

/// Sum of [`item_score`] over `items`, looking results up by canonical identifier. Items without a
/// score count as 0.
pub fn total_score(items: &[QtiItem], results: &BTreeMap<String, QtiItemResult>) -> f64 {
    items
        .iter()
        .filter_map(|item| item_score(item, results.get(&item.identifier)))
        .sum()
}
