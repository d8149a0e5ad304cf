//! # Result Remapping
//!
//! Maps the raw `itemResult` entries of a [`QtiResult`] onto the canonical item identifiers of the
//! assessment test. Result files come from several tools: modern exports carry a `sequenceIndex`,
//! some reuse the item identifiers directly, and legacy exports number their entries `Q1`, `Q2`, ...
//!
//! Each entry is offered to an ordered list of tiers and the first tier that answers wins:
//!
//! | tier | rule |
//! |------|------|
//! | [`RemapTier::Position`] | a valid `sequenceIndex` in `1..=item_count` selects that slot |
//! | [`RemapTier::Identifier`] | the result identifier equals a canonical item identifier |
//! | [`RemapTier::Mapping`] | the legacy mapping CSV names the item (only when a table is set) |
//! | [`RemapTier::QNumber`] | the identifier reads `Q<N>` (any case) with `N` in `1..=item_count` |
//!
//! The workspace store never sets a mapping table: uploads are only accepted when every entry
//! carries a valid `sequenceIndex`, so the position tier answers first for stored results. The
//! mapping tier serves library callers remapping result files that have not been through that
//! validation.
//!
//! Remapping never fails. Unmapped entries are reported in
//! [`RemapResult::missing_result_identifiers`]; when several entries land on the same item the first
//! one wins and the item is reported in [`RemapResult::duplicate_item_identifiers`].
//!
//! # Example
//!
//! ```
//! use qti::remap::ResultRemapper;
//! use qti::types::{AssessmentItemRef, QtiItemResult, QtiResult};
//!
//! let refs = vec![
//!     AssessmentItemRef { identifier: "item-1".into(), href: "item-1.qti.xml".into() },
//!     AssessmentItemRef { identifier: "item-2".into(), href: "item-2.qti.xml".into() },
//! ];
//! let result = QtiResult {
//!     file_name: "r.xml".into(),
//!     sourced_id: "c-1".into(),
//!     candidate_name: "c-1".into(),
//!     item_results: vec![QtiItemResult::empty("q2")],
//! };
//! let remapped = ResultRemapper::new(&refs).remap(&result);
//! assert!(remapped.mapped_item_results.contains_key("item-2"));
//! assert!(remapped.is_clean());
//! ```

use crate::parsers::mapping_parser::MappingTable;
use crate::types::{AssessmentItemRef, QtiItemResult, QtiResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

static Q_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^Q(\d+)$").unwrap());

/// The rule that mapped an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RemapTier {
    Position,
    Identifier,
    Mapping,
    QNumber,
}

/// Result entries keyed by canonical item identifier, plus diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemapResult {
    pub mapped_item_results: BTreeMap<String, QtiItemResult>,
    /// Tier that resolved each canonical identifier.
    pub resolved_by: BTreeMap<String, RemapTier>,
    pub missing_result_identifiers: Vec<String>,
    pub duplicate_item_identifiers: Vec<String>,
}

impl RemapResult {
    /// `true` when every entry mapped and no item was claimed twice.
    pub fn is_clean(&self) -> bool {
        self.missing_result_identifiers.is_empty() && self.duplicate_item_identifiers.is_empty()
    }
}

type TierFn = fn(&ResultRemapper<'_>, &QtiItemResult) -> Option<usize>;

const TIERS: [(RemapTier, TierFn); 4] = [
    (RemapTier::Position, by_position),
    (RemapTier::Identifier, by_identifier),
    (RemapTier::Mapping, by_mapping),
    (RemapTier::QNumber, by_q_number),
];

/// Remaps result files against one assessment test.
pub struct ResultRemapper<'a> {
    item_refs: &'a [AssessmentItemRef],
    mapping: Option<&'a MappingTable>,
}

impl<'a> ResultRemapper<'a> {
    pub fn new(item_refs: &'a [AssessmentItemRef]) -> Self {
        Self {
            item_refs,
            mapping: None,
        }
    }

    /// Enables the mapping-CSV tier, e.g. with a table from
    /// [`parse_mapping_csv`](crate::parsers::mapping_parser::parse_mapping_csv).
    pub fn with_mapping(mut self, mapping: &'a MappingTable) -> Self {
        self.mapping = Some(mapping);
        self
    }

    /// Slot (0-based) of the first tier that maps `entry`.
    pub fn resolve(&self, entry: &QtiItemResult) -> Option<(RemapTier, usize)> {
        TIERS
            .iter()
            .find_map(|(tier, resolve)| resolve(self, entry).map(|slot| (*tier, slot)))
    }

    pub fn remap(&self, result: &QtiResult) -> RemapResult {
        let mut out = RemapResult::default();
        for entry in &result.item_results {
            let Some((tier, slot)) = self.resolve(entry) else {
                out.missing_result_identifiers
                    .push(entry.result_identifier.clone());
                continue;
            };
            let canonical = &self.item_refs[slot].identifier;
            if out.mapped_item_results.contains_key(canonical) {
                if !out.duplicate_item_identifiers.contains(canonical) {
                    out.duplicate_item_identifiers.push(canonical.clone());
                }
                continue;
            }
            out.mapped_item_results
                .insert(canonical.clone(), entry.clone());
            out.resolved_by.insert(canonical.clone(), tier);
        }

        if !out.is_clean() {
            debug!(
                result_file = %result.file_name,
                missing = ?out.missing_result_identifiers,
                duplicates = ?out.duplicate_item_identifiers,
                "result file did not remap cleanly"
            );
        }
        out
    }

    fn slot_of(&self, identifier: &str) -> Option<usize> {
        self.item_refs.iter().position(|r| r.identifier == identifier)
    }

    fn slot_in_range(&self, position: usize) -> Option<usize> {
        (1..=self.item_refs.len())
            .contains(&position)
            .then(|| position - 1)
    }
}

fn by_position(remapper: &ResultRemapper<'_>, entry: &QtiItemResult) -> Option<usize> {
    entry
        .sequence_index
        .and_then(|n| remapper.slot_in_range(n))
}

fn by_identifier(remapper: &ResultRemapper<'_>, entry: &QtiItemResult) -> Option<usize> {
    remapper.slot_of(&entry.result_identifier)
}

fn by_mapping(remapper: &ResultRemapper<'_>, entry: &QtiItemResult) -> Option<usize> {
    let item = remapper.mapping?.item_for_result(&entry.result_identifier)?;
    remapper.slot_of(item)
}

fn by_q_number(remapper: &ResultRemapper<'_>, entry: &QtiItemResult) -> Option<usize> {
    let caps = Q_NUMBER.captures(&entry.result_identifier)?;
    let n = caps[1].parse::<usize>().ok()?;
    remapper.slot_in_range(n)
}

/// Remaps `result` with the three default tiers.
pub fn remap(result: &QtiResult, item_refs: &[AssessmentItemRef]) -> RemapResult {
    ResultRemapper::new(item_refs).remap(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refs(ids: &[&str]) -> Vec<AssessmentItemRef> {
        ids.iter()
            .map(|id| AssessmentItemRef {
                identifier: id.to_string(),
                href: format!("{id}.qti.xml"),
            })
            .collect()
    }

    fn entry(id: &str, seq: Option<usize>) -> QtiItemResult {
        let mut e = QtiItemResult::empty(id);
        e.sequence_index = seq;
        e
    }

    fn result(entries: Vec<QtiItemResult>) -> QtiResult {
        QtiResult {
            file_name: "r.xml".into(),
            sourced_id: "c".into(),
            candidate_name: "c".into(),
            item_results: entries,
        }
    }

    #[test]
    fn test_position_beats_direct_identifier() {
        let refs = refs(&["item-1", "item-2"]);
        let remapped = remap(&result(vec![entry("item-1", Some(2))]), &refs);
        assert_eq!(
            remapped.mapped_item_results["item-2"].result_identifier,
            "item-1"
        );
        assert_eq!(remapped.resolved_by["item-2"], RemapTier::Position);
        assert!(!remapped.mapped_item_results.contains_key("item-1"));
    }

    #[test]
    fn test_out_of_range_sequence_falls_through_to_later_tiers() {
        let refs = refs(&["item-1", "item-2"]);
        let remapped = remap(
            &result(vec![entry("item-1", Some(7)), entry("q2", Some(9))]),
            &refs,
        );
        assert_eq!(remapped.resolved_by["item-1"], RemapTier::Identifier);
        assert_eq!(remapped.resolved_by["item-2"], RemapTier::QNumber);
        assert!(remapped.is_clean());
    }

    #[test]
    fn test_mapping_tier_sits_between_identifier_and_q_number() {
        let refs = refs(&["item-1", "item-2"]);
        let mut table = MappingTable::default();
        table.insert("Q1", "item-2");
        table.insert("LEGACY", "item-1");
        let remapped = ResultRemapper::new(&refs)
            .with_mapping(&table)
            .remap(&result(vec![entry("Q1", None), entry("LEGACY", None)]));
        assert_eq!(remapped.mapped_item_results["item-2"].result_identifier, "Q1");
        assert_eq!(remapped.resolved_by["item-1"], RemapTier::Mapping);
    }

    #[test]
    fn test_unmapped_and_duplicate_diagnostics() {
        let refs = refs(&["item-1"]);
        let remapped = remap(
            &result(vec![
                entry("Q1", Some(1)),
                entry("item-1", Some(1)),
                entry("X1", None),
                entry("Q0", None),
            ]),
            &refs,
        );
        assert_eq!(remapped.mapped_item_results["item-1"].result_identifier, "Q1");
        assert_eq!(remapped.duplicate_item_identifiers, ["item-1"]);
        assert_eq!(remapped.missing_result_identifiers, ["X1", "Q0"]);
        assert!(!remapped.is_clean());
    }

    #[test]
    fn test_remap_is_idempotent() {
        let refs = refs(&["a", "b"]);
        let r = result(vec![entry("Q2", None), entry("a", None)]);
        assert_eq!(remap(&r, &refs), remap(&r, &refs));
    }
}
