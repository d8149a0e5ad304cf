//! # Result Update
//!
//! Applies a [`ResultUpdateRequest`] to the XML of one result file and returns the rewritten
//! document. The function is pure; the caller owns reading and writing the file.
//!
//! For every requested item the backing `itemResult` is located through the remapper, then:
//!
//! - each criterion `i` is written to the boolean outcome `RUBRIC_<i>_MET`;
//! - with criteria, `SCORE` is set to the rubric score of the resulting outcomes;
//! - with a comment, `COMMENT` is set.
//!
//! Existing outcome variables keep their position and attributes and only have their `value`
//! replaced. New ones are appended to the `itemResult` using its namespace prefix. Everything
//! else in the document is written back untouched.

use crate::error::QtiError;
use crate::parsers::result_parser::parse_result;
use crate::remap::remap;
use crate::scorer::rubric_score;
use crate::scoring_input::ResultUpdateRequest;
use crate::types::{AssessmentItemRef, QtiItem};
use crate::xml::{XmlElement, XmlNode, parse_document};
use std::collections::BTreeMap;
use tracing::debug;

/// Outcome writes for one `itemResult`.
#[derive(Debug, Default)]
struct OutcomeWrites {
    /// `(identifier, baseType, value)` in write order.
    values: Vec<(String, &'static str, String)>,
}

impl OutcomeWrites {
    fn push(&mut self, identifier: impl Into<String>, base_type: &'static str, value: String) {
        self.values.push((identifier.into(), base_type, value));
    }
}

/// Rewrites `result_xml` according to `request`.
///
/// # Errors
///
/// - [`QtiError::InvalidUpdate`] when the request violates the update contract or names an item
///   that has no `itemResult` in this file.
/// - [`QtiError::MalformedDocument`] when the result XML does not parse.
pub fn apply_result_update(
    result_xml: &str,
    item_refs: &[AssessmentItemRef],
    items: &[QtiItem],
    request: &ResultUpdateRequest,
) -> Result<String, QtiError> {
    request.validate_against(items)?;

    let parsed = parse_result(result_xml, &request.result_file)?;
    let remapped = remap(&parsed, item_refs);
    let mut root = parse_document(result_xml, &request.result_file)?;

    for update in &request.items {
        let entry = remapped
            .mapped_item_results
            .get(&update.identifier)
            .ok_or_else(|| {
                QtiError::InvalidUpdate(format!(
                    "{} has no itemResult for item '{}'",
                    request.result_file, update.identifier
                ))
            })?;
        let Some(item) = items.iter().find(|i| i.identifier == update.identifier) else {
            continue;
        };

        let mut writes = OutcomeWrites::default();
        if let Some(criteria) = &update.criteria {
            let mut outcomes: BTreeMap<u32, bool> = BTreeMap::new();
            for (criterion, change) in item.rubric.iter().zip(criteria) {
                let kept = request.preserve_met
                    && entry.rubric_outcomes.get(&criterion.index) == Some(&true);
                let met = change.met || kept;
                outcomes.insert(criterion.index, met);
                writes.push(
                    format!("RUBRIC_{}_MET", criterion.index),
                    "boolean",
                    met.to_string(),
                );
            }
            writes.push("SCORE", "float", rubric_score(item, &outcomes).to_string());
        }
        if let Some(comment) = &update.comment {
            writes.push("COMMENT", "string", comment.clone());
        }

        apply_to_last_item_result(&mut root, &entry.result_identifier, &writes);
        debug!(
            result_file = %request.result_file,
            item = %update.identifier,
            outcomes = writes.values.len(),
            "applied result update"
        );
    }

    root.to_document_string()
}

/// Applies `writes` to the last `itemResult` carrying `identifier`, matching the parser, which
/// lets a repeated identifier replace the earlier entry.
fn apply_to_last_item_result(root: &mut XmlElement, identifier: &str, writes: &OutcomeWrites) {
    let is_target =
        |el: &XmlElement| el.local_name() == "itemResult" && el.attr("identifier") == Some(identifier);
    let total = root
        .descendants("itemResult")
        .into_iter()
        .filter(|el| is_target(*el))
        .count();

    let mut seen = 0;
    root.visit_descendants_mut(&mut |el| {
        if !is_target(&*el) {
            return;
        }
        seen += 1;
        if seen == total {
            for (outcome, base_type, value) in &writes.values {
                upsert_outcome(el, outcome, base_type, value);
            }
        }
    });
}

fn qualified(prefix: Option<&str>, local: &str) -> String {
    match prefix {
        Some(p) => format!("{p}:{local}"),
        None => local.to_string(),
    }
}

fn upsert_outcome(item_result: &mut XmlElement, identifier: &str, base_type: &str, value: &str) {
    let prefix = item_result.prefix().map(str::to_string);

    let existing = item_result.child_elements_mut().find(|child| {
        child.local_name() == "outcomeVariable" && child.attr("identifier") == Some(identifier)
    });
    if let Some(variable) = existing {
        if let Some(value_el) = variable
            .child_elements_mut()
            .find(|child| child.local_name() == "value")
        {
            value_el.set_text(value);
        } else {
            let value_name = qualified(variable.prefix(), "value");
            variable.children_mut().push(XmlNode::Element(
                XmlElement::new(value_name).with_child(XmlNode::Text(value.to_string())),
            ));
        }
        return;
    }

    let variable = XmlElement::new(qualified(prefix.as_deref(), "outcomeVariable"))
        .with_attr("identifier", identifier)
        .with_attr("cardinality", "single")
        .with_attr("baseType", base_type)
        .with_child(XmlNode::Element(
            XmlElement::new(qualified(prefix.as_deref(), "value"))
                .with_child(XmlNode::Text(value.to_string())),
        ));
    item_result.children_mut().push(XmlNode::Element(variable));
}
