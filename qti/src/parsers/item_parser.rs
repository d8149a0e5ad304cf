//! Item Parser
//!
//! This module provides the [`ItemParser`] for `qti-assessment-item` documents and the
//! identifier readers: [`read_item_identifier`], which the consistency validator runs on every
//! referenced item, and its lenient form [`extract_item_identifier`].
//!
//! # What is extracted
//!
//! - `identifier` and `title` of the root (the title falls back to the identifier).
//! - The item [`QtiItemType`], inferred from the interactions in `qti-item-body` by
//!   [`classify_item`]: a choice interaction makes a choice item, else a text-entry interaction
//!   makes a cloze item, else the item is descriptive.
//! - `qti-simple-choice` options, for choice items only.
//! - The scorer rubric: each `qti-p` line of the first `qti-rubric-block view="scorer"` that reads
//!   `[<points>] <text>`. Lines that do not match are skipped and do not consume an index.
//! - The candidate explanation: text of the first `qti-rubric-block view="candidate"`.
//!
//! # Error Handling
//!
//! Unparsable XML, a root other than `qti-assessment-item`, or a missing `qti-item-body` are
//! reported as [`QtiError::MalformedDocument`].

use crate::error::QtiError;
use crate::traits::parser::Parser;
use crate::types::{QtiChoice, QtiItem, QtiItemType, RubricCriterion};
use crate::xml::{XmlElement, parse_document};
use once_cell::sync::Lazy;
use regex::Regex;

const DOCUMENT: &str = "item";
const ROOT: &str = "qti-assessment-item";

static RUBRIC_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[([\d.]+)\]\s+(.+)$").unwrap());

/// Parser for `qti-assessment-item` documents.
pub struct ItemParser;

impl<'a> Parser<&'a str, QtiItem> for ItemParser {
    fn parse(&self, xml: &'a str) -> Result<QtiItem, QtiError> {
        let root = parse_document(xml, DOCUMENT)?;
        if root.local_name() != ROOT {
            return Err(QtiError::malformed(
                DOCUMENT,
                format!("expected <{ROOT}> root, found <{}>", root.name()),
            ));
        }

        let identifier = root.attr("identifier").unwrap_or_default().to_string();
        let title = root
            .attr("title")
            .map(str::to_string)
            .unwrap_or_else(|| identifier.clone());
        let body = root
            .first_descendant("qti-item-body")
            .ok_or_else(|| QtiError::malformed(DOCUMENT, "qti-item-body not found"))?;

        let item_type = classify_item(body);
        let choices = if item_type == QtiItemType::Choice {
            body.descendants("qti-simple-choice")
                .into_iter()
                .map(|choice| QtiChoice {
                    identifier: choice.attr("identifier").unwrap_or_default().to_string(),
                    text: choice.text_content().trim().to_string(),
                })
                .collect()
        } else {
            Vec::new()
        };

        Ok(QtiItem {
            identifier,
            title,
            item_type,
            choices,
            rubric: parse_rubric(body),
            candidate_explanation: parse_candidate_explanation(body),
        })
    }
}

/// Classifies an item body by the interactions it contains.
pub fn classify_item(body: &XmlElement) -> QtiItemType {
    if body.first_descendant("qti-choice-interaction").is_some() {
        QtiItemType::Choice
    } else if body.first_descendant("qti-text-entry-interaction").is_some() {
        QtiItemType::Cloze
    } else {
        QtiItemType::Descriptive
    }
}

fn rubric_block<'a>(body: &'a XmlElement, view: &str) -> Option<&'a XmlElement> {
    body.descendants("qti-rubric-block")
        .into_iter()
        .find(|block| block.attr("view") == Some(view))
}

fn parse_rubric(body: &XmlElement) -> Vec<RubricCriterion> {
    let Some(scorer) = rubric_block(body, "scorer") else {
        return Vec::new();
    };
    let mut criteria = Vec::new();
    for line in scorer.descendants("qti-p") {
        let text = line.text_content();
        let Some(caps) = RUBRIC_LINE.captures(text.trim()) else {
            continue;
        };
        criteria.push(RubricCriterion {
            index: criteria.len() as u32 + 1,
            points: caps[1].parse::<f64>().unwrap_or(f64::NAN),
            text: caps[2].trim().to_string(),
        });
    }
    criteria
}

fn parse_candidate_explanation(body: &XmlElement) -> Option<String> {
    let candidate = rubric_block(body, "candidate")?;
    let lines: Vec<String> = candidate
        .descendants("qti-p")
        .into_iter()
        .map(|p| p.text_content().trim().to_string())
        .collect();
    Some(lines.join("\n"))
}

/// Convenience wrapper around [`ItemParser`].
pub fn parse_item(xml: &str) -> Result<QtiItem, QtiError> {
    ItemParser.parse(xml)
}

/// Reads the root `identifier` of an item document.
///
/// # Errors
///
/// [`QtiError::MalformedDocument`] when the XML does not parse and [`QtiError::MissingAttribute`]
/// when the root carries no (or a blank) `identifier`. `context` names the document in the latter.
pub fn read_item_identifier(xml: &str, context: &str) -> Result<String, QtiError> {
    let root = parse_document(xml, DOCUMENT)?;
    match root.attr("identifier").map(str::trim) {
        Some(id) if !id.is_empty() => Ok(id.to_string()),
        _ => Err(QtiError::MissingAttribute {
            element: root.local_name().to_string(),
            attribute: "identifier".into(),
            context: context.to_string(),
        }),
    }
}

/// Extracts the root `identifier` of an item document, regardless of namespace prefix.
pub fn extract_item_identifier(xml: &str) -> Option<String> {
    read_item_identifier(xml, DOCUMENT).ok()
}
