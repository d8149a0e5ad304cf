//! Assessment Test Parser
//!
//! This module provides the [`AssessmentTestParser`], which extracts the ordered list of
//! [`AssessmentItemRef`]s from a `qti-assessment-test` document.
//!
//! # Document Shape
//!
//! ```xml
//! <qti-assessment-test identifier="test-1">
//!   <qti-test-part identifier="part-1">
//!     <qti-assessment-section identifier="section-1">
//!       <qti-assessment-item-ref identifier="item-1" href="items/item-1.qti.xml"/>
//!       <qti-assessment-item-ref identifier="item-2" href="items/item-2.qti.xml"/>
//!     </qti-assessment-section>
//!   </qti-test-part>
//! </qti-assessment-test>
//! ```
//!
//! References are collected from anywhere below the root, in document order. Order is significant:
//! it defines the slots that `sequenceIndex` values and `Q<N>` placeholders point at.
//!
//! # Error Handling
//!
//! Parsing is fail-fast. A wrong root is [`QtiError::MalformedDocument`], a reference without
//! `identifier` or `href` is [`QtiError::MissingAttribute`], and a test with no references is
//! [`QtiError::EmptyAssessment`]. A partially parsed assessment is never returned.

use crate::error::QtiError;
use crate::traits::parser::Parser;
use crate::types::AssessmentItemRef;
use crate::xml::parse_document;

const DOCUMENT: &str = "assessmentTest";
const ROOT: &str = "qti-assessment-test";
const ITEM_REF: &str = "qti-assessment-item-ref";

/// Parser for `qti-assessment-test` documents.
pub struct AssessmentTestParser;

impl<'a> Parser<&'a str, Vec<AssessmentItemRef>> for AssessmentTestParser {
    fn parse(&self, xml: &'a str) -> Result<Vec<AssessmentItemRef>, QtiError> {
        let root = parse_document(xml, DOCUMENT)?;
        if root.local_name() != ROOT {
            return Err(QtiError::malformed(
                DOCUMENT,
                format!("expected <{ROOT}> root, found <{}>", root.name()),
            ));
        }

        let mut refs = Vec::new();
        for (position, el) in root.descendants(ITEM_REF).into_iter().enumerate() {
            let identifier = required_attr(el.attr("identifier"), "identifier", position)?;
            let href = required_attr(el.attr("href"), "href", position)?;
            refs.push(AssessmentItemRef { identifier, href });
        }

        if refs.is_empty() {
            return Err(QtiError::EmptyAssessment);
        }
        Ok(refs)
    }
}

fn required_attr(
    value: Option<&str>,
    attribute: &str,
    position: usize,
) -> Result<String, QtiError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(QtiError::MissingAttribute {
            element: ITEM_REF.to_string(),
            attribute: attribute.to_string(),
            context: format!("item reference #{}", position + 1),
        }),
    }
}

/// Convenience wrapper around [`AssessmentTestParser`].
pub fn parse_assessment_test(xml: &str) -> Result<Vec<AssessmentItemRef>, QtiError> {
    AssessmentTestParser.parse(xml)
}
