//! Result Parser
//!
//! This module parses QTI `assessmentResult` documents, one per candidate, in two views:
//!
//! - [`ResultParser`] produces the full [`QtiResult`] consumed by the remapper and the grading
//!   views: responses, `SCORE`, `COMMENT` and the `RUBRIC_<N>_MET` flags of every `itemResult`.
//! - [`parse_result_item_refs`] produces the validation-grade [`ResultItemRef`] list, keeping
//!   malformed `sequenceIndex` values visible so that the consistency validator can report them.
//!
//! # Document Shape
//!
//! ```xml
//! <assessmentResult xmlns="http://www.imsglobal.org/xsd/imsqti_result_v3p0">
//!   <context sourcedId="candidate-1">
//!     <sessionIdentifier sourceID="candidateName" identifier="Ada"/>
//!   </context>
//!   <itemResult identifier="Q1" sequenceIndex="1" sessionStatus="final">
//!     <responseVariable identifier="RESPONSE" cardinality="single" baseType="string">
//!       <candidateResponse><value>a</value></candidateResponse>
//!     </responseVariable>
//!     <outcomeVariable identifier="SCORE" cardinality="single" baseType="float"><value>2</value></outcomeVariable>
//!     <outcomeVariable identifier="RUBRIC_1_MET" cardinality="single" baseType="boolean"><value>true</value></outcomeVariable>
//!   </itemResult>
//! </assessmentResult>
//! ```

use crate::error::QtiError;
use crate::traits::parser::Parser;
use crate::types::{QtiItemResult, QtiResult, ResponseValue, ResultItemRef, SequenceIndexAttr};
use crate::xml::{XmlElement, parse_document};
use once_cell::sync::Lazy;
use regex::Regex;

const DOCUMENT: &str = "results";

static RUBRIC_OUTCOME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^RUBRIC_(\d+)_MET$").unwrap());

/// Parser for one result file. Carries the file name, which is part of the parsed [`QtiResult`]
/// and the last fallback for the candidate name.
pub struct ResultParser<'f> {
    file_name: &'f str,
}

impl<'f> ResultParser<'f> {
    pub fn new(file_name: &'f str) -> Self {
        Self { file_name }
    }
}

impl<'a> Parser<&'a str, QtiResult> for ResultParser<'_> {
    fn parse(&self, xml: &'a str) -> Result<QtiResult, QtiError> {
        let root = parse_document(xml, DOCUMENT)?;
        let context = root.first_descendant("context");
        let sourced_id = context
            .and_then(|c| c.attr("sourcedId"))
            .unwrap_or_default()
            .to_string();

        let candidate_name = context
            .and_then(|c| {
                c.descendants("sessionIdentifier")
                    .into_iter()
                    .find(|s| s.attr("sourceID") == Some("candidateName"))
            })
            .and_then(|s| s.attr("identifier"))
            .map(str::to_string)
            .unwrap_or_else(|| {
                if sourced_id.is_empty() {
                    self.file_name.to_string()
                } else {
                    sourced_id.clone()
                }
            });

        let mut item_results: Vec<QtiItemResult> = Vec::new();
        for el in root.descendants("itemResult") {
            let entry = parse_item_result(el);
            match item_results
                .iter_mut()
                .find(|r| r.result_identifier == entry.result_identifier)
            {
                Some(existing) => *existing = entry,
                None => item_results.push(entry),
            }
        }

        Ok(QtiResult {
            file_name: self.file_name.to_string(),
            sourced_id,
            candidate_name,
            item_results,
        })
    }
}

/// Convenience wrapper around [`ResultParser`].
pub fn parse_result(xml: &str, file_name: &str) -> Result<QtiResult, QtiError> {
    ResultParser::new(file_name).parse(xml)
}

fn parse_item_result(el: &XmlElement) -> QtiItemResult {
    let mut entry = QtiItemResult::empty(el.attr("identifier").unwrap_or_default());
    entry.sequence_index = match read_sequence_index(el) {
        SequenceIndexAttr::Valid(n) => Some(n),
        _ => None,
    };

    entry.response = el
        .descendants("responseVariable")
        .into_iter()
        .find(|rv| rv.attr("identifier") == Some("RESPONSE"))
        .and_then(|rv| rv.first_descendant("candidateResponse"))
        .and_then(|cr| {
            let mut values: Vec<String> = cr
                .descendants("value")
                .into_iter()
                .map(XmlElement::text_content)
                .collect();
            match values.len() {
                0 => None,
                1 => values.pop().map(ResponseValue::Single),
                _ => Some(ResponseValue::Multiple(values)),
            }
        });

    for outcome in el.descendants("outcomeVariable") {
        let identifier = outcome.attr("identifier").unwrap_or_default();
        let value = outcome.first_descendant("value").map(XmlElement::text_content);
        match identifier {
            "SCORE" => {
                entry.score = value
                    .filter(|v| !v.trim().is_empty())
                    .and_then(|v| v.trim().parse::<f64>().ok());
            }
            "COMMENT" => entry.comment = value,
            other => {
                let Some(caps) = RUBRIC_OUTCOME.captures(other) else {
                    continue;
                };
                let Ok(index) = caps[1].parse::<u32>() else {
                    continue;
                };
                match value.as_deref() {
                    Some("true") => {
                        entry.rubric_outcomes.insert(index, true);
                    }
                    Some("false") => {
                        entry.rubric_outcomes.insert(index, false);
                    }
                    _ => {}
                }
            }
        }
    }
    entry
}

fn read_sequence_index(el: &XmlElement) -> SequenceIndexAttr {
    match el.attr("sequenceIndex") {
        None => SequenceIndexAttr::Absent,
        Some(raw) => match raw.trim().parse::<usize>() {
            Ok(n) if n > 0 => SequenceIndexAttr::Valid(n),
            _ => SequenceIndexAttr::Invalid(raw.to_string()),
        },
    }
}

/// Reads the identifier and `sequenceIndex` of every `itemResult` in a result file.
///
/// Problems are returned alongside the entries instead of aborting: an entry without an
/// identifier is skipped with [`QtiError::MissingAttribute`], a malformed `sequenceIndex` is kept
/// as [`SequenceIndexAttr::Invalid`] and reported as [`QtiError::InvalidSequenceIndex`], and a
/// document that does not parse or has no `itemResult` yields [`QtiError::MalformedDocument`].
pub fn parse_result_item_refs(
    xml: &str,
    result_file: &str,
) -> (Vec<ResultItemRef>, Vec<QtiError>) {
    let mut refs = Vec::new();
    let mut errors = Vec::new();

    let root = match parse_document(xml, result_file) {
        Ok(root) => root,
        Err(err) => return (refs, vec![err]),
    };
    let entries = root.descendants("itemResult");
    if entries.is_empty() {
        errors.push(QtiError::malformed(result_file, "no itemResult elements found"));
        return (refs, errors);
    }

    for (position, el) in entries.into_iter().enumerate() {
        let identifier = match el.attr("identifier").map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                errors.push(QtiError::MissingAttribute {
                    element: "itemResult".into(),
                    attribute: "identifier".into(),
                    context: format!("{result_file} (entry #{})", position + 1),
                });
                continue;
            }
        };
        let sequence_index = read_sequence_index(el);
        if let SequenceIndexAttr::Invalid(raw) = &sequence_index {
            errors.push(QtiError::InvalidSequenceIndex {
                result_file: result_file.to_string(),
                identifier: identifier.clone(),
                raw: raw.clone(),
            });
        }
        refs.push(ResultItemRef {
            identifier,
            sequence_index,
        });
    }
    (refs, errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const RESULT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<assessmentResult xmlns="http://www.imsglobal.org/xsd/imsqti_result_v3p0">
  <context sourcedId="candidate-1">
    <sessionIdentifier sourceID="candidateName" identifier="Ada Lovelace"/>
  </context>
  <itemResult identifier="Q1" sequenceIndex="1" sessionStatus="final">
    <responseVariable identifier="RESPONSE" cardinality="single" baseType="string">
      <candidateResponse><value>a</value></candidateResponse>
    </responseVariable>
    <outcomeVariable identifier="SCORE" cardinality="single" baseType="float"><value>1.5</value></outcomeVariable>
    <outcomeVariable identifier="COMMENT" cardinality="single" baseType="string"><value>ok</value></outcomeVariable>
    <outcomeVariable identifier="RUBRIC_1_MET" baseType="boolean"><value>true</value></outcomeVariable>
    <outcomeVariable identifier="RUBRIC_2_MET" baseType="boolean"><value>false</value></outcomeVariable>
    <outcomeVariable identifier="RUBRIC_3_MET" baseType="boolean"><value>yes</value></outcomeVariable>
  </itemResult>
  <itemResult identifier="Q2" sequenceIndex="0">
    <responseVariable identifier="RESPONSE" cardinality="multiple">
      <candidateResponse><value>x</value><value>y</value></candidateResponse>
    </responseVariable>
  </itemResult>
</assessmentResult>"#;

    #[test]
    fn test_parse_result_reads_context_and_outcomes() {
        let result = parse_result(RESULT, "ada.xml").unwrap();
        assert_eq!(result.file_name, "ada.xml");
        assert_eq!(result.sourced_id, "candidate-1");
        assert_eq!(result.candidate_name, "Ada Lovelace");
        assert_eq!(result.item_results.len(), 2);

        let q1 = result.item_result("Q1").unwrap();
        assert_eq!(q1.sequence_index, Some(1));
        assert_eq!(q1.response, Some(ResponseValue::Single("a".into())));
        assert_eq!(q1.score, Some(1.5));
        assert_eq!(q1.comment.as_deref(), Some("ok"));
        assert_eq!(q1.rubric_outcomes.get(&1), Some(&true));
        assert_eq!(q1.rubric_outcomes.get(&2), Some(&false));
        assert!(!q1.rubric_outcomes.contains_key(&3));

        let q2 = result.item_result("Q2").unwrap();
        assert_eq!(q2.sequence_index, None);
        assert_eq!(
            q2.response,
            Some(ResponseValue::Multiple(vec!["x".into(), "y".into()]))
        );
        assert_eq!(q2.score, None);
    }

    #[test]
    fn test_candidate_name_falls_back_to_sourced_id_then_file_name() {
        let with_id = r#"<assessmentResult><context sourcedId="s-9"/><itemResult identifier="A"/></assessmentResult>"#;
        assert_eq!(parse_result(with_id, "f.xml").unwrap().candidate_name, "s-9");
        let bare = r#"<assessmentResult><itemResult identifier="A"/></assessmentResult>"#;
        let parsed = parse_result(bare, "f.xml").unwrap();
        assert_eq!(parsed.candidate_name, "f.xml");
        assert_eq!(parsed.sourced_id, "");
    }

    #[test]
    fn test_repeated_identifier_replaces_in_place() {
        let xml = r#"<assessmentResult>
  <itemResult identifier="A"><outcomeVariable identifier="SCORE"><value>1</value></outcomeVariable></itemResult>
  <itemResult identifier="B"/>
  <itemResult identifier="A"><outcomeVariable identifier="SCORE"><value>3</value></outcomeVariable></itemResult>
</assessmentResult>"#;
        let result = parse_result(xml, "r.xml").unwrap();
        let ids: Vec<&str> = result
            .item_results
            .iter()
            .map(|r| r.result_identifier.as_str())
            .collect();
        assert_eq!(ids, ["A", "B"]);
        assert_eq!(result.item_results[0].score, Some(3.0));
    }

    #[test]
    fn test_item_refs_report_invalid_and_missing() {
        let xml = r#"<assessmentResult>
  <itemResult identifier="A" sequenceIndex="1"/>
  <itemResult identifier="B" sequenceIndex="two"/>
  <itemResult sequenceIndex="3"/>
  <itemResult identifier="D"/>
</assessmentResult>"#;
        let (refs, errors) = parse_result_item_refs(xml, "r.xml");
        assert_eq!(refs.len(), 3);
        assert_eq!(refs[0].sequence_index, SequenceIndexAttr::Valid(1));
        assert_eq!(refs[1].sequence_index, SequenceIndexAttr::Invalid("two".into()));
        assert_eq!(refs[2].sequence_index, SequenceIndexAttr::Absent);
        let kinds: Vec<ErrorKind> = errors.iter().map(QtiError::kind).collect();
        assert_eq!(
            kinds,
            [ErrorKind::InvalidSequenceIndex, ErrorKind::MissingAttribute]
        );
    }

    #[test]
    fn test_item_refs_without_entries_is_malformed() {
        let (refs, errors) = parse_result_item_refs("<assessmentResult/>", "r.xml");
        assert!(refs.is_empty());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), ErrorKind::MalformedDocument);
        assert!(errors[0].to_string().contains("r.xml"));
    }
}
