//! Fixtures shared by the service tests.

use crate::workspace::{NewWorkspace, UploadedFile};

pub fn assessment_test_xml(refs: &[(&str, &str)]) -> String {
    let refs: String = refs
        .iter()
        .map(|(id, href)| format!(r#"<qti-assessment-item-ref identifier="{id}" href="{href}"/>"#))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<qti-assessment-test xmlns="http://www.imsglobal.org/xsd/imsqtiasi_v3p0" identifier="midterm" title="Midterm">
  <qti-test-part identifier="part-1">
    <qti-assessment-section identifier="section-1" title="Section 1">{refs}</qti-assessment-section>
  </qti-test-part>
</qti-assessment-test>"#
    )
}

pub fn item_xml(id: &str, criteria: &[(f64, &str)]) -> String {
    let lines: String = criteria
        .iter()
        .map(|(points, text)| format!("<qti-p>[{points}] {text}</qti-p>"))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<qti-assessment-item xmlns="http://www.imsglobal.org/xsd/imsqtiasi_v3p0" identifier="{id}" title="{id}">
  <qti-item-body>
    <qti-p>Explain.</qti-p>
    <qti-extended-text-interaction response-identifier="RESPONSE"/>
    <qti-rubric-block view="scorer">{lines}</qti-rubric-block>
  </qti-item-body>
</qti-assessment-item>"#
    )
}

/// `(identifier, sequenceIndex, [(criterion, met)])` per entry.
pub fn result_xml(entries: &[(&str, Option<&str>, &[(u32, bool)])]) -> String {
    let body: String = entries
        .iter()
        .map(|(id, seq, outcomes)| {
            let seq = seq
                .map(|s| format!(r#" sequenceIndex="{s}""#))
                .unwrap_or_default();
            let outcomes: String = outcomes
                .iter()
                .map(|(i, met)| {
                    format!(
                        r#"<outcomeVariable identifier="RUBRIC_{i}_MET" cardinality="single" baseType="boolean"><value>{met}</value></outcomeVariable>"#
                    )
                })
                .collect();
            format!(r#"<itemResult identifier="{id}"{seq} datestamp="2025-01-01T00:00:00Z" sessionStatus="final">{outcomes}</itemResult>"#)
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<assessmentResult xmlns="http://www.imsglobal.org/xsd/imsqti_result_v3p0">
  <context sourcedId="alice"/>
  {body}
</assessmentResult>"#
    )
}

/// Two rubric items (5 and 1 points) and one result scoring 3 + 1.
pub fn sample_upload() -> NewWorkspace {
    NewWorkspace {
        name: "Midterm".into(),
        description: None,
        assessment_files: vec![
            UploadedFile::new(
                "assessment-test.qti.xml",
                assessment_test_xml(&[
                    ("item-1", "items/item-1.qti.xml"),
                    ("item-2", "items/item-2.qti.xml"),
                ]),
            ),
            UploadedFile::new(
                "items/item-1.qti.xml",
                item_xml("item-1", &[(3.0, "Clear thesis"), (2.0, "Cites evidence")]),
            ),
            UploadedFile::new("items/item-2.qti.xml", item_xml("item-2", &[(1.0, "Formatting")])),
        ],
        result_files: vec![UploadedFile::new(
            "alice.xml",
            result_xml(&[
                ("R1", Some("1"), &[(1, true), (2, false)]),
                ("R2", Some("2"), &[(1, true)]),
            ]),
        )],
    }
}
