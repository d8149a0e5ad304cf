//! Builders for QTI documents, multipart bodies and seeded workspaces.

use axum::{body::Body, http::Request, response::Response};
use serde_json::Value;
use services::workspace::{NewWorkspace, UploadedFile, Workspace};
use services::workspace_service::WorkspaceService;

pub const BOUNDARY: &str = "----BoundaryTest";

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
pub fn result_xml(entries: &[(&str, &str, &[(u32, bool)])]) -> String {
    let body: String = entries
        .iter()
        .map(|(id, seq, outcomes)| {
            let outcomes: String = outcomes
                .iter()
                .map(|(i, met)| {
                    format!(
                        r#"<outcomeVariable identifier="RUBRIC_{i}_MET" cardinality="single" baseType="boolean"><value>{met}</value></outcomeVariable>"#
                    )
                })
                .collect();
            format!(
                r#"<itemResult identifier="{id}" sequenceIndex="{seq}" datestamp="2025-01-01T00:00:00Z" sessionStatus="final">{outcomes}</itemResult>"#
            )
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

/// Assessment package with item-1 (3 + 2 points) and item-2 (1 point).
pub fn assessment_files() -> Vec<(String, String)> {
    vec![
        (
            "assessment-test.qti.xml".into(),
            assessment_test_xml(&[
                ("item-1", "items/item-1.qti.xml"),
                ("item-2", "items/item-2.qti.xml"),
            ]),
        ),
        (
            "items/item-1.qti.xml".into(),
            item_xml("item-1", &[(3.0, "Clear thesis"), (2.0, "Cites evidence")]),
        ),
        (
            "items/item-2.qti.xml".into(),
            item_xml("item-2", &[(1.0, "Formatting")]),
        ),
    ]
}

/// Result scoring 3 on item-1 and 1 on item-2.
pub fn alice_result() -> String {
    result_xml(&[
        ("R1", "1", &[(1, true), (2, false)]),
        ("R2", "2", &[(1, true)]),
    ])
}

/// Stores the sample workspace through the service layer.
pub async fn seed_workspace() -> Workspace {
    let upload = NewWorkspace {
        name: "Midterm".into(),
        description: Some("First sitting".into()),
        assessment_files: assessment_files()
            .into_iter()
            .map(|(name, xml)| UploadedFile::new(name, xml))
            .collect(),
        result_files: vec![UploadedFile::new("alice.xml", alice_result())],
    };
    WorkspaceService::create(upload)
        .await
        .expect("failed to seed workspace")
}

pub enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                        .as_bytes(),
                );
            }
            Part::File(name, file_name, content) => {
                body.extend(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend(*content);
                body.extend(b"\r\n");
            }
        }
    }
    body.extend(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_request(uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn get_json_body(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}
