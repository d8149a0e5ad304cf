#[cfg(test)]
mod tests {
    use crate::helpers::app::make_test_app;
    use crate::helpers::fixtures::{
        Part, alice_result, assessment_files, body_bytes, empty_request, get_json_body,
        multipart_request, result_xml, seed_workspace,
    };
    use axum::http::StatusCode;
    use serial_test::serial;
    use services::workspace_service::WorkspaceService;
    use tower::ServiceExt;
    use util::paths::workspace_dir;

    fn upload_parts<'a>(
        name: &'a str,
        assessment: &'a [(String, String)],
        results: &'a [(&'a str, String)],
    ) -> Vec<Part<'a>> {
        let mut parts = vec![Part::Text("name", name)];
        for (path, xml) in assessment {
            parts.push(Part::File("assessmentFiles", path, xml.as_bytes()));
        }
        for (file_name, xml) in results {
            parts.push(Part::File("results", file_name, xml.as_bytes()));
        }
        parts
    }

    #[tokio::test]
    #[serial]
    async fn create_stores_a_consistent_upload() {
        let (app, _storage) = make_test_app();
        let assessment = assessment_files();
        let results = [("alice.xml", alice_result())];

        let mut parts = upload_parts("Midterm", &assessment, &results);
        parts.push(Part::Text("description", "First sitting"));
        let response = app
            .oneshot(multipart_request("/api/workspaces", &parts))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let json = get_json_body(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Workspace created successfully");
        assert_eq!(json["data"]["itemCount"], 2);
        assert_eq!(json["data"]["resultCount"], 1);
        assert_eq!(json["data"]["description"], "First sitting");

        let id = json["data"]["id"].as_str().unwrap();
        assert!(id.starts_with("ws_"));
        assert!(workspace_dir(id).join("results/alice.xml").is_file());
    }

    #[tokio::test]
    #[serial]
    async fn create_drops_a_shared_folder_prefix() {
        let (app, _storage) = make_test_app();
        let assessment: Vec<(String, String)> = assessment_files()
            .into_iter()
            .map(|(path, xml)| (format!("package/{path}"), xml))
            .collect();
        let results = [("alice.xml", alice_result())];

        let parts = upload_parts("Midterm", &assessment, &results);
        let response = app
            .oneshot(multipart_request("/api/workspaces", &parts))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let json = get_json_body(response).await;
        assert_eq!(json["data"]["assessmentTestFile"], "assessment-test.qti.xml");
        assert_eq!(json["data"]["itemFiles"][0], "items/item-1.qti.xml");
    }

    #[tokio::test]
    #[serial]
    async fn create_reports_every_consistency_problem() {
        let (app, storage) = make_test_app();
        let assessment = assessment_files();
        let results = [("alice.xml", result_xml(&[("R1", "1", &[])]))];

        let parts = upload_parts("Midterm", &assessment, &results);
        let response = app
            .oneshot(multipart_request("/api/workspaces", &parts))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = get_json_body(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(
            json["data"],
            serde_json::json!(["alice.xml has no itemResult with sequenceIndex=2"])
        );
        assert_eq!(std::fs::read_dir(storage.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    #[serial]
    async fn create_requires_name_and_both_file_sets() {
        let (app, _storage) = make_test_app();
        let assessment = assessment_files();
        let results = [("alice.xml", alice_result())];

        let nameless = upload_parts("", &assessment, &results);
        let response = app
            .clone()
            .oneshot(multipart_request("/api/workspaces", &nameless))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let no_results = upload_parts("Midterm", &assessment, &[]);
        let response = app
            .oneshot(multipart_request("/api/workspaces", &no_results))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    #[serial]
    async fn create_rejects_traversal_paths() {
        let (app, _storage) = make_test_app();
        let mut assessment = assessment_files();
        assessment.push(("../escape.xml".into(), "<x/>".into()));
        let results = [("alice.xml", alice_result())];

        let parts = upload_parts("Midterm", &assessment, &results);
        let response = app
            .oneshot(multipart_request("/api/workspaces", &parts))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    async fn exported_archive(app: &axum::Router, id: &str) -> Vec<u8> {
        let uri = format!("/api/workspaces/{id}/export");
        let response = app.clone().oneshot(empty_request("GET", &uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        body_bytes(response).await
    }

    #[tokio::test]
    #[serial]
    async fn import_restores_a_deleted_workspace() {
        let (app, _storage) = make_test_app();
        let ws = seed_workspace().await;
        let archive = exported_archive(&app, &ws.id).await;
        WorkspaceService::delete(&ws.id).await.unwrap();

        let parts = [Part::File("archive", "export.zip", &archive)];
        let response = app
            .oneshot(multipart_request("/api/workspaces/import", &parts))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let json = get_json_body(response).await;
        assert_eq!(json["data"]["workspaceIds"], serde_json::json!([ws.id.clone()]));
        assert_eq!(json["data"]["manifest"]["version"], 1);

        let restored = WorkspaceService::get(&ws.id).await.unwrap();
        assert_eq!(restored.name, "Midterm");
    }

    #[tokio::test]
    #[serial]
    async fn import_conflicts_unless_overwrite_is_requested() {
        let (app, _storage) = make_test_app();
        let ws = seed_workspace().await;
        let archive = exported_archive(&app, &ws.id).await;

        let reject = [
            Part::Text("mode", "reject"),
            Part::File("archive", "export.zip", &archive),
        ];
        let response = app
            .clone()
            .oneshot(multipart_request("/api/workspaces/import", &reject))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let overwrite = [
            Part::Text("mode", "overwrite"),
            Part::File("archive", "export.zip", &archive),
        ];
        let response = app
            .oneshot(multipart_request("/api/workspaces/import", &overwrite))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    #[serial]
    async fn import_rejects_bad_input() {
        let (app, _storage) = make_test_app();

        let cases: Vec<Vec<Part<'_>>> = vec![
            vec![],
            vec![Part::File("archive", "export.zip", b"not a zip")],
            vec![
                Part::Text("mode", "merge"),
                Part::File("archive", "export.zip", b"not a zip"),
            ],
        ];
        for parts in cases {
            let response = app
                .clone()
                .oneshot(multipart_request("/api/workspaces/import", &parts))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
            let json = get_json_body(response).await;
            assert_eq!(json["success"], false);
        }
    }
}
