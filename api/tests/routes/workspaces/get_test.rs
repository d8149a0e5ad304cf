#[cfg(test)]
mod tests {
    use crate::helpers::app::make_test_app;
    use crate::helpers::fixtures::{body_bytes, empty_request, get_json_body, seed_workspace};
    use axum::http::{StatusCode, header};
    use serial_test::serial;
    use std::io::Cursor;
    use tower::ServiceExt;
    use zip::ZipArchive;

    #[tokio::test]
    #[serial]
    async fn list_is_empty_on_a_fresh_root() {
        let (app, _storage) = make_test_app();

        let response = app.oneshot(empty_request("GET", "/api/workspaces")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = get_json_body(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["data"], serde_json::json!([]));
    }

    #[tokio::test]
    #[serial]
    async fn list_returns_summaries_without_file_lists() {
        let (app, _storage) = make_test_app();
        let ws = seed_workspace().await;

        let response = app.oneshot(empty_request("GET", "/api/workspaces")).await.unwrap();
        let json = get_json_body(response).await;
        let data = json["data"].as_array().unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data[0]["id"], ws.id);
        assert_eq!(data[0]["itemCount"], 2);
        assert!(data[0].get("itemFiles").is_none());
    }

    #[tokio::test]
    #[serial]
    async fn get_returns_full_metadata() {
        let (app, _storage) = make_test_app();
        let ws = seed_workspace().await;

        let uri = format!("/api/workspaces/{}", ws.id);
        let response = app.oneshot(empty_request("GET", &uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = get_json_body(response).await;
        assert_eq!(json["data"]["name"], "Midterm");
        assert_eq!(json["data"]["description"], "First sitting");
        assert_eq!(
            json["data"]["itemFiles"],
            serde_json::json!(["items/item-1.qti.xml", "items/item-2.qti.xml"])
        );
        assert_eq!(json["data"]["resultFiles"], serde_json::json!(["alice.xml"]));
    }

    #[tokio::test]
    #[serial]
    async fn get_unknown_workspace_is_not_found() {
        let (app, _storage) = make_test_app();

        let response = app
            .oneshot(empty_request("GET", "/api/workspaces/ws_missing"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let json = get_json_body(response).await;
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    #[serial]
    async fn get_with_invalid_id_is_bad_request() {
        let (app, _storage) = make_test_app();

        let response = app
            .oneshot(empty_request("GET", "/api/workspaces/ws.1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    #[serial]
    async fn view_contains_remapped_scores() {
        let (app, _storage) = make_test_app();
        let ws = seed_workspace().await;

        let uri = format!("/api/workspaces/{}/view", ws.id);
        let response = app.oneshot(empty_request("GET", &uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = get_json_body(response).await;
        let data = &json["data"];
        assert_eq!(data["items"].as_array().unwrap().len(), 2);
        assert_eq!(data["maxScore"], 6.0);

        let result = &data["results"][0];
        assert_eq!(result["fileName"], "alice.xml");
        assert_eq!(result["sourcedId"], "alice");
        assert_eq!(result["itemScores"]["item-1"], 3.0);
        assert_eq!(result["itemScores"]["item-2"], 1.0);
        assert_eq!(result["totalScore"], 4.0);
        assert_eq!(result["resolvedBy"]["item-1"], "position");
    }

    #[tokio::test]
    #[serial]
    async fn view_of_unknown_workspace_is_not_found() {
        let (app, _storage) = make_test_app();

        let response = app
            .oneshot(empty_request("GET", "/api/workspaces/ws_missing/view"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    #[serial]
    async fn file_download_sets_type_and_disposition() {
        let (app, _storage) = make_test_app();
        let ws = seed_workspace().await;

        let uri = format!(
            "/api/workspaces/{}/files?kind=assessment&name=items/item-1.qti.xml",
            ws.id
        );
        let response = app.oneshot(empty_request("GET", &uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
        assert!(content_type.contains("xml"), "{content_type}");
        let disposition = response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .to_string();
        assert_eq!(
            disposition,
            "inline; filename=\"item-1.qti.xml\"; filename*=UTF-8''item-1.qti.xml"
        );

        let body = String::from_utf8(body_bytes(response).await).unwrap();
        assert!(body.contains(r#"identifier="item-1""#));
    }

    #[tokio::test]
    #[serial]
    async fn file_download_rejects_bad_kind_and_traversal() {
        let (app, _storage) = make_test_app();
        let ws = seed_workspace().await;

        let bad_kind = format!("/api/workspaces/{}/files?kind=items&name=a.xml", ws.id);
        let response = app.clone().oneshot(empty_request("GET", &bad_kind)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let traversal = format!(
            "/api/workspaces/{}/files?kind=results&name=../workspace.json",
            ws.id
        );
        let response = app.clone().oneshot(empty_request("GET", &traversal)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let missing = format!("/api/workspaces/{}/files?kind=results&name=bob.xml", ws.id);
        let response = app.oneshot(empty_request("GET", &missing)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    #[serial]
    async fn export_returns_a_zip_with_manifest() {
        let (app, _storage) = make_test_app();
        let ws = seed_workspace().await;

        let uri = format!("/api/workspaces/{}/export", ws.id);
        let response = app.oneshot(empty_request("GET", &uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/zip");

        let disposition = response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.starts_with("inline; filename=\"workspace-export.zip\""));
        assert!(disposition.contains("filename*=UTF-8''Midterm-"));

        let bytes = body_bytes(response).await;
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let names: Vec<String> = archive.file_names().map(str::to_string).collect();
        assert!(names.contains(&"workspace-export.json".to_string()));
        assert!(names.contains(&format!("workspaces/{}/workspace.json", ws.id)));
        assert!(names.contains(&format!("workspaces/{}/results/alice.xml", ws.id)));
        assert!(archive.by_name("workspace-export.json").is_ok());
    }

    #[tokio::test]
    #[serial]
    async fn export_of_unknown_workspace_is_not_found() {
        let (app, _storage) = make_test_app();

        let response = app
            .oneshot(empty_request("GET", "/api/workspaces/ws_missing/export"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
