#[cfg(test)]
mod tests {
    use crate::helpers::app::make_test_app;
    use crate::helpers::fixtures::{empty_request, get_json_body, json_request, seed_workspace};
    use axum::http::StatusCode;
    use serde_json::json;
    use serial_test::serial;
    use tower::ServiceExt;
    use util::paths::results_dir;

    #[tokio::test]
    #[serial]
    async fn update_renames_and_clears_description() {
        let (app, _storage) = make_test_app();
        let ws = seed_workspace().await;

        let uri = format!("/api/workspaces/{}", ws.id);
        let body = json!({ "name": "  Midterm (resit)  ", "description": "   " });
        let response = app.oneshot(json_request("PUT", &uri, body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = get_json_body(response).await;
        assert_eq!(json["data"]["name"], "Midterm (resit)");
        assert!(json["data"].get("description").is_none());
    }

    #[tokio::test]
    #[serial]
    async fn update_rejects_blank_names() {
        let (app, _storage) = make_test_app();
        let ws = seed_workspace().await;
        let uri = format!("/api/workspaces/{}", ws.id);

        let response = app
            .clone()
            .oneshot(json_request("PUT", &uri, json!({ "name": "" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = get_json_body(response).await;
        assert_eq!(json["message"], "Workspace name must be 1-200 characters");

        let response = app
            .oneshot(json_request("PUT", &uri, json!({ "name": "   " })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    #[serial]
    async fn update_of_unknown_workspace_is_not_found() {
        let (app, _storage) = make_test_app();

        let response = app
            .oneshot(json_request("PUT", "/api/workspaces/ws_missing", json!({ "name": "x" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    #[serial]
    async fn result_update_rewrites_outcomes_and_scores() {
        let (app, _storage) = make_test_app();
        let ws = seed_workspace().await;

        let uri = format!("/api/workspaces/{}/results", ws.id);
        let body = json!({
            "resultFile": "alice.xml",
            "items": [{
                "identifier": "item-1",
                "criteria": [{ "index": 1, "met": true }, { "index": 2, "met": true }],
                "comment": "Well argued"
            }]
        });
        let response = app
            .clone()
            .oneshot(json_request("PUT", &uri, body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = get_json_body(response).await;
        assert_eq!(json["data"]["itemScores"]["item-1"], 5.0);
        assert_eq!(json["data"]["totalScore"], 6.0);

        let stored = std::fs::read_to_string(results_dir(&ws.id).join("alice.xml")).unwrap();
        assert!(stored.contains("RUBRIC_2_MET"));
        assert!(stored.contains("Well argued"));

        let view_uri = format!("/api/workspaces/{}/view", ws.id);
        let view = get_json_body(app.oneshot(empty_request("GET", &view_uri)).await.unwrap()).await;
        assert_eq!(view["data"]["results"][0]["totalScore"], 6.0);
    }

    #[tokio::test]
    #[serial]
    async fn result_update_with_partial_criteria_is_rejected() {
        let (app, _storage) = make_test_app();
        let ws = seed_workspace().await;
        let before = std::fs::read_to_string(results_dir(&ws.id).join("alice.xml")).unwrap();

        let uri = format!("/api/workspaces/{}/results", ws.id);
        let body = json!({
            "resultFile": "alice.xml",
            "items": [{ "identifier": "item-1", "criteria": [{ "met": true }] }]
        });
        let response = app.oneshot(json_request("PUT", &uri, body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let after = std::fs::read_to_string(results_dir(&ws.id).join("alice.xml")).unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    #[serial]
    async fn result_update_for_unknown_file_is_not_found() {
        let (app, _storage) = make_test_app();
        let ws = seed_workspace().await;

        let uri = format!("/api/workspaces/{}/results", ws.id);
        let body = json!({
            "resultFile": "bob.xml",
            "items": [{ "identifier": "item-2", "criteria": [{ "met": true }] }]
        });
        let response = app.oneshot(json_request("PUT", &uri, body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
