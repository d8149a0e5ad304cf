#[cfg(test)]
mod tests {
    use crate::helpers::app::make_test_app;
    use crate::helpers::fixtures::{empty_request, get_json_body, seed_workspace};
    use axum::http::StatusCode;
    use serial_test::serial;
    use tower::ServiceExt;
    use util::paths::workspace_dir;

    #[tokio::test]
    #[serial]
    async fn delete_removes_the_workspace() {
        let (app, _storage) = make_test_app();
        let ws = seed_workspace().await;
        let uri = format!("/api/workspaces/{}", ws.id);

        let response = app.clone().oneshot(empty_request("DELETE", &uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = get_json_body(response).await;
        assert_eq!(json["message"], "Workspace deleted successfully");
        assert!(!workspace_dir(&ws.id).exists());

        let response = app.oneshot(empty_request("GET", &uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    #[serial]
    async fn delete_of_unknown_workspace_is_not_found() {
        let (app, _storage) = make_test_app();

        let response = app
            .oneshot(empty_request("DELETE", "/api/workspaces/ws_missing"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
