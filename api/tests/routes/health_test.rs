#[cfg(test)]
mod tests {
    use crate::helpers::app::make_test_app;
    use crate::helpers::fixtures::{empty_request, get_json_body};
    use axum::http::StatusCode;
    use serial_test::serial;
    use tower::ServiceExt;

    #[tokio::test]
    #[serial]
    async fn health_check_returns_ok_json() {
        let (app, _storage) = make_test_app();

        let response = app.oneshot(empty_request("GET", "/api/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = get_json_body(response).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["status"], "OK");
        assert_eq!(json["message"], "Health check passed");
    }

    #[tokio::test]
    #[serial]
    async fn unknown_route_is_not_found() {
        let (app, _storage) = make_test_app();

        let response = app.oneshot(empty_request("GET", "/api/nope")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
