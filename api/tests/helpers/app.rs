use api::{middleware::log_request, routes::routes};
use axum::{Router, middleware::from_fn};
use tempfile::TempDir;
use util::test_helpers::setup_test_storage_root;

/// Builds the `/api` router on top of a fresh temporary storage root.
///
/// Keep the returned `TempDir` alive for the whole test; tests that call this must be
/// `#[serial]` because the storage root lives in the global config.
pub fn make_test_app() -> (Router, TempDir) {
    let storage = setup_test_storage_root();
    let router = Router::new()
        .nest("/api", routes())
        .layer(from_fn(log_request));
    (router, storage)
}
