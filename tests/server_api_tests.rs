use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use pincode_lookup::config::AppConfig;
use pincode_lookup::data::data_registry::DataRegistry;
use pincode_lookup::data::store::LoadError;
use pincode_lookup::server::routes::build_router;
use tower::ServiceExt;

fn fixture_registry() -> Arc<DataRegistry> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/config.yaml");
    let config = AppConfig::load(path).expect("fixture config should load");
    DataRegistry::new(
        config.dataset_source().expect("dataset source"),
        config.cleaning_rules().expect("cleaning rules"),
    )
}

async fn get_raw(router: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request should build");
    let response = router.oneshot(request).await.expect("router should respond");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    (status, bytes.to_vec())
}

async fn get_json(router: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let (status, bytes) = get_raw(router, uri).await;
    let payload = serde_json::from_slice(&bytes).expect("response should be valid json");
    (status, payload)
}

#[tokio::test]
async fn present_pincode_returns_cleaned_records() {
    let (status, payload) = get_json(build_router(fixture_registry()), "/api/v1/?pincode=533344").await;

    assert_eq!(status, StatusCode::OK);
    let records = payload.as_array().expect("payload should be an array");
    assert_eq!(records.len(), 2);

    assert_eq!(records[0]["Office Name"], "Jagannaickpur");
    assert_eq!(records[1]["Office Name"], "Ramanayyapeta");
    for record in records {
        assert_eq!(record["Pincode"], 533_344);
        assert_eq!(record["District"], "East Godavari");
        assert_eq!(record["StateName"], "Andhra Pradesh");
        let keys: Vec<&String> = record
            .as_object()
            .expect("record should be an object")
            .keys()
            .collect();
        assert_eq!(keys.len(), 4, "only retained columns are returned");
        assert!(record.get("Latitude").is_none());
        assert!(record.get("Office Type").is_none());
    }
}

#[tokio::test]
async fn record_keys_follow_source_column_order() {
    let (status, body) = get_raw(build_router(fixture_registry()), "/api/v1/?pincode=533001").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        String::from_utf8(body).expect("utf-8 body"),
        r#"[{"Office Name":"Kakinada","Pincode":533001,"District":"East Godavari","StateName":"Andhra Pradesh"}]"#
    );
}

#[tokio::test]
async fn short_pincode_is_rejected() {
    let (status, payload) = get_json(build_router(fixture_registry()), "/api/v1/?pincode=5333").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(payload["detail"], "Pincode must contain only 6 digits.");
}

#[tokio::test]
async fn non_numeric_pincode_is_rejected() {
    let (status, payload) = get_json(build_router(fixture_registry()), "/api/v1/?pincode=abcded").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(payload["detail"], "Invalid pincode.");
}

#[tokio::test]
async fn absent_pincode_returns_not_found() {
    let (status, payload) = get_json(build_router(fixture_registry()), "/api/v1/?pincode=999999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(payload["detail"], "Pincode 999999 not found");
}

#[tokio::test]
async fn missing_parameter_is_required() {
    let (status, payload) = get_json(build_router(fixture_registry()), "/api/v1/").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(payload["detail"]
        .as_str()
        .is_some_and(|detail| detail.contains("required")));
}

#[tokio::test]
async fn empty_parameter_is_rejected() {
    let (status, payload) = get_json(build_router(fixture_registry()), "/api/v1/?pincode=").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(payload["detail"], "Pincode should not be empty.");
}

#[tokio::test]
async fn failed_setup_surfaces_as_internal_error() {
    let registry = DataRegistry::with_loader(|| Err(LoadError::MissingColumn("Pincode".to_string())));
    let (status, payload) = get_json(build_router(registry), "/api/v1/?pincode=533344").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(payload["detail"], "Internal Server Error");
}

#[tokio::test]
async fn validation_runs_before_the_store_is_touched() {
    let registry = DataRegistry::with_loader(|| Err(LoadError::MissingColumn("Pincode".to_string())));
    let (status, _) = get_json(build_router(Arc::clone(&registry)), "/api/v1/?pincode=12").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!registry.is_loaded());
}

#[tokio::test]
async fn health_endpoint_reports_record_count() {
    let (status, payload) = get_json(build_router(fixture_registry()), "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["status"], "ok");
    assert_eq!(payload["service"], "pincode-lookup");
    assert_eq!(payload["records"], 4);
}

#[tokio::test]
async fn health_endpoint_reports_unavailable_dataset() {
    let registry = DataRegistry::with_loader(|| Err(LoadError::MissingColumn("Pincode".to_string())));
    let (status, payload) = get_json(build_router(registry), "/api/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(payload["status"], "unavailable");
    assert!(payload["records"].is_null());
}

#[tokio::test]
async fn first_build_runs_off_the_request_thread() {
    let built_on: Arc<Mutex<Option<ThreadId>>> = Arc::new(Mutex::new(None));
    let recorder = Arc::clone(&built_on);
    let inner = fixture_registry();
    let registry = DataRegistry::with_loader(move || {
        *recorder.lock().expect("recorder lock") = Some(thread::current().id());
        inner.get().cloned().map_err(|_| LoadError::MissingColumn("Pincode".to_string()))
    });

    let (status, _) = get_json(build_router(Arc::clone(&registry)), "/api/v1/?pincode=533001").await;
    assert_eq!(status, StatusCode::OK);

    let builder_thread = *built_on.lock().expect("recorder lock");
    assert!(builder_thread.is_some(), "loader should run");
    assert_ne!(builder_thread, Some(thread::current().id()));
}

#[tokio::test]
async fn unknown_routes_return_json_not_found() {
    let (status, payload) = get_json(build_router(fixture_registry()), "/api/v2/?pincode=533344").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(payload["detail"], "Not Found");
}

#[tokio::test]
async fn store_is_shared_across_requests() {
    let registry = fixture_registry();
    let router = build_router(Arc::clone(&registry));
    for uri in ["/api/v1/?pincode=533001", "/api/v1/?pincode=533101"] {
        let (status, payload) = get_json(router.clone(), uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.as_array().map(Vec::len), Some(1));
    }
    assert!(registry.is_loaded());
}
