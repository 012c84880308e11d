use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::data::data_registry::DataRegistry;
use crate::server::api::{self, AppState};

pub const API_VERSION: u32 = 1;

pub fn api_endpoint() -> String {
    format!("/api/v{API_VERSION}/")
}

pub fn build_router(registry: Arc<DataRegistry>) -> Router {
    Router::new()
        .route(&api_endpoint(), get(api::pincode_handler))
        .route("/api/health", get(api::health_handler))
        .fallback(api::not_found_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { registry })
}
