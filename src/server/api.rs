use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::data::data_registry::DataRegistry;
use crate::data::store::NotFound;
use crate::data::validate::{validate_pincode, PincodeError};

#[derive(Debug, Clone)]
pub struct AppState {
    pub registry: Arc<DataRegistry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PincodeQuery {
    pub pincode: Option<String>,
}

/// Request-time failures, each rendered as `{"detail": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Pincode parameter is required.")]
    MissingPincode,
    #[error("Pincode should not be empty.")]
    EmptyPincode,
    #[error("{0}")]
    InvalidPincode(#[from] PincodeError),
    #[error("Invalid query string: {0}")]
    BadQuery(String),
    #[error("{0}")]
    NotFound(#[from] NotFound),
    #[error("Internal Server Error")]
    Internal,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingPincode | Self::EmptyPincode | Self::InvalidPincode(_) | Self::BadQuery(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        detail_response(self.status_code(), &self.to_string())
    }
}

pub fn detail_response(status: StatusCode, detail: &str) -> Response {
    (status, Json(serde_json::json!({ "detail": detail }))).into_response()
}

/// GET /api/v1/?pincode=<value>
pub async fn pincode_handler(
    State(state): State<AppState>,
    query: Result<Query<PincodeQuery>, QueryRejection>,
) -> Response {
    let outcome = match requested_pincode(query) {
        Ok(pincode) => {
            ensure_built(&state.registry).await;
            lookup(&state, pincode)
        }
        Err(err) => Err(err),
    };
    match outcome {
        Ok(response) => response,
        Err(err) => {
            info!(status = err.status_code().as_u16(), "{err}");
            err.into_response()
        }
    }
}

fn requested_pincode(query: Result<Query<PincodeQuery>, QueryRejection>) -> Result<i64, ApiError> {
    let Query(query) = query.map_err(|rejection| ApiError::BadQuery(rejection.body_text()))?;
    let raw = query.pincode.ok_or(ApiError::MissingPincode)?;
    if raw.is_empty() {
        return Err(ApiError::EmptyPincode);
    }
    Ok(validate_pincode(&raw)?)
}

fn lookup(state: &AppState, pincode: i64) -> Result<Response, ApiError> {
    let store = state.registry.get().map_err(|err| {
        warn!("lookup refused, dataset unavailable: {err}");
        ApiError::Internal
    })?;
    let records = store.filter_by_key(pincode)?;
    info!(pincode, matches = records.len(), "pincode found");
    Ok((StatusCode::OK, Json(records)).into_response())
}

/// Run a pending first build on the blocking pool; setup reads and parses the
/// whole file.
async fn ensure_built(registry: &Arc<DataRegistry>) {
    if registry.is_initialized() {
        return;
    }
    let registry = Arc::clone(registry);
    if let Err(err) = tokio::task::spawn_blocking(move || registry.get().is_ok()).await {
        warn!("dataset build task failed: {err}");
    }
}

/// GET /api/health
pub async fn health_handler(State(state): State<AppState>) -> Response {
    let payload = |status: &str, records: Option<usize>| {
        Json(serde_json::json!({
            "status": status,
            "service": "pincode-lookup",
            "version": env!("CARGO_PKG_VERSION"),
            "records": records,
        }))
    };
    ensure_built(&state.registry).await;
    match state.registry.get() {
        Ok(store) => (StatusCode::OK, payload("ok", Some(store.len()))).into_response(),
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, payload("unavailable", None)).into_response(),
    }
}

pub async fn not_found_handler() -> Response {
    detail_response(StatusCode::NOT_FOUND, "Not Found")
}
