//! HTTP surface: one lookup endpoint plus a health check.

use std::sync::Arc;

use anyhow::anyhow;
use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use crate::{
    error::FetchError, fetch_context::FetchContext, fetcher::ResultFetcher, models::FetchResult,
};

#[derive(Clone)]
pub struct AppState {
    pub fetcher: Arc<ResultFetcher>,
}

impl AppState {
    pub fn new(fetcher: ResultFetcher) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FetchParams {
    registration_number: String,
}

/// Error body, shaped the way the results frontend already reads it.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

pub enum ApiError {
    Fetch(FetchError),
    InvalidQuery(QueryRejection),
}

impl FetchError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            FetchError::AuthorizationDenied => StatusCode::FORBIDDEN,
            FetchError::NoResultsFound(_) => StatusCode::NOT_FOUND,
            FetchError::TokenNotFound
            | FetchError::LayoutMismatch { .. }
            | FetchError::Transport(_)
            | FetchError::Unclassified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::Fetch(e) => (e.status_code(), e.to_string()),
            ApiError::InvalidQuery(rejection) => {
                (StatusCode::UNPROCESSABLE_ENTITY, rejection.body_text())
            }
        };
        (status, Json(ErrorBody { detail })).into_response()
    }
}

pub fn create_router(state: AppState) -> Router {
    // Any origin may call this; the results frontend is hosted elsewhere.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/fetch", post(fetch_results))
        .route("/health", get(health_check))
        .layer(cors)
        .with_state(state)
}

async fn health_check() -> &'static str {
    "ok"
}

/// POST /fetch?registration_number=...
async fn fetch_results(
    State(state): State<AppState>,
    params: Result<Query<FetchParams>, QueryRejection>,
) -> Result<Json<FetchResult>, ApiError> {
    let Query(params) = params.map_err(ApiError::InvalidQuery)?;
    let ctx = FetchContext::new(params.registration_number);
    info!("[{ctx}] result lookup requested");

    // A panic inside the pipeline surfaces as a join error instead of a dropped connection.
    let fetcher = Arc::clone(&state.fetcher);
    let task_ctx = ctx.clone();
    let outcome = tokio::spawn(async move { fetcher.fetch_with_context(&task_ctx).await })
        .await
        .unwrap_or_else(|e| Err(FetchError::Unclassified(anyhow!("lookup task failed: {e}"))));

    match outcome {
        Ok(result) => Ok(Json(result)),
        Err(e) => {
            match &e {
                FetchError::Unclassified(cause) => error!("[{ctx}] lookup failed: {cause:?}"),
                FetchError::Transport(cause) => error!("[{ctx}] portal unreachable: {cause:?}"),
                other => warn!("[{ctx}] lookup failed: {other}"),
            }
            Err(ApiError::Fetch(e))
        }
    }
}
