//! Read-only HTTP query layer over stored snapshots.
//!
//! - `GET /jobs?limit=N` most recent rows across all countries
//! - `GET /jobs/:country` latest row for one country
//! - `GET /health`

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::config::toml_config::ApiConfig;
use crate::domain::model::{JobCount, StoredRow};
use crate::domain::ports::SnapshotSource;
use crate::utils::error::{Result, ScrapeError};

pub const MAX_LIMIT: u32 = 1000;

pub struct ApiState<S> {
    source: Arc<S>,
    default_limit: u32,
}

impl<S> Clone for ApiState<S> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            default_limit: self.default_limit,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobEntry {
    pub country: String,
    pub job_count: JobCount,
    pub timestamp: String,
}

impl From<StoredRow> for JobEntry {
    fn from(row: StoredRow) -> Self {
        Self {
            country: row.country,
            job_count: row.job_count,
            timestamp: row.timestamp,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JobsResponse {
    pub jobs: Vec<JobEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

pub enum ApiError {
    NotFound,
    Internal(ScrapeError),
}

impl From<ScrapeError> for ApiError {
    fn from(e: ScrapeError) -> Self {
        ApiError::Internal(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, "No data found".to_string()),
            ApiError::Internal(e) => {
                tracing::error!("❌ Query failed: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.user_friendly_message())
            }
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}

pub fn router<S: SnapshotSource + 'static>(source: Arc<S>, default_limit: u32) -> Router {
    let state = ApiState {
        source,
        default_limit,
    };

    Router::new()
        .route("/health", get(health))
        .route("/jobs", get(list_jobs::<S>))
        .route("/jobs/:country", get(latest_for_country::<S>))
        .with_state(state)
}

pub async fn serve<S: SnapshotSource + 'static>(source: Arc<S>, config: &ApiConfig) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    tracing::info!("🌐 Query API listening on {}", config.bind);
    axum::serve(listener, router(source, config.default_limit)).await?;
    Ok(())
}

async fn health() -> &'static str {
    "ok"
}

async fn list_jobs<S: SnapshotSource + 'static>(
    State(state): State<ApiState<S>>,
    Query(params): Query<ListParams>,
) -> std::result::Result<Json<JobsResponse>, ApiError> {
    let limit = params.limit.unwrap_or(state.default_limit).min(MAX_LIMIT);
    let rows = state.source.list_recent(limit).await?;
    Ok(Json(JobsResponse {
        jobs: rows.into_iter().map(JobEntry::from).collect(),
    }))
}

async fn latest_for_country<S: SnapshotSource + 'static>(
    State(state): State<ApiState<S>>,
    Path(country): Path<String>,
) -> std::result::Result<Json<JobEntry>, ApiError> {
    state
        .source
        .latest_for_country(&country)
        .await?
        .map(|row| Json(JobEntry::from(row)))
        .ok_or(ApiError::NotFound)
}
