use crate::AppState;
use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct DiskUsage {
    pub storage_path: String,
    pub file_count: usize,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub service: String,
    pub storage_accessible: bool,
    pub disk_usage: DiskUsage,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service health and storage status", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let stats = state.storage.directory_stats().await;

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Utc::now(),
        service: state.config.app_name.clone(),
        storage_accessible: stats.exists,
        disk_usage: DiskUsage {
            storage_path: state.storage.root().display().to_string(),
            file_count: stats.file_count,
        },
    })
}
