use crate::AppState;
use crate::api::error::AppError;
use crate::models::LogEntry;
use axum::{Json, extract::State};
use serde::Serialize;
use utoipa::ToSchema;

/// Entries returned by `/logs`
pub const RECENT_LOG_LIMIT: usize = 20;

#[derive(Serialize, ToSchema)]
pub struct LogsResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_entries: Option<usize>,
    pub logs: Vec<LogEntry>,
}

#[utoipa::path(
    get,
    path = "/logs",
    responses(
        (status = 200, description = "Most recent request log entries, oldest first", body = LogsResponse),
        (status = 500, description = "Request log could not be read")
    ),
    tag = "system"
)]
pub async fn view_logs(State(state): State<AppState>) -> Result<Json<LogsResponse>, AppError> {
    let snapshot = state
        .request_log
        .snapshot(RECENT_LOG_LIMIT)
        .await
        .map_err(|e| AppError::Storage(e.to_string()))?;

    let response = match snapshot {
        Some(snapshot) => LogsResponse {
            message: None,
            total_entries: Some(snapshot.total_entries),
            logs: snapshot.recent,
        },
        None => LogsResponse {
            message: Some("No logs yet".to_string()),
            total_entries: None,
            logs: Vec::new(),
        },
    };

    Ok(Json(response))
}
