use crate::AppState;
use axum::{
    Json,
    extract::State,
    http::{StatusCode, Uri},
    response::IntoResponse,
};
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct EndpointInfo {
    pub path: String,
    pub methods: Vec<String>,
    pub description: String,
}

#[derive(Serialize, ToSchema)]
pub struct AppInfoResponse {
    pub app_name: String,
    pub version: String,
    pub status: String,
    pub port: u16,
    pub debug_mode: bool,
    pub storage_path: String,
    pub endpoints: Vec<EndpointInfo>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct EnvResponse {
    pub port: u16,
    pub app_name: String,
    pub debug_mode: bool,
    pub upload_folder: String,
    pub python_version: String,
    pub hostname: String,
    pub in_docker: String,
}

const ENDPOINTS: &[(&str, &str, &str)] = &[
    ("/", "GET", "Service information"),
    ("/health", "GET", "Health check"),
    ("/upload", "POST", "Upload a file"),
    ("/files", "GET", "List stored files"),
    ("/download/<filename>", "GET", "Download a file"),
    ("/logs", "GET", "View recent request log"),
    ("/env", "GET", "Environment settings"),
];

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service metadata and endpoint catalog", body = AppInfoResponse)
    ),
    tag = "system"
)]
pub async fn home(State(state): State<AppState>) -> Json<AppInfoResponse> {
    let endpoints = ENDPOINTS
        .iter()
        .map(|(path, method, description)| EndpointInfo {
            path: path.to_string(),
            methods: vec![method.to_string()],
            description: description.to_string(),
        })
        .collect();

    Json(AppInfoResponse {
        app_name: state.config.app_name.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "running".to_string(),
        port: state.config.port,
        debug_mode: state.config.debug_mode,
        storage_path: state.storage.root().display().to_string(),
        endpoints,
    })
}

#[utoipa::path(
    get,
    path = "/env",
    responses(
        (status = 200, description = "Non-secret runtime settings", body = EnvResponse)
    ),
    tag = "system"
)]
pub async fn show_env(State(state): State<AppState>) -> Json<EnvResponse> {
    let config = &state.config;

    Json(EnvResponse {
        port: config.port,
        app_name: config.app_name.clone(),
        debug_mode: config.debug_mode,
        upload_folder: state.storage.root().display().to_string(),
        python_version: config.deployment.python_version.clone(),
        hostname: config.deployment.hostname.clone(),
        in_docker: config.deployment.in_docker.clone(),
    })
}

/// Fallback for unmatched routes.
pub async fn not_found(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Endpoint not found",
            "path": uri.path()
        })),
    )
}

/// Fallback for a known route hit with a method it does not serve.
pub async fn method_not_allowed(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(json!({
            "error": "Method not allowed",
            "path": uri.path()
        })),
    )
}
