pub mod api;
pub mod config;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;

use crate::api::handlers::{files, health, logs, system};
use crate::config::AppConfig;
use crate::services::request_log::RequestLogger;
use crate::services::storage::StorageService;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::system::home,
        api::handlers::system::show_env,
        api::handlers::health::health_check,
        api::handlers::files::upload_file,
        api::handlers::files::list_files,
        api::handlers::files::download_file,
        api::handlers::logs::view_logs,
    ),
    components(
        schemas(
            api::handlers::system::AppInfoResponse,
            api::handlers::system::EndpointInfo,
            api::handlers::system::EnvResponse,
            api::handlers::health::HealthResponse,
            api::handlers::health::DiskUsage,
            api::handlers::files::UploadResponse,
            api::handlers::files::FileListResponse,
            api::handlers::logs::LogsResponse,
            models::StoredFile,
            models::FileEntry,
            models::LogEntry,
        )
    ),
    tags(
        (name = "system", description = "Service status and request log"),
        (name = "files", description = "File storage endpoints")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn StorageService>,
    pub request_log: Arc<RequestLogger>,
}

impl AppState {
    pub fn new(config: AppConfig, storage: Arc<dyn StorageService>) -> Self {
        let request_log = Arc::new(RequestLogger::from_config(&config));
        Self {
            config: Arc::new(config),
            storage,
            request_log,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes + MULTIPART_OVERHEAD;

    Router::new()
        .route("/", get(system::home).fallback(system::method_not_allowed))
        .route(
            "/health",
            get(health::health_check).fallback(system::method_not_allowed),
        )
        .route(
            "/upload",
            post(files::upload_file).fallback(system::method_not_allowed),
        )
        .route(
            "/files",
            get(files::list_files).fallback(system::method_not_allowed),
        )
        .route(
            "/download/:filename",
            get(files::download_file).fallback(system::method_not_allowed),
        )
        .route(
            "/logs",
            get(logs::view_logs).fallback(system::method_not_allowed),
        )
        .route(
            "/env",
            get(system::show_env).fallback(system::method_not_allowed),
        )
        .route_layer(from_fn_with_state(
            state.clone(),
            api::middleware::request_log::request_log_middleware,
        ))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .fallback(system::not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(CatchPanicLayer::custom(api::error::handle_panic))
        .with_state(state)
}
