use std::env;
use std::path::PathBuf;

/// File extensions accepted by `/upload`, in the order they are reported to clients.
pub const ALLOWED_EXTENSIONS: &[&str] = &["txt", "pdf", "png", "jpg", "jpeg", "gif", "json"];

/// Maximum upload size in bytes (16 MiB)
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Number of entries retained in the request log
pub const LOG_CAPACITY: usize = 100;

/// Deployment facts reported by `/env`, captured once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentInfo {
    pub python_version: String,
    pub hostname: String,
    pub in_docker: String,
}

impl Default for DeploymentInfo {
    fn default() -> Self {
        Self {
            python_version: "Unknown".to_string(),
            hostname: "Unknown".to_string(),
            in_docker: "False".to_string(),
        }
    }
}

/// Process-wide configuration, immutable after startup
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Listening port (default: 8000)
    pub port: u16,

    /// Name reported by `/`, `/health` and every log entry
    pub app_name: String,

    /// Enables debug-level tracing (default: false)
    pub debug_mode: bool,

    /// Flat directory holding uploaded files (default: "storage")
    pub storage_path: PathBuf,

    /// JSON request log (default: "app_log.json")
    pub log_file: PathBuf,

    pub allowed_extensions: Vec<String>,

    pub max_upload_bytes: usize,

    pub log_capacity: usize,

    pub deployment: DeploymentInfo,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            app_name: "Flask Docker App".to_string(),
            debug_mode: false,
            storage_path: PathBuf::from("storage"),
            log_file: PathBuf::from("app_log.json"),
            allowed_extensions: ALLOWED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            max_upload_bytes: MAX_UPLOAD_BYTES,
            log_capacity: LOG_CAPACITY,
            deployment: DeploymentInfo::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();

        Self {
            port: lookup("PORT")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default.port),

            app_name: lookup("APP_NAME").unwrap_or(default.app_name),

            debug_mode: lookup("DEBUG")
                .map(|v| v.to_lowercase() == "true")
                .unwrap_or(default.debug_mode),

            storage_path: lookup("STORAGE_PATH")
                .map(PathBuf::from)
                .unwrap_or(default.storage_path),

            log_file: lookup("LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or(default.log_file),

            deployment: DeploymentInfo {
                python_version: lookup("PYTHON_VERSION")
                    .unwrap_or(default.deployment.python_version),
                hostname: lookup("HOSTNAME").unwrap_or(default.deployment.hostname),
                in_docker: lookup("IN_DOCKER").unwrap_or(default.deployment.in_docker),
            },

            ..default
        }
    }

    /// Config rooted in a scratch directory, used by tests and local tooling.
    pub fn for_directory(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            storage_path: root.join("storage"),
            log_file: root.join("app_log.json"),
            ..Self::default()
        }
    }

    /// Human-readable list of accepted extensions, e.g. `txt, pdf, png`.
    pub fn allowed_extensions_display(&self) -> String {
        self.allowed_extensions.join(", ")
    }
}
