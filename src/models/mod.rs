use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Metadata returned after a successful upload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StoredFile {
    /// Sanitized name the file is stored under
    pub filename: String,
    pub size: u64,
    pub upload_time: DateTime<Utc>,
    /// Full on-disk path
    pub path: String,
}

/// One regular file found in the storage directory.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FileEntry {
    pub name: String,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

/// One record of a handled request, as persisted in the request log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub endpoint: String,
    pub method: String,
    #[serde(rename = "ip")]
    pub client_address: String,
    pub app_name: String,
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DirectoryStats {
    pub exists: bool,
    pub file_count: usize,
}

/// View over the request log used by `/logs`.
#[derive(Debug, Clone)]
pub struct LogSnapshot {
    pub total_entries: usize,
    pub recent: Vec<LogEntry>,
}
