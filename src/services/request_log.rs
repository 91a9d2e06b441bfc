use crate::config::AppConfig;
use crate::models::{LogEntry, LogSnapshot};
use anyhow::{Context, Result};
use chrono::Utc;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Bounded JSON audit trail of handled requests.
///
/// The whole log lives in one file holding a JSON array, oldest entry first.
/// Every append re-reads, trims to `capacity` and rewrites the file; nothing is
/// cached between calls. The mutex only serializes callers inside this
/// process, a second process writing the same file can still lose updates.
pub struct RequestLogger {
    path: PathBuf,
    capacity: usize,
    app_name: String,
    port: u16,
    lock: Mutex<()>,
}

impl RequestLogger {
    pub fn new(path: PathBuf, capacity: usize, app_name: String, port: u16) -> Self {
        Self {
            path,
            capacity,
            app_name,
            port,
            lock: Mutex::new(()),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.log_file.clone(),
            config.log_capacity,
            config.app_name.clone(),
            config.port,
        )
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one entry for a handled request.
    ///
    /// Logging failures must never propagate to the request being served, so
    /// the error is reported to tracing and dropped here.
    pub async fn record(&self, endpoint: &str, method: &str, client_address: &str) {
        let entry = LogEntry {
            timestamp: Utc::now(),
            endpoint: endpoint.to_string(),
            method: method.to_string(),
            client_address: client_address.to_string(),
            app_name: self.app_name.clone(),
            port: self.port,
        };

        if let Err(e) = self.append(entry).await {
            warn!(target: "request_log", "Logging error: {:#}", e);
        }
    }

    async fn append(&self, entry: LogEntry) -> Result<()> {
        let _guard = self.lock.lock().await;

        // A read failure leaves the file alone; only a garbled log is replaced
        let mut entries = match self.read_raw().await? {
            Some(raw) => serde_json::from_slice(&raw).unwrap_or_else(|e| {
                warn!(target: "request_log", "Discarding unparsable request log: {}", e);
                Vec::new()
            }),
            None => Vec::new(),
        };

        debug!(
            target: "request_log",
            endpoint = %entry.endpoint,
            method = %entry.method,
            ip = %entry.client_address,
            "Recording request"
        );

        entries.push(entry);
        if entries.len() > self.capacity {
            let excess = entries.len() - self.capacity;
            entries.drain(..excess);
        }

        let json = serde_json::to_vec_pretty(&entries)?;
        fs::write(&self.path, json)
            .await
            .with_context(|| format!("writing {}", self.path.display()))?;

        Ok(())
    }

    /// `None` when no log file exists yet.
    async fn read_raw(&self) -> Result<Option<Vec<u8>>> {
        match fs::read(&self.path).await {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("reading {}", self.path.display())),
        }
    }

    async fn load(&self) -> Result<Option<Vec<LogEntry>>> {
        let Some(raw) = self.read_raw().await? else {
            return Ok(None);
        };

        let entries: Vec<LogEntry> = serde_json::from_slice(&raw)?;
        Ok(Some(entries))
    }

    /// Total entry count plus the last `limit` entries, oldest first.
    pub async fn snapshot(&self, limit: usize) -> Result<Option<LogSnapshot>> {
        let _guard = self.lock.lock().await;

        let Some(entries) = self.load().await? else {
            return Ok(None);
        };

        let total_entries = entries.len();
        let recent = entries[total_entries.saturating_sub(limit)..].to_vec();

        Ok(Some(LogSnapshot {
            total_entries,
            recent,
        }))
    }

    /// Last `limit` entries in chronological order; empty when nothing was logged yet.
    pub async fn read_recent(&self, limit: usize) -> Result<Vec<LogEntry>> {
        Ok(self
            .snapshot(limit)
            .await?
            .map(|s| s.recent)
            .unwrap_or_default())
    }
}
