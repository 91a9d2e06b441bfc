use crate::config::AppConfig;
use crate::models::{DirectoryStats, FileEntry, StoredFile};
use crate::utils::validation::{self, ValidationError};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Hidden subdirectory uploads are written to before being renamed into place.
/// Listing ignores subdirectories, so staged files never show up.
pub const STAGING_DIR: &str = ".staging";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("File not found")]
    NotFound(String),

    #[error("Not a file")]
    NotAFile(String),

    #[error("{source}: '{}'", .path.display())]
    Unavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// An opened stored file, ready to be streamed to a client.
#[derive(Debug)]
pub struct FileDownload {
    pub name: String,
    pub size: u64,
    pub file: fs::File,
}

#[async_trait]
pub trait StorageService: Send + Sync {
    /// Directory the service reads from and writes to.
    fn root(&self) -> &Path;

    async fn save_upload(&self, raw_filename: &str, content: Bytes)
    -> Result<StoredFile, StorageError>;

    /// Regular files directly inside the storage directory, in enumeration order.
    async fn list_files(&self) -> Result<Vec<FileEntry>, StorageError>;

    async fn fetch_file(&self, filename: &str) -> Result<FileDownload, StorageError>;

    /// Never fails; an unreadable or missing directory reports zero files.
    async fn directory_stats(&self) -> DirectoryStats;
}

pub struct LocalStorageService {
    root: PathBuf,
    allowed_extensions: Vec<String>,
    max_upload_bytes: usize,
}

impl LocalStorageService {
    pub fn new(root: PathBuf, allowed_extensions: Vec<String>, max_upload_bytes: usize) -> Self {
        Self {
            root,
            allowed_extensions,
            max_upload_bytes,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.storage_path.clone(),
            config.allowed_extensions.clone(),
            config.max_upload_bytes,
        )
    }

    /// Creates the storage directory and its staging area if missing.
    pub async fn ensure_directories(&self) -> io::Result<()> {
        fs::create_dir_all(self.root.join(STAGING_DIR)).await
    }

    fn unavailable(&self, source: io::Error) -> StorageError {
        StorageError::Unavailable {
            path: self.root.clone(),
            source,
        }
    }
}

#[async_trait]
impl StorageService for LocalStorageService {
    fn root(&self) -> &Path {
        &self.root
    }

    async fn save_upload(
        &self,
        raw_filename: &str,
        content: Bytes,
    ) -> Result<StoredFile, StorageError> {
        let filename = validation::validate_upload(
            raw_filename,
            content.len(),
            &self.allowed_extensions,
            self.max_upload_bytes,
        )?;

        let staging_dir = self.root.join(STAGING_DIR);
        fs::create_dir_all(&staging_dir).await?;

        let staging_path = staging_dir.join(Uuid::new_v4().to_string());
        let target = self.root.join(&filename);

        if let Err(e) = fs::write(&staging_path, &content).await {
            let _ = fs::remove_file(&staging_path).await;
            return Err(e.into());
        }

        // Same-name uploads replace each other whole; last rename wins.
        if let Err(e) = fs::rename(&staging_path, &target).await {
            let _ = fs::remove_file(&staging_path).await;
            return Err(e.into());
        }

        let size = fs::metadata(&target).await?.len();

        info!(
            "💾 Stored {} ({} bytes, requested as {:?})",
            filename, size, raw_filename
        );

        Ok(StoredFile {
            filename,
            size,
            upload_time: Utc::now(),
            path: target.display().to_string(),
        })
    }

    async fn list_files(&self) -> Result<Vec<FileEntry>, StorageError> {
        let mut dir = fs::read_dir(&self.root)
            .await
            .map_err(|e| self.unavailable(e))?;

        let mut files = Vec::new();
        while let Some(entry) = dir.next_entry().await.map_err(|e| self.unavailable(e))? {
            let path = entry.path();

            // Follows symlinks, like a plain `stat`
            let metadata = match fs::metadata(&path).await {
                Ok(m) => m,
                Err(e) => {
                    debug!("Skipping {} while listing: {}", path.display(), e);
                    continue;
                }
            };

            if !metadata.is_file() {
                continue;
            }

            let modified = match metadata.modified() {
                Ok(time) => DateTime::<Utc>::from(time),
                Err(e) => {
                    debug!(
                        "No modification time for {}, reporting now: {}",
                        path.display(),
                        e
                    );
                    Utc::now()
                }
            };

            files.push(FileEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                size: metadata.len(),
                modified,
            });
        }

        Ok(files)
    }

    async fn fetch_file(&self, filename: &str) -> Result<FileDownload, StorageError> {
        validation::validate_stored_name(filename)?;

        let path = self.root.join(filename);
        let metadata = match fs::metadata(&path).await {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(filename.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        if !metadata.is_file() {
            return Err(StorageError::NotAFile(filename.to_string()));
        }

        let file = fs::File::open(&path).await?;

        Ok(FileDownload {
            name: filename.to_string(),
            size: metadata.len(),
            file,
        })
    }

    async fn directory_stats(&self) -> DirectoryStats {
        let exists = fs::metadata(&self.root)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);

        if !exists {
            return DirectoryStats::default();
        }

        let file_count = match self.list_files().await {
            Ok(files) => files.len(),
            Err(e) => {
                warn!("Storage directory exists but cannot be listed: {}", e);
                0
            }
        };

        DirectoryStats { exists, file_count }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ALLOWED_EXTENSIONS;
    use tokio::io::AsyncReadExt;

    fn service(root: &Path) -> LocalStorageService {
        LocalStorageService::new(
            root.to_path_buf(),
            ALLOWED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            1024,
        )
    }

    async fn read_all(download: FileDownload) -> Vec<u8> {
        let mut file = download.file;
        let mut data = Vec::new();
        file.read_to_end(&mut data).await.unwrap();
        data
    }

    #[tokio::test]
    async fn test_save_then_fetch_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = service(dir.path());
        storage.ensure_directories().await.unwrap();

        for name in ["notes.txt", "Report.PDF", "pic.jpeg", "data.json"] {
            let content = Bytes::from(format!("content of {name}"));
            let stored = storage.save_upload(name, content.clone()).await.unwrap();
            assert_eq!(stored.filename, name);
            assert_eq!(stored.size, content.len() as u64);

            let download = storage.fetch_file(&stored.filename).await.unwrap();
            assert_eq!(download.size, content.len() as u64);
            assert_eq!(read_all(download).await, content.to_vec());
        }
    }

    #[tokio::test]
    async fn test_rejected_uploads_write_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let storage = service(dir.path());
        storage.ensure_directories().await.unwrap();

        let rejected = [
            ("", Bytes::from_static(b"x")),
            ("run.sh", Bytes::from_static(b"x")),
            ("README", Bytes::from_static(b"x")),
            ("big.txt", Bytes::from(vec![0u8; 1025])),
        ];
        for (name, content) in rejected {
            assert!(matches!(
                storage.save_upload(name, content).await,
                Err(StorageError::Validation(_))
            ));
        }

        assert!(storage.list_files().await.unwrap().is_empty());
        let mut staged = fs::read_dir(dir.path().join(STAGING_DIR)).await.unwrap();
        assert!(staged.next_entry().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_same_name_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let storage = service(dir.path());

        storage
            .save_upload("a.txt", Bytes::from_static(b"first version"))
            .await
            .unwrap();
        storage
            .save_upload("a.txt", Bytes::from_static(b"second"))
            .await
            .unwrap();

        let files = storage.list_files().await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].size, 6);
    }

    #[tokio::test]
    async fn test_traversal_stays_inside_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("storage");
        let storage = service(&root);

        let stored = storage
            .save_upload("../../etc/passwd.txt", Bytes::from_static(b"root:x"))
            .await
            .unwrap();

        assert_eq!(stored.filename, "etc_passwd.txt");
        assert!(!stored.filename.contains('/'));
        assert!(root.join("etc_passwd.txt").is_file());
        assert!(!dir.path().join("etc").exists());
    }

    #[tokio::test]
    async fn test_listing_counts_only_regular_files() {
        let dir = tempfile::tempdir().unwrap();
        let storage = service(dir.path());
        storage.ensure_directories().await.unwrap();

        fs::create_dir(dir.path().join("nested")).await.unwrap();
        fs::write(dir.path().join("nested").join("inner.txt"), b"x")
            .await
            .unwrap();
        fs::write(dir.path().join("manual.bin"), b"abc").await.unwrap();
        storage
            .save_upload("one.txt", Bytes::from_static(b"1"))
            .await
            .unwrap();

        let mut names: Vec<String> = storage
            .list_files()
            .await
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["manual.bin", "one.txt"]);

        fs::remove_file(dir.path().join("manual.bin")).await.unwrap();
        assert_eq!(storage.list_files().await.unwrap().len(), 1);

        let stats = storage.directory_stats().await;
        assert!(stats.exists);
        assert_eq!(stats.file_count, 1);
    }

    #[tokio::test]
    async fn test_fetch_errors() {
        let dir = tempfile::tempdir().unwrap();
        let storage = service(dir.path());
        storage.ensure_directories().await.unwrap();
        fs::create_dir(dir.path().join("folder.txt")).await.unwrap();

        assert!(matches!(
            storage.fetch_file("missing.txt").await,
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            storage.fetch_file("folder.txt").await,
            Err(StorageError::NotAFile(_))
        ));
        assert!(matches!(
            storage.fetch_file("..").await,
            Err(StorageError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let storage = service(&dir.path().join("absent"));

        assert_eq!(storage.directory_stats().await, DirectoryStats::default());
        assert!(matches!(
            storage.list_files().await,
            Err(StorageError::Unavailable { .. })
        ));
    }
}
