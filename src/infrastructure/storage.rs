use crate::config::AppConfig;
use crate::services::storage::LocalStorageService;
use anyhow::Context;
use std::sync::Arc;
use tracing::info;

pub async fn setup_storage(config: &AppConfig) -> anyhow::Result<Arc<LocalStorageService>> {
    let storage = LocalStorageService::from_config(config);
    storage.ensure_directories().await.with_context(|| {
        format!(
            "creating storage directory {}",
            config.storage_path.display()
        )
    })?;

    if let Some(parent) = config
        .log_file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
    {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }

    info!("📁 Storage folder: {}", config.storage_path.display());
    info!("📝 Request log: {}", config.log_file.display());

    Ok(Arc::new(storage))
}
