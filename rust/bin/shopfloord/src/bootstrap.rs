//! Startup checks and store initialization.

use std::sync::Arc;

use tracing::info;

use shopfloor_blob::{BlobStore, FileStore};
use shopfloor_core::ServiceConfig;
use shopfloor_machine::service::MachineService;
use shopfloor_sql::{SQLStore, SqliteStore};

use crate::config::ServerConfig;

/// Refuse to start on a configuration that cannot work.
pub fn verify_config(config: &ServerConfig) -> anyhow::Result<()> {
    if config.storage.data_dir.trim().is_empty() {
        anyhow::bail!("Storage data_dir is empty in configuration.");
    }
    if config.registry.block_count == 0 {
        anyhow::bail!("registry.block_count must be at least 1.");
    }
    if config.server.max_upload_bytes == 0 {
        anyhow::bail!("server.max_upload_bytes must be greater than 0.");
    }
    Ok(())
}

/// Open the SQLite database and blob directory, then build the service.
pub fn open_service(config: &ServerConfig, core: &ServiceConfig) -> anyhow::Result<MachineService> {
    if let Some(dir) = &core.data_dir {
        std::fs::create_dir_all(dir)?;
    }

    let sqlite_path = core.resolve_sqlite_path();
    let sql: Arc<dyn SQLStore> = Arc::new(
        SqliteStore::open(&sqlite_path)
            .map_err(|e| anyhow::anyhow!("failed to open SQL store: {}", e))?,
    );
    let blob_dir = core.resolve_blob_dir();
    let blob: Arc<dyn BlobStore> = Arc::new(
        FileStore::open(&blob_dir)
            .map_err(|e| anyhow::anyhow!("failed to open blob store: {}", e))?,
    );
    info!(
        "storage ready: sqlite={} blobs={}",
        sqlite_path.display(),
        blob_dir.display()
    );

    let registry = config.registry_config();
    info!(
        "registry: {} blocks, policy {:?}",
        registry.block_count, registry.policy
    );
    MachineService::new(sql, blob, registry)
        .map_err(|e| anyhow::anyhow!("failed to initialize machine service: {}", e))
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn config(data_dir: &str) -> ServerConfig {
        ServerConfig::parse(&format!("[storage]\ndata_dir = {:?}\n", data_dir)).unwrap()
    }

    #[test]
    fn rejects_empty_data_dir() {
        assert!(verify_config(&config("")).is_err());
        assert!(verify_config(&config("/data")).is_ok());
    }

    #[test]
    fn rejects_zero_blocks() {
        let mut cfg = config("/data");
        cfg.registry.block_count = 0;
        assert!(verify_config(&cfg).is_err());
    }

    #[test]
    fn rejects_zero_upload_limit() {
        let mut cfg = config("/data");
        cfg.server.max_upload_bytes = 0;
        assert!(verify_config(&cfg).is_err());
    }

    #[test]
    fn opens_stores_under_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("state");
        let cfg = config(&data_dir.display().to_string());
        let core = ServiceConfig {
            data_dir: Some(PathBuf::from(&data_dir)),
            ..Default::default()
        };

        let svc = open_service(&cfg, &core).unwrap();
        assert_eq!(svc.config().block_count, 12);
        assert!(data_dir.join("data.sqlite").exists());
        assert!(data_dir.join("blobs").is_dir());
    }
}
