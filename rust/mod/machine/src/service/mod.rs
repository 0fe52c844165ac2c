pub mod schema;
pub mod registry;
pub mod documents;
pub mod qc;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use shopfloor_blob::{BlobError, BlobStore};
use shopfloor_core::ServiceError;
use shopfloor_sql::{SQLError, SQLStore, Value};

use crate::eligibility::EligibilityPolicy;

/// Default number of blocks on the floor.
pub const DEFAULT_BLOCK_COUNT: u32 = 12;

/// Registry settings fixed at startup.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Number of blocks `N`; valid block numbers are `1..=N`.
    pub block_count: u32,

    /// Completion rule enforced by `complete`.
    pub policy: EligibilityPolicy,

    /// Largest accepted request body for uploads.
    pub max_upload_bytes: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            block_count: DEFAULT_BLOCK_COUNT,
            policy: EligibilityPolicy::default(),
            max_upload_bytes: 20 * 1024 * 1024,
        }
    }
}

/// Holds the storage backends and the registry rules.
pub struct MachineService {
    pub(crate) sql: Arc<dyn SQLStore>,
    pub(crate) blob: Arc<dyn BlobStore>,
    pub(crate) config: RegistryConfig,
}

impl MachineService {
    pub fn new(
        sql: Arc<dyn SQLStore>,
        blob: Arc<dyn BlobStore>,
        config: RegistryConfig,
    ) -> Result<Self, ServiceError> {
        if config.block_count == 0 {
            return Err(ServiceError::Validation("block_count must be at least 1".into()));
        }
        schema::init_schema(sql.as_ref())?;
        Ok(Self { sql, blob, config })
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    // ── Generic record helpers ──

    /// Fetch one JSON document by id.
    pub(crate) fn get_record<T: DeserializeOwned>(
        &self,
        table: &str,
        id: &str,
    ) -> Result<Option<T>, ServiceError> {
        let sql = format!("SELECT data FROM {} WHERE id = ?1", table);
        let mut items = self.query_records(&sql, &[Value::Text(id.to_string())])?;
        Ok(items.pop())
    }

    /// Run a `SELECT data ...` query and decode every row.
    pub(crate) fn query_records<T: DeserializeOwned>(
        &self,
        sql: &str,
        params: &[Value],
    ) -> Result<Vec<T>, ServiceError> {
        let rows = self.sql.query(sql, params).map_err(storage_err)?;

        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            let data = row
                .get_str("data")
                .ok_or_else(|| ServiceError::Internal("missing data column".into()))?;
            let item: T = serde_json::from_str(data)
                .map_err(|e| ServiceError::Internal(e.to_string()))?;
            items.push(item);
        }
        Ok(items)
    }

    pub(crate) fn count(&self, sql: &str, params: &[Value]) -> Result<i64, ServiceError> {
        let rows = self.sql.query(sql, params).map_err(storage_err)?;
        Ok(rows.first().and_then(|r| r.get_i64("cnt")).unwrap_or(0))
    }

    /// Delete a blob, logging instead of failing. Used for cleanup after
    /// the record change has already been committed or rejected.
    pub(crate) fn discard_blob(&self, key: &str) {
        if let Err(e) = self.blob.delete(key) {
            warn!("failed to delete blob {}: {}", key, e);
        }
    }
}

pub(crate) fn to_json<T: Serialize>(record: &T) -> Result<String, ServiceError> {
    serde_json::to_string(record).map_err(|e| ServiceError::Internal(e.to_string()))
}

pub(crate) fn storage_err(e: SQLError) -> ServiceError {
    ServiceError::Storage(e.to_string())
}

pub(crate) fn upload_err(e: BlobError) -> ServiceError {
    ServiceError::UploadFailed(e.to_string())
}
