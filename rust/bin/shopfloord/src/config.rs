//! Server configuration file.
//!
//! ```toml
//! [storage]
//! data_dir = "/var/lib/shopfloor"
//!
//! [registry]
//! block_count = 12
//! eligibility_policy = "QC_PDF_ONLY"
//!
//! [server]
//! listen = "0.0.0.0:8080"
//! max_upload_bytes = 20971520
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use shopfloor_machine::eligibility::EligibilityPolicy;
use shopfloor_machine::service::{RegistryConfig, DEFAULT_BLOCK_COUNT};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub storage: StorageConfig,

    #[serde(default)]
    pub registry: RegistrySection,

    #[serde(default)]
    pub server: ServerSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root for `data.sqlite` and `blobs/`.
    pub data_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrySection {
    #[serde(default = "default_block_count")]
    pub block_count: u32,

    #[serde(default)]
    pub eligibility_policy: EligibilityPolicy,
}

impl Default for RegistrySection {
    fn default() -> Self {
        Self {
            block_count: DEFAULT_BLOCK_COUNT,
            eligibility_policy: EligibilityPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default)]
    pub listen: Option<String>,

    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: None,
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_block_count() -> u32 {
    DEFAULT_BLOCK_COUNT
}

fn default_max_upload_bytes() -> usize {
    RegistryConfig::default().max_upload_bytes
}

impl ServerConfig {
    /// A bare name maps to `/etc/shopfloor/<name>.toml`; anything containing
    /// `/` or `.` is taken as a path.
    pub fn resolve_path(name_or_path: &str) -> PathBuf {
        if name_or_path.contains('/') || name_or_path.contains('.') {
            PathBuf::from(name_or_path)
        } else {
            PathBuf::from(format!("/etc/shopfloor/{}.toml", name_or_path))
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("cannot read {}: {}", path.display(), e))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            block_count: self.registry.block_count,
            policy: self.registry.eligibility_policy,
            max_upload_bytes: self.server.max_upload_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_name_and_path() {
        assert_eq!(
            ServerConfig::resolve_path("plant-a"),
            PathBuf::from("/etc/shopfloor/plant-a.toml")
        );
        assert_eq!(
            ServerConfig::resolve_path("./dev.toml"),
            PathBuf::from("./dev.toml")
        );
        assert_eq!(
            ServerConfig::resolve_path("/opt/sf/conf.toml"),
            PathBuf::from("/opt/sf/conf.toml")
        );
    }

    #[test]
    fn minimal_file_uses_defaults() {
        let config = ServerConfig::parse("[storage]\ndata_dir = \"/var/lib/shopfloor\"\n").unwrap();
        assert_eq!(config.storage.data_dir, "/var/lib/shopfloor");
        assert_eq!(config.registry.block_count, 12);
        assert_eq!(config.registry.eligibility_policy, EligibilityPolicy::QcPdfOnly);
        assert_eq!(config.server.listen, None);
        assert_eq!(config.server.max_upload_bytes, 20 * 1024 * 1024);
    }

    #[test]
    fn full_file() {
        let config = ServerConfig::parse(
            r#"
[storage]
data_dir = "/data"

[registry]
block_count = 16
eligibility_policy = "FULL_DOCUMENTATION"

[server]
listen = "127.0.0.1:9000"
max_upload_bytes = 1048576
"#,
        )
        .unwrap();
        let registry = config.registry_config();
        assert_eq!(registry.block_count, 16);
        assert_eq!(registry.policy, EligibilityPolicy::FullDocumentation);
        assert_eq!(registry.max_upload_bytes, 1_048_576);
        assert_eq!(config.server.listen.as_deref(), Some("127.0.0.1:9000"));
    }

    #[test]
    fn unknown_policy_is_rejected() {
        let err = ServerConfig::parse(
            "[storage]\ndata_dir = \"/d\"\n[registry]\neligibility_policy = \"ANYTHING\"\n",
        );
        assert!(err.is_err());
    }

    #[test]
    fn load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shopfloor.toml");
        std::fs::write(&path, "[storage]\ndata_dir = \"/srv/sf\"\n").unwrap();
        let config = ServerConfig::load(&path).unwrap();
        assert_eq!(config.storage.data_dir, "/srv/sf");

        assert!(ServerConfig::load(&dir.path().join("missing.toml")).is_err());
    }
}
