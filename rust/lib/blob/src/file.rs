use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::BlobError;
use crate::traits::{BlobMeta, BlobStore};

/// FileStore is a BlobStore implementation backed by the local filesystem.
///
/// Keys are mapped to paths under `base_dir`:
///   key "qc/42/qcform-7-1718000000000.pdf" → `{base_dir}/qc/42/qcform-7-1718000000000.pdf`
///
/// Parent directories are created automatically on `put`.
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    /// Create a new FileStore rooted at `base_dir`.
    /// The directory is created if it doesn't exist.
    pub fn open(base_dir: &Path) -> Result<Self, BlobError> {
        fs::create_dir_all(base_dir).map_err(|e| BlobError::Io(e.to_string()))?;
        debug!("FileStore: rooted at {:?}", base_dir);
        Ok(Self {
            base_dir: base_dir.to_path_buf(),
        })
    }

    /// Resolve a key to a filesystem path. Rejects keys that could escape
    /// `base_dir`: empty, absolute, backslashes, or any non-normal component.
    fn resolve(&self, key: &str) -> Result<PathBuf, BlobError> {
        if key.is_empty() || key.starts_with('/') || key.contains('\\') {
            return Err(BlobError::InvalidKey(key.to_string()));
        }

        let rel = Path::new(key);
        if !rel.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(BlobError::InvalidKey(key.to_string()));
        }

        Ok(self.base_dir.join(rel))
    }

    /// Recursively walk directory, collecting blobs whose keys match prefix.
    fn walk_dir(
        &self,
        dir: &Path,
        prefix: &str,
        results: &mut Vec<BlobMeta>,
    ) -> Result<(), BlobError> {
        if !dir.is_dir() {
            return Ok(());
        }

        let entries = fs::read_dir(dir).map_err(|e| BlobError::Io(e.to_string()))?;
        for entry in entries {
            let entry = entry.map_err(|e| BlobError::Io(e.to_string()))?;
            let path = entry.path();

            if path.is_dir() {
                self.walk_dir(&path, prefix, results)?;
            } else if path.is_file() {
                // Convert path back to key (relative to base_dir, `/`-separated).
                if let Ok(rel) = path.strip_prefix(&self.base_dir) {
                    let key = rel
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy())
                        .collect::<Vec<_>>()
                        .join("/");
                    if key.starts_with(prefix) {
                        let meta = entry
                            .metadata()
                            .map_err(|e| BlobError::Io(e.to_string()))?;
                        results.push(BlobMeta {
                            key,
                            size: meta.len(),
                        });
                    }
                }
            }
        }

        Ok(())
    }
}

impl BlobStore for FileStore {
    fn put(&self, key: &str, data: &[u8]) -> Result<(), BlobError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| BlobError::Io(e.to_string()))?;
        }
        fs::write(&path, data).map_err(|e| BlobError::Io(e.to_string()))?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BlobError> {
        let path = self.resolve(key)?;
        if !path.is_file() {
            return Ok(None);
        }
        let data = fs::read(&path).map_err(|e| BlobError::Io(e.to_string()))?;
        Ok(Some(data))
    }

    fn delete(&self, key: &str) -> Result<(), BlobError> {
        let path = self.resolve(key)?;
        if path.is_file() {
            fs::remove_file(&path).map_err(|e| BlobError::Io(e.to_string()))?;
        }
        Ok(())
    }

    fn list(&self, prefix: &str) -> Result<Vec<BlobMeta>, BlobError> {
        let mut results = Vec::new();
        self.walk_dir(&self.base_dir, prefix, &mut results)?;
        results.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (FileStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(&dir.path().join("blobs")).unwrap();
        (store, dir)
    }

    #[test]
    fn put_get_delete() {
        let (store, _dir) = store();
        store.put("machines/m1/mastercard/1-a.pdf", b"%PDF-1.4").unwrap();
        assert_eq!(
            store.get("machines/m1/mastercard/1-a.pdf").unwrap(),
            Some(b"%PDF-1.4".to_vec())
        );

        store.delete("machines/m1/mastercard/1-a.pdf").unwrap();
        assert_eq!(store.get("machines/m1/mastercard/1-a.pdf").unwrap(), None);

        // Deleting again is a no-op.
        store.delete("machines/m1/mastercard/1-a.pdf").unwrap();
    }

    #[test]
    fn put_overwrites() {
        let (store, _dir) = store();
        store.put("k.pdf", b"one").unwrap();
        store.put("k.pdf", b"two").unwrap();
        assert_eq!(store.get("k.pdf").unwrap(), Some(b"two".to_vec()));
    }

    #[test]
    fn list_by_prefix() {
        let (store, _dir) = store();
        store.put("machines/m1/mastercard/1-a.pdf", b"a").unwrap();
        store.put("machines/m1/drawing/2-b.pdf", b"bb").unwrap();
        store.put("machines/m2/drawing/3-c.pdf", b"ccc").unwrap();

        let listed = store.list("machines/m1/").unwrap();
        let keys: Vec<&str> = listed.iter().map(|m| m.key.as_str()).collect();
        assert_eq!(
            keys,
            vec!["machines/m1/drawing/2-b.pdf", "machines/m1/mastercard/1-a.pdf"]
        );
        assert_eq!(listed[0].size, 2);
    }

    #[test]
    fn rejects_traversal() {
        let (store, _dir) = store();
        for key in ["", "/etc/passwd", "../escape.pdf", "a/../../b.pdf", "a\\b.pdf", "./a.pdf"] {
            assert!(
                matches!(store.put(key, b"x"), Err(BlobError::InvalidKey(_))),
                "key {:?} should be rejected",
                key
            );
        }
    }
}
