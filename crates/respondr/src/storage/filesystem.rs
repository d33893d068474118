use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use super::{ObjectMetadata, ObjectStore};
use crate::error::StorageError;

/// Object store backed by a directory tree: one directory per container
/// under `root`, keys map to relative paths.
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn container_path(&self, container: &str) -> Result<PathBuf, StorageError> {
        if container.is_empty() || container.contains(['/', '\\']) || container == ".." {
            return Err(StorageError::InvalidKey {
                key: container.to_string(),
                reason: "invalid container name".to_string(),
            });
        }
        Ok(self.root.join(container))
    }

    fn object_path(&self, container: &str, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.container_path(container)?.join(key))
    }

    fn ensure_directory(&self, path: &Path) -> Result<(), StorageError> {
        if !path.exists() {
            std::fs::create_dir_all(path).map_err(|e| StorageError::CreateDirectory {
                path: path.to_path_buf(),
                source: e,
            })?;
        }
        Ok(())
    }
}

fn validate_key(key: &str) -> Result<(), StorageError> {
    let invalid = |reason: &str| StorageError::InvalidKey {
        key: key.to_string(),
        reason: reason.to_string(),
    };

    if key.is_empty() {
        return Err(invalid("key is empty"));
    }
    if key.starts_with('/') || Path::new(key).is_absolute() {
        return Err(invalid("key must be relative"));
    }
    if Path::new(key)
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(invalid("key must not contain '..'"));
    }
    Ok(())
}

/// Relative path of `path` under `base`, always `/`-separated.
fn key_for(base: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(base).ok()?;
    let parts: Vec<&str> = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    Some(parts.join("/"))
}

fn is_temp_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with(".tmp-"))
        .unwrap_or(false)
}

impl ObjectStore for FsObjectStore {
    fn head(&self, container: &str, key: &str) -> Result<ObjectMetadata, StorageError> {
        let path = self.object_path(container, key)?;
        match std::fs::metadata(&path) {
            Ok(meta) if meta.is_file() => Ok(ObjectMetadata {
                size_bytes: meta.len(),
            }),
            Ok(_) => Err(StorageError::NotFound {
                container: container.to_string(),
                key: key.to_string(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound {
                container: container.to_string(),
                key: key.to_string(),
            }),
            Err(e) => Err(StorageError::ReadObject { path, source: e }),
        }
    }

    fn get(&self, container: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.object_path(container, key)?;
        std::fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::NotFound {
                    container: container.to_string(),
                    key: key.to_string(),
                }
            } else {
                StorageError::ReadObject { path, source: e }
            }
        })
    }

    fn put(&self, container: &str, key: &str, content: &[u8]) -> Result<(), StorageError> {
        let path = self.object_path(container, key)?;
        let parent = path.parent().unwrap_or(&self.root).to_path_buf();
        self.ensure_directory(&parent)?;

        // Readers never see a partially written object.
        let temp_path = parent.join(format!(".tmp-{}", uuid::Uuid::new_v4()));
        std::fs::write(&temp_path, content).map_err(|e| StorageError::WriteObject {
            path: temp_path.clone(),
            source: e,
        })?;
        std::fs::rename(&temp_path, &path).map_err(|e| {
            let _ = std::fs::remove_file(&temp_path);
            StorageError::WriteObject {
                path: path.clone(),
                source: e,
            }
        })?;

        tracing::debug!(container, bytes = content.len(), "object written");
        Ok(())
    }

    fn list(&self, container: &str, prefix: Option<&str>) -> Result<Vec<String>, StorageError> {
        let base = self.container_path(container)?;
        if !base.exists() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        for entry in WalkDir::new(&base).follow_links(false) {
            let entry = entry.map_err(|e| StorageError::List {
                container: container.to_string(),
                source: e,
            })?;
            if !entry.file_type().is_file() || is_temp_file(entry.path()) {
                continue;
            }
            if let Some(key) = key_for(&base, entry.path()) {
                if prefix.map_or(true, |p| key.starts_with(p)) {
                    keys.push(key);
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_put_get_head() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsObjectStore::new(temp_dir.path());

        store.put("uploads", "acme/plans/fire.pdf", b"%PDF-1.5").unwrap();

        assert_eq!(store.get("uploads", "acme/plans/fire.pdf").unwrap(), b"%PDF-1.5");
        assert_eq!(
            store.head("uploads", "acme/plans/fire.pdf").unwrap(),
            ObjectMetadata { size_bytes: 8 }
        );
        assert!(temp_dir.path().join("uploads/acme/plans/fire.pdf").exists());
    }

    #[test]
    fn test_put_replaces_existing_object() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsObjectStore::new(temp_dir.path());

        store.put("parsed", "id/doc.txt", b"first").unwrap();
        store.put("parsed", "id/doc.txt", b"second").unwrap();

        assert_eq!(store.get("parsed", "id/doc.txt").unwrap(), b"second");
        assert_eq!(store.list("parsed", None).unwrap(), vec!["id/doc.txt"]);
    }

    #[test]
    fn test_missing_object_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsObjectStore::new(temp_dir.path());

        match store.get("uploads", "nope.pdf") {
            Err(StorageError::NotFound { container, key }) => {
                assert_eq!(container, "uploads");
                assert_eq!(key, "nope.pdf");
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
        assert!(matches!(
            store.head("uploads", "nope.pdf"),
            Err(StorageError::NotFound { .. })
        ));
    }

    #[test]
    fn test_rejects_escaping_keys() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsObjectStore::new(temp_dir.path());

        for key in ["", "/etc/passwd", "../outside.pdf", "a/../../b.pdf"] {
            assert!(
                matches!(store.put("uploads", key, b"x"), Err(StorageError::InvalidKey { .. })),
                "key {:?} should be rejected",
                key
            );
        }
        assert!(matches!(
            store.put("up/loads", "a.pdf", b"x"),
            Err(StorageError::InvalidKey { .. })
        ));
    }

    #[test]
    fn test_list_with_prefix() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsObjectStore::new(temp_dir.path());

        store.put("uploads", "acme/b.pdf", b"b").unwrap();
        store.put("uploads", "acme/a.pdf", b"a").unwrap();
        store.put("uploads", "globex/c.pdf", b"c").unwrap();

        assert_eq!(
            store.list("uploads", None).unwrap(),
            vec!["acme/a.pdf", "acme/b.pdf", "globex/c.pdf"]
        );
        assert_eq!(
            store.list("uploads", Some("acme/")).unwrap(),
            vec!["acme/a.pdf", "acme/b.pdf"]
        );
        assert!(store.list("missing", None).unwrap().is_empty());
    }
}
